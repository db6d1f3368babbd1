// A headless run of the game against a synthetic camera: a bright block sweeps
// across a dark frame, so the engine sees motion without any capture device.
// The real webcam runner lives in the `webcam_player` package.

use image::{Rgba, RgbaImage};
use log::{debug, info};
use motion_catch::config::AppConfig;
use motion_catch::core_modules::score_engine::AudioAlert;
use motion_catch::game::RenderIntent;
use motion_catch::session::{AudioSink, ExitSignal, FrameSource, Renderer, Session};
use std::env;
use std::path::Path;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const BLOCK: u32 = 120;
const FRAMES: u32 = 300;

struct SweepingBlock {
    frame: u32,
}

impl FrameSource for SweepingBlock {
    fn next_frame(&mut self) -> Option<RgbaImage> {
        if self.frame >= FRAMES {
            return None;
        }
        let step = self.frame * 8;
        let x0 = step % (WIDTH - BLOCK);
        let y0 = (step / (WIDTH - BLOCK) * BLOCK) % (HEIGHT - BLOCK);
        self.frame += 1;
        Some(RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
            if x >= x0 && x < x0 + BLOCK && y >= y0 && y < y0 + BLOCK {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([20, 20, 20, 255])
            }
        }))
    }
}

struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, _frame: &RgbaImage, intent: &RenderIntent) {
        match intent {
            RenderIntent::Playing(view) => {
                for hit in &view.hits {
                    info!("HIT at ({}, {})", hit.center.x, hit.center.y);
                }
                if let Some(combo) = view.combo_banner {
                    debug!("{combo} COMBO!");
                }
                debug!(
                    "TIME: {} TARGET: {} scores {:?}",
                    view.hud.remaining_secs,
                    view.hud.target.name(),
                    view.hud.scores.iter().collect::<Vec<_>>()
                );
            }
            RenderIntent::Summary(summary) => debug!("GAME OVER, TOTAL: {}", summary.total),
        }
    }
}

struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, alert: AudioAlert) {
        debug!("beep {} Hz for {} ms", alert.frequency_hz, alert.duration_ms);
    }
}

struct Never;

impl ExitSignal for Never {
    fn exit_requested(&mut self) -> bool {
        false
    }
}

fn main() -> Result<(), motion_catch::error::GameError> {
    env_logger::builder().filter_level(log::LevelFilter::Info).parse_default_env().init();

    println!("Motion Catch - Headless Runner");
    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load_or_default(args.get(1).map(Path::new))?;

    let mut session = Session::new(SweepingBlock { frame: 0 }, LogRenderer, LogAudio, Never);
    let report = session.run(&config.session)?;

    for (color, score) in report.scores.iter() {
        println!("{}: {}", color.name(), score);
    }
    println!("TOTAL: {} after {} frames", report.total, report.ticks);
    Ok(())
}
