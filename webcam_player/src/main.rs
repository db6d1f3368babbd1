use anyhow::{Context, bail};
use log::{debug, error, info};
use motion_catch::config::{AppConfig, SpriteConfig};
use motion_catch::core_modules::ball::ball::BallColor;
use motion_catch::core_modules::score_engine::AudioAlert;
use motion_catch::core_modules::utils::image_helper::image_helper;
use motion_catch::game::{BallOverlay, HitMarker, PlayingView, RenderIntent, SummaryView};
use motion_catch::session::{AudioSink, ExitSignal, FrameSource, Renderer, Session};
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    highgui, imgcodecs, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::env;
use std::io::Write;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    env_logger::builder().filter_level(log::LevelFilter::Info).parse_default_env().init();

    // --- 1. Configuration ---
    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load_or_default(args.get(1).map(Path::new))
        .context("Error reading configuration")?;

    // --- 2. Camera & Sprites ---
    let mut capture = VideoCapture::new(config.camera.device_index, videoio::CAP_ANY)?;
    if !capture.is_opened()? {
        bail!("No camera available at index {}", config.camera.device_index);
    }
    let sprites = SpriteSheet::load(&config.sprites)?;

    // --- 3. Game Loop ---
    let mut session = Session::new(
        Webcam {
            capture,
            mirror: config.camera.mirror,
        },
        WindowRenderer {
            title: config.camera.window_title.clone(),
            sprites,
        },
        TerminalBell,
        KeyPress {
            exit_key: config.camera.exit_key,
            poll_millis: config.camera.poll_millis,
        },
    );
    let report = session.run(&config.session)?;

    highgui::destroy_all_windows()?;
    println!("Final total: {} ({:?})", report.total, report.end);
    Ok(())
}

struct Webcam {
    capture: VideoCapture,
    mirror: bool,
}

impl Webcam {
    fn read_rgba(&mut self) -> opencv::Result<Option<image::RgbaImage>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        let mut rgba = Mat::default();
        imgproc::cvt_color(&frame, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
        let buffer = rgba.data_bytes()?.to_vec();
        match image_helper::rgba_frame(rgba.cols() as u32, rgba.rows() as u32, buffer) {
            Ok(image) if self.mirror => Ok(Some(image_helper::mirror(&image))),
            Ok(image) => Ok(Some(image)),
            Err(e) => {
                error!("Undecodable frame: {e}");
                Ok(None)
            }
        }
    }
}

impl FrameSource for Webcam {
    fn next_frame(&mut self) -> Option<image::RgbaImage> {
        match self.read_rgba() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Error reading frame: {:?}", e);
                None
            }
        }
    }
}

/// One BGRA sprite per ball color.
struct SpriteSheet {
    sprites: Vec<Mat>,
}

impl SpriteSheet {
    fn load(config: &SpriteConfig) -> anyhow::Result<Self> {
        let mut sprites = Vec::with_capacity(BallColor::ALL.len());
        for color in BallColor::ALL {
            let path = config.path_for(color);
            let sprite = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_UNCHANGED)?;
            if sprite.empty() {
                bail!("Could not load the {} sprite from {}", color.name(), path.display());
            }
            if sprite.channels() != 4 {
                bail!("The {} sprite at {} has no alpha channel", color.name(), path.display());
            }
            sprites.push(sprite);
        }
        Ok(Self { sprites })
    }

    fn get(&self, color: BallColor) -> &Mat {
        &self.sprites[color.index()]
    }
}

struct WindowRenderer {
    title: String,
    sprites: SpriteSheet,
}

const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);

fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

fn color_of(color: BallColor) -> Scalar {
    match color {
        BallColor::Red => bgr((0.0, 0.0, 255.0)),
        BallColor::Green => bgr((0.0, 255.0, 0.0)),
        BallColor::Blue => bgr((255.0, 0.0, 0.0)),
    }
}

fn text(frame: &mut Mat, label: &str, at: Point, scale: f64, color: Scalar, thickness: i32) -> opencv::Result<()> {
    imgproc::put_text(
        frame,
        label,
        at,
        imgproc::FONT_HERSHEY_PLAIN,
        scale,
        color,
        thickness,
        imgproc::LINE_8,
        false,
    )
}

impl WindowRenderer {
    fn draw(&self, frame: &image::RgbaImage, intent: &RenderIntent) -> opencv::Result<()> {
        let output = match intent {
            RenderIntent::Playing(view) => {
                let mut output = to_bgr(frame)?;
                self.draw_playing(&mut output, view)?;
                output
            }
            RenderIntent::Summary(summary) if summary.dimmed => {
                self.draw_summary(to_bgr(&image_helper::dim(frame))?, summary)?
            }
            RenderIntent::Summary(summary) => self.draw_summary(to_bgr(frame)?, summary)?,
        };
        highgui::imshow(&self.title, &output)
    }

    fn draw_playing(&self, frame: &mut Mat, view: &PlayingView) -> opencv::Result<()> {
        let (width, height) = (frame.cols(), frame.rows());

        for hit in &view.hits {
            self.draw_hit(frame, hit)?;
        }

        text(frame, &format!("TIME: {}", view.hud.remaining_secs), Point::new(20, 30), 2.0, bgr(YELLOW), 2)?;
        text(
            frame,
            &format!("TARGET: {}", view.hud.target.name()),
            Point::new(width - 260, 40),
            2.5,
            color_of(view.hud.target),
            3,
        )?;
        for (row, (color, score)) in view.hud.scores.iter().enumerate() {
            text(
                frame,
                &format!("{}: {}", color.name(), score),
                Point::new(20, 70 + row as i32 * 30),
                1.5,
                color_of(color),
                2,
            )?;
        }

        if view.wrong_flash {
            let red = Mat::new_size_with_default(frame.size()?, frame.typ(), bgr((0.0, 0.0, 255.0)))?;
            let mut tinted = Mat::default();
            core::add_weighted(&red, 0.3, &*frame, 0.7, 0.0, &mut tinted, -1)?;
            *frame = tinted;
        }

        if let Some(combo) = view.combo_banner {
            text(
                frame,
                &format!("{combo} COMBO!"),
                Point::new(width / 2 - 100, height / 2),
                3.0,
                bgr(YELLOW),
                3,
            )?;
        }

        for ball in &view.balls {
            self.draw_ball(frame, ball)?;
        }
        Ok(())
    }

    fn draw_summary(&self, mut output: Mat, summary: &SummaryView) -> opencv::Result<Mat> {
        let (width, height) = (output.cols(), output.rows());

        text(
            &mut output,
            "GAME OVER",
            Point::new(width / 2 - 200, height / 2 - 40),
            3.0,
            bgr((0.0, 0.0, 255.0)),
            3,
        )?;
        text(
            &mut output,
            &format!("TOTAL: {}", summary.total),
            Point::new(width / 2 - 120, height / 2 + 40),
            2.0,
            bgr((255.0, 255.0, 255.0)),
            2,
        )?;

        for ball in &summary.balls {
            self.draw_ball(&mut output, ball)?;
        }
        Ok(output)
    }

    fn draw_hit(&self, frame: &mut Mat, hit: &HitMarker) -> opencv::Result<()> {
        let center = Point::new(hit.center.x as i32, hit.center.y as i32);
        imgproc::circle(frame, center, hit.radius as i32 + 5, bgr(YELLOW), 3, imgproc::LINE_8, 0)?;
        text(frame, "HIT", center, 2.0, bgr(YELLOW), 2)
    }

    /// Resizes the ball's sprite to its diameter and copies it through its alpha.
    fn draw_ball(&self, frame: &mut Mat, ball: &BallOverlay) -> opencv::Result<()> {
        let side = ball.radius as i32 * 2;
        if side == 0 {
            return Ok(());
        }
        let mut resized = Mat::default();
        imgproc::resize(
            self.sprites.get(ball.color),
            &mut resized,
            Size::new(side, side),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let placed = Rect::new(
            ball.center.x as i32 - ball.radius as i32,
            ball.center.y as i32 - ball.radius as i32,
            side,
            side,
        );
        let x0 = placed.x.max(0);
        let y0 = placed.y.max(0);
        let x1 = (placed.x + placed.width).min(frame.cols());
        let y1 = (placed.y + placed.height).min(frame.rows());
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }
        let visible = Rect::new(x0, y0, x1 - x0, y1 - y0);
        let sprite_part = Mat::roi(
            &resized,
            Rect::new(x0 - placed.x, y0 - placed.y, visible.width, visible.height),
        )?;

        let mut channels = Vector::<Mat>::new();
        core::split(&sprite_part, &mut channels)?;
        let alpha = channels.get(3)?;
        let mut color_channels = Vector::<Mat>::new();
        for index in 0..3 {
            color_channels.push(channels.get(index)?);
        }
        let mut sprite_bgr = Mat::default();
        core::merge(&color_channels, &mut sprite_bgr)?;

        let mut target = Mat::roi_mut(frame, visible)?;
        sprite_bgr.copy_to_masked(&mut target, &alpha)
    }
}

fn to_bgr(frame: &image::RgbaImage) -> opencv::Result<Mat> {
    let mut rgba = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC4,
        Scalar::all(0.0),
    )?;
    rgba.data_bytes_mut()?.copy_from_slice(frame.as_raw());
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgba, &mut bgr, imgproc::COLOR_RGBA2BGR, 0)?;
    Ok(bgr)
}

impl Renderer for WindowRenderer {
    fn render(&mut self, frame: &image::RgbaImage, intent: &RenderIntent) {
        if let Err(e) = self.draw(frame, intent) {
            error!("Error drawing frame: {:?}", e);
        }
    }
}

struct TerminalBell;

impl AudioSink for TerminalBell {
    fn play(&mut self, alert: AudioAlert) {
        debug!("Alert {} Hz for {} ms", alert.frequency_hz, alert.duration_ms);
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            debug!("Error ringing the bell: {:?}", e);
        }
    }
}

struct KeyPress {
    exit_key: i32,
    poll_millis: i32,
}

impl ExitSignal for KeyPress {
    fn exit_requested(&mut self) -> bool {
        match highgui::wait_key(self.poll_millis) {
            Ok(key) if key == self.exit_key => {
                info!("Exit key pressed");
                true
            }
            Ok(_) => false,
            Err(e) => {
                error!("Error polling keys: {:?}", e);
                true
            }
        }
    }
}
