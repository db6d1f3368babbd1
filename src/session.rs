// THEORY:
// A `Session` is the frame loop around a `GameController`. Everything the game
// needs from the outside world arrives through four small traits, so the same
// loop runs against a webcam and a window in the runner, and against scripted
// fakes in tests.
//
// The loop is single-threaded and blocking: it waits for a frame, ticks the
// controller, hands the render intent and any audio alerts to their sinks, and
// polls the exit signal. A missing frame ends the session cleanly. The first
// frame fixes the frame size for the whole session.

use crate::config::SessionConfig;
use crate::core_modules::ball::ball::FrameSize;
use crate::core_modules::score_engine::{AudioAlert, ColorScores};
use crate::error::GameError;
use crate::game::{GameController, RenderIntent};
use image::RgbaImage;
use log::info;
use std::time::Instant;

/// Supplies camera frames. `None` means the stream has ended.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<RgbaImage>;
}

/// Draws a render intent over the frame it was computed from.
pub trait Renderer {
    fn render(&mut self, frame: &RgbaImage, intent: &RenderIntent);
}

/// Plays short alert tones.
pub trait AudioSink {
    fn play(&mut self, alert: AudioAlert);
}

/// Reports whether the player asked to quit.
pub trait ExitSignal {
    fn exit_requested(&mut self) -> bool;
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    EndOfStream,
    ExitRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub ticks: u64,
    pub scores: ColorScores,
    pub total: i32,
    pub finished: bool,
}

pub struct Session<S, R, A, E> {
    pub source: S,
    pub renderer: R,
    pub audio: A,
    pub exit: E,
}

impl<S, R, A, E> Session<S, R, A, E>
where
    S: FrameSource,
    R: Renderer,
    A: AudioSink,
    E: ExitSignal,
{
    pub fn new(source: S, renderer: R, audio: A, exit: E) -> Self {
        Self {
            source,
            renderer,
            audio,
            exit,
        }
    }

    /// Runs until the stream ends or the player quits, on the system clock.
    pub fn run(&mut self, config: &SessionConfig) -> Result<SessionReport, GameError> {
        self.run_with_clock(config, Instant::now)
    }

    /// Runs with an injected time source.
    pub fn run_with_clock(
        &mut self,
        config: &SessionConfig,
        mut now: impl FnMut() -> Instant,
    ) -> Result<SessionReport, GameError> {
        let first = self.source.next_frame().ok_or(GameError::NoInitialFrame)?;
        let frame_size = FrameSize::new(first.width(), first.height());
        let mut controller = GameController::new(frame_size, config, now())?;

        let mut ticks = 0u64;
        let mut pending = Some(first);
        let end = loop {
            let frame = match pending.take().or_else(|| self.source.next_frame()) {
                Some(frame) => frame,
                None => break SessionEnd::EndOfStream,
            };

            let output = controller.tick(&frame, now());
            ticks += 1;
            for alert in output.alerts {
                self.audio.play(alert);
            }
            self.renderer.render(&frame, &output.intent);

            if self.exit.exit_requested() {
                break SessionEnd::ExitRequested;
            }
        };

        let scores = *controller.score().scores();
        info!("Session ended ({end:?}) after {ticks} ticks, total score {}", scores.total());

        Ok(SessionReport {
            end,
            ticks,
            scores,
            total: scores.total(),
            finished: controller.is_finished(),
        })
    }
}
