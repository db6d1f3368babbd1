// THEORY:
// The `game` module is the top-level API of the engine. A `GameController`
// processes one camera frame per call to `tick` and answers with a `TickOutput`:
// a description of what should be drawn (`RenderIntent`) and the tones that
// should be played (`AudioAlert`s). It never draws or plays anything itself.
//
// One tick runs the layers in a fixed order:
// 1.  **Clock**: once the round is over, nothing else runs. The controller only
//     reports the final summary and leaves every piece of state untouched.
// 2.  **Motion**: the frame goes through the `MotionDetector`. The first frame
//     of a session only warms the detector up.
// 3.  **Hits**: the `HitJudge` checks every ball against the motion mask and
//     applies each verdict to the `ScoreEngine` and `BallField` in turn.
// 4.  **Feedback**: the score engine's countdown timers advance by one tick.
// 5.  **Intent**: the HUD, ball overlays, hit markers, combo banner and red
//     flash are collected into a `RenderIntent::Playing`.

use crate::config::SessionConfig;
use crate::core_modules::ball::ball::{Ball, BallColor, FrameSize, Point};
use crate::core_modules::ball_field::BallField;
use crate::core_modules::hit_judge::{HitEvent, HitJudge};
use crate::core_modules::motion_detector::MotionDetector;
use crate::core_modules::round_clock::{ClockReading, RoundClock};
use crate::core_modules::score_engine::{AudioAlert, ColorScores, ScoreEngine};
use crate::error::GameError;
use image::RgbaImage;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;

/// Number of balls on screen during a round.
pub const BALL_COUNT: usize = 5;

/// Where and how to draw one ball.
#[derive(Debug, Clone, PartialEq)]
pub struct BallOverlay {
    pub index: usize,
    pub color: BallColor,
    pub center: Point,
    pub radius: u32,
}

impl BallOverlay {
    fn from_ball(index: usize, ball: &Ball) -> Self {
        Self {
            index,
            color: ball.color,
            center: ball.position,
            radius: ball.radius,
        }
    }
}

/// A ring and "HIT" label at the spot where a ball was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitMarker {
    pub center: Point,
    pub radius: u32,
    pub is_correct: bool,
}

/// The heads-up text shown while a round runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub remaining_secs: u64,
    pub target: BallColor,
    pub scores: ColorScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayingView {
    pub hud: Hud,
    pub balls: Vec<BallOverlay>,
    pub hits: Vec<HitMarker>,
    /// Tint the frame red.
    pub wrong_flash: bool,
    /// Show "n COMBO!" in the middle of the frame.
    pub combo_banner: Option<u32>,
    /// The motion detector had no previous frame to compare against.
    pub warming_up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub scores: ColorScores,
    pub total: i32,
    pub balls: Vec<BallOverlay>,
    /// Draw the frame at half brightness.
    pub dimmed: bool,
}

/// What the renderer should draw on top of the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderIntent {
    Playing(PlayingView),
    Summary(SummaryView),
}

impl RenderIntent {
    pub fn is_summary(&self) -> bool {
        matches!(self, RenderIntent::Summary(_))
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub intent: RenderIntent,
    pub alerts: Vec<AudioAlert>,
}

/// The game-state machine. Owns all per-session state.
pub struct GameController {
    frame_size: FrameSize,
    detector: MotionDetector,
    judge: HitJudge,
    field: BallField,
    score: ScoreEngine,
    clock: RoundClock,
    rng: StdRng,
}

impl GameController {
    /// Starts a round at `now` for frames of `frame_size`.
    pub fn new(frame_size: FrameSize, config: &SessionConfig, now: Instant) -> Result<Self, GameError> {
        if frame_size.max_radius() == 0 {
            return Err(GameError::FrameTooSmall {
                width: frame_size.width,
                height: frame_size.height,
            });
        }

        let seed = config.resolve_seed();
        let mut rng = StdRng::seed_from_u64(seed);
        let score = ScoreEngine::with_random_target(&mut rng);
        let mut field = BallField::spawn_initial(BALL_COUNT, frame_size, &mut rng);
        field.ensure_target_present(score.target());

        info!(
            "Round started: {}x{} frame, {} balls, target {}, seed {seed}",
            frame_size.width,
            frame_size.height,
            field.len(),
            score.target().name()
        );

        Ok(Self {
            frame_size,
            detector: MotionDetector::new(),
            judge: HitJudge::new(),
            field,
            score,
            clock: RoundClock::start(now),
            rng,
        })
    }

    pub fn tick(&mut self, frame: &RgbaImage, now: Instant) -> TickOutput {
        let reading = self.clock.tick(now);
        if !reading.is_running() {
            if reading.just_finished {
                info!("Round finished with total score {}", self.score.scores().total());
            }
            return TickOutput {
                intent: RenderIntent::Summary(self.summary()),
                alerts: Vec::new(),
            };
        }

        let (hits, warming_up) = self.evaluate_hits(frame);
        let feedback = self.score.tick();

        TickOutput {
            alerts: hits.iter().map(|hit| hit.alert).collect(),
            intent: RenderIntent::Playing(PlayingView {
                hud: self.hud(&reading),
                balls: self.overlays(),
                hits: hits
                    .iter()
                    .map(|hit| HitMarker {
                        center: hit.position,
                        radius: hit.radius,
                        is_correct: hit.is_correct,
                    })
                    .collect(),
                wrong_flash: feedback.wrong_flash,
                combo_banner: feedback.combo_banner,
                warming_up,
            }),
        }
    }

    fn evaluate_hits(&mut self, frame: &RgbaImage) -> (Vec<HitEvent>, bool) {
        if frame.dimensions() != (self.frame_size.width, self.frame_size.height) {
            warn!(
                "Dropping a {:?} frame in a {}x{} session",
                frame.dimensions(),
                self.frame_size.width,
                self.frame_size.height
            );
            return (Vec::new(), false);
        }

        match self.detector.detect(frame) {
            Some(mask) => {
                let hits = self.judge.evaluate(
                    &mask,
                    self.frame_size,
                    &mut self.field,
                    &mut self.score,
                    &mut self.rng,
                );
                (hits, false)
            }
            None => (Vec::new(), true),
        }
    }

    fn hud(&self, reading: &ClockReading) -> Hud {
        Hud {
            remaining_secs: reading.remaining_secs(),
            target: self.score.target(),
            scores: *self.score.scores(),
        }
    }

    fn overlays(&self) -> Vec<BallOverlay> {
        self.field
            .balls()
            .iter()
            .enumerate()
            .map(|(index, ball)| BallOverlay::from_ball(index, ball))
            .collect()
    }

    pub fn summary(&self) -> SummaryView {
        let scores = *self.score.scores();
        SummaryView {
            scores,
            total: scores.total(),
            balls: self.overlays(),
            dimmed: true,
        }
    }

    pub fn field(&self) -> &BallField {
        &self.field
    }

    pub fn score(&self) -> &ScoreEngine {
        &self.score
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::score_engine::WRONG_FLASH_TICKS;
    use image::Rgba;
    use std::time::Duration;

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    fn black() -> RgbaImage {
        RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([0, 0, 0, 255]))
    }

    /// A black frame with a white square over the ball's bounding box.
    fn covering(ball: &Ball) -> RgbaImage {
        let r = ball.radius;
        let Point { x: cx, y: cy } = ball.position;
        RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
            if x + r >= cx && x < cx + r && y + r >= cy && y < cy + r {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn controller_with(balls: Vec<Ball>, target: BallColor, start: Instant) -> GameController {
        let config = SessionConfig { seed: Some(1234) };
        let mut controller =
            GameController::new(FrameSize::new(WIDTH, HEIGHT), &config, start).expect("controller");
        controller.field = BallField::from_balls(balls);
        controller.score = ScoreEngine::new(target);
        controller
    }

    fn five_spread_balls(colors: [BallColor; 5]) -> Vec<Ball> {
        let centers = [(80, 80), (240, 80), (400, 80), (80, 300), (400, 300)];
        centers
            .iter()
            .zip(colors)
            .map(|(&(x, y), color)| Ball::new(Point::new(x, y), 45, color))
            .collect()
    }

    fn playing(output: &TickOutput) -> &PlayingView {
        match &output.intent {
            RenderIntent::Playing(view) => view,
            RenderIntent::Summary(_) => panic!("expected a playing intent"),
        }
    }

    #[test]
    fn new_round_has_five_balls_and_a_reachable_target() {
        for seed in 0..50 {
            let config = SessionConfig { seed: Some(seed) };
            let controller =
                GameController::new(FrameSize::new(WIDTH, HEIGHT), &config, Instant::now()).expect("controller");
            assert_eq!(controller.field().len(), BALL_COUNT);
            assert!(controller.field().has_color(controller.score().target()));
        }
    }

    #[test]
    fn degenerate_frames_fail_setup() {
        let config = SessionConfig::default();
        let result = GameController::new(FrameSize::new(1, 480), &config, Instant::now());
        assert!(matches!(result, Err(GameError::FrameTooSmall { width: 1, height: 480 })));
    }

    #[test]
    fn first_tick_only_warms_up() {
        let start = Instant::now();
        let mut controller = controller_with(five_spread_balls([BallColor::Green; 5]), BallColor::Green, start);
        let ball = controller.field().balls()[0].clone();

        let output = controller.tick(&covering(&ball), start);

        let view = playing(&output);
        assert!(view.warming_up);
        assert!(view.hits.is_empty());
        assert!(output.alerts.is_empty());
        assert_eq!(view.hud.remaining_secs, 30);
        assert_eq!(view.balls.len(), 5);
    }

    #[test]
    fn correct_hit_scores_and_respawns_the_ball() {
        let start = Instant::now();
        let colors = [BallColor::Red, BallColor::Blue, BallColor::Green, BallColor::Red, BallColor::Blue];
        let mut controller = controller_with(five_spread_balls(colors), BallColor::Green, start);
        let hit_ball = controller.field().balls()[2].clone();
        let untouched: Vec<Ball> = controller.field().balls().to_vec();

        controller.tick(&black(), start);
        let output = controller.tick(&covering(&hit_ball), start + Duration::from_millis(33));

        let view = playing(&output);
        assert_eq!(view.hits.len(), 1);
        assert_eq!(view.hits[0].center, hit_ball.position);
        assert!(view.hits[0].is_correct);
        assert_eq!(output.alerts, vec![AudioAlert::CORRECT]);

        let respawned = &controller.field().balls()[2];
        assert!(respawned.radius >= 40 && respawned.radius <= 59);
        assert_ne!(respawned.position, hit_ball.position);

        assert_eq!(controller.score().scores().get(BallColor::Green), 1);
        assert_eq!(controller.score().combo(), 1);
        assert!(controller.field().has_color(controller.score().target()));
        assert_eq!(view.hud.target, controller.score().target());

        for index in [1, 3, 4] {
            assert_eq!(controller.field().balls()[index], untouched[index]);
        }
        assert_eq!(controller.field().balls()[0].position, untouched[0].position);
    }

    #[test]
    fn wrong_hit_flashes_and_penalises_the_target_color() {
        let start = Instant::now();
        let colors = [BallColor::Red, BallColor::Blue, BallColor::Green, BallColor::Red, BallColor::Blue];
        let mut controller = controller_with(five_spread_balls(colors), BallColor::Green, start);
        let wrong_ball = controller.field().balls()[1].clone();

        controller.tick(&black(), start);
        let output = controller.tick(&covering(&wrong_ball), start + Duration::from_millis(33));

        let view = playing(&output);
        assert!(view.wrong_flash);
        assert_eq!(output.alerts, vec![AudioAlert::WRONG]);
        assert_eq!(controller.score().scores().get(BallColor::Green), -1);
        assert_eq!(controller.score().combo(), 0);
        assert_eq!(controller.score().wrong_flash_timer(), WRONG_FLASH_TICKS - 1);
        assert!(controller.field().has_color(controller.score().target()));
    }

    #[test]
    fn expiry_switches_to_the_summary_and_freezes_state() {
        let start = Instant::now();
        let colors = [BallColor::Green, BallColor::Blue, BallColor::Green, BallColor::Red, BallColor::Blue];
        let mut controller = controller_with(five_spread_balls(colors), BallColor::Green, start);
        controller.score.on_hit(true, &mut controller.rng);
        controller.score.on_hit(false, &mut controller.rng);
        let scores = *controller.score().scores();
        let field = controller.field().clone();
        let score = controller.score().clone();

        controller.tick(&black(), start + Duration::from_secs(29));
        let ball = controller.field().balls()[0].clone();
        let output = controller.tick(&covering(&ball), start + Duration::from_secs(30));

        match &output.intent {
            RenderIntent::Summary(summary) => {
                assert_eq!(summary.total, scores.get(BallColor::Red) + scores.get(BallColor::Green) + scores.get(BallColor::Blue));
                assert!(summary.dimmed);
                assert_eq!(summary.balls.len(), 5);
            }
            RenderIntent::Playing(_) => panic!("round should be over"),
        }
        assert!(output.alerts.is_empty());
        assert!(controller.is_finished());

        for later in 31..40 {
            let output = controller.tick(&covering(&ball), start + Duration::from_secs(later));
            assert!(output.intent.is_summary());
            assert!(output.alerts.is_empty());
        }
        assert_eq!(controller.field(), &field);
        assert_eq!(controller.score().scores(), score.scores());
        assert_eq!(controller.score().combo(), score.combo());
    }

    #[test]
    fn mismatched_frames_never_hit() {
        let start = Instant::now();
        let mut controller = controller_with(five_spread_balls([BallColor::Red; 5]), BallColor::Red, start);
        controller.tick(&black(), start);

        let small = RgbaImage::from_pixel(320, 240, Rgba([255, 255, 255, 255]));
        let output = controller.tick(&small, start + Duration::from_millis(33));

        assert!(playing(&output).hits.is_empty());
        assert_eq!(controller.score().scores().total(), 0);
    }

    #[test]
    fn combo_banner_appears_on_the_second_consecutive_hit() {
        let start = Instant::now();
        let mut controller = controller_with(Vec::new(), BallColor::Blue, start);
        controller.tick(&black(), start);

        let first = [(240, 80), (400, 80), (80, 300), (400, 300), (560, 300)];
        // No ball sits where the first hit happened, so only the new square moves.
        let second = [(400, 80), (80, 300), (400, 300), (560, 300), (560, 80)];

        let mut now = start;
        let mut banner = None;
        for centers in [first, second] {
            let target = controller.score().target();
            controller.field = BallField::from_balls(
                centers
                    .iter()
                    .map(|&(x, y)| Ball::new(Point::new(x, y), 45, target))
                    .collect(),
            );
            let ball = controller.field().balls()[0].clone();
            now += Duration::from_millis(33);
            let output = controller.tick(&covering(&ball), now);
            assert_eq!(playing(&output).hits.len(), 1);
            banner = playing(&output).combo_banner;
        }
        assert_eq!(controller.score().combo(), 2);
        assert_eq!(controller.score().scores().total(), 1 + 2);
        assert_eq!(banner, Some(2));
    }
}
