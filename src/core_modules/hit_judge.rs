// THEORY:
// The `HitJudge` decides, for every ball, whether the player moved in front of
// it this tick. It compares the motion mask against the square that bounds each
// ball and calls it a hit when enough of that square moved.
//
// The area used for "enough" is the full, unclipped square `(2r)^2`, even when
// the square sticks out of the frame and only part of it can be counted. A ball
// hugging the frame edge therefore needs proportionally less visible motion to
// register. That sensitivity is part of how the game plays and is kept as is.
//
// Balls are judged in ascending index order and each verdict is applied before
// the next ball is looked at, so a correct hit that changes the target color
// changes what counts as correct for the balls after it in the same tick.

use crate::core_modules::ball::ball::{Ball, FrameSize, Point};
use crate::core_modules::ball_field::BallField;
use crate::core_modules::motion_detector::MotionMask;
use crate::core_modules::score_engine::{AudioAlert, ScoreEngine};
use log::debug;
use rand::Rng;

/// Fraction of the ball's bounding square that must move to register a hit.
const HIT_AREA_RATIO: f64 = 0.1;

/// A clipped, half-open pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    /// The square of side `2r` around the ball, clipped to `width` x `height`.
    pub fn around(ball: &Ball, width: u32, height: u32) -> Self {
        let Point { x, y } = ball.position;
        let r = ball.radius;
        let x0 = x.saturating_sub(r).min(width);
        let y0 = y.saturating_sub(r).min(height);
        Self {
            x0,
            y0,
            x1: (x + r).min(width).max(x0),
            y1: (y + r).min(height).max(y0),
        }
    }
}

/// A registered hit, reported before the ball was respawned.
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub index: usize,
    pub is_correct: bool,
    /// Where the ball was when it was hit.
    pub position: Point,
    pub radius: u32,
    pub alert: AudioAlert,
}

#[derive(Debug, Clone, Default)]
pub struct HitJudge;

impl HitJudge {
    pub fn new() -> Self {
        Self
    }

    /// Minimum number of active pixels a ball needs to exceed to be hit.
    pub fn threshold(ball: &Ball) -> f64 {
        let side = 2.0 * ball.radius as f64;
        side * side * HIT_AREA_RATIO
    }

    /// Whether enough of the ball's bounding square moved.
    pub fn is_hit(&self, ball: &Ball, mask: &MotionMask) -> bool {
        let region = Region::around(ball, mask.width(), mask.height());
        let moved = mask.count_active(region.x0, region.y0, region.x1, region.y1);
        moved as f64 > Self::threshold(ball)
    }

    /// Judges every ball in index order, applying each hit to the score and the
    /// field before moving on.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        mask: &MotionMask,
        frame_size: FrameSize,
        field: &mut BallField,
        score: &mut ScoreEngine,
        rng: &mut R,
    ) -> Vec<HitEvent> {
        let mut events = Vec::new();

        for index in 0..field.len() {
            let ball = field.balls()[index].clone();
            if !self.is_hit(&ball, mask) {
                continue;
            }

            let is_correct = ball.color == score.target();
            let alert = score.on_hit(is_correct, rng);
            field.reset_ball(index, frame_size, rng);
            if field.ensure_target_present(score.target()) {
                debug!("Recolored ball 0 to keep {} on screen", score.target().name());
            }

            debug!(
                "Ball {index} ({}) hit at {:?}: {}",
                ball.color.name(),
                ball.position,
                if is_correct { "correct" } else { "wrong" }
            );

            events.push(HitEvent {
                index,
                is_correct,
                position: ball.position,
                radius: ball.radius,
                alert,
            });
        }

        events
    }
}
