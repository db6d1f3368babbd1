// THEORY:
// The `BallField` owns every target on screen for the duration of a round. Balls
// are never created or destroyed mid-round: a hit ball is "reset" in place, which
// gives it a new position, a new (smaller) radius and a new random color.
//
// The field also enforces the one fairness guarantee of the game: there is always
// at least one ball of the color the player is asked to hit. Whoever changes the
// target color or any ball's color calls `ensure_target_present` right after, and
// the field repairs the set by recoloring the first ball when needed.

use crate::core_modules::ball::ball::{Ball, BallColor, FrameSize};
use rand::Rng;
use std::ops::RangeInclusive;

/// Radius range of the balls created when a round starts.
pub const INITIAL_RADIUS: RangeInclusive<u32> = 59..=103;
/// Radius range of a ball respawned after a hit.
pub const RESPAWN_RADIUS: RangeInclusive<u32> = 40..=59;

/// The set of targets on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct BallField {
    balls: Vec<Ball>,
}

impl BallField {
    /// Creates `count` balls with large radii, random colors and in-bounds positions.
    pub fn spawn_initial<R: Rng + ?Sized>(count: usize, frame_size: FrameSize, rng: &mut R) -> Self {
        let balls = (0..count)
            .map(|_| Self::random_ball(INITIAL_RADIUS, frame_size, rng))
            .collect();
        Self { balls }
    }

    /// Builds a field from explicit balls.
    pub fn from_balls(balls: Vec<Ball>) -> Self {
        Self { balls }
    }

    /// Re-rolls one ball in place with a smaller radius. Out-of-range indices are ignored.
    pub fn reset_ball<R: Rng + ?Sized>(&mut self, index: usize, frame_size: FrameSize, rng: &mut R) {
        if let Some(ball) = self.balls.get_mut(index) {
            *ball = Self::random_ball(RESPAWN_RADIUS, frame_size, rng);
        }
    }

    /// Guarantees that at least one ball has the `target` color, recoloring the
    /// first ball if none does. Returns true when a repair happened.
    pub fn ensure_target_present(&mut self, target: BallColor) -> bool {
        if self.balls.iter().any(|ball| ball.color == target) {
            return false;
        }
        match self.balls.first_mut() {
            Some(first) => {
                first.color = target;
                true
            }
            None => false,
        }
    }

    pub fn has_color(&self, color: BallColor) -> bool {
        self.balls.iter().any(|ball| ball.color == color)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    fn random_ball<R: Rng + ?Sized>(
        radius_range: RangeInclusive<u32>,
        frame_size: FrameSize,
        rng: &mut R,
    ) -> Ball {
        let radius = frame_size.fit_radius(rng.gen_range(radius_range));
        let position = frame_size.random_center(radius, rng);
        Ball::new(position, radius, rng.r#gen())
    }
}
