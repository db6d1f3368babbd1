// THEORY:
// The `ScoreEngine` is the bookkeeping layer. It receives hit verdicts (right
// color or wrong color) and turns them into points, combos and short-lived
// feedback timers. It also owns the target color the player is asked to hit.
//
// Key architectural principles:
// 1.  **Verdicts in, intents out**: A hit never plays a sound directly. It
//     returns an `AudioAlert` describing the tone, and the caller forwards it to
//     whatever audio sink the session was built with.
// 2.  **Combo-weighted scoring**: A correct hit is worth the current combo once
//     the combo reaches two, and a single point before that. A wrong hit costs a
//     point against the color that was being asked for and wipes the combo.
// 3.  **Tick-scoped feedback**: The combo banner and the red flash are driven by
//     countdown timers. `tick` reports what is visible this frame and then counts
//     the timers down, so a freshly armed timer is always shown at least once.

use crate::core_modules::ball::ball::BallColor;
use rand::Rng;

/// Ticks the combo banner stays up after a correct hit.
pub const COMBO_DISPLAY_TICKS: u32 = 30;
/// Ticks the red flash stays up after a wrong hit.
pub const WRONG_FLASH_TICKS: u32 = 6;

/// A tone request for the audio sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioAlert {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl AudioAlert {
    pub const CORRECT: AudioAlert = AudioAlert {
        frequency_hz: 1200,
        duration_ms: 50,
    };
    pub const WRONG: AudioAlert = AudioAlert {
        frequency_hz: 400,
        duration_ms: 80,
    };
}

/// Per-color scores. Scores may go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorScores {
    values: [i32; 3],
}

impl ColorScores {
    pub fn get(&self, color: BallColor) -> i32 {
        self.values[color.index()]
    }

    pub fn add(&mut self, color: BallColor, points: i32) {
        self.values[color.index()] += points;
    }

    pub fn total(&self) -> i32 {
        self.values.iter().sum()
    }

    /// Scores paired with their color, in HUD order.
    pub fn iter(&self) -> impl Iterator<Item = (BallColor, i32)> + '_ {
        BallColor::ALL.iter().map(|&color| (color, self.get(color)))
    }
}

/// The feedback visible on the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    /// The combo to announce, when the banner is up.
    pub combo_banner: Option<u32>,
    /// Whether the frame should be tinted red.
    pub wrong_flash: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEngine {
    scores: ColorScores,
    combo: u32,
    combo_timer: u32,
    wrong_flash_timer: u32,
    target: BallColor,
}

impl ScoreEngine {
    pub fn new(target: BallColor) -> Self {
        Self {
            scores: ColorScores::default(),
            combo: 0,
            combo_timer: 0,
            wrong_flash_timer: 0,
            target,
        }
    }

    /// Starts with a uniformly random target color.
    pub fn with_random_target<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.r#gen())
    }

    /// Applies one hit verdict. A correct hit also draws the next target, which
    /// may repeat the current one.
    pub fn on_hit<R: Rng + ?Sized>(&mut self, is_correct: bool, rng: &mut R) -> AudioAlert {
        if is_correct {
            self.combo += 1;
            self.scores.add(self.target, self.combo.max(1) as i32);
            self.combo_timer = COMBO_DISPLAY_TICKS;
            self.target = rng.r#gen();
            AudioAlert::CORRECT
        } else {
            self.scores.add(self.target, -1);
            self.combo = 0;
            self.combo_timer = 0;
            self.wrong_flash_timer = WRONG_FLASH_TICKS;
            AudioAlert::WRONG
        }
    }

    /// Reports the feedback visible this tick, then counts the timers down.
    pub fn tick(&mut self) -> Feedback {
        let feedback = Feedback {
            combo_banner: self.combo_display_active().then_some(self.combo),
            wrong_flash: self.wrong_flash_active(),
        };
        self.combo_timer = self.combo_timer.saturating_sub(1);
        self.wrong_flash_timer = self.wrong_flash_timer.saturating_sub(1);
        feedback
    }

    pub fn combo_display_active(&self) -> bool {
        self.combo_timer > 0 && self.combo >= 2
    }

    pub fn wrong_flash_active(&self) -> bool {
        self.wrong_flash_timer > 0
    }

    pub fn target(&self) -> BallColor {
        self.target
    }

    pub fn scores(&self) -> &ColorScores {
        &self.scores
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn combo_timer(&self) -> u32 {
        self.combo_timer
    }

    pub fn wrong_flash_timer(&self) -> u32 {
        self.wrong_flash_timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn first_correct_hit_scores_one() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut engine = ScoreEngine::new(BallColor::Green);
        let alert = engine.on_hit(true, &mut rng);
        assert_eq!(alert, AudioAlert::CORRECT);
        assert_eq!(engine.scores().get(BallColor::Green), 1);
        assert_eq!(engine.combo(), 1);
        assert_eq!(engine.combo_timer(), COMBO_DISPLAY_TICKS);
    }

    #[test]
    fn combo_weighted_scoring_adds_the_combo() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut engine = ScoreEngine::new(BallColor::Red);
        let mut expected = ColorScores::default();
        for k in 1..=6u32 {
            let target = engine.target();
            engine.on_hit(true, &mut rng);
            expected.add(target, k as i32);
            assert_eq!(engine.combo(), k);
            assert_eq!(*engine.scores(), expected);
        }
        assert_eq!(engine.scores().total(), 1 + 2 + 3 + 4 + 5 + 6);
    }

    #[test]
    fn wrong_hit_with_combo_three_resets_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut engine = ScoreEngine::new(BallColor::Blue);
        for _ in 0..3 {
            engine.on_hit(true, &mut rng);
        }
        assert_eq!(engine.combo(), 3);
        let old_target = engine.target();
        let before = engine.scores().get(old_target);

        let alert = engine.on_hit(false, &mut rng);

        assert_eq!(alert, AudioAlert::WRONG);
        assert_eq!(engine.scores().get(old_target), before - 1);
        assert_eq!(engine.target(), old_target);
        assert_eq!(engine.combo(), 0);
        assert_eq!(engine.combo_timer(), 0);
        assert_eq!(engine.wrong_flash_timer(), WRONG_FLASH_TICKS);
    }

    #[test]
    fn scores_can_go_negative() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut engine = ScoreEngine::new(BallColor::Red);
        engine.on_hit(false, &mut rng);
        engine.on_hit(false, &mut rng);
        assert_eq!(engine.scores().get(BallColor::Red), -2);
        assert_eq!(engine.scores().total(), -2);
    }

    #[test]
    fn banner_needs_a_combo_of_two() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut engine = ScoreEngine::new(BallColor::Red);
        engine.on_hit(true, &mut rng);
        assert_eq!(engine.tick().combo_banner, None);
        engine.on_hit(true, &mut rng);
        assert_eq!(engine.tick().combo_banner, Some(2));
    }

    #[test]
    fn timers_count_down_to_zero_and_stop() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut engine = ScoreEngine::new(BallColor::Red);
        engine.on_hit(false, &mut rng);
        let flashes = (0..10).filter(|_| engine.tick().wrong_flash).count();
        assert_eq!(flashes, WRONG_FLASH_TICKS as usize);
        assert_eq!(engine.wrong_flash_timer(), 0);

        engine.on_hit(true, &mut rng);
        engine.on_hit(true, &mut rng);
        let banners = (0..40).filter(|_| engine.tick().combo_banner.is_some()).count();
        assert_eq!(banners, COMBO_DISPLAY_TICKS as usize);
        assert_eq!(engine.combo_timer(), 0);
        assert_eq!(engine.combo(), 2);
    }
}
