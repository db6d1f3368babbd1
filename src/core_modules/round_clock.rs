// THEORY:
// The `RoundClock` bounds a round in wall-clock time. It is a two-state machine:
// `Running` until the round duration has elapsed, then `Finished` forever. The
// clock never reads the system time itself; the caller passes `now` on every
// tick, which keeps the whole game deterministic under test.

use std::time::{Duration, Instant};

/// Length of one round.
pub const ROUND_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Finished,
}

/// What one tick of the clock observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub state: ClockState,
    pub remaining: Duration,
    /// True only on the tick that moved the clock from `Running` to `Finished`.
    pub just_finished: bool,
}

impl ClockReading {
    /// Remaining time in whole seconds, rounded up, as shown on the HUD.
    pub fn remaining_secs(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 { secs + 1 } else { secs }
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }
}

#[derive(Debug, Clone)]
pub struct RoundClock {
    start: Instant,
    duration: Duration,
    state: ClockState,
}

impl RoundClock {
    pub fn start(now: Instant) -> Self {
        Self::with_duration(now, ROUND_DURATION)
    }

    pub fn with_duration(now: Instant, duration: Duration) -> Self {
        Self {
            start: now,
            duration,
            state: ClockState::Running,
        }
    }

    pub fn tick(&mut self, now: Instant) -> ClockReading {
        let remaining = self.remaining_at(now);
        let just_finished = self.state == ClockState::Running && remaining.is_zero();
        if just_finished {
            self.state = ClockState::Finished;
        }
        ClockReading {
            state: self.state,
            remaining,
            just_finished,
        }
    }

    /// Remaining time at `now`, without advancing the state.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        if self.state == ClockState::Finished {
            return Duration::ZERO;
        }
        self.duration.saturating_sub(now.saturating_duration_since(self.start))
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ClockState::Finished
    }
}
