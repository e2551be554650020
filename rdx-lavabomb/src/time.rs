//! The three cadence timers and the run budget they share.

use crate::common::Cadence;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};

/// What the clock produced on one wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// A cadence timer fired at its scheduled instant.
    Tick { cadence: Cadence, at: Instant },
    /// Elapsed time has exceeded the run budget.
    BudgetSpent,
}

/// Drives the second, minute and hour timers against one run budget.
///
/// All timers start together and first fire one full period after `start`.
/// When several deadlines coincide, the finer cadence is reported first, and
/// any tick scheduled at or before the budget boundary is reported before
/// [`Beat::BudgetSpent`].
pub struct CadenceClock {
    start: Instant,
    budget: Duration,
    second: Interval,
    minute: Interval,
    hour: Interval,
    deadline: Pin<Box<Sleep>>,
}

impl CadenceClock {
    /// Starts all three timers now.
    pub fn start(budget: Duration) -> Self {
        Self::start_at(Instant::now(), budget)
    }

    pub fn start_at(start: Instant, budget: Duration) -> Self {
        Self {
            start,
            budget,
            second: cadence_interval(start, Cadence::Second),
            minute: cadence_interval(start, Cadence::Minute),
            hour: cadence_interval(start, Cadence::Hour),
            deadline: Box::pin(sleep_until(start + budget)),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.start
    }

    /// Returns `true` once `at` lies strictly past the budget.
    pub fn is_spent(&self, at: Instant) -> bool {
        at.saturating_duration_since(self.start) > self.budget
    }

    /// Waits for the next timer fire or for the budget to run out.
    ///
    /// Cancellation safe: dropping the future loses no tick.
    pub async fn next(&mut self) -> Beat {
        let (cadence, at) = tokio::select! {
            biased;
            at = self.second.tick() => (Cadence::Second, at),
            at = self.minute.tick() => (Cadence::Minute, at),
            at = self.hour.tick() => (Cadence::Hour, at),
            _ = &mut self.deadline => return Beat::BudgetSpent,
        };
        if self.is_spent(at) {
            Beat::BudgetSpent
        } else {
            Beat::Tick { cadence, at }
        }
    }
}

fn cadence_interval(start: Instant, cadence: Cadence) -> Interval {
    let period = cadence.period();
    let mut interval = interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
