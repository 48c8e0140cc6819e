use std::time::{Duration, Instant};

/// Longest period or delay a timer accepts; longer values are clamped.
pub const MAX_PERIOD: Duration = Duration::from_secs(86_400);

/// Recurring timer driven by the UI tick. Missed periods collapse into one firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    next_due: Instant,
}

impl IntervalTimer {
    pub fn start(period: Duration, now: Instant) -> Self {
        let period = period.clamp(Duration::from_millis(1), MAX_PERIOD);
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn fire_due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.period;
        true
    }
}

/// One-shot delay, the equivalent of a single `setTimeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    due: Instant,
}

impl Delay {
    pub fn after(delay: Duration, now: Instant) -> Self {
        Self {
            due: now + delay.min(MAX_PERIOD),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}
