/// Tick scheduler: one deadline, re-armed after every tick.
///
/// `reschedule` cancels the in-flight deadline and starts a fresh period,
/// so an interval change applies from the very next tick. At most one
/// deadline exists, which keeps ticks from overlapping.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct TickScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl TickScheduler {
    /// A disarmed scheduler.
    pub fn new(interval: Duration) -> Self {
        TickScheduler { interval, deadline: None }
    }

    /// Cancel any pending deadline and arm `interval` from `now`.
    pub fn reschedule(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.deadline = Some(now + interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// If due, consume this deadline and arm the next one. Returns whether a tick fires.
    ///
    /// The next deadline keeps a fixed rate; if the loop fell a whole period
    /// behind it restarts from `now` instead of bursting.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.due(now) {
            return false;
        }
        let deadline = self.deadline.unwrap_or(now);
        let next = deadline + self.interval;
        self.deadline = Some(if next > now { next } else { now + self.interval });
        true
    }

    /// Time left until the next deadline (zero when due, None when disarmed).
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
