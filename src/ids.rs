//! Identifier and timestamp sources for new and edited entities.

use std::cell::Cell;

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

/// Produces a fresh, globally unique identifier
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Source of the current time for created/updated stamps
pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Deterministic clock that advances by a fixed step on every reading
#[derive(Debug)]
pub struct ManualClock {
    current: Cell<Timestamp>,
    step: SignedDuration,
}

impl ManualClock {
    pub fn new(start: Timestamp, step: SignedDuration) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// Starts at the Unix epoch and ticks one second per reading
    pub fn ticking() -> Self {
        Self::new(Timestamp::UNIX_EPOCH, SignedDuration::from_secs(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let now = self.current.get();
        self.current
            .set(now.checked_add(self.step).unwrap_or(Timestamp::MAX));
        now
    }
}

/// Next `updated_at` for an entity last touched at `previous`; never moves backwards
pub fn touch(previous: Timestamp, now: Timestamp) -> Timestamp {
    previous.max(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_manual_clock_ticks() {
        let clock = ManualClock::ticking();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second.duration_since(first), SignedDuration::from_secs(1));
    }

    #[test]
    fn test_touch_never_goes_backwards() {
        let later: Timestamp = "2025-01-02T00:00:00Z".parse().unwrap();
        let earlier: Timestamp = "2025-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(touch(later, earlier), later);
        assert_eq!(touch(earlier, later), later);
    }
}
