use std::num::NonZeroU64;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fires on wall-clock multiples of a fixed period (e.g. every full minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    period: Duration,
}

impl Schedule {
    pub fn every_secs(secs: NonZeroU64) -> Self {
        Self {
            period: Duration::from_secs(secs.get()),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left until the next boundary; zero when `now` sits exactly on one.
    pub fn until_next(&self, now: SystemTime) -> Duration {
        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        let period = self.period.as_nanos();
        let into_period = since_epoch.as_nanos() % period;
        if into_period == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((period - into_period) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minute() -> Schedule {
        Schedule::every_secs(NonZeroU64::new(60).unwrap())
    }

    fn at(secs: f64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_waits_until_next_full_minute() {
        assert_eq!(minute().until_next(at(125.0)), Duration::from_secs(55));
        assert_eq!(minute().until_next(at(120.5)), Duration::from_millis(59_500));
        assert_eq!(minute().until_next(at(179.0)), Duration::from_secs(1));
    }

    #[test]
    fn test_on_boundary_fires_immediately() {
        assert_eq!(minute().until_next(at(1_500_000_000.0)), Duration::ZERO);
        assert_eq!(minute().until_next(UNIX_EPOCH), Duration::ZERO);
    }
}
