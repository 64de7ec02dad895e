//! Fixed backoff schedule.
//!
//! The delay after failed attempt `n` (1-based) is entry `n - 1` of the
//! schedule. Past the end of the schedule no delay is inserted.

use std::time::Duration;

/// Ordered list of delays between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl BackoffSchedule {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Build a schedule from millisecond values.
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self::new(delays_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// A schedule that never waits.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Delay to wait after attempt `attempt` (1-based) has failed.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        let index = usize::try_from(attempt.checked_sub(1)?).ok()?;
        self.delays.get(index).copied()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_millis(&[500, 1000, 2000])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_lookup() {
        let schedule = BackoffSchedule::default();
        assert_eq!(schedule.delay_after(0), None);
        assert_eq!(schedule.delay_after(1), Some(Duration::from_millis(500)));
        assert_eq!(schedule.delay_after(2), Some(Duration::from_millis(1000)));
        assert_eq!(schedule.delay_after(3), Some(Duration::from_millis(2000)));
        assert_eq!(schedule.delay_after(4), None);
    }

    #[test]
    fn test_short_schedule_stops_delaying() {
        let schedule = BackoffSchedule::from_millis(&[100]);
        assert_eq!(schedule.delay_after(1), Some(Duration::from_millis(100)));
        assert_eq!(schedule.delay_after(2), None);
    }
}
