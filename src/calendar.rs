//! Business-calendar abstraction.
//!
//! Period ends are computed by an external calendar service; the core only
//! knows the contract. The accelerator is an environment-supplied divisor
//! that compresses durations for sandbox/test deployments; it is input,
//! never derived here.

use chrono::{DateTime, Duration, Utc};

/// Computes the end of a business period.
pub trait Calendar: Send + Sync {
    /// Returns `start` advanced by `days` business days.
    ///
    /// When `accelerator` is present the duration is divided by it, so an
    /// accelerator of 1440 turns days into minutes.
    fn add_business_period(
        &self,
        start: DateTime<Utc>,
        days: i64,
        accelerator: Option<u32>,
    ) -> DateTime<Utc>;
}

/// Calendar-day implementation.
///
/// Counts plain calendar days; a working-day calendar with holiday data is
/// expected to replace this behind the same trait in production wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCalendar;

impl Calendar for PlainCalendar {
    fn add_business_period(
        &self,
        start: DateTime<Utc>,
        days: i64,
        accelerator: Option<u32>,
    ) -> DateTime<Utc> {
        let full = Duration::days(days);
        match accelerator {
            Some(divisor) if divisor > 1 => {
                let seconds = full.num_seconds() / i64::from(divisor);
                start + Duration::seconds(seconds.max(1))
            }
            _ => start + full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_calendar_adds_days() {
        let start = Utc::now();
        let end = PlainCalendar.add_business_period(start, 15, None);
        assert_eq!(end - start, Duration::days(15));
    }

    #[test]
    fn accelerator_compresses_duration() {
        let start = Utc::now();
        let end = PlainCalendar.add_business_period(start, 10, Some(86400));
        assert_eq!(end - start, Duration::seconds(10));
    }

    #[test]
    fn accelerator_of_one_is_ignored() {
        let start = Utc::now();
        let end = PlainCalendar.add_business_period(start, 3, Some(1));
        assert_eq!(end - start, Duration::days(3));
    }

    #[test]
    fn accelerated_period_never_collapses_to_zero() {
        let start = Utc::now();
        let end = PlainCalendar.add_business_period(start, 1, Some(u32::MAX));
        assert!(end > start);
    }
}
