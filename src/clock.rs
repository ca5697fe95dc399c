use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};

/// Wall-clock source for line timestamps and file rotation.
///
/// The dispatch loop asks the clock for the current local time once per
/// entry. Production code uses [`SystemClock`]; tests plug in a fixed or
/// manually advanced clock to exercise midnight rotation deterministically.
///
/// # Examples
///
/// ```
/// # use dual_logger::clock::{Clock, SystemClock};
/// let clock = SystemClock;
/// let first = clock.now();
/// let second = clock.now();
/// assert!(second >= first);
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Returns the first instant of the local calendar day following `now`.
///
/// Midnight can be skipped or repeated by a DST transition in some zones;
/// the earliest valid local time on the next day is used then, and a plain
/// 24 hours after `now` if the zone reports no valid time at all.
///
/// ```
/// # use chrono::{Local, TimeZone, Timelike, Datelike};
/// # use dual_logger::clock::next_midnight;
/// let late = Local.with_ymd_and_hms(2026, 3, 10, 23, 59, 58).unwrap();
/// let next = next_midnight(late);
/// assert_eq!((next.day(), next.hour(), next.minute()), (11, 0, 0));
/// ```
pub fn next_midnight(now: DateTime<Local>) -> DateTime<Local> {
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return now + Duration::hours(24);
    };
    let naive = tomorrow.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| now + Duration::hours(24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_next_midnight_from_early_morning() {
        let now = Local.with_ymd_and_hms(2026, 1, 5, 0, 0, 1).unwrap();
        let next = next_midnight(now);
        assert_eq!((next.month(), next.day()), (1, 6));
        assert_eq!(next.num_seconds_from_midnight(), 0);
    }

    #[test]
    fn test_next_midnight_crosses_year() {
        let now = Local.with_ymd_and_hms(2025, 12, 31, 12, 0, 0).unwrap();
        let next = next_midnight(now);
        assert_eq!((next.year(), next.month(), next.day()), (2026, 1, 1));
    }
}
