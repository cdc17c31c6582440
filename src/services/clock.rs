//! Clock port and per-user work-date resolution.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::models::User;

/// Source of "now", injected so tests can pin the calendar.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Today's date in the given IANA time zone. An unparseable stored zone
/// falls back to UTC rather than failing the whole operation.
pub fn today_in_tz(clock: &dyn Clock, timezone: &str) -> NaiveDate {
    let tz: Tz = timezone.parse().unwrap_or(Tz::UTC);
    clock.now_utc().with_timezone(&tz).date_naive()
}

/// The date a user's work is currently logged against: their explicit
/// override if set, otherwise today in their time zone.
pub fn selected_work_date(clock: &dyn Clock, user: &User) -> NaiveDate {
    user.selected_work_date
        .unwrap_or_else(|| today_in_tz(clock, &user.timezone))
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Clock pinned to a fixed instant.
    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }
    }
}
