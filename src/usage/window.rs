use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const DEFAULT_RESET_TIMEZONE: &str = "America/New_York";

/// Calendar-day windows in a single reference timezone.
///
/// Every user resets at the same local midnight regardless of their own
/// locale. A record belongs to the current window when its `last_reset`
/// falls on the same local date as "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetWindow {
    tz: Tz,
}

impl Default for ResetWindow {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
        }
    }
}

impl ResetWindow {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parses an IANA zone name such as `America/New_York`.
    pub fn from_name(name: &str) -> Option<Self> {
        name.trim().parse::<Tz>().ok().map(Self::new)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date(a) == self.local_date(b)
    }

    /// First instant of `date` in the reference zone.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        // Ambiguous midnights take the earliest mapping; a skipped midnight
        // walks forward to the first local time that exists.
        let mut candidate = midnight;
        for _ in 0..=24 * 4 {
            if let Some(local) = self.tz.from_local_datetime(&candidate).earliest() {
                return local.with_timezone(&Utc);
            }
            candidate += Duration::minutes(15);
        }
        Utc.from_utc_datetime(&midnight)
    }

    pub fn start_of_next_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(instant);
        match today.succ_opt() {
            Some(tomorrow) => self.start_of_day(tomorrow),
            None => instant + Duration::hours(24),
        }
    }

    /// `[start, end)` of the window containing `now`.
    pub fn current_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_of_day(self.local_date(now));
        let end = self.start_of_next_day(now);
        (start, end)
    }
}
