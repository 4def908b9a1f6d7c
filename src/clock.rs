//! Time source and calendar arithmetic.
//!
//! The ledger works in one fixed UTC offset for the whole process. Timestamps
//! are stored in UTC and projected onto local calendar days and months through
//! the [`Clock`] in use.

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, Utc};

/// Supplies the current time and normalizes timestamps to local days and months.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The configured local offset.
    fn offset(&self) -> FixedOffset;

    /// Local calendar day of `at`, or of now when `None`.
    fn day_start(&self, at: Option<DateTime<Utc>>) -> NaiveDate {
        at.unwrap_or_else(|| self.now())
            .with_timezone(&self.offset())
            .date_naive()
    }

    /// First day of the local calendar month of `at`, or of now when `None`.
    fn month_start(&self, at: Option<DateTime<Utc>>) -> NaiveDate {
        first_of_month(self.day_start(at))
    }

    /// The UTC instant at which local `day` begins.
    fn local_midnight(&self, day: NaiveDate) -> DateTime<Utc> {
        let local = day.and_time(NaiveTime::MIN);
        (local - TimeDelta::seconds(i64::from(self.offset().local_minus_utc()))).and_utc()
    }
}

/// Wall clock in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Wall clock reporting local time in `offset`.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock pinned to a single instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Clock that always reports `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Normalizes any date to the first day of its month.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Shifts a month start by `months` (may be negative), saturating at the calendar bounds.
#[must_use]
pub fn add_months(month: NaiveDate, months: i32) -> NaiveDate {
    let month = first_of_month(month);
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        month.checked_add_months(delta).unwrap_or(NaiveDate::MAX)
    } else {
        month.checked_sub_months(delta).unwrap_or(NaiveDate::MIN)
    }
}

/// Signed number of calendar months from `from` to `to`, ignoring the day.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    month_index(to) - month_index(from)
}

#[allow(clippy::cast_possible_wrap)] // month0 is at most 11
fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Exclusive upper bound of the month containing `month`.
#[must_use]
pub fn next_month_start(month: NaiveDate) -> NaiveDate {
    add_months(month, 1)
}

/// Every calendar day of the month containing `month`, ascending.
#[must_use]
pub fn days_in_month(month: NaiveDate) -> Vec<NaiveDate> {
    let end = next_month_start(month);
    first_of_month(month)
        .iter_days()
        .take_while(|day| *day < end)
        .collect()
}
