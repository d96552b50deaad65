//! Next-occurrence calculation for "the evening before the Nth weekday of the
//! month" reminders.
//!
//! Given a rule and a reference instant, the reminder for a month is the
//! calendar day *before* the rule's Nth weekday, at a fixed local hour. If
//! that moment has already passed (or is exactly now), the following month's
//! reminder is used instead.
//!
//! The Nth weekday is not clamped to the month: a fifth Friday that does not
//! exist rolls over into the first days of the next month, exactly as plain
//! day arithmetic would place it.

use chrono::{
  DateTime, Datelike as _, LocalResult, Months, NaiveDate, NaiveDateTime,
  NaiveTime, TimeDelta, TimeZone, Timelike as _, Utc,
};
use chrono_tz::Tz;

use crate::{Error, Result, subscription::OccurrenceRule};

/// Local hour-of-day at which reminders fire unless configured otherwise.
pub const DEFAULT_REMINDER_HOUR: u32 = 19;

/// How many months past the reference month are tried before giving up.
/// Two always suffice for any `nth_week` of at least zero.
const MAX_MONTHS_AHEAD: u32 = 2;

/// Computes reminder instants from [`OccurrenceRule`]s.
///
/// Preconditions: `weekday` in `0..=6` and `nth_week` in `1..=5`. Values
/// outside those ranges produce some ordinal without panicking; which one is
/// unspecified.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceCalculator {
  reminder_time: NaiveTime,
}

impl Default for RecurrenceCalculator {
  fn default() -> Self {
    Self {
      reminder_time: NaiveTime::from_hms_opt(DEFAULT_REMINDER_HOUR, 0, 0)
        .unwrap_or_default(),
    }
  }
}

impl RecurrenceCalculator {
  pub fn new(reminder_hour: u32) -> Result<Self> {
    let reminder_time = NaiveTime::from_hms_opt(reminder_hour, 0, 0)
      .ok_or(Error::InvalidReminderHour(reminder_hour))?;
    Ok(Self { reminder_time })
  }

  pub fn reminder_hour(&self) -> u32 { self.reminder_time.hour() }

  /// The first reminder instant strictly after `reference`.
  pub fn next_occurrence(
    &self,
    rule: &OccurrenceRule,
    reference: DateTime<Utc>,
  ) -> Result<DateTime<Utc>> {
    let tz = rule.tz()?;
    let month_start = reference
      .with_timezone(&tz)
      .date_naive()
      .with_day(1)
      .ok_or(Error::DateOutOfRange)?;

    for months_ahead in 0..=MAX_MONTHS_AHEAD {
      let first_of_month = month_start
        .checked_add_months(Months::new(months_ahead))
        .ok_or(Error::DateOutOfRange)?;
      let candidate = self.reminder_in_month(&tz, first_of_month, rule)?;
      if candidate > reference {
        return Ok(candidate);
      }
    }

    Err(Error::DateOutOfRange)
  }

  fn reminder_in_month(
    &self,
    tz: &Tz,
    first_of_month: NaiveDate,
    rule: &OccurrenceRule,
  ) -> Result<DateTime<Utc>> {
    let date = reminder_date(first_of_month, rule.weekday, rule.nth_week)?;
    let local = resolve_local(tz, date.and_time(self.reminder_time))?;
    Ok(local.with_timezone(&Utc))
  }
}

/// The calendar day before the `nth_week`-th `weekday` of the month that
/// starts on `first_of_month`.
pub fn reminder_date(
  first_of_month: NaiveDate,
  weekday: u8,
  nth_week: u8,
) -> Result<NaiveDate> {
  let first_weekday = i64::from(first_of_month.weekday().num_days_from_sunday());
  let first_occurrence_day =
    (i64::from(weekday) - first_weekday + 7).rem_euclid(7) + 1;
  let target_day = first_occurrence_day + (i64::from(nth_week) - 1) * 7;

  // Day 1 is `first_of_month`, and the reminder goes out one day early.
  first_of_month
    .checked_add_signed(TimeDelta::days(target_day - 2))
    .ok_or(Error::DateOutOfRange)
}

/// Pin a local wall-clock time to an instant. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward to the first wall
/// time that exists.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
  match tz.from_local_datetime(&naive) {
    LocalResult::Single(dt) => Ok(dt),
    LocalResult::Ambiguous(earliest, _) => Ok(earliest),
    LocalResult::None => (1..=16)
      .filter_map(|quarter| {
        naive.checked_add_signed(TimeDelta::minutes(15 * quarter))
      })
      .find_map(|shifted| tz.from_local_datetime(&shifted).earliest())
      .ok_or(Error::DateOutOfRange),
  }
}
