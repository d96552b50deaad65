//! Subscription types: who gets reminded, and by which monthly rule.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Destination ─────────────────────────────────────────────────────────────

/// A phone number that reminders are sent to.
///
/// Formatting characters (spaces, dashes, dots, parentheses) are stripped on
/// parse. A leading `+` marks a number that already carries its country
/// code; bare numbers are completed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Destination(String);

impl Destination {
  pub fn parse(raw: &str) -> Result<Self> {
    let trimmed = raw.trim();
    let (international, rest) = match trimmed.strip_prefix('+') {
      Some(rest) => (true, rest),
      None => (false, trimmed),
    };

    let digits: String = rest
      .chars()
      .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
      .collect();

    if !(7..=15).contains(&digits.len())
      || !digits.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(Error::InvalidDestination(raw.to_owned()));
    }

    Ok(Self(if international { format!("+{digits}") } else { digits }))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Whether the number already carries a country code.
  pub fn is_international(&self) -> bool { self.0.starts_with('+') }

  /// The number with all but its last four digits hidden, for logs.
  pub fn masked(&self) -> String {
    let visible = self.0.len().saturating_sub(4);
    format!("{}{}", "*".repeat(visible), &self.0[visible..])
  }
}

impl TryFrom<String> for Destination {
  type Error = Error;

  fn try_from(raw: String) -> Result<Self> { Self::parse(&raw) }
}

impl From<Destination> for String {
  fn from(d: Destination) -> Self { d.0 }
}

impl fmt::Display for Destination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Occurrence rule ─────────────────────────────────────────────────────────

/// "The `nth_week`-th `weekday` of every month, in `timezone`."
///
/// Fields are public so stored rules can be rebuilt without re-validation;
/// use [`OccurrenceRule::new`] for untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceRule {
  /// 0 = Sunday … 6 = Saturday.
  pub weekday:  u8,
  /// 1-based ordinal of `weekday` within the month.
  pub nth_week: u8,
  /// IANA timezone name, e.g. `America/New_York`.
  pub timezone: String,
}

impl OccurrenceRule {
  pub fn new(
    weekday: u8,
    nth_week: u8,
    timezone: impl Into<String>,
  ) -> Result<Self> {
    let rule = Self { weekday, nth_week, timezone: timezone.into() };
    rule.validate()?;
    Ok(rule)
  }

  pub fn validate(&self) -> Result<()> {
    if self.weekday > 6 {
      return Err(Error::InvalidWeekday(self.weekday));
    }
    if !(1..=5).contains(&self.nth_week) {
      return Err(Error::InvalidNthWeek(self.nth_week));
    }
    self.tz()?;
    Ok(())
  }

  /// Resolve the timezone name against the tz database.
  pub fn tz(&self) -> Result<Tz> {
    self
      .timezone
      .parse::<Tz>()
      .map_err(|_| Error::InvalidTimezone(self.timezone.clone()))
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A persisted reminder subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id: Uuid,
  pub destination:     Destination,
  pub rule:            OccurrenceRule,
  /// When the next reminder is due. Only the sweeper moves this forward.
  pub next_fire_at:    DateTime<Utc>,
  /// Server-assigned; never changes after creation.
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::AlertStore::create`].
/// The id and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSubscription {
  pub destination:  Destination,
  pub rule:         OccurrenceRule,
  pub next_fire_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn destination_strips_formatting() {
    let d = Destination::parse(" (510) 241-4070 ").unwrap();
    assert_eq!(d.as_str(), "5102414070");
    assert!(!d.is_international());
  }

  #[test]
  fn destination_keeps_leading_plus() {
    let d = Destination::parse("+44 20 7946 0958").unwrap();
    assert_eq!(d.as_str(), "+442079460958");
    assert!(d.is_international());
  }

  #[test]
  fn destination_rejects_letters_and_short_numbers() {
    assert!(matches!(
      Destination::parse("555-CALL-NOW"),
      Err(Error::InvalidDestination(_))
    ));
    assert!(Destination::parse("12345").is_err());
    assert!(Destination::parse("").is_err());
  }

  #[test]
  fn destination_masks_all_but_last_four() {
    let d = Destination::parse("5102414070").unwrap();
    assert_eq!(d.masked(), "******4070");
  }

  #[test]
  fn destination_deserialises_through_parse() {
    let d: Destination = serde_json::from_str("\"510-241-4070\"").unwrap();
    assert_eq!(d.as_str(), "5102414070");
    assert!(serde_json::from_str::<Destination>("\"nope\"").is_err());
  }

  #[test]
  fn rule_validation() {
    assert!(OccurrenceRule::new(0, 1, "America/New_York").is_ok());
    assert!(matches!(
      OccurrenceRule::new(7, 1, "America/New_York"),
      Err(Error::InvalidWeekday(7))
    ));
    assert!(matches!(
      OccurrenceRule::new(3, 0, "America/New_York"),
      Err(Error::InvalidNthWeek(0))
    ));
    assert!(matches!(
      OccurrenceRule::new(3, 6, "America/New_York"),
      Err(Error::InvalidNthWeek(6))
    ));
    assert!(matches!(
      OccurrenceRule::new(3, 2, "Mars/Olympus_Mons"),
      Err(Error::InvalidTimezone(_))
    ));
  }
}
