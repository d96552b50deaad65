//! Error types for `sweep-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid timezone: {0:?}")]
  InvalidTimezone(String),

  #[error("weekday must be between 0 (Sunday) and 6 (Saturday), got {0}")]
  InvalidWeekday(u8),

  #[error("nth week must be between 1 and 5, got {0}")]
  InvalidNthWeek(u8),

  #[error("reminder hour must be between 0 and 23, got {0}")]
  InvalidReminderHour(u32),

  #[error("invalid destination: {0:?}")]
  InvalidDestination(String),

  /// Calendar arithmetic left the range chrono can represent.
  #[error("date out of range")]
  DateOutOfRange,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
