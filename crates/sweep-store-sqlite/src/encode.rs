//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! `created_at` is stored as an RFC 3339 string, `next_fire_at` as integer
//! epoch seconds so the due-query is a plain integer comparison. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use sweep_core::subscription::{Destination, OccurrenceRule, Subscription};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Epoch seconds ───────────────────────────────────────────────────────────

pub fn encode_instant(dt: DateTime<Utc>) -> i64 { dt.timestamp() }

pub fn decode_instant(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0)
    .ok_or_else(|| Error::DateParse(format!("epoch seconds out of range: {secs}")))
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub destination:     String,
  pub timezone:        String,
  pub weekday:         u8,
  pub nth_week:        u8,
  pub next_fire_at:    i64,
  pub created_at:      String,
}

impl RawSubscription {
  /// Read a row selected with [`crate::schema::SUBSCRIPTION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      destination:     row.get(1)?,
      timezone:        row.get(2)?,
      weekday:         row.get(3)?,
      nth_week:        row.get(4)?,
      next_fire_at:    row.get(5)?,
      created_at:      row.get(6)?,
    })
  }

  /// The stored rule is trusted as-is; an unresolvable timezone surfaces
  /// later, when the calculator is asked for the next occurrence.
  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id: decode_uuid(&self.subscription_id)?,
      destination:     Destination::parse(&self.destination)?,
      rule:            OccurrenceRule {
        weekday:  self.weekday,
        nth_week: self.nth_week,
        timezone: self.timezone,
      },
      next_fire_at:    decode_instant(self.next_fire_at)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
