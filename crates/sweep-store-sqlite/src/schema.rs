//! SQL schema for the subscription store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id TEXT PRIMARY KEY,
    destination     TEXT    NOT NULL,   -- normalised phone number
    timezone        TEXT    NOT NULL,   -- IANA name
    weekday         INTEGER NOT NULL,   -- 0 = Sunday .. 6 = Saturday
    nth_week        INTEGER NOT NULL,   -- 1 .. 5
    next_fire_at    INTEGER NOT NULL,   -- seconds since the Unix epoch, UTC
    created_at      TEXT    NOT NULL    -- RFC 3339 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS subscriptions_next_fire_idx   ON subscriptions(next_fire_at);
CREATE INDEX IF NOT EXISTS subscriptions_destination_idx ON subscriptions(destination);

PRAGMA user_version = 1;
";

/// Column list shared by every `SELECT` that decodes into
/// [`crate::encode::RawSubscription`].
pub const SUBSCRIPTION_COLUMNS: &str =
  "subscription_id, destination, timezone, weekday, nth_week, next_fire_at, created_at";
