//! [`SqliteStore`], the SQLite implementation of [`AlertStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use sweep_core::{
  store::AlertStore,
  subscription::{Destination, NewSubscription, Subscription},
};

use crate::{
  Error, Result,
  encode::{RawSubscription, encode_dt, encode_instant, encode_uuid},
  schema::{SCHEMA, SUBSCRIPTION_COLUMNS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on one background thread, so each write is applied
/// atomically and in order.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "subscription store opened");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Run raw SQL against the underlying connection.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Assign the store-owned fields of a new subscription.
fn assign(input: NewSubscription) -> Subscription {
  Subscription {
    subscription_id: Uuid::new_v4(),
    destination:     input.destination,
    rule:            input.rule,
    next_fire_at:    input.next_fire_at,
    created_at:      Utc::now(),
  }
}

fn insert_row(conn: &rusqlite::Connection, row: &Subscription) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO subscriptions (
       subscription_id, destination, timezone, weekday, nth_week,
       next_fire_at, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(row.subscription_id),
      row.destination.as_str(),
      row.rule.timezone,
      row.rule.weekday,
      row.rule.nth_week,
      encode_instant(row.next_fire_at),
      encode_dt(row.created_at),
    ],
  )?;
  Ok(())
}

// ─── AlertStore impl ─────────────────────────────────────────────────────────

impl AlertStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewSubscription) -> Result<Subscription> {
    let subscription = assign(input);
    let row = subscription.clone();

    self
      .conn
      .call(move |conn| {
        insert_row(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(subscription)
  }

  async fn create_many(
    &self,
    inputs: Vec<NewSubscription>,
  ) -> Result<Vec<Subscription>> {
    let batch: Vec<Subscription> = inputs.into_iter().map(assign).collect();
    let rows = batch.clone();

    self
      .conn
      .call(move |conn| {
        // Dropping the transaction without commit rolls every row back.
        let tx = conn.transaction()?;
        for row in &rows {
          insert_row(&tx, row)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(count = batch.len(), "subscription rows inserted");
    Ok(batch)
  }

  async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
    let now_secs = encode_instant(now);

    let raws: Vec<rusqlite::Result<RawSubscription>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS}
           FROM subscriptions
           WHERE next_fire_at <= ?1
           ORDER BY next_fire_at, subscription_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![now_secs], RawSubscription::from_row)?
          .collect();
        Ok(rows)
      })
      .await?;

    // One bad row must not starve every other subscription of its reminder.
    let mut due = Vec::with_capacity(raws.len());
    for raw in raws {
      let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
          warn!(error = %e, "skipping unreadable subscription row");
          continue;
        }
      };
      let raw_id = raw.subscription_id.clone();
      match raw.into_subscription() {
        Ok(subscription) => due.push(subscription),
        Err(e) => {
          warn!(subscription_id = %raw_id, error = %e, "skipping undecodable subscription row");
        }
      }
    }
    Ok(due)
  }

  async fn update_next_fire(
    &self,
    id: Uuid,
    next_fire_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str    = encode_uuid(id);
    let next_fire = encode_instant(next_fire_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions SET next_fire_at = ?1 WHERE subscription_id = ?2",
          rusqlite::params![next_fire, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SubscriptionNotFound(id));
    }
    Ok(())
  }

  async fn delete_by_destination(&self, destination: &Destination) -> Result<usize> {
    let masked      = destination.masked();
    let destination = destination.as_str().to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE destination = ?1",
          rusqlite::params![destination],
        )?)
      })
      .await?;

    debug!(destination = %masked, removed, "subscription rows deleted");
    Ok(removed)
  }
}
