//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use sweep_core::{
  store::AlertStore,
  subscription::{Destination, NewSubscription, OccurrenceRule},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

fn phone(raw: &str) -> Destination { Destination::parse(raw).unwrap() }

fn new_sub(destination: &str, next_fire_at: DateTime<Utc>) -> NewSubscription {
  NewSubscription {
    destination: phone(destination),
    rule:        OccurrenceRule::new(0, 1, "America/New_York").unwrap(),
    next_fire_at,
  }
}

// ─── create / find_due ───────────────────────────────────────────────────────

#[tokio::test]
async fn created_row_reads_back_unchanged() {
  let s = store().await;
  let input = NewSubscription {
    destination:  phone("+44 20 7946 0958"),
    rule:         OccurrenceRule::new(3, 2, "Europe/London").unwrap(),
    next_fire_at: at(1_494_111_600),
  };
  let created = s.create(input).await.unwrap();

  let due = s.find_due(at(1_494_111_600)).await.unwrap();
  assert_eq!(due, vec![created.clone()]);
  assert_eq!(due[0].destination.as_str(), "+442079460958");
  assert_eq!(due[0].rule.timezone, "Europe/London");
  assert_eq!(due[0].rule.weekday, 3);
  assert_eq!(due[0].rule.nth_week, 2);
}

#[tokio::test]
async fn find_due_includes_exact_boundary() {
  let s = store().await;
  s.create(new_sub("5102414070", at(1_000))).await.unwrap();

  assert_eq!(s.find_due(at(1_000)).await.unwrap().len(), 1);
  assert!(s.find_due(at(999)).await.unwrap().is_empty());
}

#[tokio::test]
async fn find_due_excludes_future_rows_and_orders_oldest_first() {
  let s = store().await;
  let late = s.create(new_sub("5102414070", at(3_000))).await.unwrap();
  let early = s.create(new_sub("4155550100", at(1_000))).await.unwrap();
  s.create(new_sub("4155550101", at(9_000))).await.unwrap();

  let due = s.find_due(at(5_000)).await.unwrap();
  let ids: Vec<Uuid> = due.iter().map(|d| d.subscription_id).collect();
  assert_eq!(ids, vec![early.subscription_id, late.subscription_id]);
}

#[tokio::test]
async fn find_due_on_empty_store_is_empty() {
  let s = store().await;
  assert!(s.find_due(Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_row_does_not_hide_healthy_rows() {
  let s = store().await;
  let good = s.create(new_sub("5102414070", at(1_000))).await.unwrap();
  s.execute_raw(
    "INSERT INTO subscriptions (
       subscription_id, destination, timezone, weekday, nth_week,
       next_fire_at, created_at
     ) VALUES (
       'not-a-uuid', '4155550100', 'America/New_York', 0, 1,
       1500, '2017-04-06T04:00:00+00:00'
     );",
  )
  .await
  .unwrap();

  let due = s.find_due(at(2_000)).await.unwrap();
  assert_eq!(due, vec![good]);
}

#[tokio::test]
async fn unreadable_column_does_not_hide_healthy_rows() {
  let s = store().await;
  let good = s.create(new_sub("5102414070", at(1_000))).await.unwrap();
  // weekday far outside u8
  s.execute_raw(
    "INSERT INTO subscriptions (
       subscription_id, destination, timezone, weekday, nth_week,
       next_fire_at, created_at
     ) VALUES (
       '00000000-0000-4000-8000-000000000000', '4155550100', 'UTC', 9000, 1,
       1500, '2017-04-06T04:00:00+00:00'
     );",
  )
  .await
  .unwrap();

  assert_eq!(s.find_due(at(2_000)).await.unwrap(), vec![good]);
}

// ─── create_many ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_many_writes_every_row_in_order() {
  let s = store().await;
  let created = s
    .create_many(vec![
      new_sub("5102414070", at(1_000)),
      new_sub("5102414070", at(2_000)),
    ])
    .await
    .unwrap();

  assert_eq!(created.len(), 2);
  assert_eq!(created[0].next_fire_at, at(1_000));
  assert_eq!(s.find_due(at(2_000)).await.unwrap(), created);
}

#[tokio::test]
async fn create_many_failing_midway_writes_nothing() {
  let s = store().await;
  s.execute_raw(
    "CREATE TRIGGER refuse_blocked BEFORE INSERT ON subscriptions
     WHEN NEW.destination = '4155550100'
     BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
  )
  .await
  .unwrap();

  let result = s
    .create_many(vec![
      new_sub("5102414070", at(1_000)),
      new_sub("4155550100", at(1_000)),
    ])
    .await;

  assert!(matches!(result, Err(Error::Database(_))));
  assert!(s.find_due(at(10_000)).await.unwrap().is_empty());
}

// ─── update_next_fire ────────────────────────────────────────────────────────

#[tokio::test]
async fn update_moves_row_out_of_due_set() {
  let s = store().await;
  let sub = s.create(new_sub("5102414070", at(1_000))).await.unwrap();

  let next = at(1_000) + TimeDelta::days(30);
  s.update_next_fire(sub.subscription_id, next).await.unwrap();

  assert!(s.find_due(at(2_000)).await.unwrap().is_empty());
  let later = s.find_due(next).await.unwrap();
  assert_eq!(later.len(), 1);
  assert_eq!(later[0].next_fire_at, next);
  assert_eq!(later[0].created_at, sub.created_at);
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.update_next_fire(id, at(1_000)).await.unwrap_err();
  assert!(matches!(err, Error::SubscriptionNotFound(missing) if missing == id));
}

// ─── delete_by_destination ───────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_only_that_destination() {
  let s = store().await;
  s.create(new_sub("5102414070", at(1_000))).await.unwrap();
  s.create(new_sub("510-241-4070", at(2_000))).await.unwrap();
  let kept = s.create(new_sub("4155550100", at(1_500))).await.unwrap();

  let removed = s.delete_by_destination(&phone("5102414070")).await.unwrap();
  assert_eq!(removed, 2);

  let left = s.find_due(at(10_000)).await.unwrap();
  assert_eq!(left, vec![kept]);
}

#[tokio::test]
async fn delete_unknown_destination_removes_nothing() {
  let s = store().await;
  s.create(new_sub("5102414070", at(1_000))).await.unwrap();
  let removed = s.delete_by_destination(&phone("4155550100")).await.unwrap();
  assert_eq!(removed, 0);
  assert_eq!(s.find_due(at(1_000)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_after_delete_is_not_found() {
  let s = store().await;
  let sub = s.create(new_sub("5102414070", at(1_000))).await.unwrap();
  s.delete_by_destination(&sub.destination).await.unwrap();

  let err = s
    .update_next_fire(sub.subscription_id, at(5_000))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubscriptionNotFound(_)));
}

// ─── persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn rows_survive_reopening_the_file() {
  let path = std::env::temp_dir().join(format!("sweep-store-{}.db", Uuid::new_v4()));

  let created = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create(new_sub("5102414070", at(1_000))).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.find_due(at(1_000)).await.unwrap(), vec![created]);

  drop(s);
  for suffix in ["", "-wal", "-shm"] {
    let mut file = path.clone().into_os_string();
    file.push(suffix);
    let _ = std::fs::remove_file(file);
  }
}
