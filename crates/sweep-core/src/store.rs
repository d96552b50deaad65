//! The `AlertStore` trait.
//!
//! Implemented by storage backends (e.g. `sweep-store-sqlite`). The service
//! and the sweeper depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::subscription::{Destination, NewSubscription, Subscription};

/// Persistence for reminder subscriptions.
///
/// Every mutation is a single row-level statement, so the sweeper and the
/// request handlers may call into the same store concurrently without any
/// application-level locking.
pub trait AlertStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new subscription. The id and `created_at` are assigned here.
  fn create(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Persist several subscriptions at once: either every row is written or
  /// none is. Returned in input order.
  fn create_many(
    &self,
    inputs: Vec<NewSubscription>,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// All subscriptions whose `next_fire_at` is at or before `now`, oldest
  /// first. Rows that cannot be decoded are logged and left out.
  fn find_due(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  /// Overwrite the next reminder instant of one subscription.
  ///
  /// Fails if the subscription no longer exists (e.g. it was cancelled while
  /// a sweep was in flight).
  fn update_next_fire(
    &self,
    id: Uuid,
    next_fire_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every subscription for `destination`, returning how many went.
  fn delete_by_destination<'a>(
    &'a self,
    destination: &'a Destination,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
