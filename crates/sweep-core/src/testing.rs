//! In-memory store and recording gateway with failure injection, shared by
//! the service and sweeper tests.

use std::{
  collections::HashSet,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  gateway::{Channel, NotificationGateway},
  store::AlertStore,
  subscription::{Destination, NewSubscription, Subscription},
};

pub const GOOD_CODE: &str = "123456";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub &'static str);

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
  rows:           Mutex<Vec<Subscription>>,
  fail_find_due:  AtomicBool,
  fail_create:    AtomicBool,
  fail_create_at: Mutex<Option<usize>>,
  fail_update:    Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
  pub fn all(&self) -> Vec<Subscription> { self.rows.lock().unwrap().clone() }

  pub fn get(&self, id: Uuid) -> Option<Subscription> {
    self.all().into_iter().find(|s| s.subscription_id == id)
  }

  /// Insert a row directly, bypassing `create`.
  pub fn insert(&self, subscription: Subscription) {
    self.rows.lock().unwrap().push(subscription);
  }

  pub fn fail_find_due(&self, fail: bool) {
    self.fail_find_due.store(fail, Ordering::SeqCst);
  }

  pub fn fail_create(&self, fail: bool) {
    self.fail_create.store(fail, Ordering::SeqCst);
  }

  /// Make `create_many` fail on the input at `index`.
  pub fn fail_create_at(&self, index: usize) {
    *self.fail_create_at.lock().unwrap() = Some(index);
  }

  pub fn fail_update_for(&self, id: Uuid) {
    self.fail_update.lock().unwrap().insert(id);
  }
}

impl AlertStore for MemoryStore {
  type Error = FakeError;

  async fn create(&self, input: NewSubscription) -> Result<Subscription, FakeError> {
    if self.fail_create.load(Ordering::SeqCst) {
      return Err(FakeError("create failed"));
    }
    let subscription = assign(input);
    self.insert(subscription.clone());
    Ok(subscription)
  }

  async fn create_many(
    &self,
    inputs: Vec<NewSubscription>,
  ) -> Result<Vec<Subscription>, FakeError> {
    if self.fail_create.load(Ordering::SeqCst) {
      return Err(FakeError("create failed"));
    }
    let fail_at = *self.fail_create_at.lock().unwrap();
    let mut batch = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
      if fail_at == Some(index) {
        return Err(FakeError("create failed mid-batch"));
      }
      batch.push(assign(input));
    }
    self.rows.lock().unwrap().extend(batch.iter().cloned());
    Ok(batch)
  }

  async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, FakeError> {
    if self.fail_find_due.load(Ordering::SeqCst) {
      return Err(FakeError("find_due failed"));
    }
    let mut due: Vec<_> =
      self.all().into_iter().filter(|s| s.next_fire_at <= now).collect();
    due.sort_by_key(|s| s.next_fire_at);
    Ok(due)
  }

  async fn update_next_fire(
    &self,
    id: Uuid,
    next_fire_at: DateTime<Utc>,
  ) -> Result<(), FakeError> {
    if self.fail_update.lock().unwrap().contains(&id) {
      return Err(FakeError("update failed"));
    }
    let mut rows = self.rows.lock().unwrap();
    let row = rows
      .iter_mut()
      .find(|s| s.subscription_id == id)
      .ok_or(FakeError("no such subscription"))?;
    row.next_fire_at = next_fire_at;
    Ok(())
  }

  async fn delete_by_destination(
    &self,
    destination: &Destination,
  ) -> Result<usize, FakeError> {
    let mut rows = self.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|s| &s.destination != destination);
    Ok(before - rows.len())
  }
}

fn assign(input: NewSubscription) -> Subscription {
  Subscription {
    subscription_id: Uuid::new_v4(),
    destination:     input.destination,
    rule:            input.rule,
    next_fire_at:    input.next_fire_at,
    created_at:      Utc::now(),
  }
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
  pub from: String,
  pub to:   String,
  pub body: String,
}

/// Accepts [`GOOD_CODE`] for every destination and records every send.
#[derive(Default)]
pub struct RecordingGateway {
  sent:            Mutex<Vec<SentMessage>>,
  requested:       Mutex<Vec<(String, Channel)>>,
  refuse_requests: AtomicBool,
  provider_down:   AtomicBool,
  fail_send_to:    Mutex<HashSet<String>>,
}

impl RecordingGateway {
  pub fn sent(&self) -> Vec<SentMessage> { self.sent.lock().unwrap().clone() }

  pub fn requested(&self) -> Vec<(String, Channel)> {
    self.requested.lock().unwrap().clone()
  }

  pub fn refuse_requests(&self, refuse: bool) {
    self.refuse_requests.store(refuse, Ordering::SeqCst);
  }

  pub fn provider_down(&self, down: bool) {
    self.provider_down.store(down, Ordering::SeqCst);
  }

  pub fn fail_send_to(&self, destination: &Destination) {
    self
      .fail_send_to
      .lock()
      .unwrap()
      .insert(destination.as_str().to_owned());
  }

  fn check_up(&self) -> Result<(), FakeError> {
    if self.provider_down.load(Ordering::SeqCst) {
      return Err(FakeError("provider unreachable"));
    }
    Ok(())
  }
}

impl NotificationGateway for RecordingGateway {
  type Error = FakeError;

  async fn request_code(
    &self,
    destination: &Destination,
    channel: Channel,
  ) -> Result<bool, FakeError> {
    self.check_up()?;
    self
      .requested
      .lock()
      .unwrap()
      .push((destination.as_str().to_owned(), channel));
    Ok(!self.refuse_requests.load(Ordering::SeqCst))
  }

  async fn verify_code(
    &self,
    _destination: &Destination,
    code: &str,
  ) -> Result<bool, FakeError> {
    self.check_up()?;
    Ok(code == GOOD_CODE)
  }

  async fn send(
    &self,
    from: &str,
    to: &Destination,
    body: &str,
  ) -> Result<(), FakeError> {
    if self.fail_send_to.lock().unwrap().contains(to.as_str()) {
      return Err(FakeError("send failed"));
    }
    self.sent.lock().unwrap().push(SentMessage {
      from: from.to_owned(),
      to:   to.as_str().to_owned(),
      body: body.to_owned(),
    });
    Ok(())
  }
}
