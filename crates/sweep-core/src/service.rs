//! Subscribe and unsubscribe flows.
//!
//! Both flows are gated on a one-time code from the [`NotificationGateway`];
//! nothing touches the store until the provider has approved the code.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
  clock::Clock,
  gateway::{Channel, NotificationGateway},
  recurrence::RecurrenceCalculator,
  store::AlertStore,
  subscription::{Destination, NewSubscription, OccurrenceRule, Subscription},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ServiceError {
  /// The provider refused the destination or the code.
  #[error("verification rejected")]
  VerificationRejected,

  #[error("at least one occurrence rule is required")]
  NoRules,

  #[error(transparent)]
  Rule(#[from] crate::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("gateway error: {0}")]
  Gateway(#[source] BoxError),
}

pub struct SubscriptionService<S, G, C> {
  store:      Arc<S>,
  gateway:    Arc<G>,
  clock:      Arc<C>,
  calculator: RecurrenceCalculator,
}

impl<S, G, C> SubscriptionService<S, G, C>
where
  S: AlertStore,
  G: NotificationGateway,
  C: Clock,
{
  pub fn new(
    store: Arc<S>,
    gateway: Arc<G>,
    clock: Arc<C>,
    calculator: RecurrenceCalculator,
  ) -> Self {
    Self { store, gateway, clock, calculator }
  }

  /// Ask the provider to send a code to `destination`.
  pub async fn start_verification(
    &self,
    destination: &Destination,
    channel: Channel,
  ) -> Result<(), ServiceError> {
    let accepted = self
      .gateway
      .request_code(destination, channel)
      .await
      .map_err(|e| ServiceError::Gateway(Box::new(e)))?;

    if !accepted {
      warn!(destination = %destination.masked(), "provider refused to send a code");
      return Err(ServiceError::VerificationRejected);
    }

    info!(
      destination = %destination.masked(),
      channel = channel.as_str(),
      "verification code requested"
    );
    Ok(())
  }

  /// Check `code`, then persist one subscription per rule with its first
  /// reminder already scheduled.
  ///
  /// Rules are validated before the provider is asked, so a malformed
  /// request never burns the subscriber's code.
  pub async fn complete_subscription(
    &self,
    destination: &Destination,
    code: &str,
    rules: Vec<OccurrenceRule>,
  ) -> Result<Vec<Subscription>, ServiceError> {
    if rules.is_empty() {
      return Err(ServiceError::NoRules);
    }
    for rule in &rules {
      rule.validate()?;
    }

    self.verify(destination, code).await?;

    let now = self.clock.now();
    let inputs = rules
      .into_iter()
      .map(|rule| {
        let next_fire_at = self.calculator.next_occurrence(&rule, now)?;
        Ok(NewSubscription { destination: destination.clone(), rule, next_fire_at })
      })
      .collect::<crate::Result<Vec<_>>>()?;

    // All rows or none: a retry after a failure must not duplicate reminders.
    let created = self
      .store
      .create_many(inputs)
      .await
      .map_err(|e| ServiceError::Store(Box::new(e)))?;

    for subscription in &created {
      info!(
        subscription_id = %subscription.subscription_id,
        destination = %destination.masked(),
        next_fire_at = %subscription.next_fire_at,
        "subscription created"
      );
    }

    Ok(created)
  }

  /// Check `code`, then delete every subscription for `destination`.
  pub async fn cancel_subscription(
    &self,
    destination: &Destination,
    code: &str,
  ) -> Result<usize, ServiceError> {
    self.verify(destination, code).await?;

    let removed = self
      .store
      .delete_by_destination(destination)
      .await
      .map_err(|e| ServiceError::Store(Box::new(e)))?;

    info!(destination = %destination.masked(), removed, "subscriptions cancelled");
    Ok(removed)
  }

  async fn verify(
    &self,
    destination: &Destination,
    code: &str,
  ) -> Result<(), ServiceError> {
    let approved = self
      .gateway
      .verify_code(destination, code)
      .await
      .map_err(|e| ServiceError::Gateway(Box::new(e)))?;

    if !approved {
      warn!(destination = %destination.masked(), "verification code rejected");
      return Err(ServiceError::VerificationRejected);
    }
    Ok(())
  }
}
