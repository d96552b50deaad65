//! The due-alert sweep: a periodic task that fires every reminder whose time
//! has come and schedules the next one.
//!
//! Ordering per subscription is *reschedule, then notify*. If the process
//! dies between the two steps the reminder is lost rather than repeated, and
//! a subscription whose reschedule could not be persisted is not messaged at
//! all, since it would otherwise be due again on every tick.
//!
//! Delivery is at-least-once only in the sense that a send which fails is
//! never retried early; the subscription simply waits for its next
//! occurrence.

use std::{sync::Arc, time::Duration};

use tokio::{
  sync::watch,
  time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

use crate::{
  clock::Clock,
  gateway::NotificationGateway,
  recurrence::RecurrenceCalculator,
  store::AlertStore,
  subscription::Subscription,
};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

pub const DEFAULT_REMINDER_BODY: &str = "Don't forget about street sweeping \
  tomorrow! (to stop getting these reminders, unsubscribe at /alerts/stop)";

/// The fixed text every reminder carries, and the number it comes from.
#[derive(Debug, Clone)]
pub struct ReminderMessage {
  pub sender: String,
  pub body:   String,
}

impl ReminderMessage {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into(), body: DEFAULT_REMINDER_BODY.to_owned() }
  }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  pub due:         usize,
  pub rescheduled: usize,
  pub sent:        usize,
  pub failed:      usize,
}

pub struct DueAlertSweeper<S, G, C> {
  store:      Arc<S>,
  gateway:    Arc<G>,
  clock:      Arc<C>,
  calculator: RecurrenceCalculator,
  message:    ReminderMessage,
  interval:   Duration,
}

impl<S, G, C> DueAlertSweeper<S, G, C>
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
    message: ReminderMessage,
  ) -> Self {
    Self {
      store,
      gateway,
      clock,
      calculator,
      message,
      interval: DEFAULT_SWEEP_INTERVAL,
    }
  }

  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Run one sweep over everything currently due.
  ///
  /// Only a failed due-query is returned as an error. Failures for a single
  /// subscription are logged, counted in the report, and do not stop the
  /// rest of the batch.
  pub async fn sweep_once(&self) -> Result<SweepReport, S::Error> {
    let due = self.store.find_due(self.clock.now()).await?;
    let mut report = SweepReport { due: due.len(), ..SweepReport::default() };

    for subscription in &due {
      self.fire(subscription, &mut report).await;
    }

    Ok(report)
  }

  async fn fire(&self, subscription: &Subscription, report: &mut SweepReport) {
    let id = subscription.subscription_id;

    let next_fire_at = match self
      .calculator
      .next_occurrence(&subscription.rule, self.clock.now())
    {
      Ok(next) => next,
      Err(e) => {
        error!(subscription_id = %id, error = %e, "cannot compute next reminder; skipping");
        report.failed += 1;
        return;
      }
    };

    if let Err(e) = self.store.update_next_fire(id, next_fire_at).await {
      error!(subscription_id = %id, error = %e, "reschedule failed; reminder not sent");
      report.failed += 1;
      return;
    }
    report.rescheduled += 1;

    match self
      .gateway
      .send(&self.message.sender, &subscription.destination, &self.message.body)
      .await
    {
      Ok(()) => {
        report.sent += 1;
        debug!(
          subscription_id = %id,
          destination = %subscription.destination.masked(),
          %next_fire_at,
          "reminder sent"
        );
      }
      Err(e) => {
        report.failed += 1;
        warn!(
          subscription_id = %id,
          error = %e,
          %next_fire_at,
          "reminder send failed; next attempt at the next occurrence"
        );
      }
    }
  }

  /// Sweep on a fixed interval until `shutdown` carries `true` or its sender
  /// is dropped.
  ///
  /// Ticks never overlap: a sweep runs to completion before the timer is
  /// looked at again, and a late timer is delayed rather than fired twice.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    info!(interval_secs = self.interval.as_secs_f64(), "due-alert sweeper started");

    let mut ticker = interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          match self.sweep_once().await {
            Ok(report) if report.due > 0 => info!(
              due = report.due,
              rescheduled = report.rescheduled,
              sent = report.sent,
              failed = report.failed,
              "sweep complete"
            ),
            Ok(_) => {}
            Err(e) => error!(error = %e, "due-alert query failed; retrying next tick"),
          }
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            info!("due-alert sweeper shutting down");
            break;
          }
        }
      }
    }
  }
}
