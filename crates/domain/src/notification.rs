//! Notification sink trait and test implementations.
//!
//! On meaningful transitions the executor emits a fire-and-forget payload
//! toward the notification collaborator. Delivery failures are logged and
//! never roll back or block the state transition itself.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use common::OrderId;

use crate::order::OrderStatus;

/// Event payload handed to the notification collaborator.
#[derive(Debug, Clone)]
pub struct OrderNotification {
    /// The order the event concerns.
    pub order_id: OrderId,

    /// Human-facing order number.
    pub order_number: String,

    /// The status the order just entered.
    pub status: OrderStatus,

    /// Customer contact for the delivery channel.
    pub customer_email: String,
}

/// Error reported by a notification sink.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Trait for the notification/email collaborator.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notification. The caller ignores failures beyond logging.
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotificationError>;
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl NotificationSink for NoopNotifier {
    async fn notify(&self, _notification: OrderNotification) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<OrderNotification>,
    fail_on_notify: bool,
}

/// In-memory sink for tests: records every payload and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every delivery.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the notifications delivered so far.
    pub fn sent(&self) -> Vec<OrderNotification> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of notifications delivered so far.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotificationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_notify {
            return Err(NotificationError("sink unavailable".to_string()));
        }
        state.sent.push(notification);
        Ok(())
    }
}
