//! Email/SMS delivery for order lifecycle events
//!
//! Provides a trait for sending stored notifications, with:
//! - A log-only dispatcher used by the server (no external gateway)
//! - A recording dispatcher for tests
//!
//! Delivery is best effort. Nothing here can fail an order request.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fleetctl_core::config::NotificationSection;
use fleetctl_core::models::Channel;
use fleetctl_core::notify::{compose, OrderContext, OrderEvent, Recipient};
use sqlx::SqlitePool;

use crate::db::repos::users;
use crate::db::{DbError, Notification, NotificationRepo, Order};

/// Error during delivery
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{channel} gateway rejected message to {recipient}: {reason}")]
    Rejected {
        channel: Channel,
        recipient: String,
        reason: String,
    },
}

/// Sends one stored notification (testable)
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Writes each message to the log instead of a real gateway
#[derive(Debug, Clone)]
pub struct LogDispatcher {
    email_from: String,
    sms_from: String,
}

impl LogDispatcher {
    pub fn new(settings: &NotificationSection) -> Self {
        Self {
            email_from: settings.email_from.clone(),
            sms_from: settings.sms_from.clone(),
        }
    }
}

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn send(&self, n: &Notification) -> Result<(), DispatchError> {
        let from = match n.channel {
            Channel::Email => &self.email_from,
            Channel::Sms => &self.sms_from,
        };
        tracing::info!(
            channel = %n.channel,
            from = %from,
            to = %n.recipient,
            subject = %n.subject,
            notification_id = %n.id,
            "notification sent"
        );
        Ok(())
    }
}

/// Keeps every sent notification in memory
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, n: &Notification) -> Result<(), DispatchError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(n.clone());
        }
        Ok(())
    }
}

/// Turns order events into stored and dispatched notifications
#[derive(Clone)]
pub struct Notifier {
    dispatcher: Arc<dyn Dispatcher>,
    enabled: bool,
}

impl Notifier {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, enabled: bool) -> Self {
        Self { dispatcher, enabled }
    }

    /// Notifier that never sends anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(RecordingDispatcher::new()), false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Notify the order's client. Must run after the order change committed.
    ///
    /// Failures are logged and swallowed; returns what was stored.
    pub async fn order_event(
        &self,
        pool: &SqlitePool,
        order: &Order,
        event: OrderEvent,
    ) -> Vec<Notification> {
        if !self.enabled {
            return Vec::new();
        }

        let stored = match self.store(pool, order, event).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "failed to store notifications");
                return Vec::new();
            }
        };

        for n in &stored {
            if let Err(e) = self.dispatcher.send(n).await {
                tracing::warn!(notification_id = %n.id, error = %e, "notification dispatch failed");
            }
        }

        stored
    }

    async fn store(
        &self,
        pool: &SqlitePool,
        order: &Order,
        event: OrderEvent,
    ) -> Result<Vec<Notification>, DbError> {
        let client = {
            let mut conn = pool.acquire().await?;
            users::fetch(&mut *conn, order.client_id).await?
        };

        let drafts = compose(
            event,
            OrderContext {
                order_id: order.id,
                delivery_address: &order.delivery_address,
                rejection_reason: order.rejection_reason.as_deref(),
            },
            Recipient {
                user_id: client.id,
                name: &client.name,
                email: &client.email,
                phone: client.phone.as_deref(),
            },
        );

        NotificationRepo::new(pool).insert_all(drafts).await
    }
}
