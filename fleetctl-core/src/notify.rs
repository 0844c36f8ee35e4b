//! Notification templates for order lifecycle events
//!
//! Composition is pure: the server decides whether notifications are
//! enabled, persists the drafts and hands them to a dispatcher.

use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::Transition;
use crate::models::{Channel, OrderStatus};

/// Something that happened to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    StatusChanged(Transition),
}

impl OrderEvent {
    /// Status the order is in after the event.
    pub fn status(&self) -> OrderStatus {
        match self {
            Self::Created => OrderStatus::Pending,
            Self::StatusChanged(t) => t.to,
        }
    }
}

/// Order fields the templates need
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    pub order_id: Uuid,
    pub delivery_address: &'a str,
    pub rejection_reason: Option<&'a str>,
}

/// Who gets told
#[derive(Debug, Clone, Copy)]
pub struct Recipient<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
}

/// Notification ready to be stored and dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

/// First eight hex digits of an id, as shown to customers.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_owned()
}

/// Build one email draft and, when the recipient has a phone, one SMS draft.
pub fn compose(event: OrderEvent, order: OrderContext<'_>, to: Recipient<'_>) -> Vec<Draft> {
    let status = event.status();
    let subject = format!("Order {}: {}", short_id(order.order_id), status.label());
    let body = body_for(status, order);

    let mut drafts = Vec::with_capacity(2);
    drafts.push(Draft {
        user_id: to.user_id,
        order_id: Some(order.order_id),
        channel: Channel::Email,
        recipient: to.email.to_owned(),
        subject: subject.clone(),
        message: format!("Hello {},\n\n{}", to.name, body),
    });

    if let Some(phone) = to.phone {
        drafts.push(Draft {
            user_id: to.user_id,
            order_id: Some(order.order_id),
            channel: Channel::Sms,
            recipient: phone.to_owned(),
            subject,
            message: body,
        });
    }

    drafts
}

fn body_for(status: OrderStatus, order: OrderContext<'_>) -> String {
    let id = short_id(order.order_id);
    let address = order.delivery_address;
    match status {
        OrderStatus::Pending => {
            format!("Your order {id} to {address} has been placed and is awaiting confirmation.")
        }
        OrderStatus::Received => {
            format!("Your order {id} to {address} has been received and is being prepared.")
        }
        OrderStatus::InTransit => {
            format!("Your order {id} is on its way to {address}. Track it live from your dashboard.")
        }
        OrderStatus::Delivered => format!("Your order {id} has been delivered to {address}."),
        OrderStatus::Rejected => match order.rejection_reason {
            Some(reason) => format!("Your order {id} to {address} was rejected: {reason}"),
            None => format!("Your order {id} to {address} was rejected."),
        },
    }
}
