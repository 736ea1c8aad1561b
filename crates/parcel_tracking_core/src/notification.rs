//! Notification messages exchanged over the queue and the text rendered from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationMessage {
    OrderCreated {
        #[serde(default)]
        order_id: String,
        #[serde(default)]
        customer_id: String,
        #[serde(default, with = "rust_decimal::serde::float")]
        total: Decimal,
    },
    TrackingUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tracking_id: Option<String>,
        #[serde(default = "unknown_status")]
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl NotificationMessage {
    /// Decodes a queue body. Only text that is not JSON is an error: missing
    /// fields take defaults and anything else that does not fit a known
    /// message decodes as [`Self::Unknown`].
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        if value.get("type").and_then(Value::as_str).is_none() {
            return Ok(Self::Unknown);
        }
        Ok(serde_json::from_value(value).unwrap_or(Self::Unknown))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "ORDER_CREATED",
            Self::TrackingUpdate { .. } => "TRACKING_UPDATE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

fn unknown_status() -> String {
    "UNKNOWN".to_string()
}

/// Text of a simulated delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

pub fn render(message: &NotificationMessage) -> Option<RenderedNotification> {
    match message {
        NotificationMessage::OrderCreated {
            order_id,
            customer_id,
            total,
        } => Some(RenderedNotification {
            recipient: customer_id.clone(),
            subject: format!("Order {order_id} confirmed"),
            body: format!("Order: {order_id}\nTotal: ${:.2}", total.round_dp(2)),
        }),
        NotificationMessage::TrackingUpdate {
            order_id,
            tracking_id,
            status,
            location,
        } => {
            let reference = order_id
                .as_deref()
                .or(tracking_id.as_deref())
                .unwrap_or("UNKNOWN");
            Some(RenderedNotification {
                recipient: reference.to_string(),
                subject: format!("Shipment {reference}: {status}"),
                body: format!(
                    "Order: {reference}\nStatus: {status}\nLocation: {}",
                    location.as_deref().unwrap_or("No location")
                ),
            })
        }
        NotificationMessage::Unknown => None,
    }
}

pub fn tracking_subject(tracking_id: &str, status: &str) -> String {
    format!("Tracking {tracking_id} - {status}")
}

pub fn tracking_message(
    tracking_id: &str,
    status: &str,
    location: &str,
    at: DateTime<Utc>,
) -> String {
    format!(
        "Tracking update\n\nTracking ID: {tracking_id}\nStatus: {status}\n\
         Location: {location}\nDate/Time: {}\n\n\
         This is an automated message from the parcel tracking system.",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}
