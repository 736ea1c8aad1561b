//! Persisted record shapes for the orders, tracking, and routes tables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const ORDER_STATUS_PENDING: &str = "PENDING";
pub const TRACKING_UPDATED_BY: &str = "system";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl ProductLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub created_at: String,
    pub customer_id: String,
    #[serde(default)]
    pub products: Vec<ProductLine>,
    #[serde(default)]
    pub delivery_address: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub ttl: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEvent {
    pub tracking_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    pub expiry: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Planned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRecord {
    pub route_id: String,
    pub driver_id: String,
    pub created_at: String,
    pub order_ids: Vec<String>,
    pub stops: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_distance_km: Decimal,
    pub status: RouteStatus,
}
