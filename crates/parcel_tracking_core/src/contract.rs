use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{OrderRecord, ProductLine, TrackingEvent};

pub const LIST_ORDERS_LIMIT: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn required_text(value: Option<String>, message: &str) -> Result<String, ValidationError> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ValidationError::new(message)),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

// ── orders ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProductRequest {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductRequest>,
    #[serde(default)]
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: String,
    pub products: Vec<ProductLine>,
    pub delivery_address: String,
    pub total: Decimal,
}

pub fn normalize_create_order(payload: CreateOrderRequest) -> Result<NewOrder, ValidationError> {
    let customer_id = required_text(payload.customer_id, "customer_id is required")?;

    if payload.products.is_empty() {
        return Err(ValidationError::new(
            "products is required and must contain at least one product",
        ));
    }

    let mut products = Vec::with_capacity(payload.products.len());
    for (index, product) in payload.products.into_iter().enumerate() {
        let quantity = product.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(ValidationError::new(format!(
                "products[{index}].quantity must be a positive integer"
            )));
        }
        let Some(price) = product.price else {
            return Err(ValidationError::new(format!(
                "products[{index}].price is required"
            )));
        };
        if price < Decimal::ZERO {
            return Err(ValidationError::new(format!(
                "products[{index}].price cannot be negative"
            )));
        }
        products.push(ProductLine {
            sku: optional_text(product.sku),
            name: optional_text(product.name),
            quantity,
            price,
        });
    }

    let total = order_total(&products);
    Ok(NewOrder {
        customer_id,
        products,
        delivery_address: payload.delivery_address.unwrap_or_default().trim().to_string(),
        total,
    })
}

pub fn order_total(products: &[ProductLine]) -> Decimal {
    products.iter().map(ProductLine::line_total).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order_id: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderListResponse {
    pub orders: Vec<OrderRecord>,
    pub count: usize,
}

// ── tracking ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UpdateTrackingRequest {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingUpdate {
    pub order_id: Option<String>,
    pub tracking_id: Option<String>,
    pub status: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub estimated_delivery: Option<String>,
    pub order_created_at: Option<String>,
    pub notify: bool,
}

pub fn normalize_tracking_update(
    payload: UpdateTrackingRequest,
) -> Result<TrackingUpdate, ValidationError> {
    let order_id = optional_text(payload.order_id);
    let tracking_id = optional_text(payload.tracking_id);
    if order_id.is_none() && tracking_id.is_none() {
        return Err(ValidationError::new("order_id or tracking_id is required"));
    }

    let status = required_text(payload.status, "status is required")?;

    if let Some(latitude) = payload.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::new("latitude must be between -90 and 90"));
        }
    }
    if let Some(longitude) = payload.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::new(
                "longitude must be between -180 and 180",
            ));
        }
    }

    Ok(TrackingUpdate {
        order_id,
        tracking_id,
        status,
        location: payload.location.unwrap_or_default().trim().to_string(),
        latitude: payload.latitude,
        longitude: payload.longitude,
        notes: optional_text(payload.notes),
        estimated_delivery: optional_text(payload.estimated_delivery),
        order_created_at: optional_text(payload.created_at),
        notify: payload.notify,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingLookup {
    Order(String),
    Tracking(String),
}

/// `order_id` wins when both query parameters are present.
pub fn tracking_lookup(
    query: &BTreeMap<String, String>,
) -> Result<TrackingLookup, ValidationError> {
    let read = |name: &str| {
        query
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(order_id) = read("order_id") {
        return Ok(TrackingLookup::Order(order_id));
    }
    if let Some(tracking_id) = read("tracking_id") {
        return Ok(TrackingLookup::Tracking(tracking_id));
    }
    Err(ValidationError::new(
        "order_id or tracking_id query parameter is required",
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingHistoryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    pub events: Vec<TrackingEvent>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingUpdatedResponse {
    pub message: String,
    pub tracking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub status: String,
    pub location: String,
    pub timestamp: String,
}

// ── routes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OptimizeRouteRequest {
    #[serde(default)]
    pub order_ids: Vec<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub order_ids: Vec<String>,
    pub driver_id: String,
}

/// Trims ids, drops blanks, and keeps the first occurrence of duplicates.
pub fn normalize_route_request(
    payload: OptimizeRouteRequest,
) -> Result<RouteRequest, ValidationError> {
    let mut seen = HashSet::new();
    let order_ids: Vec<String> = payload
        .order_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let driver_id = optional_text(payload.driver_id);
    match (order_ids.is_empty(), driver_id) {
        (false, Some(driver_id)) => Ok(RouteRequest {
            order_ids,
            driver_id,
        }),
        _ => Err(ValidationError::new("order_ids and driver_id are required")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteOptimizedResponse {
    pub message: String,
    pub route_id: String,
    pub stops: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_distance_km: Decimal,
    pub order_sequence: Vec<String>,
}
