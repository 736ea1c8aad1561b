use parcel_tracking_core::contract::{
    normalize_tracking_update, tracking_lookup, TrackingHistoryResponse, TrackingLookup,
    TrackingUpdate, TrackingUpdatedResponse, UpdateTrackingRequest,
};
use parcel_tracking_core::notification::{tracking_message, tracking_subject, NotificationMessage};
use parcel_tracking_core::records::{TrackingEvent, TRACKING_UPDATED_BY};
use parcel_tracking_core::storage_keys::{
    expiry_epoch_seconds, new_record_id, order_key, record_timestamp, RecordKind, ORDER_INDEX,
};
use serde_json::{json, Value};

use crate::adapters::queue::NotificationQueue;
use crate::adapters::store::{decode_items, to_item, KeyQuery, KeyValueStore};
use crate::adapters::topic::NotificationTopic;
use crate::error::{DependencyError, HandlerError};
use crate::handlers::envelope::{
    into_response, parse_api_request, success_response, ApiGatewayResponse, ApiRequest,
};
use crate::handlers::orders::enqueue_notification;
use crate::handlers::InvocationContext;

const ALLOWED_METHODS: &[&str] = &["GET", "PUT", "POST"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingHandlerConfig {
    pub tracking_table: String,
    /// Order status is only mirrored when the orders table is known.
    pub orders_table: Option<String>,
    pub service: String,
}

/// External collaborators of the tracking handler.
pub struct TrackingPorts<'a> {
    pub store: &'a dyn KeyValueStore,
    pub queue: &'a dyn NotificationQueue,
    pub topic: &'a dyn NotificationTopic,
}

pub fn handle_tracking_event(
    event: Value,
    config: &TrackingHandlerConfig,
    context: &InvocationContext,
    ports: &TrackingPorts<'_>,
) -> ApiGatewayResponse {
    let outcome = parse_api_request(event).and_then(|request| {
        if request.is_health_check() {
            return Ok(health_check(config, context, ports.store));
        }
        match request.method_or("GET").as_str() {
            "GET" => tracking_history(&request, config, context, ports.store),
            method @ ("PUT" | "POST") => {
                let status_code = if method == "POST" { 201 } else { 200 };
                update_tracking(&request, status_code, config, context, ports)
            }
            other => Err(HandlerError::MethodNotSupported {
                method: other.to_string(),
                allowed: ALLOWED_METHODS,
            }),
        }
    });
    into_response("tracking", outcome, context)
}

fn tracking_history(
    request: &ApiRequest,
    config: &TrackingHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
) -> Result<ApiGatewayResponse, HandlerError> {
    let lookup = tracking_lookup(&request.query)?;
    let query = match &lookup {
        TrackingLookup::Order(order_id) => KeyQuery::partition("order_id", order_id.as_str())
            .on_index(ORDER_INDEX)
            .newest_first(),
        TrackingLookup::Tracking(tracking_id) => {
            KeyQuery::partition("tracking_id", tracking_id.as_str()).newest_first()
        }
    };

    let items = store.query(&config.tracking_table, &query)?;
    let events: Vec<TrackingEvent> = decode_items(&config.tracking_table, items);

    let response = match lookup {
        TrackingLookup::Order(order_id) => TrackingHistoryResponse {
            order_id: Some(order_id),
            tracking_id: None,
            count: events.len(),
            events,
        },
        TrackingLookup::Tracking(tracking_id) => {
            if events.is_empty() {
                return Err(HandlerError::NotFound(format!(
                    "Tracking {tracking_id} not found"
                )));
            }
            TrackingHistoryResponse {
                order_id: None,
                tracking_id: Some(tracking_id),
                count: events.len(),
                events,
            }
        }
    };

    tracing::info!(count = response.count, "tracking history served");
    Ok(success_response(200, response, context))
}

fn update_tracking(
    request: &ApiRequest,
    status_code: u16,
    config: &TrackingHandlerConfig,
    context: &InvocationContext,
    ports: &TrackingPorts<'_>,
) -> Result<ApiGatewayResponse, HandlerError> {
    let payload: UpdateTrackingRequest = request.parse_body()?;
    let update = normalize_tracking_update(payload)?;

    let event = TrackingEvent {
        tracking_id: update
            .tracking_id
            .clone()
            .unwrap_or_else(|| new_record_id(RecordKind::Tracking)),
        timestamp: record_timestamp(context.now),
        order_id: update.order_id.clone(),
        status: update.status.clone(),
        location: update.location.clone(),
        latitude: update.latitude,
        longitude: update.longitude,
        notes: update.notes.clone(),
        estimated_delivery: update.estimated_delivery.clone(),
        expiry: expiry_epoch_seconds(context.now),
        environment: Some(context.environment.clone()),
        updated_by: Some(TRACKING_UPDATED_BY.to_string()),
    };

    ports
        .store
        .put_item(&config.tracking_table, to_item(&event)?)?;
    tracing::info!(
        tracking_id = %event.tracking_id,
        order_id = ?event.order_id,
        status = %event.status,
        "tracking event recorded"
    );

    // Everything past the tracking write is best-effort.
    if let (Some(orders_table), Some(order_id)) = (&config.orders_table, &update.order_id) {
        if let Err(error) = mirror_order_status(ports.store, orders_table, order_id, &update) {
            tracing::warn!(order_id = %order_id, error = %error, "order status not updated");
        }
    }

    let message = NotificationMessage::TrackingUpdate {
        order_id: event.order_id.clone(),
        tracking_id: Some(event.tracking_id.clone()),
        status: event.status.clone(),
        location: Some(event.location.clone()).filter(|location| !location.is_empty()),
    };
    if let Err(error) = enqueue_notification(ports.queue, &message) {
        tracing::warn!(
            tracking_id = %event.tracking_id,
            error = %error,
            "tracking notification not queued"
        );
    }

    if update.notify {
        let subject = tracking_subject(&event.tracking_id, &event.status);
        let body =
            tracking_message(&event.tracking_id, &event.status, &event.location, context.now);
        if let Err(error) = ports.topic.publish(&subject, &body) {
            tracing::warn!(
                tracking_id = %event.tracking_id,
                error = %error,
                "tracking update not published"
            );
        }
    }

    Ok(success_response(
        status_code,
        TrackingUpdatedResponse {
            message: "Tracking updated successfully".to_string(),
            tracking_id: event.tracking_id,
            order_id: event.order_id,
            status: event.status,
            location: event.location,
            timestamp: event.timestamp,
        },
        context,
    ))
}

fn mirror_order_status(
    store: &dyn KeyValueStore,
    orders_table: &str,
    order_id: &str,
    update: &TrackingUpdate,
) -> Result<(), DependencyError> {
    let created_at = match &update.order_created_at {
        Some(created_at) => created_at.clone(),
        None => {
            let query = KeyQuery::partition("order_id", order_id).limit(1);
            let found = store.query(orders_table, &query)?;
            let created_at = found
                .first()
                .and_then(|item| item.get("created_at"))
                .and_then(Value::as_str);
            match created_at {
                Some(created_at) => created_at.to_string(),
                None => {
                    tracing::warn!(order_id = %order_id, "order not found for status update");
                    return Ok(());
                }
            }
        }
    };

    let updated = store.update_attribute(
        orders_table,
        order_key(order_id, &created_at),
        "status",
        Value::String(update.status.clone()),
    )?;
    if !updated {
        tracing::warn!(
            order_id = %order_id,
            created_at = %created_at,
            "no order matches the key, status not updated"
        );
    }
    Ok(())
}

fn health_check(
    config: &TrackingHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
) -> ApiGatewayResponse {
    let timestamp = record_timestamp(context.now);
    match store.table_status(&config.tracking_table) {
        Ok(table_status) => success_response(
            200,
            json!({
                "status": "healthy",
                "service": config.service,
                "environment": context.environment,
                "timestamp": timestamp,
                "dynamodb": "connected",
                "table_status": table_status,
            }),
            context,
        ),
        Err(error) => {
            tracing::error!(error = %error, "health check failed");
            let detail = if context.include_error_detail() {
                error.to_string()
            } else {
                "Dependency unavailable".to_string()
            };
            success_response(
                503,
                json!({
                    "status": "unhealthy",
                    "service": config.service,
                    "environment": context.environment,
                    "timestamp": timestamp,
                    "error": detail,
                }),
                context,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::adapters::memory::{InMemoryStore, StoreOperation};
    use crate::adapters::queue::UnconfiguredQueue;
    use crate::adapters::topic::UnconfiguredTopic;

    fn context() -> InvocationContext {
        InvocationContext::new("test", Utc.with_ymd_and_hms(2026, 2, 14, 12, 0, 0).unwrap())
    }

    fn config() -> TrackingHandlerConfig {
        TrackingHandlerConfig {
            tracking_table: "tracking".to_string(),
            orders_table: Some("orders".to_string()),
            service: "parcel-tracking".to_string(),
        }
    }

    #[test]
    fn update_mirrors_status_onto_order() {
        let store = InMemoryStore::new();
        store.insert(
            "orders",
            json!({
                "order_id": "ORD-1",
                "created_at": "2026-02-14T10:00:00.000Z",
                "status": "PENDING"
            }),
        );
        let ports = TrackingPorts {
            store: &store,
            queue: &UnconfiguredQueue,
            topic: &UnconfiguredTopic,
        };

        let response = handle_tracking_event(
            json!({
                "httpMethod": "PUT",
                "body": {"order_id": "ORD-1", "status": "IN_TRANSIT", "location": "Lisbon"}
            }),
            &config(),
            &context(),
            &ports,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(store.items("orders")[0]["status"], json!("IN_TRANSIT"));
        let events = store.items("tracking");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["updated_by"], json!("system"));
        assert!(events[0]["tracking_id"]
            .as_str()
            .is_some_and(|id| id.starts_with("TRK-")));
    }

    #[test]
    fn update_for_unknown_order_creates_no_order() {
        let store = InMemoryStore::new();
        let ports = TrackingPorts {
            store: &store,
            queue: &UnconfiguredQueue,
            topic: &UnconfiguredTopic,
        };

        let response = handle_tracking_event(
            json!({
                "httpMethod": "PUT",
                "body": {"order_id": "ORD-NOPE", "created_at": "2020-01-01", "status": "IN_TRANSIT"}
            }),
            &config(),
            &context(),
            &ports,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(store.items("tracking").len(), 1);
        assert!(store.items("orders").is_empty());
    }

    #[test]
    fn notify_false_skips_topic() {
        let store = InMemoryStore::new();
        let published = Mutex::new(Vec::new());
        let topic = |subject: &str, _message: &str| -> Result<(), DependencyError> {
            published.lock().expect("poisoned mutex").push(subject.to_string());
            Ok(())
        };
        let ports = TrackingPorts {
            store: &store,
            queue: &UnconfiguredQueue,
            topic: &topic,
        };

        let quiet = handle_tracking_event(
            json!({
                "httpMethod": "POST",
                "body": {"tracking_id": "TRK-1", "status": "DELIVERED", "notify": false}
            }),
            &config(),
            &context(),
            &ports,
        );
        assert_eq!(quiet.status_code, 201);
        assert!(published.lock().expect("poisoned mutex").is_empty());

        handle_tracking_event(
            json!({"httpMethod": "POST", "body": {"tracking_id": "TRK-1", "status": "DELIVERED"}}),
            &config(),
            &context(),
            &ports,
        );
        assert_eq!(
            published.into_inner().expect("poisoned mutex"),
            vec!["Tracking TRK-1 - DELIVERED".to_string()]
        );
    }

    #[test]
    fn unknown_tracking_id_is_not_found() {
        let store = InMemoryStore::new();
        let ports = TrackingPorts {
            store: &store,
            queue: &UnconfiguredQueue,
            topic: &UnconfiguredTopic,
        };

        let response = handle_tracking_event(
            json!({"httpMethod": "GET", "queryStringParameters": {"tracking_id": "TRK-404"}}),
            &config(),
            &context(),
            &ports,
        );
        assert_eq!(response.status_code, 404);

        let by_order = handle_tracking_event(
            json!({"httpMethod": "GET", "queryStringParameters": {"order_id": "ORD-404"}}),
            &config(),
            &context(),
            &ports,
        );
        assert_eq!(by_order.status_code, 200);
        assert_eq!(by_order.json_body()["count"], json!(0));
    }

    #[test]
    fn health_reports_table_status() {
        let store = InMemoryStore::new();
        let ports = TrackingPorts {
            store: &store,
            queue: &UnconfiguredQueue,
            topic: &UnconfiguredTopic,
        };
        let event = json!({"httpMethod": "GET", "path": "/health"});

        let healthy = handle_tracking_event(event.clone(), &config(), &context(), &ports);
        assert_eq!(healthy.status_code, 200);
        assert_eq!(healthy.json_body()["table_status"], json!("ACTIVE"));

        store.fail_on("tracking", StoreOperation::Describe);
        let unhealthy = handle_tracking_event(event, &config(), &context(), &ports);
        assert_eq!(unhealthy.status_code, 503);
        assert_eq!(unhealthy.json_body()["status"], json!("unhealthy"));
        assert!(unhealthy.json_body()["error"]
            .as_str()
            .is_some_and(|error| error.contains("injected failure")));

        let prod = InvocationContext::new("prod", context().now);
        let hidden = handle_tracking_event(
            json!({"httpMethod": "GET", "path": "/health"}),
            &config(),
            &prod,
            &ports,
        );
        assert_eq!(hidden.status_code, 503);
        assert_eq!(hidden.json_body()["error"], json!("Dependency unavailable"));
        assert!(!hidden.body.contains("injected failure"));
    }
}
