//! Notification dispatch for queue messages and tracking-table stream records.
//!
//! Queue records are rendered and "delivered" through the log. Stream records
//! describe tracking writes and are fanned out to the topic.

use parcel_tracking_core::notification::{
    render, tracking_message, tracking_subject, NotificationMessage,
};
use serde_json::{json, Value};

use crate::adapters::topic::NotificationTopic;
use crate::error::HandlerError;
use crate::handlers::envelope::{success_response, ApiGatewayResponse};
use crate::handlers::InvocationContext;

const QUEUE_SOURCE: &str = "aws:sqs";
const STREAM_SOURCE: &str = "aws:dynamodb";

fn records(event: &Value) -> &[Value] {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn all_records_from(event: &Value, source: &str) -> bool {
    let records = records(event);
    !records.is_empty()
        && records.iter().all(|record| {
            record
                .get("eventSource")
                .and_then(Value::as_str)
                .map(|event_source| event_source == source)
                .unwrap_or(false)
        })
}

pub fn is_queue_event(event: &Value) -> bool {
    all_records_from(event, QUEUE_SOURCE)
}

pub fn is_stream_event(event: &Value) -> bool {
    all_records_from(event, STREAM_SOURCE)
}

/// Routes a batch to the queue or stream consumer. Anything without records
/// (a scheduled poke, a manual test) reports an empty batch.
pub fn handle_notifications_event(
    event: &Value,
    context: &InvocationContext,
    topic: &dyn NotificationTopic,
) -> Result<ApiGatewayResponse, HandlerError> {
    if is_stream_event(event) {
        Ok(handle_stream_records(event, context, topic))
    } else if is_queue_event(event) {
        handle_queue_records(event, context)
    } else {
        Ok(batch_response(0, context))
    }
}

/// Fails the whole batch on the first body that is not JSON so the queue redrives it.
pub fn handle_queue_records(
    event: &Value,
    context: &InvocationContext,
) -> Result<ApiGatewayResponse, HandlerError> {
    let mut processed = 0;
    for record in records(event) {
        let body = record
            .get("body")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::validation("SQS record body must be a string"))?;
        let message = NotificationMessage::from_body(body).map_err(|error| {
            HandlerError::validation(format!("invalid notification message: {error}"))
        })?;

        match render(&message) {
            Some(notification) => tracing::info!(
                kind = message.kind(),
                recipient = %notification.recipient,
                subject = %notification.subject,
                body = %notification.body,
                "notification delivered"
            ),
            None => tracing::warn!(body, "unknown notification type"),
        }
        processed += 1;
    }

    Ok(batch_response(processed, context))
}

/// Publish failures and malformed records are logged and skipped.
pub fn handle_stream_records(
    event: &Value,
    context: &InvocationContext,
    topic: &dyn NotificationTopic,
) -> ApiGatewayResponse {
    let mut processed = 0;
    for record in records(event) {
        let event_name = record.get("eventName").and_then(Value::as_str).unwrap_or_default();
        if !matches!(event_name, "INSERT" | "MODIFY") {
            continue;
        }
        let Some(image) = record.get("dynamodb").and_then(|change| change.get("NewImage")) else {
            tracing::warn!(event_name, "stream record has no new image");
            continue;
        };

        let tracking_id = string_attribute(image, "tracking_id").unwrap_or("UNKNOWN");
        let location = string_attribute(image, "location").unwrap_or("Unknown");
        let status = string_attribute(image, "status").unwrap_or("UNKNOWN");

        let subject = tracking_subject(tracking_id, status);
        let message = tracking_message(tracking_id, status, location, context.now);
        match topic.publish(&subject, &message) {
            Ok(()) => processed += 1,
            Err(error) => {
                tracing::warn!(tracking_id, error = %error, "tracking notification not published")
            }
        }
    }

    batch_response(processed, context)
}

/// Reads a string attribute from a stream image in DynamoDB's typed JSON.
fn string_attribute<'a>(image: &'a Value, name: &str) -> Option<&'a str> {
    image
        .get(name)
        .and_then(|attribute| attribute.get("S"))
        .and_then(Value::as_str)
}

fn batch_response(processed: usize, context: &InvocationContext) -> ApiGatewayResponse {
    let message = if processed == 0 {
        "No pending notifications".to_string()
    } else {
        format!("{processed} notifications processed")
    };
    tracing::info!(processed, "notification batch finished");
    success_response(200, json!({ "message": message }), context)
}
