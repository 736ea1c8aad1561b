#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parcel_tracking_lambda::adapters::queue::NotificationQueue;
use parcel_tracking_lambda::adapters::topic::NotificationTopic;
use parcel_tracking_lambda::error::DependencyError;
use parcel_tracking_lambda::handlers::InvocationContext;
use serde_json::{json, Value};

pub const ORDERS_TABLE: &str = "orders-test";
pub const TRACKING_TABLE: &str = "tracking-test";
pub const ROUTES_TABLE: &str = "routes-test";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap()
}

pub fn context_at(environment: &str, offset_seconds: i64) -> InvocationContext {
    InvocationContext::new(environment, base_time() + Duration::seconds(offset_seconds))
}

pub fn context() -> InvocationContext {
    context_at("test", 0)
}

pub fn rest_event(method: &str, body: Value) -> Value {
    json!({
        "httpMethod": method,
        "path": "/",
        "body": body.to_string(),
    })
}

pub fn query_event(params: Value) -> Value {
    json!({
        "httpMethod": "GET",
        "path": "/",
        "queryStringParameters": params,
    })
}

#[derive(Debug, Default)]
pub struct RecordingQueue {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingQueue {
    pub fn messages(&self) -> Vec<Value> {
        self.sent
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|body| serde_json::from_str(body).expect("queued body should be JSON"))
            .collect()
    }

    /// Wraps the queued bodies as an SQS batch for the notifications consumer.
    pub fn as_sqs_event(&self) -> Value {
        let records: Vec<Value> = self
            .sent
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|body| json!({"eventSource": "aws:sqs", "body": body}))
            .collect();
        json!({ "Records": records })
    }
}

impl NotificationQueue for RecordingQueue {
    fn enqueue(&self, body: &str) -> Result<(), DependencyError> {
        self.sent.lock().expect("poisoned mutex").push(body.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingTopic {
    pub published: Mutex<Vec<(String, String)>>,
}

impl RecordingTopic {
    pub fn subjects(&self) -> Vec<String> {
        self.published
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

impl NotificationTopic for RecordingTopic {
    fn publish(&self, subject: &str, message: &str) -> Result<(), DependencyError> {
        self.published
            .lock()
            .expect("poisoned mutex")
            .push((subject.to_string(), message.to_string()));
        Ok(())
    }
}
