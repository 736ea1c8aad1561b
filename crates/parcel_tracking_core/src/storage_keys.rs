use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Days a record is kept before the store's native expiry removes it.
pub const RETENTION_DAYS: i64 = 30;

pub const CUSTOMER_INDEX: &str = "customer_index";
pub const ORDER_INDEX: &str = "order_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Order,
    Tracking,
    Route,
}

impl RecordKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Order => "ORD",
            Self::Tracking => "TRK",
            Self::Route => "ROUTE",
        }
    }
}

/// Builds `<PREFIX>-XXXXXXXX` from the first eight hex digits of a v4 UUID.
pub fn new_record_id(kind: RecordKind) -> String {
    record_id_from_uuid(kind, Uuid::new_v4())
}

pub fn record_id_from_uuid(kind: RecordKind, uuid: Uuid) -> String {
    let simple = uuid.simple().to_string();
    format!("{}-{}", kind.prefix(), simple[..8].to_ascii_uppercase())
}

pub fn record_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn expiry_epoch_seconds(now: DateTime<Utc>) -> i64 {
    (now + Duration::days(RETENTION_DAYS)).timestamp()
}

pub fn order_key(order_id: &str, created_at: &str) -> Map<String, Value> {
    let mut key = Map::new();
    key.insert("order_id".to_string(), Value::from(order_id));
    key.insert("created_at".to_string(), Value::from(created_at));
    key
}
