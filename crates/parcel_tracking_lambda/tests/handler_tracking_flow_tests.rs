mod support;

use parcel_tracking_lambda::adapters::memory::InMemoryStore;
use parcel_tracking_lambda::handlers::notifications::handle_notifications_event;
use parcel_tracking_lambda::handlers::orders::{handle_orders_event, OrdersHandlerConfig};
use parcel_tracking_lambda::handlers::tracking::{
    handle_tracking_event, TrackingHandlerConfig, TrackingPorts,
};
use parcel_tracking_lambda::runtime::records::TrackingEvent;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use support::{
    context, context_at, query_event, rest_event, RecordingQueue, RecordingTopic, ORDERS_TABLE,
    TRACKING_TABLE,
};

fn config() -> TrackingHandlerConfig {
    TrackingHandlerConfig {
        tracking_table: TRACKING_TABLE.to_string(),
        orders_table: Some(ORDERS_TABLE.to_string()),
        service: "parcel-tracking".to_string(),
    }
}

fn create_order(store: &InMemoryStore) -> String {
    let response = handle_orders_event(
        rest_event(
            "POST",
            json!({"customer_id": "CUST001", "products": [{"price": 20}]}),
        ),
        &OrdersHandlerConfig {
            orders_table: ORDERS_TABLE.to_string(),
        },
        &context(),
        store,
        &RecordingQueue::default(),
    );
    response.json_body()["order_id"]
        .as_str()
        .expect("order id")
        .to_string()
}

#[test]
fn tracking_updates_flow_into_history_newest_first() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();
    let topic = RecordingTopic::default();
    let ports = TrackingPorts {
        store: &store,
        queue: &queue,
        topic: &topic,
    };
    let order_id = create_order(&store);

    let first = handle_tracking_event(
        rest_event(
            "POST",
            json!({"order_id": order_id, "status": "PICKED_UP", "location": "Depot"}),
        ),
        &config(),
        &context_at("test", 60),
        &ports,
    );
    assert_eq!(first.status_code, 201);
    let tracking_id = first.json_body()["tracking_id"]
        .as_str()
        .expect("tracking id")
        .to_string();

    let second = handle_tracking_event(
        rest_event(
            "PUT",
            json!({
                "order_id": order_id,
                "tracking_id": tracking_id,
                "status": "IN_TRANSIT",
                "location": "Hub"
            }),
        ),
        &config(),
        &context_at("test", 120),
        &ports,
    );
    assert_eq!(second.status_code, 200);
    assert_eq!(second.json_body()["timestamp"], json!("2026-02-14T09:32:00.000Z"));

    let history = handle_tracking_event(
        query_event(json!({"order_id": order_id})),
        &config(),
        &context(),
        &ports,
    );
    assert_eq!(history.status_code, 200);
    let body = history.json_body();
    assert_eq!(body["count"], json!(2));
    let events: Vec<TrackingEvent> =
        serde_json::from_value(body["events"].clone()).expect("events should decode");
    let statuses: Vec<&str> = events.iter().map(|event| event.status.as_str()).collect();
    assert_eq!(statuses, vec!["IN_TRANSIT", "PICKED_UP"]);

    let by_tracking = handle_tracking_event(
        query_event(json!({"tracking_id": tracking_id})),
        &config(),
        &context(),
        &ports,
    );
    assert_eq!(by_tracking.status_code, 200);
    assert_eq!(by_tracking.json_body()["count"], json!(2));

    assert_eq!(store.items(ORDERS_TABLE)[0]["status"], json!("IN_TRANSIT"));
    let kinds: Vec<Value> = queue
        .messages()
        .iter()
        .map(|message| message["type"].clone())
        .collect();
    assert_eq!(kinds, vec![json!("TRACKING_UPDATE"), json!("TRACKING_UPDATE")]);
    assert_eq!(
        topic.subjects(),
        vec![
            format!("Tracking {tracking_id} - PICKED_UP"),
            format!("Tracking {tracking_id} - IN_TRANSIT"),
        ]
    );

    let delivered = handle_notifications_event(&queue.as_sqs_event(), &context(), &topic)
        .expect("batch should be processed");
    assert_eq!(
        delivered.json_body()["message"],
        json!("2 notifications processed")
    );
}

#[test]
fn update_for_unknown_order_keeps_order_listing_intact() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();
    let topic = RecordingTopic::default();
    let ports = TrackingPorts {
        store: &store,
        queue: &queue,
        topic: &topic,
    };
    create_order(&store);

    let update = handle_tracking_event(
        rest_event(
            "PUT",
            json!({"order_id": "ORD-NOPE", "created_at": "2020-01-01", "status": "IN_TRANSIT"}),
        ),
        &config(),
        &context(),
        &ports,
    );
    assert_eq!(update.status_code, 200);
    assert_eq!(store.items(ORDERS_TABLE).len(), 1);

    let listing = handle_orders_event(
        query_event(json!(null)),
        &OrdersHandlerConfig {
            orders_table: ORDERS_TABLE.to_string(),
        },
        &context(),
        &store,
        &queue,
    );
    assert_eq!(listing.status_code, 200);
    assert_eq!(listing.json_body()["count"], json!(1));
}

#[test]
fn tracking_requests_are_validated() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();
    let topic = RecordingTopic::default();
    let ports = TrackingPorts {
        store: &store,
        queue: &queue,
        topic: &topic,
    };

    let missing_status = handle_tracking_event(
        rest_event("PUT", json!({"order_id": "ORD-00000001"})),
        &config(),
        &context(),
        &ports,
    );
    assert_eq!(missing_status.status_code, 400);
    assert_eq!(
        missing_status.json_body()["error"],
        json!("status is required")
    );

    let missing_lookup =
        handle_tracking_event(query_event(json!({})), &config(), &context(), &ports);
    assert_eq!(missing_lookup.status_code, 400);

    let delete = handle_tracking_event(
        json!({"httpMethod": "DELETE"}),
        &config(),
        &context(),
        &ports,
    );
    assert_eq!(delete.status_code, 405);
    assert_eq!(
        delete.json_body()["allowed_methods"],
        json!(["GET", "PUT", "POST"])
    );

    assert!(store.items(TRACKING_TABLE).is_empty());
    assert!(topic.subjects().is_empty());
}

#[test]
fn stream_records_fan_out_to_topic() {
    let topic = RecordingTopic::default();
    let event = json!({"Records": [{
        "eventSource": "aws:dynamodb",
        "eventName": "INSERT",
        "dynamodb": {"NewImage": {
            "tracking_id": {"S": "TRK-ABCDEF12"},
            "status": {"S": "DELIVERED"},
            "location": {"S": "Front door"}
        }}
    }]});

    let response =
        handle_notifications_event(&event, &context(), &topic).expect("stream batch");
    assert_eq!(response.json_body()["message"], json!("1 notifications processed"));

    let published = topic.published.lock().expect("poisoned mutex");
    assert_eq!(published[0].0, "Tracking TRK-ABCDEF12 - DELIVERED");
    assert!(published[0].1.contains("Location: Front door"));
    assert!(published[0].1.contains("Date/Time: 2026-02-14 09:30:00"));
}
