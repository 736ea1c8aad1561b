mod support;

use parcel_tracking_lambda::adapters::memory::{InMemoryStore, StoreOperation};
use parcel_tracking_lambda::adapters::topic::UnconfiguredTopic;
use parcel_tracking_lambda::handlers::notifications::handle_notifications_event;
use parcel_tracking_lambda::handlers::orders::{handle_orders_event, OrdersHandlerConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{context, context_at, query_event, rest_event, RecordingQueue, ORDERS_TABLE};

fn config() -> OrdersHandlerConfig {
    OrdersHandlerConfig {
        orders_table: ORDERS_TABLE.to_string(),
    }
}

#[test]
fn create_order_stores_pending_order_and_queues_notification() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();

    let response = handle_orders_event(
        rest_event(
            "POST",
            json!({
                "customer_id": "CUST001",
                "products": [{"sku": "PROD123", "quantity": 2, "price": 50.0}],
                "delivery_address": "123 Main St"
            }),
        ),
        &config(),
        &context(),
        &store,
        &queue,
    );

    assert_eq!(response.status_code, 201);
    let body = response.json_body();
    assert_eq!(body["message"], json!("Order created successfully"));
    assert_eq!(body["status"], json!("PENDING"));
    assert_eq!(body["total"].as_f64(), Some(100.0));
    let order_id = body["order_id"].as_str().expect("order id");
    assert!(order_id.starts_with("ORD-"));
    assert_eq!(order_id.len(), "ORD-".len() + 8);

    let stored = store.items(ORDERS_TABLE);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["order_id"], json!(order_id));
    assert_eq!(stored[0]["created_at"], json!("2026-02-14T09:30:00.000Z"));
    assert_eq!(stored[0]["environment"], json!("test"));
    assert_eq!(
        stored[0]["ttl"],
        json!(context().now.timestamp() + 30 * 24 * 60 * 60)
    );

    let messages = queue.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], json!("ORDER_CREATED"));
    assert_eq!(messages[0]["order_id"], json!(order_id));
    assert_eq!(messages[0]["customer_id"], json!("CUST001"));
}

#[test]
fn create_order_validates_input() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();

    let missing_customer = handle_orders_event(
        rest_event("POST", json!({"products": [{"price": 1.0}]})),
        &config(),
        &context(),
        &store,
        &queue,
    );
    assert_eq!(missing_customer.status_code, 400);
    assert_eq!(
        missing_customer.json_body()["error"],
        json!("customer_id is required")
    );

    let no_products = handle_orders_event(
        rest_event("POST", json!({"customer_id": "CUST001", "products": []})),
        &config(),
        &context(),
        &store,
        &queue,
    );
    assert_eq!(no_products.status_code, 400);

    let invalid_json = handle_orders_event(
        json!({"httpMethod": "POST", "body": "{\"customer_id\": "}),
        &config(),
        &context(),
        &store,
        &queue,
    );
    assert_eq!(invalid_json.status_code, 400);
    assert_eq!(invalid_json.json_body()["error"], json!("Invalid JSON body"));

    assert!(store.items(ORDERS_TABLE).is_empty());
    assert!(queue.messages().is_empty());
}

#[test]
fn list_orders_filters_by_customer_newest_first() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();

    let empty =
        handle_orders_event(query_event(json!(null)), &config(), &context(), &store, &queue);
    assert_eq!(empty.status_code, 200);
    assert_eq!(empty.json_body()["count"], json!(0));
    assert_eq!(empty.json_body()["orders"], json!([]));

    for (offset, customer) in [(0, "CUST001"), (60, "CUST002"), (120, "CUST001")] {
        let created = handle_orders_event(
            rest_event(
                "POST",
                json!({"customer_id": customer, "products": [{"price": 10}]}),
            ),
            &config(),
            &context_at("test", offset),
            &store,
            &queue,
        );
        assert_eq!(created.status_code, 201);
    }

    let filtered = handle_orders_event(
        query_event(json!({"customer_id": "CUST001"})),
        &config(),
        &context(),
        &store,
        &queue,
    );
    let body = filtered.json_body();
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["orders"][0]["created_at"], json!("2026-02-14T09:32:00.000Z"));
    assert_eq!(body["orders"][1]["created_at"], json!("2026-02-14T09:30:00.000Z"));

    let all = handle_orders_event(query_event(json!({})), &config(), &context(), &store, &queue);
    assert_eq!(all.json_body()["count"], json!(3));
}

#[test]
fn store_failure_hides_detail_in_production() {
    let store = InMemoryStore::new();
    store.fail_on(ORDERS_TABLE, StoreOperation::Put);
    let queue = RecordingQueue::default();
    let event = rest_event(
        "POST",
        json!({"customer_id": "CUST001", "products": [{"price": 5}]}),
    );

    let dev = handle_orders_event(event.clone(), &config(), &context_at("dev", 0), &store, &queue);
    assert_eq!(dev.status_code, 500);
    assert_eq!(dev.json_body()["error"], json!("Internal server error"));
    assert!(dev.json_body()["detail"].is_string());

    let prod = handle_orders_event(event, &config(), &context_at("prod", 0), &store, &queue);
    assert_eq!(prod.status_code, 500);
    assert!(prod.json_body().get("detail").is_none());
    assert_eq!(prod.headers["X-Environment"], json!("prod"));
    assert!(queue.messages().is_empty());
}

#[test]
fn queued_order_notification_is_delivered() {
    let store = InMemoryStore::new();
    let queue = RecordingQueue::default();

    handle_orders_event(
        rest_event(
            "POST",
            json!({"customer_id": "CUST001", "products": [{"quantity": 3, "price": 50}]}),
        ),
        &config(),
        &context(),
        &store,
        &queue,
    );

    let response = handle_notifications_event(&queue.as_sqs_event(), &context(), &UnconfiguredTopic)
        .expect("batch should be processed");
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.json_body()["message"],
        json!("1 notifications processed")
    );
}
