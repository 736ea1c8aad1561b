use parcel_tracking_core::contract::{
    normalize_create_order, CreateOrderRequest, OrderCreatedResponse, OrderListResponse,
    LIST_ORDERS_LIMIT,
};
use parcel_tracking_core::notification::NotificationMessage;
use parcel_tracking_core::records::{OrderRecord, ORDER_STATUS_PENDING};
use parcel_tracking_core::storage_keys::{
    expiry_epoch_seconds, new_record_id, record_timestamp, RecordKind, CUSTOMER_INDEX,
};
use serde_json::Value;

use crate::adapters::queue::NotificationQueue;
use crate::adapters::store::{decode_items, to_item, KeyQuery, KeyValueStore};
use crate::error::HandlerError;
use crate::handlers::envelope::{
    into_response, parse_api_request, success_response, ApiGatewayResponse, ApiRequest,
};
use crate::handlers::InvocationContext;

const ALLOWED_METHODS: &[&str] = &["GET", "POST"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdersHandlerConfig {
    pub orders_table: String,
}

pub fn handle_orders_event(
    event: Value,
    config: &OrdersHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
    queue: &dyn NotificationQueue,
) -> ApiGatewayResponse {
    let outcome = parse_api_request(event).and_then(|request| {
        match request.method_or("GET").as_str() {
            "POST" => create_order(&request, config, context, store, queue),
            "GET" => list_orders(&request, config, context, store),
            other => Err(HandlerError::MethodNotSupported {
                method: other.to_string(),
                allowed: ALLOWED_METHODS,
            }),
        }
    });
    into_response("orders", outcome, context)
}

fn create_order(
    request: &ApiRequest,
    config: &OrdersHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
    queue: &dyn NotificationQueue,
) -> Result<ApiGatewayResponse, HandlerError> {
    let payload: CreateOrderRequest = request.parse_body()?;
    let order = normalize_create_order(payload)?;

    let record = OrderRecord {
        order_id: new_record_id(RecordKind::Order),
        created_at: record_timestamp(context.now),
        customer_id: order.customer_id,
        products: order.products,
        delivery_address: order.delivery_address,
        status: ORDER_STATUS_PENDING.to_string(),
        total: order.total,
        ttl: expiry_epoch_seconds(context.now),
        environment: Some(context.environment.clone()),
    };

    store.put_item(&config.orders_table, to_item(&record)?)?;
    tracing::info!(
        order_id = %record.order_id,
        customer_id = %record.customer_id,
        "order created"
    );

    let message = NotificationMessage::OrderCreated {
        order_id: record.order_id.clone(),
        customer_id: record.customer_id.clone(),
        total: record.total,
    };
    // Best-effort: the order is already stored.
    if let Err(error) = enqueue_notification(queue, &message) {
        tracing::warn!(
            order_id = %record.order_id,
            error = %error,
            "order notification not sent"
        );
    }

    Ok(success_response(
        201,
        OrderCreatedResponse {
            message: "Order created successfully".to_string(),
            order_id: record.order_id,
            status: record.status,
            total: record.total,
        },
        context,
    ))
}

pub(crate) fn enqueue_notification(
    queue: &dyn NotificationQueue,
    message: &NotificationMessage,
) -> Result<(), HandlerError> {
    let body = serde_json::to_string(message).map_err(|error| {
        HandlerError::Internal(format!("failed to encode notification: {error}"))
    })?;
    queue.enqueue(&body)?;
    tracing::info!(kind = message.kind(), "notification enqueued");
    Ok(())
}

fn list_orders(
    request: &ApiRequest,
    config: &OrdersHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
) -> Result<ApiGatewayResponse, HandlerError> {
    let customer_id = request
        .query
        .get("customer_id")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty());

    let items = match customer_id {
        Some(customer_id) => store.query(
            &config.orders_table,
            &KeyQuery::partition("customer_id", customer_id)
                .on_index(CUSTOMER_INDEX)
                .limit(LIST_ORDERS_LIMIT)
                .newest_first(),
        )?,
        None => store.scan(&config.orders_table, LIST_ORDERS_LIMIT)?,
    };

    let orders: Vec<OrderRecord> = decode_items(&config.orders_table, items);
    tracing::info!(count = orders.len(), customer_id = ?customer_id, "orders listed");

    Ok(success_response(
        200,
        OrderListResponse {
            count: orders.len(),
            orders,
        },
        context,
    ))
}
