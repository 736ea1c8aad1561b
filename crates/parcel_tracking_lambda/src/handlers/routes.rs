use parcel_tracking_core::contract::{
    normalize_route_request, OptimizeRouteRequest, RouteOptimizedResponse,
};
use parcel_tracking_core::records::{RouteRecord, RouteStatus};
use parcel_tracking_core::routing::{
    plan_route, rounded_distance_km, Geocoder, SimulatedGeocoder, Stop,
};
use parcel_tracking_core::storage_keys::{new_record_id, record_timestamp, RecordKind};
use serde_json::Value;

use crate::adapters::store::{to_item, KeyQuery, KeyValueStore};
use crate::error::{DependencyError, HandlerError};
use crate::handlers::envelope::{
    into_response, parse_api_request, success_response, ApiGatewayResponse, ApiRequest,
};
use crate::handlers::InvocationContext;

const ALLOWED_METHODS: &[&str] = &["POST"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHandlerConfig {
    pub orders_table: String,
    pub routes_table: String,
}

pub fn handle_route_event(
    event: Value,
    config: &RouteHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
) -> ApiGatewayResponse {
    let outcome = parse_api_request(event).and_then(|request| {
        match request.method_or("POST").as_str() {
            "POST" => optimize_route(&request, config, context, store, &SimulatedGeocoder),
            other => Err(HandlerError::MethodNotSupported {
                method: other.to_string(),
                allowed: ALLOWED_METHODS,
            }),
        }
    });
    into_response("route_optimizer", outcome, context)
}

fn optimize_route(
    request: &ApiRequest,
    config: &RouteHandlerConfig,
    context: &InvocationContext,
    store: &dyn KeyValueStore,
    geocoder: &impl Geocoder,
) -> Result<ApiGatewayResponse, HandlerError> {
    let payload: OptimizeRouteRequest = request.parse_body()?;
    let route_request = normalize_route_request(payload)?;

    let mut stops = Vec::with_capacity(route_request.order_ids.len());
    for order_id in &route_request.order_ids {
        match lookup_delivery_address(store, &config.orders_table, order_id) {
            Ok(Some(address)) => stops.push(Stop::geocoded(order_id.as_str(), address, geocoder)),
            Ok(None) => tracing::warn!(order_id = %order_id, "order not found, skipping stop"),
            Err(error) => tracing::warn!(
                order_id = %order_id,
                error = %error,
                "order lookup failed, skipping stop"
            ),
        }
    }

    if stops.is_empty() {
        return Err(HandlerError::NotFound("No valid orders found".to_string()));
    }

    let planned = plan_route(stops);
    let record = RouteRecord {
        route_id: new_record_id(RecordKind::Route),
        driver_id: route_request.driver_id,
        created_at: record_timestamp(context.now),
        order_ids: planned.order_sequence(),
        stops: planned.sequence.len(),
        estimated_distance_km: rounded_distance_km(planned.total_distance),
        status: RouteStatus::Planned,
    };

    store.put_item(&config.routes_table, to_item(&record)?)?;
    tracing::info!(
        route_id = %record.route_id,
        driver_id = %record.driver_id,
        stops = record.stops,
        "route planned"
    );

    Ok(success_response(
        200,
        RouteOptimizedResponse {
            message: "Route optimized successfully".to_string(),
            route_id: record.route_id,
            stops: record.stops,
            estimated_distance_km: record.estimated_distance_km,
            order_sequence: record.order_ids,
        },
        context,
    ))
}

/// Orders without a stored address still get a stop, placed from the empty address.
fn lookup_delivery_address(
    store: &dyn KeyValueStore,
    orders_table: &str,
    order_id: &str,
) -> Result<Option<String>, DependencyError> {
    let found = store.query(orders_table, &KeyQuery::partition("order_id", order_id).limit(1))?;
    Ok(found.first().map(|order| {
        order
            .get("delivery_address")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }))
}
