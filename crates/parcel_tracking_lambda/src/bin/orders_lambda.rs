use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use parcel_tracking_lambda::adapters::dynamodb::DynamoDbStore;
use parcel_tracking_lambda::adapters::queue::{NotificationQueue, UnconfiguredQueue};
use parcel_tracking_lambda::adapters::sqs::SqsQueue;
use parcel_tracking_lambda::config::RuntimeConfig;
use parcel_tracking_lambda::handlers::envelope::ApiGatewayResponse;
use parcel_tracking_lambda::handlers::orders::{handle_orders_event, OrdersHandlerConfig};
use parcel_tracking_lambda::telemetry::init_tracing;
use serde_json::Value;

struct RuntimeDependencies {
    runtime_config: RuntimeConfig,
    handler_config: OrdersHandlerConfig,
    store: DynamoDbStore,
    queue: Box<dyn NotificationQueue + Send + Sync>,
}

fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> ApiGatewayResponse {
    let context = deps.runtime_config.invocation_context(Utc::now());
    handle_orders_event(
        event.payload,
        &deps.handler_config,
        &context,
        &deps.store,
        deps.queue.as_ref(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime_config = RuntimeConfig::from_env()?;
    init_tracing(&runtime_config.log_level);

    let handler_config = OrdersHandlerConfig {
        orders_table: RuntimeConfig::require(&runtime_config.orders_table, "ORDERS_TABLE")?,
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let queue: Box<dyn NotificationQueue + Send + Sync> = match runtime_config.notifications_queue()
    {
        Some(queue_url) => Box::new(SqsQueue::new(
            aws_sdk_sqs::Client::new(&aws_config),
            queue_url,
        )),
        None => Box::new(UnconfiguredQueue),
    };
    let deps = RuntimeDependencies {
        handler_config,
        store: DynamoDbStore::new(aws_sdk_dynamodb::Client::new(&aws_config)),
        queue,
        runtime_config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(handle_request(event, deps))
    }))
    .await
}
