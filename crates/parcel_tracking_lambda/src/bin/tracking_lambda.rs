use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use parcel_tracking_lambda::adapters::dynamodb::DynamoDbStore;
use parcel_tracking_lambda::adapters::queue::{NotificationQueue, UnconfiguredQueue};
use parcel_tracking_lambda::adapters::sns::SnsTopic;
use parcel_tracking_lambda::adapters::sqs::SqsQueue;
use parcel_tracking_lambda::adapters::topic::{NotificationTopic, UnconfiguredTopic};
use parcel_tracking_lambda::config::RuntimeConfig;
use parcel_tracking_lambda::handlers::envelope::ApiGatewayResponse;
use parcel_tracking_lambda::handlers::tracking::{
    handle_tracking_event, TrackingHandlerConfig, TrackingPorts,
};
use parcel_tracking_lambda::telemetry::init_tracing;
use serde_json::Value;

const SERVICE_NAME: &str = "parcel-tracking";

struct RuntimeDependencies {
    runtime_config: RuntimeConfig,
    handler_config: TrackingHandlerConfig,
    store: DynamoDbStore,
    queue: Box<dyn NotificationQueue + Send + Sync>,
    topic: Box<dyn NotificationTopic + Send + Sync>,
}

fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> ApiGatewayResponse {
    let context = deps.runtime_config.invocation_context(Utc::now());
    let ports = TrackingPorts {
        store: &deps.store,
        queue: deps.queue.as_ref(),
        topic: deps.topic.as_ref(),
    };
    handle_tracking_event(event.payload, &deps.handler_config, &context, &ports)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime_config = RuntimeConfig::from_env()?;
    init_tracing(&runtime_config.log_level);

    let handler_config = TrackingHandlerConfig {
        tracking_table: RuntimeConfig::require(&runtime_config.tracking_table, "TRACKING_TABLE")?,
        orders_table: RuntimeConfig::require(&runtime_config.orders_table, "ORDERS_TABLE").ok(),
        service: SERVICE_NAME.to_string(),
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
    let topic: Box<dyn NotificationTopic + Send + Sync> = match runtime_config.sns_topic() {
        Some(topic_arn) => Box::new(SnsTopic::new(
            aws_sdk_sns::Client::new(&aws_config),
            topic_arn,
        )),
        None => Box::new(UnconfiguredTopic),
    };
    let deps = RuntimeDependencies {
        handler_config,
        store: DynamoDbStore::new(aws_sdk_dynamodb::Client::new(&aws_config)),
        queue,
        topic,
        runtime_config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(handle_request(event, deps))
    }))
    .await
}
