use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use parcel_tracking_lambda::adapters::sns::SnsTopic;
use parcel_tracking_lambda::adapters::topic::{NotificationTopic, UnconfiguredTopic};
use parcel_tracking_lambda::config::RuntimeConfig;
use parcel_tracking_lambda::handlers::envelope::ApiGatewayResponse;
use parcel_tracking_lambda::handlers::notifications::handle_notifications_event;
use parcel_tracking_lambda::telemetry::init_tracing;
use serde_json::Value;

struct RuntimeDependencies {
    runtime_config: RuntimeConfig,
    topic: Box<dyn NotificationTopic + Send + Sync>,
}

/// Errors fail the invocation so SQS redelivers the batch.
fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    let context = deps.runtime_config.invocation_context(Utc::now());
    handle_notifications_event(&event.payload, &context, deps.topic.as_ref()).map_err(|error| {
        tracing::error!(error = %error, "notification batch failed");
        Error::from(error.to_string())
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime_config = RuntimeConfig::from_env()?;
    init_tracing(&runtime_config.log_level);

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let topic: Box<dyn NotificationTopic + Send + Sync> = match runtime_config.sns_topic() {
        Some(topic_arn) => Box::new(SnsTopic::new(
            aws_sdk_sns::Client::new(&aws_config),
            topic_arn,
        )),
        None => Box::new(UnconfiguredTopic),
    };
    let deps = RuntimeDependencies {
        runtime_config,
        topic,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps)
    }))
    .await
}
