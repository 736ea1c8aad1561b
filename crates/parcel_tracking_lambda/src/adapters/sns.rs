use crate::adapters::block_on;
use crate::adapters::topic::NotificationTopic;
use crate::error::DependencyError;

/// SNS caps subjects at 100 characters.
const MAX_SUBJECT_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct SnsTopic {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsTopic {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }
}

impl NotificationTopic for SnsTopic {
    fn publish(&self, subject: &str, message: &str) -> Result<(), DependencyError> {
        let client = self.client.clone();
        let topic_arn = self.topic_arn.clone();
        let subject: String = subject.chars().take(MAX_SUBJECT_CHARS).collect();
        let message = message.to_string();

        block_on(async move {
            client
                .publish()
                .topic_arn(topic_arn)
                .subject(subject)
                .message(message)
                .send()
                .await
                .map(|output| {
                    tracing::info!(message_id = ?output.message_id(), "notification published");
                })
                .map_err(|error| DependencyError::new("sns", "publish", error.to_string()))
        })
    }
}
