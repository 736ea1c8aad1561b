use crate::adapters::block_on;
use crate::adapters::queue::NotificationQueue;
use crate::error::DependencyError;

#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

impl NotificationQueue for SqsQueue {
    fn enqueue(&self, body: &str) -> Result<(), DependencyError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let body = body.to_string();

        block_on(async move {
            client
                .send_message()
                .queue_url(queue_url)
                .message_body(body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| DependencyError::new("sqs", "send_message", error.to_string()))
        })
    }
}
