use crate::error::DependencyError;

pub trait NotificationTopic {
    fn publish(&self, subject: &str, message: &str) -> Result<(), DependencyError>;
}

impl<F> NotificationTopic for F
where
    F: Fn(&str, &str) -> Result<(), DependencyError>,
{
    fn publish(&self, subject: &str, message: &str) -> Result<(), DependencyError> {
        self(subject, message)
    }
}

/// Stand-in used when `SNS_TOPIC` is not set: logs and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTopic;

impl NotificationTopic for UnconfiguredTopic {
    fn publish(&self, subject: &str, _message: &str) -> Result<(), DependencyError> {
        tracing::info!(subject, "notification topic not configured, skipping publish");
        Ok(())
    }
}
