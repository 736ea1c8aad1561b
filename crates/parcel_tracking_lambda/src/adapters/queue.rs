use crate::error::DependencyError;

pub trait NotificationQueue {
    fn enqueue(&self, body: &str) -> Result<(), DependencyError>;
}

impl<F> NotificationQueue for F
where
    F: Fn(&str) -> Result<(), DependencyError>,
{
    fn enqueue(&self, body: &str) -> Result<(), DependencyError> {
        self(body)
    }
}

/// Stand-in used when `NOTIFICATIONS_QUEUE` is not set: logs and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredQueue;

impl NotificationQueue for UnconfiguredQueue {
    fn enqueue(&self, _body: &str) -> Result<(), DependencyError> {
        tracing::warn!("notifications queue not configured, message dropped");
        Ok(())
    }
}
