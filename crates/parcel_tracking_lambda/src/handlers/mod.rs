use chrono::{DateTime, Utc};

pub mod envelope;
pub mod notifications;
pub mod orders;
pub mod routes;
pub mod tracking;

/// Per-invocation facts the binaries supply to every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub environment: String,
    pub now: DateTime<Utc>,
}

impl InvocationContext {
    pub fn new(environment: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            environment: environment.into(),
            now,
        }
    }

    pub fn is_production(&self) -> bool {
        crate::config::is_production_name(&self.environment)
    }

    pub fn include_error_detail(&self) -> bool {
        !self.is_production()
    }
}
