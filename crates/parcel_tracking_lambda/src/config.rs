//! Runtime configuration loaded from Lambda environment variables.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::handlers::InvocationContext;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Deployment name (`dev`, `staging`, `prod`, ...).
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub orders_table: Option<String>,

    #[serde(default, alias = "table_name")]
    pub tracking_table: Option<String>,

    #[serde(default)]
    pub routes_table: Option<String>,

    /// SQS queue URL for notification messages.
    #[serde(default)]
    pub notifications_queue: Option<String>,

    /// SNS topic ARN for tracking notifications.
    #[serde(default)]
    pub sns_topic: Option<String>,
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env::<Self>()?)
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Self>(pairs)?)
    }

    /// Returns the value of a setting a binary cannot run without.
    pub fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
        match value.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(ConfigError::Missing(name)),
        }
    }

    pub fn is_production(&self) -> bool {
        is_production_name(&self.environment)
    }

    pub fn invocation_context(&self, now: DateTime<Utc>) -> InvocationContext {
        InvocationContext::new(self.environment.trim(), now)
    }

    /// Queue/topic settings that are present but blank count as unset.
    pub fn notifications_queue(&self) -> Option<&str> {
        non_blank(&self.notifications_queue)
    }

    pub fn sns_topic(&self) -> Option<&str> {
        non_blank(&self.sns_topic)
    }
}

pub(crate) fn is_production_name(environment: &str) -> bool {
    matches!(
        environment.trim().to_ascii_lowercase().as_str(),
        "prod" | "production"
    )
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
        values
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn applies_defaults() {
        let config = RuntimeConfig::from_pairs(pairs(&[("ORDERS_TABLE", "orders")]))
            .expect("config should load");

        assert_eq!(config.environment, "dev");
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.orders_table.as_deref(), Some("orders"));
        assert!(config.notifications_queue().is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn accepts_legacy_table_name_for_tracking() {
        let config = RuntimeConfig::from_pairs(pairs(&[
            ("TABLE_NAME", "tracking"),
            ("ENVIRONMENT", "Production"),
            ("SNS_TOPIC", " "),
        ]))
        .expect("config should load");

        assert_eq!(config.tracking_table.as_deref(), Some("tracking"));
        assert!(config.is_production());
        assert!(config.sns_topic().is_none());
    }

    #[test]
    fn require_reports_missing_setting() {
        let error = RuntimeConfig::require(&None, "ROUTES_TABLE").expect_err("should fail");
        assert_eq!(error.to_string(), "ROUTES_TABLE must be configured");
        assert_eq!(
            RuntimeConfig::require(&Some(" routes ".to_string()), "ROUTES_TABLE")
                .expect("should pass"),
            "routes"
        );
    }
}
