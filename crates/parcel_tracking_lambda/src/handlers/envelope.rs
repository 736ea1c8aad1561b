use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::HandlerError;
use crate::handlers::InvocationContext;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// The parts of an API Gateway event (REST v1 or HTTP API v2) the handlers use.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Upper-cased method, `None` for direct invocations.
    pub method: Option<String>,
    pub path: String,
    pub query: BTreeMap<String, String>,
    body: Value,
}

impl ApiRequest {
    pub fn method_or(&self, default: &str) -> String {
        self.method.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn is_health_check(&self) -> bool {
        self.path.trim_end_matches('/').ends_with("/health")
    }

    /// Decodes the body into a JSON object: missing or null bodies become
    /// `{}`, string bodies are parsed.
    pub fn json_body(&self) -> Result<Value, HandlerError> {
        match &self.body {
            Value::Null => Ok(json!({})),
            Value::Object(_) => Ok(self.body.clone()),
            Value::String(text) if text.trim().is_empty() => Ok(json!({})),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(value @ Value::Object(_)) => Ok(value),
                Ok(_) => Err(HandlerError::validation("Request body must be a JSON object")),
                Err(_) => Err(HandlerError::validation("Invalid JSON body")),
            },
            _ => Err(HandlerError::validation("Request body must be a JSON object")),
        }
    }

    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.json_body()?)
            .map_err(|error| HandlerError::validation(format!("Malformed request: {error}")))
    }
}

pub fn parse_api_request(event: Value) -> Result<ApiRequest, HandlerError> {
    let Value::Object(mut object) = event else {
        return Err(HandlerError::validation(
            "Request payload must be a JSON object",
        ));
    };

    let http_context = object
        .get("requestContext")
        .and_then(|context| context.get("http"))
        .cloned()
        .unwrap_or(Value::Null);

    let method = object
        .get("httpMethod")
        .or_else(|| http_context.get("method"))
        .and_then(Value::as_str)
        .map(|method| method.trim().to_ascii_uppercase())
        .filter(|method| !method.is_empty());

    let path = object
        .get("path")
        .or_else(|| object.get("rawPath"))
        .or_else(|| http_context.get("path"))
        .and_then(Value::as_str)
        .unwrap_or("/")
        .to_string();

    let query = match object.get("queryStringParameters") {
        Some(Value::Object(params)) => params
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    let is_gateway_event =
        object.contains_key("httpMethod") || object.contains_key("requestContext");
    let body = match object.remove("body") {
        Some(body) => body,
        None if is_gateway_event => Value::Null,
        None => Value::Object(object),
    };

    Ok(ApiRequest {
        method,
        path,
        query,
        body,
    })
}

fn headers(context: &InvocationContext) -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Headers": "Content-Type,X-Amz-Date,Authorization,X-Api-Key",
        "Access-Control-Allow-Methods": "GET,POST,PUT,DELETE,OPTIONS",
        "X-Environment": context.environment,
    })
}

pub fn success_response(
    status_code: u16,
    payload: impl Serialize,
    context: &InvocationContext,
) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: headers(context),
            body,
        },
        Err(error) => error_response(
            &HandlerError::Internal(format!("failed to serialize response: {error}")),
            context,
        ),
    }
}

pub fn error_response(error: &HandlerError, context: &InvocationContext) -> ApiGatewayResponse {
    let payload = match error {
        HandlerError::Validation(validation) => json!({ "error": validation.message() }),
        HandlerError::NotFound(message) => json!({ "error": message }),
        HandlerError::MethodNotSupported { allowed, .. } => json!({
            "error": "Method not allowed",
            "allowed_methods": allowed,
        }),
        HandlerError::Dependency(_) | HandlerError::Internal(_) => {
            if context.include_error_detail() {
                json!({ "error": "Internal server error", "detail": error.to_string() })
            } else {
                json!({ "error": "Internal server error" })
            }
        }
    };

    ApiGatewayResponse {
        status_code: error.status_code(),
        headers: headers(context),
        body: payload.to_string(),
    }
}

/// Converts a handler outcome into a response, logging server-side failures.
pub fn into_response(
    component: &'static str,
    outcome: Result<ApiGatewayResponse, HandlerError>,
    context: &InvocationContext,
) -> ApiGatewayResponse {
    match outcome {
        Ok(response) => response,
        Err(error) => {
            match &error {
                HandlerError::Dependency(_) | HandlerError::Internal(_) => {
                    tracing::error!(component, error = %error, "request failed");
                }
                _ => {
                    tracing::info!(
                        component,
                        status = error.status_code(),
                        error = %error,
                        "request rejected"
                    );
                }
            }
            error_response(&error, context)
        }
    }
}
