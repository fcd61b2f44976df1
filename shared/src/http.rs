//! Request/response envelopes for gateway-invoked Lambda functions.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::ErrorResponse;
use crate::{Error, Result};

/// Proxy-style Lambda response: status, headers and a JSON-encoded body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl LambdaResponse {
    /// Add a header, replacing any previous value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<LambdaResponse> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    Ok(LambdaResponse {
        status_code: status,
        headers,
        body: serde_json::to_string(data)?,
    })
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<LambdaResponse> {
    json_response(status, &ErrorResponse::new(message))
}

/// Map a library error onto its status code.
pub fn error_to_response(error: &Error) -> Result<LambdaResponse> {
    error_response(error.status_code(), error.to_string())
}

/// Extract the tool request from a Lambda event.
///
/// The gateway sends the parameters directly; API Gateway wraps them in
/// `body`, either as an object or as a JSON string.
pub fn extract_body(event: Value) -> Result<Value> {
    match event {
        Value::Object(mut map) if map.contains_key("body") => match map.remove("body") {
            Some(Value::String(raw)) => serde_json::from_str(&raw)
                .map_err(|e| Error::Validation(format!("Invalid request body: {}", e))),
            Some(body) => Ok(body),
            None => Ok(Value::Null),
        },
        other => Ok(other),
    }
}

/// Check that every required parameter is present and non-empty.
///
/// The error names all required parameters, matching what callers already expect.
pub fn require_params(body: &Value, required: &[&str]) -> Result<()> {
    let missing = required.iter().any(|key| match body.get(*key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    });

    if missing {
        return Err(Error::Validation(format!(
            "Missing required parameters: {}",
            required.join(", ")
        )));
    }
    Ok(())
}
