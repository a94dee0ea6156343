//! Client error taxonomy
//!
//! HTTP failures are classified from the status code and the server's error
//! body; the server's message is carried through verbatim.

use model_registry_core::CodecError;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Error code the registry uses for missing resources regardless of status
pub const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

/// Errors returned by the transport and adapters
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation failed ({status}): {message}")]
    Validation {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Not found: {message}")]
    NotFound {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Conflict: {message}")]
    Conflict {
        status: u16,
        message: String,
        body: String,
    },

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Network error connecting to {url}: {message}")]
    Network { url: String, message: String },

    #[error("SSL certificate verification failed for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Timed out after {elapsed:?} waiting for {url}")]
    Timeout { elapsed: Duration, url: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Pagination error: {0}")]
    Pagination(String),

    #[error("Custom property error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Classify a non-success response
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        let message = parsed
            .as_ref()
            .and_then(|v| string_field(v, &["message", "error"]))
            .map(str::to_string)
            .unwrap_or_else(|| {
                let text = body.trim();
                if text.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    text.to_string()
                }
            });
        let code = parsed
            .as_ref()
            .and_then(|v| string_field(v, &["code", "errorCode", "error_code"]));

        let lowered = message.to_ascii_lowercase();
        let client_error = (400..500).contains(&status);

        if status == 404
            || code == Some(RESOURCE_DOES_NOT_EXIST)
            || (client_error && lowered.contains("not found"))
        {
            ClientError::NotFound {
                status,
                message,
                body,
            }
        } else if status == 409 || (client_error && lowered.contains("already exists")) {
            ClientError::Conflict {
                status,
                message,
                body,
            }
        } else if status == 400 || status == 422 {
            ClientError::Validation {
                status,
                message,
                body,
            }
        } else {
            ClientError::Http {
                status,
                message,
                body,
            }
        }
    }

    /// Map a failed request (no response received)
    pub fn from_transport(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ClientError::Timeout {
                elapsed: timeout,
                url: url.to_string(),
            };
        }

        let chain = error_chain(&err);
        let lowered = chain.to_ascii_lowercase();
        if lowered.contains("certificate") || lowered.contains("unknownissuer") {
            ClientError::Tls {
                url: url.to_string(),
                message: chain,
            }
        } else {
            ClientError::Network {
                url: url.to_string(),
                message: chain,
            }
        }
    }

    /// HTTP status, for errors that came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Validation { status, .. }
            | ClientError::NotFound { status, .. }
            | ClientError::Conflict { status, .. }
            | ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict { .. })
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", err))
    }
}

fn string_field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| value.get(*name).and_then(Value::as_str))
}

/// Flatten an error and its sources into one line
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
