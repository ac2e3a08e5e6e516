//! Error types for `booker-core`.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Per-field validation messages, keyed by form field name
/// (`name`, `type_id`, `location`, `description`, `property_<key>`).
pub type ValidationErrors = BTreeMap<String, String>;

/// A failure talking to the REST collaborator.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request never produced a response (connection refused, timeout…).
  #[error("transport error: {0}")]
  Transport(String),

  /// The server answered with a non-success status.
  #[error("server returned status {status}")]
  Status {
    status: u16,
    /// The response body: parsed JSON when possible, else the raw text as a
    /// JSON string. `None` when the body was empty.
    body:   Option<Value>,
  },

  /// The server answered successfully but the body was not JSON.
  #[error("malformed response: {0}")]
  Decode(String),
}

impl ApiError {
  /// Extract a message suitable for a banner.
  ///
  /// Precedence: `error` field, `message` field, a plain string body, the
  /// stringified JSON body, then `fallback`.
  pub fn user_message(&self, fallback: &str) -> String {
    let Self::Status {
      body: Some(body), ..
    } = self
    else {
      return fallback.to_string();
    };

    if let Some(msg) = body.get("error").and_then(Value::as_str) {
      return msg.to_string();
    }
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
      return msg.to_string();
    }
    match body {
      Value::String(s) if !s.trim().is_empty() => s.clone(),
      Value::String(_) | Value::Null => fallback.to_string(),
      other => other.to_string(),
    }
  }
}

/// The failure taxonomy of one form session. Every variant is recoverable.
#[derive(Debug, Error)]
pub enum Error {
  /// Listing resource types failed; the type selector stays empty.
  #[error("failed to load resource types: {0}")]
  LoadTypes(#[source] ApiError),

  /// Resolving one type's schema failed; the form falls back to zero
  /// dynamic fields.
  #[error("failed to load resource type {type_id}: {message}")]
  LoadSchema { type_id: i64, message: String },

  /// Local validation rejected the form; nothing was sent.
  #[error("{} field(s) failed validation", .0.len())]
  Validation(ValidationErrors),

  /// The collaborator rejected the submission or could not be reached.
  #[error("{message}")]
  Submission {
    message: String,
    #[source]
    source:  ApiError,
  },

  #[error("a submission is already in flight")]
  SubmitInProgress,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
