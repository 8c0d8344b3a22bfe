//! Failure inputs handed to the classifier.
//!
//! A [`TransportError`] describes how far a remote call got before it failed:
//! a response arrived, a request went out and nothing came back, or the
//! request never left the client. The reqwest adapters at the bottom of this
//! module build one from a real HTTP call.

use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::HttpStatus;

/// The part of a transport error that is only present when the remote end answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    /// Status code of the response.
    pub status: HttpStatus,
    /// Decoded response body, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// A failure produced by the HTTP client.
///
/// The constructors enforce that a status code and body exist only when a
/// response was received.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct TransportError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<TransportResponse>,
    request_sent: bool,
    message: String,
}

impl TransportError {
    /// A failure where the remote end returned an HTTP response.
    pub fn with_response(status: u16, body: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            response: Some(TransportResponse {
                status: HttpStatus::from_code(status),
                body,
            }),
            request_sent: true,
            message: message.into(),
        }
    }

    /// A failure where the request was dispatched but no response arrived.
    pub fn without_response(message: impl Into<String>) -> Self {
        Self {
            response: None,
            request_sent: true,
            message: message.into(),
        }
    }

    /// A failure where the request never left the client.
    pub fn not_sent(message: impl Into<String>) -> Self {
        Self {
            response: None,
            request_sent: false,
            message: message.into(),
        }
    }

    /// Returns true if the remote end returned a response (any status).
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Returns true if a request was dispatched.
    pub fn has_request(&self) -> bool {
        self.request_sent
    }

    /// Returns the response part, if a response arrived.
    pub fn response(&self) -> Option<&TransportResponse> {
        self.response.as_ref()
    }

    /// Returns the response status, if a response arrived.
    pub fn status(&self) -> Option<HttpStatus> {
        self.response.as_ref().map(|r| r.status)
    }

    /// Returns the response body, if a response with a body arrived.
    pub fn body(&self) -> Option<&Value> {
        self.response.as_ref().and_then(|r| r.body.as_ref())
    }

    /// Library-level description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failed call as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FailureSignal {
    /// Caller-supplied description of what failed.
    pub raw_message: String,
    /// Present only when the failure came from a network call.
    pub transport: Option<TransportError>,
}

impl FailureSignal {
    /// Creates a signal with no transport information.
    pub fn new(raw_message: impl Into<String>) -> Self {
        Self {
            raw_message: raw_message.into(),
            transport: None,
        }
    }

    /// Attaches the transport error that caused the failure.
    pub fn with_transport(mut self, transport: TransportError) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// A field-level validation failure as returned by the server on a 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationFailure {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Data handed back to the caller for it to render.
///
/// Bodies that are neither a validation object nor a string are kept
/// verbatim as [`FailurePayload::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FailurePayload {
    Validation(ValidationFailure),
    Message(String),
    Other(Value),
}

impl FailurePayload {
    /// Interprets a response body without ever failing.
    ///
    /// A typed view is only used when it serializes back to the exact body;
    /// anything else is kept as [`FailurePayload::Other`].
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<FailurePayload>(value.clone()) {
            Ok(payload) if serde_json::to_value(&payload).ok().as_ref() == Some(&value) => payload,
            _ => FailurePayload::Other(value),
        }
    }

    /// Returns the validation failure, if this payload is one.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            FailurePayload::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the plain message, if this payload is one.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            FailurePayload::Message(m) => Some(m),
            _ => None,
        }
    }
}

/// Decodes a response body: JSON when it parses, otherwise the text as a
/// JSON string. Blank bodies decode to `None`.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text.into_owned())),
    }
}

impl TransportError {
    /// Builds a transport error from a reqwest failure.
    ///
    /// Status errors (from `error_for_status`) count as a received response
    /// without a body. Builder errors mean the request never left the client.
    /// Every other failure was sent without a response arriving.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = err.to_string();
        if let Some(status) = err.status() {
            return Self::with_response(status.as_u16(), None, message);
        }
        if err.is_builder() {
            return Self::not_sent(message);
        }
        Self::without_response(message)
    }

    /// Builds a transport error from a non-success response, reading its body.
    ///
    /// Returns `None` for 2xx responses.
    pub async fn from_response(response: Response) -> Option<Self> {
        if response.status().is_success() {
            return None;
        }
        Some(Self::read_error_response(response).await)
    }

    async fn read_error_response(response: Response) -> Self {
        let code = response.status().as_u16();
        let message = format!("Request failed with status code {}", code);
        let body = match response.bytes().await {
            Ok(bytes) => parse_body(&bytes),
            Err(err) => {
                tracing::warn!(status = code, error = %err, "failed to read error response body");
                None
            }
        };
        Self::with_response(code, body, message)
    }
}

/// Converts the result of sending a request into either a successful
/// response or a [`TransportError`] ready for classification.
pub async fn capture(
    result: Result<Response, reqwest::Error>,
) -> Result<Response, TransportError> {
    let response = result.map_err(|err| TransportError::from_reqwest(&err))?;
    if response.status().is_success() {
        return Ok(response);
    }
    Err(TransportError::read_error_response(response).await)
}
