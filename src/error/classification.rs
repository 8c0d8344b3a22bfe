//! Failure taxonomy for the recovery dispatcher
//!
//! Failures are sorted into four categories, each resolved a different way:
//! redirectable failures by navigation, structured failures by returning data
//! to the caller, surfaced failures by publishing a message, and timeouts by
//! publishing a fixed timeout message.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{FailurePayload, FailureSignal, HttpStatus};
use crate::gateway::Route;

/// Why a failure is resolved by navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// The resource moved for good (HTTP 308).
    PermanentRedirect,
    /// The session is missing or expired (HTTP 401).
    Unauthorized,
    /// The session lacks access (HTTP 403).
    Forbidden,
}

/// Why a failure is resolved by publishing to the shared error surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceReason {
    /// HTTP 404.
    NotFound,
    /// HTTP 500.
    ServerError,
    /// A status with no dedicated recovery path.
    UnmappedStatus(u16),
    /// An application failure with no transport information.
    NoTransport,
    /// The request never left the client.
    RequestNotSent,
}

/// The category of a failure, determining how it is recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum FailureCategory {
    /// Resolved by navigation; the caller gets no payload.
    Redirectable(RedirectReason),
    /// Resolved by returning caller-actionable data (HTTP 400).
    Structured,
    /// Resolved by publishing the effective message.
    Surfaced(SurfaceReason),
    /// A request went out and no response came back.
    Timeout,
}

impl FailureCategory {
    /// Returns true if this failure is resolved by navigation.
    pub fn is_redirectable(&self) -> bool {
        matches!(self, FailureCategory::Redirectable(_))
    }

    /// Returns true if this failure hands data back to the caller.
    pub fn is_structured(&self) -> bool {
        matches!(self, FailureCategory::Structured)
    }

    /// Returns true if this failure publishes the effective message.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, FailureCategory::Surfaced(_))
    }

    /// Returns true if this failure is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureCategory::Timeout)
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::Redirectable(_) => write!(f, "redirectable"),
            FailureCategory::Structured => write!(f, "structured"),
            FailureCategory::Surfaced(_) => write!(f, "surfaced"),
            FailureCategory::Timeout => write!(f, "timeout"),
        }
    }
}

/// Sorts a failure into its category.
///
/// Pure: depends only on the signal. The decision order is: no transport
/// error, then response status, then request-sent-without-response, then
/// request-never-sent.
pub fn categorize(signal: &FailureSignal) -> FailureCategory {
    let Some(transport) = &signal.transport else {
        return FailureCategory::Surfaced(SurfaceReason::NoTransport);
    };

    match transport.status() {
        Some(status) => match status {
            HttpStatus::PermanentRedirect => {
                FailureCategory::Redirectable(RedirectReason::PermanentRedirect)
            }
            HttpStatus::BadRequest => FailureCategory::Structured,
            HttpStatus::Unauthorized => FailureCategory::Redirectable(RedirectReason::Unauthorized),
            HttpStatus::Forbidden => FailureCategory::Redirectable(RedirectReason::Forbidden),
            HttpStatus::NotFound => FailureCategory::Surfaced(SurfaceReason::NotFound),
            HttpStatus::ServerError => FailureCategory::Surfaced(SurfaceReason::ServerError),
            HttpStatus::Other(code) => FailureCategory::Surfaced(SurfaceReason::UnmappedStatus(code)),
        },
        None if transport.has_request() => FailureCategory::Timeout,
        None => FailureCategory::Surfaced(SurfaceReason::RequestNotSent),
    }
}

/// What the dispatcher did about a failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// A navigation was issued to the given route.
    Redirected(Route),
    /// The given message was published to the shared error surface.
    Published(String),
    /// No side effect; the caller renders the payload.
    Payload(FailurePayload),
}

impl RecoveryOutcome {
    /// Returns the payload for the caller, or `None` when a side effect
    /// already resolved the failure.
    pub fn into_payload(self) -> Option<FailurePayload> {
        match self {
            RecoveryOutcome::Payload(payload) => Some(payload),
            RecoveryOutcome::Redirected(_) | RecoveryOutcome::Published(_) => None,
        }
    }

    /// Borrowing form of [`RecoveryOutcome::into_payload`].
    pub fn payload(&self) -> Option<&FailurePayload> {
        match self {
            RecoveryOutcome::Payload(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns true if the user was sent to another route.
    pub fn is_redirected(&self) -> bool {
        matches!(self, RecoveryOutcome::Redirected(_))
    }

    /// Returns true if a message went to the error surface.
    pub fn is_published(&self) -> bool {
        matches!(self, RecoveryOutcome::Published(_))
    }
}

/// Errors the classifier itself can raise.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierError {
    /// A redirect path was taken before a navigation gateway was bound.
    #[error("cannot navigate to '{route}': no navigation gateway is bound")]
    NavigationUnbound { route: Route },
}

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;
