//! Failure classification and recovery dispatch
//!
//! This module sorts failed remote calls into recovery categories and
//! dispatches the matching recovery action: a redirect, a message on the
//! shared error surface, or a payload handed back to the caller.

pub mod classification;
pub mod classifier;
pub mod status;
pub mod transport;

// Re-export main types for convenient access
pub use classification::{
    categorize, ClassifierError, ClassifierResult, FailureCategory, RecoveryOutcome,
    RedirectReason, SurfaceReason,
};
pub use classifier::ErrorClassifier;
pub use status::HttpStatus;
pub use transport::{
    capture, parse_body, FailurePayload, FailureSignal, TransportError, TransportResponse,
    ValidationFailure,
};
