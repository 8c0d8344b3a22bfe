//! Catchpoint - client-side failure classification and recovery dispatch
//!
//! Given the outcome of a failed remote call, [`ErrorClassifier`] decides
//! how to recover: redirect the user, publish a message to the shared error
//! surface, or hand a structured payload back to the caller.
//!
//! ```
//! use std::sync::Arc;
//! use catchpoint::config::RouteTable;
//! use catchpoint::error::{ErrorClassifier, RecoveryOutcome, TransportError};
//! use catchpoint::gateway::{MemoryRouter, Route, SharedErrorState};
//!
//! let errors = Arc::new(SharedErrorState::new());
//! let classifier = ErrorClassifier::new(errors.clone());
//! classifier.set_navigation(Arc::new(MemoryRouter::new(RouteTable::default(), "/chats")));
//!
//! let outcome = classifier
//!     .classify("", Some(TransportError::with_response(403, None, "Forbidden")))
//!     .unwrap();
//! assert_eq!(outcome, RecoveryOutcome::Redirected(Route::SignIn));
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;

pub use error::{ErrorClassifier, FailureCategory, FailureSignal, RecoveryOutcome, TransportError};
