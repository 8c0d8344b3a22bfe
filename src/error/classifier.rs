//! Recovery dispatcher
//!
//! [`ErrorClassifier`] takes a failed call, sorts it with
//! [`categorize`](super::categorize), and performs exactly one recovery
//! action: navigate, publish a message, or hand a payload back.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use super::{
    categorize, ClassifierError, ClassifierResult, FailureCategory, FailurePayload, FailureSignal,
    RecoveryOutcome, RedirectReason, TransportError,
};
use crate::config::{CatchpointConfig, MessageConfig};
use crate::gateway::{ErrorSurface, NavigationGateway, Route};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Classifies failed remote calls and performs the matching recovery action.
///
/// The error surface is fixed at construction. The navigation gateway is
/// bound later with [`ErrorClassifier::set_navigation`], once the UI is
/// mounted; taking a redirect path before that returns
/// [`ClassifierError::NavigationUnbound`].
///
/// The classifier can be shared across tasks. [`ErrorClassifier::error`]
/// reflects whichever `classify` call wrote last; reads made while several
/// failures are being classified at once are not ordered.
pub struct ErrorClassifier {
    surface: Arc<dyn ErrorSurface>,
    navigation: RwLock<Option<Arc<dyn NavigationGateway>>>,
    messages: MessageConfig,
    last_message: Mutex<Option<String>>,
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("messages", &self.messages)
            .field("navigation_bound", &self.has_navigation())
            .field("last_message", &*lock(&self.last_message))
            .finish()
    }
}

impl ErrorClassifier {
    /// Creates a classifier with the default messages.
    pub fn new(surface: Arc<dyn ErrorSurface>) -> Self {
        Self::with_messages(surface, MessageConfig::default())
    }

    /// Creates a classifier with custom messages.
    pub fn with_messages(surface: Arc<dyn ErrorSurface>, messages: MessageConfig) -> Self {
        Self {
            surface,
            navigation: RwLock::new(None),
            messages,
            last_message: Mutex::new(None),
        }
    }

    /// Creates a classifier using the messages from a loaded configuration.
    pub fn from_config(surface: Arc<dyn ErrorSurface>, config: &CatchpointConfig) -> Self {
        Self::with_messages(surface, config.messages.clone())
    }

    /// Binds the navigation gateway, replacing any previous one.
    pub fn set_navigation(&self, gateway: Arc<dyn NavigationGateway>) {
        let mut slot = self
            .navigation
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(gateway);
    }

    /// Returns true once a navigation gateway has been bound.
    pub fn has_navigation(&self) -> bool {
        self.navigation
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// The messages this classifier publishes.
    pub fn messages(&self) -> &MessageConfig {
        &self.messages
    }

    /// The effective message of the last classified failure, or the default
    /// message if nothing has been classified yet.
    pub fn error(&self) -> String {
        lock(&self.last_message)
            .clone()
            .unwrap_or_else(|| self.messages.default_message.clone())
    }

    /// The message shown for a surfaced failure: the transport message
    /// whenever a transport error exists (even if empty), else the caller's
    /// message, else the default.
    pub fn effective_message(&self, signal: &FailureSignal) -> String {
        signal
            .transport
            .as_ref()
            .map(|t| t.message())
            .or_else(|| non_empty(&signal.raw_message))
            .unwrap_or(self.messages.default_message.as_str())
            .to_string()
    }

    /// Classifies a failure and performs its recovery action.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::NavigationUnbound`] if the failure calls for
    /// a redirect and no navigation gateway is bound. No other input fails.
    pub fn classify(
        &self,
        raw_message: impl Into<String>,
        transport: Option<TransportError>,
    ) -> ClassifierResult<RecoveryOutcome> {
        let signal = FailureSignal {
            raw_message: raw_message.into(),
            transport,
        };
        self.classify_signal(&signal)
    }

    /// Same as [`ErrorClassifier::classify`], for a prebuilt signal.
    pub fn classify_signal(&self, signal: &FailureSignal) -> ClassifierResult<RecoveryOutcome> {
        let message = self.effective_message(signal);
        *lock(&self.last_message) = Some(message.clone());

        if let Some(transport) = &signal.transport {
            tracing::error!(
                error = %transport,
                has_response = transport.has_response(),
                has_request = transport.has_request(),
                status = transport.status().map(|s| s.code()),
                "remote call failed"
            );
        }

        let category = categorize(signal);
        let outcome = match category {
            FailureCategory::Redirectable(RedirectReason::PermanentRedirect) => {
                self.redirect(Route::Profile)?
            }
            FailureCategory::Redirectable(RedirectReason::Unauthorized) => {
                self.redirect_unauthorized()?
            }
            FailureCategory::Redirectable(RedirectReason::Forbidden) => {
                self.redirect(Route::SignIn)?
            }
            FailureCategory::Structured => RecoveryOutcome::Payload(self.bad_request_payload(signal)),
            FailureCategory::Surfaced(_) => self.publish(message),
            FailureCategory::Timeout => self.publish(self.messages.timeout_message.clone()),
        };

        tracing::debug!(category = %category, outcome = ?outcome, "failure classified");
        Ok(outcome)
    }

    fn gateway(&self, route: Route) -> ClassifierResult<Arc<dyn NavigationGateway>> {
        self.navigation
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(ClassifierError::NavigationUnbound { route })
    }

    fn redirect(&self, route: Route) -> ClassifierResult<RecoveryOutcome> {
        self.gateway(route)?.navigate_to(route);
        Ok(RecoveryOutcome::Redirected(route))
    }

    // Already on sign-up: navigate to sign-up again rather than to sign-in.
    fn redirect_unauthorized(&self) -> ClassifierResult<RecoveryOutcome> {
        let gateway = self.gateway(Route::SignIn)?;
        let target = match gateway.current_route() {
            Some(Route::SignUp) => Route::SignUp,
            _ => Route::SignIn,
        };
        gateway.navigate_to(target);
        Ok(RecoveryOutcome::Redirected(target))
    }

    fn bad_request_payload(&self, signal: &FailureSignal) -> FailurePayload {
        let transport = signal.transport.as_ref();
        if let Some(body) = transport.and_then(|t| t.body()).filter(|b| !b.is_null()) {
            return FailurePayload::from_value(body.clone());
        }

        let message = transport
            .and_then(|t| non_empty(t.message()))
            .or_else(|| non_empty(&signal.raw_message))
            .unwrap_or(self.messages.default_message.as_str());
        FailurePayload::Message(message.to_string())
    }

    fn publish(&self, message: String) -> RecoveryOutcome {
        self.surface.publish(&message);
        RecoveryOutcome::Published(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SharedErrorState;
    use serde_json::json;

    fn classifier() -> (Arc<SharedErrorState>, ErrorClassifier) {
        let state = Arc::new(SharedErrorState::new());
        let classifier = ErrorClassifier::new(state.clone());
        (state, classifier)
    }

    #[test]
    fn test_error_defaults_before_first_call() {
        let (_, classifier) = classifier();
        assert_eq!(classifier.error(), "Error");
        assert!(!classifier.has_navigation());
    }

    #[test]
    fn test_plain_failure_publishes_raw_message() {
        let (state, classifier) = classifier();
        let outcome = classifier.classify("Could not load chats", None).unwrap();

        assert_eq!(outcome, RecoveryOutcome::Published("Could not load chats".into()));
        assert_eq!(state.current().as_deref(), Some("Could not load chats"));
        assert_eq!(classifier.error(), "Could not load chats");
    }

    #[test]
    fn test_plain_failure_with_empty_message_publishes_default() {
        let (state, classifier) = classifier();
        classifier.classify("", None).unwrap();
        assert_eq!(state.current().as_deref(), Some("Error"));
    }

    #[test]
    fn test_effective_message_prefers_transport_message_even_when_empty() {
        let (state, classifier) = classifier();
        let signal = FailureSignal::new("raw").with_transport(TransportError::not_sent(""));
        assert_eq!(classifier.effective_message(&signal), "");

        classifier
            .classify("raw", Some(TransportError::with_response(500, None, "")))
            .unwrap();
        assert_eq!(state.current().as_deref(), Some(""));
        assert_eq!(classifier.error(), "");
    }

    #[test]
    fn test_redirect_without_navigation_is_an_error() {
        let (state, classifier) = classifier();
        let result = classifier.classify(
            "",
            Some(TransportError::with_response(403, None, "Forbidden")),
        );

        assert_eq!(
            result,
            Err(ClassifierError::NavigationUnbound { route: Route::SignIn })
        );
        assert_eq!(state.published_count(), 0);
    }

    #[test]
    fn test_bad_request_returns_body_without_side_effects() {
        let (state, classifier) = classifier();
        let body = json!({"success": false, "message": "x", "field": "email"});
        let outcome = classifier
            .classify("", Some(TransportError::with_response(400, Some(body), "bad")))
            .unwrap();

        let payload = outcome.into_payload().unwrap();
        assert_eq!(payload.as_validation().unwrap().field.as_deref(), Some("email"));
        assert_eq!(state.published_count(), 0);
    }

    #[test]
    fn test_bad_request_null_body_falls_back_to_message() {
        let (_, classifier) = classifier();
        let outcome = classifier
            .classify(
                "",
                Some(TransportError::with_response(400, Some(serde_json::Value::Null), "bad")),
            )
            .unwrap();
        assert_eq!(outcome, RecoveryOutcome::Payload(FailurePayload::Message("bad".into())));
    }

    #[test]
    fn test_timeout_uses_custom_message() {
        let state = Arc::new(SharedErrorState::new());
        let messages = MessageConfig {
            default_message: "Oops".into(),
            timeout_message: "Server is slow".into(),
        };
        let classifier = ErrorClassifier::with_messages(state.clone(), messages);

        classifier
            .classify("x", Some(TransportError::without_response("timeout")))
            .unwrap();
        assert_eq!(state.current().as_deref(), Some("Server is slow"));
        assert_eq!(classifier.error(), "timeout");
    }
}
