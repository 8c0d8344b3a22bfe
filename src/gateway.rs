//! Collaborators the classifier drives.
//!
//! The classifier never reaches for globals: navigation and the shared error
//! surface are handed to it as trait objects. This module defines those
//! traits plus in-memory implementations usable by applications and tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::config::RouteTable;

/// Logical routes the classifier can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Profile,
    SignIn,
    SignUp,
}

impl Route {
    /// All routes, in declaration order.
    pub const ALL: [Route; 3] = [Route::Profile, Route::SignIn, Route::SignUp];

    /// Returns the logical route identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Profile => "profile",
            Route::SignIn => "sign-in",
            Route::SignUp => "sign-up",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs client-side route changes.
pub trait NavigationGateway: Send + Sync {
    /// Changes the current route.
    fn navigate_to(&self, route: Route);

    /// Returns the current route, or `None` if the client is somewhere
    /// that is not one of the logical routes.
    fn current_route(&self) -> Option<Route>;
}

/// Application-wide channel for showing an error message to the user.
///
/// Publishing is fire-and-forget and cannot fail.
pub trait ErrorSurface: Send + Sync {
    fn publish(&self, message: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A navigation gateway backed by an in-memory path history.
#[derive(Debug)]
pub struct MemoryRouter {
    routes: RouteTable,
    history: Mutex<Vec<String>>,
}

impl MemoryRouter {
    /// Creates a router whose history starts at `initial_path`.
    pub fn new(routes: RouteTable, initial_path: impl Into<String>) -> Self {
        Self {
            routes,
            history: Mutex::new(vec![initial_path.into()]),
        }
    }

    /// Returns the path at the top of the history.
    pub fn current_path(&self) -> String {
        lock(&self.history).last().cloned().unwrap_or_default()
    }

    /// Returns every path visited, oldest first.
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    /// Returns the route table used to resolve paths.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

impl NavigationGateway for MemoryRouter {
    fn navigate_to(&self, route: Route) {
        let path = self.routes.path(route).to_string();
        tracing::debug!(route = %route, path = %path, "navigating");
        lock(&self.history).push(path);
    }

    fn current_route(&self) -> Option<Route> {
        self.routes.resolve(&self.current_path())
    }
}

/// The shared error slot: holds the most recently published message.
#[derive(Debug, Default)]
pub struct SharedErrorState {
    current: Mutex<Option<String>>,
    published: AtomicUsize,
}

impl SharedErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the message currently on display, if any.
    pub fn current(&self) -> Option<String> {
        lock(&self.current).clone()
    }

    /// Dismisses the current message.
    pub fn clear(&self) {
        *lock(&self.current) = None;
    }

    /// Number of messages published since creation.
    pub fn published_count(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }
}

impl ErrorSurface for SharedErrorState {
    fn publish(&self, message: &str) {
        *lock(&self.current) = Some(message.to_string());
        self.published.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_identifiers() {
        assert_eq!(Route::Profile.as_str(), "profile");
        assert_eq!(Route::SignIn.to_string(), "sign-in");
        assert_eq!(serde_json::to_string(&Route::SignUp).unwrap(), "\"sign-up\"");
    }

    #[test]
    fn test_memory_router_navigates_and_resolves() {
        let router = MemoryRouter::new(RouteTable::default(), "/dashboard");
        assert_eq!(router.current_route(), None);

        router.navigate_to(Route::SignUp);
        assert_eq!(router.current_path(), "/sign-up");
        assert_eq!(router.current_route(), Some(Route::SignUp));

        router.navigate_to(Route::Profile);
        assert_eq!(router.history(), vec!["/dashboard", "/sign-up", "/profile"]);
    }

    #[test]
    fn test_shared_error_state_publish_and_clear() {
        let state = SharedErrorState::new();
        assert_eq!(state.current(), None);

        state.publish("first");
        state.publish("second");
        assert_eq!(state.current().as_deref(), Some("second"));
        assert_eq!(state.published_count(), 2);

        state.clear();
        assert_eq!(state.current(), None);
        assert_eq!(state.published_count(), 2);
    }
}
