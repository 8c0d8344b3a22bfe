//! Configuration for the classifier.
//!
//! Holds the fixed user-facing messages and the path of each logical route.
//! Values load from a TOML file and can be overridden from the environment.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::gateway::Route;

const ENV_PREFIX: &str = "CATCHPOINT";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ::config::ConfigError),

    /// The configuration parsed but breaks an invariant.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_message() -> String {
    "Error".to_string()
}

fn default_timeout_message() -> String {
    "There were problems with the database or the response wait time exceeded 15 seconds"
        .to_string()
}

/// Fixed messages published when nothing more specific is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Published when neither the transport nor the caller supplied a message.
    #[serde(default = "default_message")]
    pub default_message: String,
    /// Published when a request went out and no response came back.
    #[serde(default = "default_timeout_message")]
    pub timeout_message: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            default_message: default_message(),
            timeout_message: default_timeout_message(),
        }
    }
}

fn default_profile_path() -> String {
    "/profile".to_string()
}

fn default_sign_in_path() -> String {
    "/sign-in".to_string()
}

fn default_sign_up_path() -> String {
    "/sign-up".to_string()
}

/// Client-side path of each logical route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default = "default_profile_path")]
    pub profile: String,
    #[serde(default = "default_sign_in_path")]
    pub sign_in: String,
    #[serde(default = "default_sign_up_path")]
    pub sign_up: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            profile: default_profile_path(),
            sign_in: default_sign_in_path(),
            sign_up: default_sign_up_path(),
        }
    }
}

impl RouteTable {
    /// Returns the path for a route.
    pub fn path(&self, route: Route) -> &str {
        match route {
            Route::Profile => &self.profile,
            Route::SignIn => &self.sign_in,
            Route::SignUp => &self.sign_up,
        }
    }

    /// Resolves a path back to its route. Trailing slashes are ignored.
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let normalize = |p: &str| -> String {
            let trimmed = p.trim_end_matches('/');
            if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            }
        };
        let wanted = normalize(path);
        Route::ALL
            .into_iter()
            .find(|route| normalize(self.path(*route)) == wanted)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchpointConfig {
    #[serde(default)]
    pub messages: MessageConfig,
    #[serde(default)]
    pub routes: RouteTable,
}

impl CatchpointConfig {
    /// Load configuration from a TOML file, with environment overrides.
    ///
    /// # Environment Variable Overrides
    ///
    /// `CATCHPOINT__<SECTION>__<KEY>` overrides a file value, e.g.
    /// `CATCHPOINT__MESSAGES__DEFAULT_MESSAGE=Oops`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be parsed, or
    /// fails [`CatchpointConfig::validate`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use catchpoint::config::CatchpointConfig;
    ///
    /// let config = CatchpointConfig::load("catchpoint.toml")?;
    /// # Ok::<(), catchpoint::config::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: CatchpointConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Defaults plus environment overrides, without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: CatchpointConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks the invariants the classifier relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let messages = &self.messages;
        if messages.default_message.trim().is_empty() {
            return Err(ConfigError::Invalid("default_message must not be empty".into()));
        }
        if messages.timeout_message.trim().is_empty() {
            return Err(ConfigError::Invalid("timeout_message must not be empty".into()));
        }
        if messages.timeout_message == messages.default_message {
            return Err(ConfigError::Invalid(
                "timeout_message must differ from default_message".into(),
            ));
        }

        for route in Route::ALL {
            if self.routes.path(route).trim().is_empty() {
                return Err(ConfigError::Invalid(format!("path for route '{}' is empty", route)));
            }
        }
        for (i, a) in Route::ALL.iter().enumerate() {
            for b in &Route::ALL[i + 1..] {
                if self.routes.resolve(self.routes.path(*b)) == Some(*a) {
                    return Err(ConfigError::Invalid(format!(
                        "routes '{}' and '{}' share the path '{}'",
                        a,
                        b,
                        self.routes.path(*b)
                    )));
                }
            }
        }
        Ok(())
    }
}
