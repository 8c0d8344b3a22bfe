//! HTTP status codes that drive recovery dispatch.
//!
//! Only a handful of codes have a dedicated recovery path; everything else is
//! carried through as [`HttpStatus::Other`] and handled by the default arm.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of HTTP statuses the classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", from = "u16")]
pub enum HttpStatus {
    /// 308 Permanent Redirect.
    PermanentRedirect,
    /// 400 Bad Request.
    BadRequest,
    /// 401 Unauthorized.
    Unauthorized,
    /// 403 Forbidden.
    Forbidden,
    /// 404 Not Found.
    NotFound,
    /// 500 Internal Server Error.
    ServerError,
    /// Any status without a dedicated recovery path.
    Other(u16),
}

impl HttpStatus {
    /// Maps a raw status code onto the enumeration.
    pub const fn from_code(code: u16) -> Self {
        match code {
            308 => HttpStatus::PermanentRedirect,
            400 => HttpStatus::BadRequest,
            401 => HttpStatus::Unauthorized,
            403 => HttpStatus::Forbidden,
            404 => HttpStatus::NotFound,
            500 => HttpStatus::ServerError,
            other => HttpStatus::Other(other),
        }
    }

    /// Returns the numeric status code.
    pub const fn code(self) -> u16 {
        match self {
            HttpStatus::PermanentRedirect => 308,
            HttpStatus::BadRequest => 400,
            HttpStatus::Unauthorized => 401,
            HttpStatus::Forbidden => 403,
            HttpStatus::NotFound => 404,
            HttpStatus::ServerError => 500,
            HttpStatus::Other(code) => code,
        }
    }

    /// Returns true if the status has its own recovery path.
    pub const fn is_mapped(self) -> bool {
        !matches!(self, HttpStatus::Other(_))
    }
}

impl From<u16> for HttpStatus {
    fn from(code: u16) -> Self {
        HttpStatus::from_code(code)
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
