//! Unified error type.

use std::net::AddrParseError;

use crate::handler::HandlerError;
use crate::method::{AllowedMethods, Method};

/// The error type returned by perch's fallible operations.
///
/// Registration errors (`PatternSyntax`, `DuplicateRoute`) come back from the
/// `Router` setup calls and leave the router untouched. Dispatch errors
/// (`MethodNotAllowed`, `Handler`, `Middleware`) come back from
/// [`Router::handle`](crate::Router::handle). An unmatched path is not an
/// error at all: it produces the `404 Not found.` response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The route pattern could not be compiled.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    PatternSyntax { pattern: String, reason: String },

    /// A structurally identical pattern is already registered.
    #[error("route `{pattern}` duplicates already registered route `{existing}`")]
    DuplicateRoute { pattern: String, existing: String },

    /// A route matched, but its handler does not serve the request method.
    #[error("method {method} not allowed for `{path}` (allowed: {})", .allowed.header_value())]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: AllowedMethods,
    },

    /// The handler failed and no exception handler was registered.
    #[error("handler for {method} `{path}` failed: {source}")]
    Handler {
        method: Method,
        path: String,
        #[source]
        source: HandlerError,
    },

    /// A middleware hook failed.
    #[error("middleware failed: {0}")]
    Middleware(#[source] HandlerError),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::PatternSyntax { pattern: pattern.to_owned(), reason: reason.into() }
    }
}
