//! Shared primitives used across glue crates.

use core::fmt;

/// Result alias used across the workspace.
pub type GlueResult<T> = Result<T, GlueError>;

/// Broad failure category, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A document lacks the structure the router depends on (no page root).
    Structural,
    /// Transport-level failure: DNS, connect, TLS, socket I/O.
    Network,
    /// The server answered with a non-success status.
    Http,
    /// Markup or response framing could not be turned into a usable value.
    Parse,
    /// Invalid configuration values.
    Config,
    /// A host collaborator refused an operation.
    Host,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Network => "network",
            Self::Http => "http",
            Self::Parse => "parse",
            Self::Config => "config",
            Self::Host => "host",
        }
    }
}

/// Top-level error type.
///
/// Cloneable because a single failed fetch is observed by every caller that
/// joined the same in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl GlueError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn structural(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, code, message)
    }

    pub fn network(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, code, message)
    }

    pub fn http(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Http, code, message)
    }

    pub fn parse(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, code, message)
    }

    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, code, message)
    }

    pub fn host(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, code, message)
    }

    pub fn is_structural(&self) -> bool {
        self.kind == ErrorKind::Structural
    }
}

impl fmt::Display for GlueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GlueError {}
