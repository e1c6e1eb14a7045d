//! Error types for bus access.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors raised while reading from or calling into the remote object graph.
#[derive(Debug, Error)]
pub enum BusError {
    /// The daemon executed the call and reported a failure.
    ///
    /// `name` is the bus error name when the transport exposes it. Some
    /// transports (notably `busctl`) only surface the message.
    #[error("remote operation failed: {message}")]
    Remote {
        /// Error name, e.g. `org.freedesktop.UDisks2.Error.Failed`.
        name: Option<String>,
        /// Human-readable message from the daemon.
        message: String,
    },

    /// No object is exported at the path.
    #[error("object does not exist at path {0}")]
    NoSuchObject(String),

    /// The object exists but does not carry the interface.
    #[error("no such interface '{interface}' on object at path {path}")]
    NoSuchInterface {
        /// Object path.
        path: String,
        /// Interface name.
        interface: String,
    },

    /// The interface exists but does not carry the property.
    #[error("no such property '{property}' on interface '{interface}' at path {path}")]
    NoSuchProperty {
        /// Object path.
        path: String,
        /// Interface name.
        interface: String,
        /// Property name.
        property: String,
    },

    /// The call did not complete within its transport timeout.
    #[error("method {method} did not complete within {timeout:?}")]
    Timeout {
        /// Fully qualified method name.
        method: String,
        /// Transport timeout that elapsed.
        timeout: Duration,
    },

    /// The transport itself failed (bus unreachable, tool missing, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A reply could not be decoded into the expected shape.
    #[error("failed to decode reply: {0}")]
    Decode(String),

    /// I/O error while driving the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BusError {
    /// Creates a remote failure carrying an error name.
    #[must_use]
    pub fn remote(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            name: Some(name.into()),
            message: message.into(),
        }
    }

    /// Creates a remote failure without an error name.
    #[must_use]
    pub fn remote_message(message: impl Into<String>) -> Self {
        Self::Remote {
            name: None,
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Returns true if the daemon itself reported the failure.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns true if the addressed object or interface is gone.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::NoSuchObject(_) | Self::NoSuchInterface { .. } | Self::NoSuchProperty { .. }
        )
    }

    /// Returns the remote error name, if one was reported.
    #[must_use]
    pub fn remote_name(&self) -> Option<&str> {
        match self {
            Self::Remote { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the error's name or rendered message contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.remote_name().is_some_and(|n| n.contains(needle)) || self.to_string().contains(needle)
    }
}
