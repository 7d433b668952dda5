//! Error types for SMTP operations.

use crate::types::Reply;
use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// An operation did not complete within its deadline.
    #[error("timed out during {0}")]
    Timeout(&'static str),

    /// Server returned an error response.
    #[error("SMTP error {code}: {message}")]
    Smtp {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected or malformed response).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// TLS was required but the server does not offer it.
    #[error("server does not support STARTTLS")]
    TlsUnavailable,
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp(code: u16, message: impl Into<String>) -> Self {
        Self::Smtp {
            code,
            message: message.into(),
        }
    }

    /// Creates an SMTP error from a full server reply, preserving its text.
    #[must_use]
    pub fn from_reply(reply: &Reply) -> Self {
        Self::Smtp {
            code: reply.code.as_u16(),
            message: reply.message_text(),
        }
    }

    /// Returns true if the server announced it is closing the channel (421).
    #[must_use]
    pub const fn is_server_disconnect(&self) -> bool {
        matches!(self, Self::Smtp { code: 421, .. })
    }

    /// Returns true if this error occurred below the protocol layer.
    ///
    /// Transport errors leave the connection in an unknown state and always
    /// force a disconnect, regardless of session phase.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Reply, ReplyCode};

    #[test]
    fn smtp_error_display() {
        let err = Error::smtp(550, "mailbox unavailable");
        assert_eq!(err.to_string(), "SMTP error 550: mailbox unavailable");
    }

    #[test]
    fn from_reply_keeps_text() {
        let reply = Reply::new(
            ReplyCode::new(421),
            vec!["service shutting down".to_string()],
        );
        let err = Error::from_reply(&reply);
        assert!(err.is_server_disconnect());
        assert!(err.to_string().contains("service shutting down"));
    }

    #[test]
    fn transport_classification() {
        assert!(Error::Timeout("connect").is_transport());
        assert!(Error::Io(std::io::Error::other("boom")).is_transport());
        assert!(!Error::smtp(550, "no").is_transport());
    }
}
