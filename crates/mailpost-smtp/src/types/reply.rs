//! SMTP reply types.

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply message lines.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    pub const fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full message as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns true if this code means the greeting command itself was not
    /// understood, the only condition under which EHLO may be retried as HELO.
    #[must_use]
    pub const fn is_command_unrecognized(self) -> bool {
        matches!(self.0, 500 | 502)
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Reply codes the session logic branches on
impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 500 Syntax error, command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable (not found, access denied)
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 554 Transaction failed
    pub const TRANSACTION_FAILED: Self = Self(554);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn success_codes() {
        assert!(ReplyCode::OK.is_success());
        assert!(ReplyCode::SERVICE_READY.is_success());
        assert!(ReplyCode::CLOSING.is_success());
        assert!(!ReplyCode::START_DATA.is_success());
    }

    #[test]
    fn error_classes() {
        assert!(ReplyCode::SERVICE_UNAVAILABLE.is_transient());
        assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
        assert!(ReplyCode::AUTH_FAILED.is_permanent());
        assert!(!ReplyCode::OK.is_permanent());
    }

    #[test]
    fn greeting_fallback_codes() {
        assert!(ReplyCode::SYNTAX_ERROR.is_command_unrecognized());
        assert!(ReplyCode::NOT_IMPLEMENTED.is_command_unrecognized());
        // A 504 is a parameter problem, not an unknown command; no fallback.
        assert!(!ReplyCode::new(504).is_command_unrecognized());
        assert!(!ReplyCode::TRANSACTION_FAILED.is_command_unrecognized());
    }

    #[test]
    fn message_text_joins_lines() {
        let reply = Reply::new(
            ReplyCode::OK,
            vec!["first".to_string(), "second".to_string()],
        );
        assert_eq!(reply.message_text(), "first\nsecond");
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", ReplyCode::OK), "250");
        assert_eq!(format!("{}", ReplyCode::SERVICE_UNAVAILABLE), "421");
    }
}
