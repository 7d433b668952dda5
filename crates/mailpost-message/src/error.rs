//! Error types for message handling.

/// Result type alias for message operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message handling error types.
///
/// All of these are message-scoped: the offending message is skipped and
/// the run continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header field exists but its address list does not parse.
    #[error("{field}: malformed address list: {detail}")]
    MalformedAddressList {
        /// Header field name (`From`, `To`, `Cc`).
        field: String,
        /// What went wrong.
        detail: String,
    },

    /// The message ended before the blank line separating header and body.
    #[error("message ends before the header/body separator")]
    TruncatedHeader,
}
