//! SMTP response parser.

use crate::error::{Error, Result};

/// One parsed line of a server reply.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyLine<'a> {
    /// Three-digit reply code.
    pub code: u16,
    /// True on the final line of the reply (space separator).
    pub last: bool,
    /// Text after the code and separator.
    pub text: &'a str,
}

/// Parses a single reply line.
///
/// A bare three-digit line (`250`) is accepted as a final line with empty
/// text; some servers send it.
///
/// # Errors
///
/// Returns an error if the line has no leading three-digit code or an
/// unrecognized separator.
pub fn parse_reply_line(line: &str) -> Result<ReplyLine<'_>> {
    let code = line
        .get(0..3)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| Error::Protocol(format!("malformed reply line: {line:?}")))?;

    match line.get(3..4) {
        None => Ok(ReplyLine {
            code,
            last: true,
            text: "",
        }),
        Some(" ") => Ok(ReplyLine {
            code,
            last: true,
            text: line.get(4..).unwrap_or(""),
        }),
        Some("-") => Ok(ReplyLine {
            code,
            last: false,
            text: line.get(4..).unwrap_or(""),
        }),
        Some(_) => Err(Error::Protocol(format!("malformed reply line: {line:?}"))),
    }
}
