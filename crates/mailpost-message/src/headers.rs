//! Message header block handling.
//!
//! Envelope resolution needs the `From`/`To`/`Cc` fields, but the header
//! bytes must still reach the wire exactly as read. The block is therefore
//! kept as a borrowed byte slice; parsing only ever looks at a copy.

use crate::error::{Error, Result};

/// The raw header block of a message, up to and including the blank
/// separator line.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBlock<'a> {
    raw: &'a [u8],
}

impl<'a> HeaderBlock<'a> {
    /// Splits a message at the first blank line.
    ///
    /// Returns the header block (blank line included) and the remaining
    /// body bytes. Terminators may be LF or CRLF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedHeader`] when the message ends before a
    /// blank line.
    pub fn split(message: &'a [u8]) -> Result<(Self, &'a [u8])> {
        let mut pos = 0;
        while pos < message.len() {
            let Some(offset) = message[pos..].iter().position(|&b| b == b'\n') else {
                return Err(Error::TruncatedHeader);
            };
            let line_end = pos + offset;
            let line = &message[pos..line_end];
            let content = line.strip_suffix(b"\r").unwrap_or(line);
            if content.is_empty() {
                let header_end = line_end + 1;
                return Ok((
                    Self {
                        raw: &message[..header_end],
                    },
                    &message[header_end..],
                ));
            }
            pos = line_end + 1;
        }
        Err(Error::TruncatedHeader)
    }

    /// The verbatim header bytes for the wire.
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    /// Returns the unfolded value of the first occurrence of a field,
    /// matched case-insensitively.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        let text = String::from_utf8_lossy(self.raw);
        let mut value: Option<String> = None;
        let mut in_match = false;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            // Continuation lines extend whichever field came before them.
            if line.starts_with(' ') || line.starts_with('\t') {
                if in_match {
                    if let Some(v) = &mut value {
                        v.push(' ');
                        v.push_str(line.trim());
                    }
                }
                continue;
            }
            if value.is_some() {
                break;
            }
            in_match = false;
            if let Some((field_name, rest)) = line.split_once(':') {
                if field_name.trim().eq_ignore_ascii_case(name) {
                    in_match = true;
                    value = Some(rest.trim().to_string());
                }
            }
        }
        value
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = b"From: alice@example.com\r\n\
To: bob@example.com,\r\n\
\x20carol@example.com\r\n\
Subject: greetings\r\n\
\r\n\
Hello there.\r\n";

    #[test]
    fn split_keeps_wire_bytes() {
        let (header, body) = HeaderBlock::split(MESSAGE).unwrap();
        assert!(header.as_bytes().ends_with(b"Subject: greetings\r\n\r\n"));
        assert_eq!(body, b"Hello there.\r\n");
        // Reassembly is byte-identical to the input.
        let mut reassembled = header.as_bytes().to_vec();
        reassembled.extend_from_slice(body);
        assert_eq!(reassembled, MESSAGE);
    }

    #[test]
    fn split_with_bare_lf() {
        let msg = b"From: a@b.example\n\nbody\n";
        let (header, body) = HeaderBlock::split(msg).unwrap();
        assert_eq!(header.as_bytes(), b"From: a@b.example\n\n");
        assert_eq!(body, b"body\n");
    }

    #[test]
    fn split_without_separator_fails() {
        let msg = b"From: a@b.example\nTo: c@d.example\n";
        assert!(matches!(
            HeaderBlock::split(msg),
            Err(Error::TruncatedHeader)
        ));
    }

    #[test]
    fn split_without_final_newline_fails() {
        assert!(matches!(
            HeaderBlock::split(b"From: a@b.example"),
            Err(Error::TruncatedHeader)
        ));
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let (header, _) = HeaderBlock::split(MESSAGE).unwrap();
        assert_eq!(
            header.field("from").as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(header.field("SUBJECT").as_deref(), Some("greetings"));
        assert_eq!(header.field("Date"), None);
    }

    #[test]
    fn field_unfolds_continuations() {
        let (header, _) = HeaderBlock::split(MESSAGE).unwrap();
        assert_eq!(
            header.field("To").as_deref(),
            Some("bob@example.com, carol@example.com")
        );
    }

    #[test]
    fn field_ignores_continuations_of_other_fields() {
        let msg = b"X-Note: first\n continued: sneaky\nFrom: a@b.example\n\n";
        let (header, _) = HeaderBlock::split(msg).unwrap();
        assert_eq!(header.field("From").as_deref(), Some("a@b.example"));
        assert_eq!(header.field("continued"), None);
    }

    #[test]
    fn field_takes_first_occurrence() {
        let msg = b"To: one@example.com\nTo: two@example.com\n\n";
        let (header, _) = HeaderBlock::split(msg).unwrap();
        assert_eq!(header.field("To").as_deref(), Some("one@example.com"));
    }
}
