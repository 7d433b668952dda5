//! Envelope resolution.
//!
//! The envelope — the MAIL FROM sender and RCPT TO recipients — is distinct
//! from the address headers inside the message. It is either supplied
//! explicitly or derived from the `From`/`To`/`Cc` header fields, never a
//! merge of the two recipient sources.

use crate::address::parse_address_list;
use crate::error::Result;
use crate::headers::HeaderBlock;

/// Per-message envelope addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender address. Empty means the null (bounce) sender.
    pub sender: String,
    /// Recipient addresses, duplicates permitted, order preserved.
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Builds an envelope from explicitly supplied addresses, unmodified.
    #[must_use]
    pub fn from_explicit(sender: &str, recipients: &[String]) -> Self {
        Self {
            sender: sender.to_string(),
            recipients: recipients.to_vec(),
        }
    }

    /// Derives an envelope from the message header.
    ///
    /// The sender comes from `From` unless `sender_override` is given, which
    /// always wins. Recipients are the union of `To` and `Cc` in field
    /// order. A missing field is fine — a missing `From` yields the null
    /// sender — but a field that is present and malformed is an error and
    /// the message must be skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when a present `From`, `To`, or `Cc` field fails to
    /// parse.
    pub fn from_headers(header: &HeaderBlock<'_>, sender_override: Option<&str>) -> Result<Self> {
        let sender = match sender_override {
            Some(explicit) => explicit.to_string(),
            None => match header.field("From") {
                Some(value) => parse_address_list("From", &value)?
                    .into_iter()
                    .next()
                    .unwrap_or_default(),
                None => String::new(),
            },
        };

        let mut recipients = Vec::new();
        for field in ["To", "Cc"] {
            if let Some(value) = header.field(field) {
                recipients.extend(parse_address_list(field, &value)?);
            }
        }

        Ok(Self { sender, recipients })
    }

    /// Sender rendered for reporting, `<>` for the null sender.
    #[must_use]
    pub fn sender_display(&self) -> &str {
        if self.sender.is_empty() {
            "<>"
        } else {
            &self.sender
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn header(raw: &[u8]) -> HeaderBlock<'_> {
        HeaderBlock::split(raw).unwrap().0
    }

    #[test]
    fn explicit_passthrough() {
        let envelope = Envelope::from_explicit(
            "sender@example.com",
            &["a@example.com".to_string(), "a@example.com".to_string()],
        );
        assert_eq!(envelope.sender, "sender@example.com");
        // Duplicates are preserved, not collapsed.
        assert_eq!(envelope.recipients.len(), 2);
    }

    #[test]
    fn derives_all_fields() {
        let h = header(
            b"From: Alice <alice@example.com>\n\
To: bob@example.com\n\
Cc: carol@example.com, dave@example.com\n\n",
        );
        let envelope = Envelope::from_headers(&h, None).unwrap();
        assert_eq!(envelope.sender, "alice@example.com");
        assert_eq!(
            envelope.recipients,
            vec!["bob@example.com", "carol@example.com", "dave@example.com"]
        );
    }

    #[test]
    fn override_beats_header_sender() {
        let h = header(b"From: alice@example.com\nTo: bob@example.com\n\n");
        let envelope = Envelope::from_headers(&h, Some("postmaster@example.com")).unwrap();
        assert_eq!(envelope.sender, "postmaster@example.com");
    }

    #[test]
    fn missing_from_means_null_sender() {
        let h = header(b"To: bob@example.com\n\n");
        let envelope = Envelope::from_headers(&h, None).unwrap();
        assert_eq!(envelope.sender, "");
        assert_eq!(envelope.sender_display(), "<>");
    }

    #[test]
    fn missing_recipient_fields_yield_empty_list() {
        let h = header(b"From: alice@example.com\n\n");
        let envelope = Envelope::from_headers(&h, None).unwrap();
        assert!(envelope.recipients.is_empty());
    }

    #[test]
    fn malformed_to_is_an_error() {
        let h = header(b"From: alice@example.com\nTo: bob@example.com, <broken\n\n");
        let err = Envelope::from_headers(&h, None).unwrap_err();
        assert!(err.to_string().contains("To"));
    }

    #[test]
    fn malformed_cc_is_an_error() {
        let h = header(b"To: bob@example.com\nCc: not-an-address\n\n");
        assert!(Envelope::from_headers(&h, None).is_err());
    }

    #[test]
    fn malformed_from_ignored_when_overridden() {
        // The override makes the broken From irrelevant to the envelope...
        // but To/Cc must still parse. From is only consulted when needed.
        let h = header(b"From: <broken\nTo: bob@example.com\n\n");
        let envelope = Envelope::from_headers(&h, Some("s@example.com")).unwrap();
        assert_eq!(envelope.sender, "s@example.com");
    }
}
