//! Mail transaction execution.
//!
//! Drives exactly one message through MAIL/RCPT/DATA on a `Ready` session,
//! applying the recipient-acceptance policies and performing the recovery
//! (reset or disconnect) the [classifier](crate::classify) dictates before
//! handing the outcome back to the caller.

use crate::classify::{Verdict, classify};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::ReplyCode;
use mailpost_message::normalize_crlf;
use tracing::warn;

/// Policies and decorations applied to one submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Abort the message on the first rejected recipient.
    pub abort_on_any_bad: bool,
    /// Proceed to DATA even when every recipient was rejected.
    pub ignore_all_bad: bool,
    /// Skip CRLF normalization of the message bytes. Only sensible for
    /// protocol conformance testing; servers may reject bare line feeds
    /// unpredictably.
    pub raw_line_endings: bool,
    /// Trace header line (without terminator) to prepend to the message.
    pub received_header: Option<String>,
}

/// Message bytes to put on the wire.
///
/// When the header block was pre-read for envelope resolution it is carried
/// separately and written first, byte for byte; header extraction never
/// alters what reaches the wire.
#[derive(Debug, Clone, Copy)]
pub struct MessagePayload<'a> {
    /// Pre-read header block, if envelope resolution consumed it.
    pub header: Option<&'a [u8]>,
    /// Remainder of the message.
    pub body: &'a [u8],
}

/// Per-recipient result of the RCPT exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientStatus {
    /// Server accepted the recipient.
    Accepted,
    /// Server rejected the recipient.
    Rejected {
        /// Reply code.
        code: u16,
        /// Server reply text.
        reason: String,
    },
}

/// One recipient's address and status, in RCPT issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    /// Recipient address as issued.
    pub address: String,
    /// What the server said.
    pub status: RecipientStatus,
}

/// Overall fate of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Message accepted for delivery.
    Sent,
    /// Message not attempted past RCPT; nothing was transmitted.
    Skipped {
        /// Why the message was skipped.
        reason: String,
    },
    /// Transaction started but abandoned.
    Aborted {
        /// Why the message was abandoned.
        reason: String,
    },
}

/// Result of one MAIL/RCPT/DATA sequence.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Per-recipient statuses, preserving RCPT order.
    pub recipients: Vec<RecipientOutcome>,
    /// Overall message status.
    pub disposition: Disposition,
}

impl Outcome {
    /// Number of recipients the server accepted.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| r.status == RecipientStatus::Accepted)
            .count()
    }

    /// True when the message was accepted for delivery.
    #[must_use]
    pub const fn was_sent(&self) -> bool {
        matches!(self.disposition, Disposition::Sent)
    }
}

/// Executes one message transaction on a `Ready` session.
///
/// An `Err` return is session-fatal: the connection has already been
/// dropped and no further message should be attempted on it. Message-scoped
/// failures come back as `Ok` with a non-`Sent` disposition after the
/// connection has been reset for the next message.
///
/// # Errors
///
/// Returns an error when the failure (as classified against the phase it
/// occurred in) requires dropping the connection, or when the recovery
/// RSET itself fails.
pub async fn submit(
    session: &mut Session,
    sender: &str,
    recipients: &[String],
    payload: MessagePayload<'_>,
    opts: &SubmitOptions,
) -> Result<Outcome> {
    if let Err(err) = session.mail_from(sender).await {
        return recover(session, err, Vec::new()).await;
    }

    let mut statuses = Vec::with_capacity(recipients.len());
    let mut accepted = 0usize;
    let mut any_rejected = false;
    for address in recipients {
        let reply = match session.rcpt_to(address).await {
            Ok(reply) => reply,
            Err(err) => return recover(session, err, statuses).await,
        };
        if reply.is_success() {
            accepted += 1;
            statuses.push(RecipientOutcome {
                address: address.clone(),
                status: RecipientStatus::Accepted,
            });
            continue;
        }
        if reply.code == ReplyCode::SERVICE_UNAVAILABLE {
            return recover(session, Error::from_reply(&reply), statuses).await;
        }
        warn!(%address, code = %reply.code, "recipient rejected");
        any_rejected = true;
        statuses.push(RecipientOutcome {
            address: address.clone(),
            status: RecipientStatus::Rejected {
                code: reply.code.as_u16(),
                reason: reply.message_text(),
            },
        });
        if opts.abort_on_any_bad {
            // First rejection stops further RCPT issuance.
            break;
        }
    }

    // Recipient-count policy. Abort-on-any-bad wins over ignore-all-bad
    // when both are set. A failed RSET here propagates as session-fatal.
    if opts.abort_on_any_bad && any_rejected {
        session.reset().await?;
        return Ok(Outcome {
            recipients: statuses,
            disposition: Disposition::Aborted {
                reason: "recipient rejected".to_string(),
            },
        });
    }
    if accepted == 0 && !opts.ignore_all_bad {
        session.reset().await?;
        return Ok(Outcome {
            recipients: statuses,
            disposition: Disposition::Skipped {
                reason: "no recipients accepted".to_string(),
            },
        });
    }

    if let Err(err) = session.data_begin().await {
        return recover(session, err, statuses).await;
    }
    let wire = frame_message(payload, opts);
    if let Err(err) = session.data_finish(&wire).await {
        return recover(session, err, statuses).await;
    }

    Ok(Outcome {
        recipients: statuses,
        disposition: Disposition::Sent,
    })
}

/// Applies the classifier's verdict after a wire failure.
///
/// This is the single, explicit cleanup path for the transaction: reset and
/// continue for message-fatal failures, disconnect and bubble up for
/// session-fatal ones. A reset that fails escalates to session-fatal while
/// still reporting the original error.
async fn recover(
    session: &mut Session,
    error: Error,
    recipients: Vec<RecipientOutcome>,
) -> Result<Outcome> {
    match classify(&error, session.phase()) {
        Verdict::SessionFatal => {
            session.disconnect();
            Err(error)
        }
        Verdict::MessageFatal => {
            warn!(error = %error, "message failed; resetting session");
            if session.reset().await.is_err() {
                return Err(error);
            }
            Ok(Outcome {
                recipients,
                disposition: Disposition::Aborted {
                    reason: error.to_string(),
                },
            })
        }
    }
}

/// Assembles the wire form of the message: optional trace header, pre-read
/// header bytes, body, CRLF normalization (unless disabled), dot stuffing,
/// and the terminating dot line.
fn frame_message(payload: MessagePayload<'_>, opts: &SubmitOptions) -> Vec<u8> {
    let mut message = Vec::new();
    if let Some(received) = &opts.received_header {
        message.extend_from_slice(received.as_bytes());
        message.extend_from_slice(b"\r\n");
    }
    if let Some(header) = payload.header {
        message.extend_from_slice(header);
    }
    message.extend_from_slice(payload.body);

    let message = if opts.raw_line_endings {
        message
    } else {
        normalize_crlf(&message)
    };
    terminate(&message)
}

/// Dot-stuffs line starts, guarantees a trailing CRLF, and appends the
/// end-of-data dot line.
fn terminate(message: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(message.len() + 8);
    let mut at_line_start = true;
    for &byte in message {
        if at_line_start && byte == b'.' {
            wire.push(b'.');
        }
        wire.push(byte);
        at_line_start = byte == b'\n';
    }
    if !wire.ends_with(b"\r\n") {
        wire.extend_from_slice(b"\r\n");
    }
    wire.extend_from_slice(b".\r\n");
    wire
}
