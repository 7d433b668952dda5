//! Run orchestration.
//!
//! Walks the message list in order, resolving each envelope, lazily
//! establishing the shared session, and submitting one transaction per
//! message. Message-scoped failures skip the message and continue; the
//! first session-fatal failure aborts the run.

use crate::config::{Config, EnvelopeMode, Input};
use anyhow::Context;
use chrono::Local;
use mailpost_message::{Envelope, HeaderBlock, received_header};
use mailpost_smtp::{
    Disposition, MessagePayload, RecipientStatus, Session, SubmitOptions, Trace, submit,
};
use std::io::Read;
use tracing::{error, warn};

/// Protocol trace sink writing to stdout, `>>` for client lines.
struct StdoutTrace;

impl Trace for StdoutTrace {
    fn line(&mut self, outbound: bool, text: &str) {
        let prefix = if outbound { ">>" } else { "<<" };
        println!("{prefix} {text}");
    }
}

/// Processes every configured input against one (reusable) session.
///
/// # Errors
///
/// Returns an error on the first session-fatal failure; individual message
/// skips are reported but do not fail the run.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let mut session = Session::new(config.session_config());
    if config.trace {
        session = session.with_trace(Box::new(StdoutTrace));
    }

    for input in &config.inputs {
        let source = input.label();

        let bytes = match read_input(input) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(%source, %err, "cannot read message");
                continue;
            }
        };

        let (payload, envelope) = match resolve_message(config, &bytes) {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(%source, %err, "skipping message");
                continue;
            }
        };

        if config.verbose {
            println!(
                "{source}: from {} to {}",
                envelope.sender_display(),
                envelope.recipients.join(", ")
            );
        }

        session
            .ensure_ready()
            .await
            .with_context(|| format!("{source}: cannot establish session"))?;

        let opts = SubmitOptions {
            abort_on_any_bad: config.abort_on_any_bad,
            ignore_all_bad: config.ignore_all_bad,
            raw_line_endings: config.raw_line_endings,
            received_header: config
                .add_received
                .then(|| received_header(&config.helo_name, Local::now().fixed_offset())),
        };

        let outcome = submit(
            &mut session,
            &envelope.sender,
            &envelope.recipients,
            payload,
            &opts,
        )
        .await
        .with_context(|| source.clone())?;

        match &outcome.disposition {
            Disposition::Sent => {
                if config.verbose {
                    println!(
                        "{source}: sent to {} of {} recipient(s)",
                        outcome.accepted(),
                        outcome.recipients.len()
                    );
                }
            }
            Disposition::Skipped { reason } => warn!(%source, %reason, "message skipped"),
            Disposition::Aborted { reason } => warn!(%source, %reason, "message aborted"),
        }
        if config.verbose {
            for recipient in &outcome.recipients {
                if let RecipientStatus::Rejected { code, reason } = &recipient.status {
                    println!("{source}:   {} rejected ({code} {reason})", recipient.address);
                }
            }
        }

        if config.disconnect_between {
            session.quit().await;
        }
    }

    session.quit().await;
    Ok(())
}

/// Builds the wire payload and envelope for one message.
fn resolve_message<'a>(
    config: &Config,
    bytes: &'a [u8],
) -> Result<(MessagePayload<'a>, Envelope), mailpost_message::Error> {
    match &config.envelope {
        EnvelopeMode::Explicit { sender, recipients } => Ok((
            MessagePayload {
                header: None,
                body: bytes,
            },
            Envelope::from_explicit(sender, recipients),
        )),
        EnvelopeMode::FromHeaders { sender_override } => {
            let (header, body) = HeaderBlock::split(bytes)?;
            let envelope = Envelope::from_headers(&header, sender_override.as_deref())?;
            Ok((
                MessagePayload {
                    header: Some(header.as_bytes()),
                    body,
                },
                envelope,
            ))
        }
    }
}

fn read_input(input: &Input) -> std::io::Result<Vec<u8>> {
    match input {
        Input::Stdin => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
        Input::File(path) => std::fs::read(path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn config(argv: &[&str]) -> Config {
        Config::resolve(Cli::try_parse_from(argv).unwrap()).unwrap()
    }

    #[test]
    fn explicit_mode_keeps_whole_message_as_body() {
        let config = config(&["mailpost", "x.example", "s@example.com", "r@example.com"]);
        let bytes = b"Subject: hi\n\nbody\n";
        let (payload, envelope) = resolve_message(&config, bytes).unwrap();
        assert!(payload.header.is_none());
        assert_eq!(payload.body, bytes);
        assert_eq!(envelope.recipients, vec!["r@example.com"]);
    }

    #[test]
    fn header_mode_splits_and_derives() {
        let config = config(&["mailpost", "-s", "x.example", "-F"]);
        let bytes = b"From: a@example.com\nTo: b@example.com\n\nbody\n";
        let (payload, envelope) = resolve_message(&config, bytes).unwrap();
        assert_eq!(
            payload.header.unwrap(),
            b"From: a@example.com\nTo: b@example.com\n\n"
        );
        assert_eq!(payload.body, b"body\n");
        assert_eq!(envelope.sender, "a@example.com");
        assert_eq!(envelope.recipients, vec!["b@example.com"]);
    }

    #[test]
    fn header_mode_propagates_malformed_fields() {
        let config = config(&["mailpost", "-s", "x.example", "-F"]);
        let bytes = b"From: a@example.com\nTo: <broken\n\nbody\n";
        assert!(resolve_message(&config, bytes).is_err());
    }
}
