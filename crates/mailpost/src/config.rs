//! Configuration resolution.
//!
//! Option state is resolved exactly once, before any connection, into an
//! immutable [`Config`] that is passed explicitly to the orchestrator and
//! session; nothing downstream reaches back into command line state.

use crate::cli::Cli;
use mailpost_smtp::{Credentials, SessionConfig, TlsMode, TlsParams};
use std::path::PathBuf;

/// How each message's envelope is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeMode {
    /// A fixed envelope supplied on the command line.
    Explicit {
        /// Sender address; empty for the null sender.
        sender: String,
        /// Recipient addresses.
        recipients: Vec<String>,
    },
    /// Each message supplies its own envelope via its headers.
    FromHeaders {
        /// Sender override; always wins over the header-derived sender.
        sender_override: Option<String>,
    },
}

/// One message source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Standard input.
    Stdin,
    /// A message file.
    File(PathBuf),
}

impl Input {
    /// Source identifier used in diagnostics, `-` for stdin.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "-".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Client identity for EHLO/HELO.
    pub helo_name: String,
    /// Envelope resolution mode.
    pub envelope: EnvelopeMode,
    /// Message sources, processed in order.
    pub inputs: Vec<Input>,
    /// Abort a message on its first rejected recipient.
    pub abort_on_any_bad: bool,
    /// Proceed even when every recipient was rejected.
    pub ignore_all_bad: bool,
    /// Tear down and re-establish the connection between messages.
    pub disconnect_between: bool,
    /// Prepend a Received trace header to each message.
    pub add_received: bool,
    /// Skip CRLF normalization.
    pub raw_line_endings: bool,
    /// Per-message summary lines on stdout.
    pub verbose: bool,
    /// Protocol trace on stdout.
    pub trace: bool,
    /// TLS mode.
    pub tls: TlsMode,
    /// TLS handshake parameters.
    pub tls_params: TlsParams,
    /// AUTH username.
    pub username: Option<String>,
    /// AUTH password; filled by prompting when a username was given alone.
    pub password: Option<String>,
}

/// Configuration errors, all detected before any connection is made.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No server was named.
    #[error("missing server name (-s <SERVER>)")]
    MissingServer,
    /// Option form without a sender.
    #[error("missing sender address (-f <ADDRESS>)")]
    MissingSender,
    /// Option form without recipients.
    #[error("missing recipients (-r <ADDRESS>)")]
    MissingRecipients,
    /// Header-derived recipients and explicit recipients are mutually
    /// exclusive modes.
    #[error("-F and -r cannot be used together")]
    RecipientsWithHeaderEnvelope,
    /// Positional form with too few arguments.
    #[error("missing required arguments (server, sender, and at least one recipient)")]
    MissingArguments,
}

impl Config {
    /// Infers the command form and resolves all options.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when required pieces are missing or modes
    /// conflict.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let Cli {
            abort_on_bad,
            ignore_all_bad,
            disconnect,
            sender,
            envelope_from_header,
            helo_name,
            port,
            password,
            recipients,
            add_received,
            server,
            tls_opportunistic,
            tls_mandatory,
            tls_verify,
            tls_protocol,
            username,
            verbose,
            no_normalize,
            trace,
            args,
        } = cli;

        let (server, envelope, inputs) = if envelope_from_header {
            // Form three: -s required, -f allowed as override, -r forbidden.
            if !recipients.is_empty() {
                return Err(ConfigError::RecipientsWithHeaderEnvelope);
            }
            let server = server.ok_or(ConfigError::MissingServer)?;
            (
                server,
                EnvelopeMode::FromHeaders {
                    sender_override: sender,
                },
                files_or_stdin(args),
            )
        } else if server.is_some() || sender.is_some() || !recipients.is_empty() {
            // Form two: all of -s, -f, -r required.
            let server = server.ok_or(ConfigError::MissingServer)?;
            let sender = sender.ok_or(ConfigError::MissingSender)?;
            if recipients.is_empty() {
                return Err(ConfigError::MissingRecipients);
            }
            (
                server,
                EnvelopeMode::Explicit { sender, recipients },
                files_or_stdin(args),
            )
        } else {
            // Form one: everything positional, message from stdin.
            if args.len() < 3 {
                return Err(ConfigError::MissingArguments);
            }
            let mut args = args;
            let server = args.remove(0);
            let sender = args.remove(0);
            (
                server,
                EnvelopeMode::Explicit {
                    sender,
                    recipients: args,
                },
                vec![Input::Stdin],
            )
        };

        // Mandatory TLS subsumes opportunistic when both are asked for.
        let tls = if tls_mandatory {
            TlsMode::Mandatory
        } else if tls_opportunistic {
            TlsMode::Opportunistic
        } else {
            TlsMode::Off
        };

        Ok(Self {
            server,
            port,
            helo_name: helo_name.unwrap_or_else(|| "localhost".to_string()),
            envelope,
            inputs,
            abort_on_any_bad: abort_on_bad,
            ignore_all_bad,
            disconnect_between: disconnect,
            add_received,
            raw_line_endings: no_normalize,
            verbose,
            trace,
            tls,
            tls_params: TlsParams {
                verify_certificates: tls_verify,
                min_protocol: tls_protocol.into(),
            },
            username,
            password,
        })
    }

    /// Maps the run configuration onto a per-connection session config.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig::new(self.server.clone(), self.port);
        session.helo_name.clone_from(&self.helo_name);
        session.tls = self.tls;
        session.tls_params = self.tls_params;
        session.credentials = self.username.clone().map(|username| Credentials {
            username,
            password: self.password.clone().unwrap_or_default(),
        });
        session
    }
}

fn files_or_stdin(args: Vec<String>) -> Vec<Input> {
    if args.is_empty() {
        vec![Input::Stdin]
    } else {
        args.into_iter().map(|a| Input::File(a.into())).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn positional_form() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "mail.example.com",
            "sender@example.com",
            "a@example.com",
            "b@example.com",
        ]))
        .unwrap();
        assert_eq!(config.server, "mail.example.com");
        assert_eq!(
            config.envelope,
            EnvelopeMode::Explicit {
                sender: "sender@example.com".to_string(),
                recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            }
        );
        assert_eq!(config.inputs, vec![Input::Stdin]);
    }

    #[test]
    fn positional_form_too_short() {
        let err = Config::resolve(parse(&["mailpost", "mail.example.com", "s@example.com"]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingArguments);
    }

    #[test]
    fn option_form_with_files() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-f",
            "s@example.com",
            "-r",
            "r@example.com",
            "one.eml",
            "two.eml",
        ]))
        .unwrap();
        assert_eq!(
            config.inputs,
            vec![
                Input::File("one.eml".into()),
                Input::File("two.eml".into())
            ]
        );
    }

    #[test]
    fn option_form_without_files_reads_stdin() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-f",
            "s@example.com",
            "-r",
            "r@example.com",
        ]))
        .unwrap();
        assert_eq!(config.inputs, vec![Input::Stdin]);
    }

    #[test]
    fn option_form_requires_all_three() {
        let err = Config::resolve(parse(&["mailpost", "-s", "mail.example.com"])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSender);

        let err = Config::resolve(parse(&[
            "mailpost",
            "-f",
            "s@example.com",
            "-r",
            "r@example.com",
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingServer);

        let err = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-f",
            "s@example.com",
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingRecipients);
    }

    #[test]
    fn header_form() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-F",
            "msg.eml",
        ]))
        .unwrap();
        assert_eq!(
            config.envelope,
            EnvelopeMode::FromHeaders {
                sender_override: None
            }
        );
    }

    #[test]
    fn header_form_with_sender_override() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-F",
            "-f",
            "postmaster@example.com",
        ]))
        .unwrap();
        assert_eq!(
            config.envelope,
            EnvelopeMode::FromHeaders {
                sender_override: Some("postmaster@example.com".to_string())
            }
        );
    }

    #[test]
    fn header_form_rejects_explicit_recipients() {
        let err = Config::resolve(parse(&[
            "mailpost",
            "-s",
            "mail.example.com",
            "-F",
            "-r",
            "r@example.com",
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::RecipientsWithHeaderEnvelope);
    }

    #[test]
    fn header_form_requires_server() {
        let err = Config::resolve(parse(&["mailpost", "-F", "msg.eml"])).unwrap_err();
        assert_eq!(err, ConfigError::MissingServer);
    }

    #[test]
    fn mandatory_tls_wins_over_opportunistic() {
        let config = Config::resolve(parse(&[
            "mailpost", "-T", "-M", "x.example", "s@example.com", "r@example.com",
        ]))
        .unwrap();
        assert_eq!(config.tls, TlsMode::Mandatory);
    }

    #[test]
    fn default_helo_name_and_port() {
        let config = Config::resolve(parse(&[
            "mailpost",
            "x.example",
            "s@example.com",
            "r@example.com",
        ]))
        .unwrap();
        assert_eq!(config.helo_name, "localhost");
        assert_eq!(config.port, 25);
        let session = config.session_config();
        assert_eq!(session.helo_name, "localhost");
        assert!(session.credentials.is_none());
    }

    #[test]
    fn credentials_carry_empty_password() {
        let mut config = Config::resolve(parse(&[
            "mailpost",
            "-U",
            "user",
            "x.example",
            "s@example.com",
            "r@example.com",
        ]))
        .unwrap();
        config.password = Some(String::new());
        let session = config.session_config();
        let creds = session.credentials.unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "");
    }
}
