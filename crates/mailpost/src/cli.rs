//! Command line definition.
//!
//! Three command forms share one flag set; which one is in play is inferred
//! from the options that were given (see [`crate::config`]):
//!
//! 1. `mailpost SERVER SENDER RCPT...` — envelope from positional
//!    arguments, message from stdin. Handy for a single message with many
//!    recipients.
//! 2. `mailpost -s SERVER -f SENDER -r RCPT... [FILE]...` — fixed envelope,
//!    one message per file. Handy for sending many messages in a test
//!    environment.
//! 3. `mailpost -s SERVER -F [-f SENDER] [FILE]...` — each file supplies
//!    its own envelope via its headers.

use clap::Parser;
use mailpost_smtp::TlsProtocol;

/// Submit fully formed RFC 2822 messages to an SMTP server.
#[derive(Debug, Parser)]
#[command(
    name = "mailpost",
    version,
    about,
    override_usage = "mailpost [OPTIONS] <SERVER> <SENDER> <RCPT>...\n       \
                      mailpost [OPTIONS] -s <SERVER> -f <SENDER> -r <RCPT>... [FILE]...\n       \
                      mailpost [OPTIONS] -s <SERVER> -F [-f <SENDER>] [FILE]..."
)]
pub struct Cli {
    /// Stop (abort) a message if any of its recipients are rejected
    #[arg(short = 'a', long)]
    pub abort_on_bad: bool,

    /// Continue a message even if all of its recipients are rejected
    #[arg(short = 'c', long)]
    pub ignore_all_bad: bool,

    /// Disconnect between messages
    #[arg(short = 'd', long)]
    pub disconnect: bool,

    /// Sender (bounce) address
    #[arg(short = 'f', long = "sender", value_name = "ADDRESS")]
    pub sender: Option<String>,

    /// Take each message's envelope from its header (From, To, Cc)
    #[arg(short = 'F', long)]
    pub envelope_from_header: bool,

    /// Client identity sent with EHLO/HELO
    #[arg(short = 'H', long = "helo-name", value_name = "NAME")]
    pub helo_name: Option<String>,

    /// Server port
    #[arg(short = 'p', long, value_name = "PORT", default_value_t = 25)]
    pub port: u16,

    /// Password for SMTP authentication; prompted for when -U is given
    /// without -P
    #[arg(short = 'P', long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Recipient address (repeatable)
    #[arg(short = 'r', long = "recipient", value_name = "ADDRESS")]
    pub recipients: Vec<String>,

    /// Prepend a standard Received header field to each message
    #[arg(short = 'R', long = "received")]
    pub add_received: bool,

    /// SMTP server to submit to
    #[arg(short = 's', long, value_name = "SERVER")]
    pub server: Option<String>,

    /// Use TLS when the server offers it, falling back to clear text
    #[arg(short = 'T', long = "tls")]
    pub tls_opportunistic: bool,

    /// Require TLS; abort if it is unavailable
    #[arg(short = 'M', long = "tls-mandatory")]
    pub tls_mandatory: bool,

    /// Verify the server certificate instead of accepting anything
    #[arg(long)]
    pub tls_verify: bool,

    /// Minimum TLS protocol version to negotiate
    #[arg(long, value_enum, value_name = "VERSION", default_value = "auto")]
    pub tls_protocol: TlsVersionArg,

    /// Username for SMTP authentication
    #[arg(short = 'U', long = "user", value_name = "USERNAME")]
    pub username: Option<String>,

    /// Write per-message activity to stdout
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Do not normalize message line endings to CRLF. Only sensible for
    /// protocol conformance testing; servers may reject bare line feeds
    #[arg(long)]
    pub no_normalize: bool,

    /// Echo the protocol exchange to stdout
    #[arg(long)]
    pub trace: bool,

    /// Positional arguments; their meaning depends on the command form
    #[arg(value_name = "ARG")]
    pub args: Vec<String>,
}

/// Command line face of [`TlsProtocol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TlsVersionArg {
    /// Whatever rustls enables by default.
    #[default]
    Auto,
    /// TLS 1.2 or newer.
    Tls12,
    /// TLS 1.3 only.
    Tls13,
}

impl From<TlsVersionArg> for TlsProtocol {
    fn from(arg: TlsVersionArg) -> Self {
        match arg {
            TlsVersionArg::Auto => Self::Auto,
            TlsVersionArg::Tls12 => Self::Tls12,
            TlsVersionArg::Tls13 => Self::Tls13,
        }
    }
}
