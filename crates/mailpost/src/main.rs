//! mailpost - submit fully formed RFC 2822 messages from the command line.
//!
//! Reads one or more RFC 2822 messages and delivers them to an SMTP server,
//! with envelope addresses taken from the command line or from the message
//! headers, optional TLS, and optional authentication.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod run;

use clap::Parser;
use config::Config;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for summaries and the
    // protocol trace.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailpost=info,mailpost_smtp=info,mailpost_message=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    let mut config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            eprintln!("For help, try: mailpost --help");
            return ExitCode::FAILURE;
        }
    };

    // A username without a password means prompting on the terminal, with
    // echo suppressed. A zero-length password given with -P is legal, so
    // only the absent option triggers the prompt.
    if config.username.is_some() && config.password.is_none() {
        match rpassword::prompt_password("Password: ") {
            Ok(password) => config.password = Some(password),
            Err(err) => {
                error!(%err, "cannot read password");
                return ExitCode::FAILURE;
            }
        }
    }

    match run::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
