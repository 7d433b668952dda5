//! # mailpost-smtp
//!
//! SMTP submission client library implementing the client side of RFC 5321.
//!
//! ## Features
//!
//! - **Explicit session state machine**: one connection walked through
//!   greeting, optional STARTTLS, optional AUTH, then reused for any number
//!   of mail transactions
//! - **Greeting fallback**: HELO is retried only on the specific "command
//!   unrecognized" codes, and the server's original reply text is never
//!   discarded
//! - **Failure classification**: every error is judged against the phase it
//!   occurred in to decide between skipping a message and dropping the
//!   connection
//! - **TLS**: STARTTLS via rustls, permissive certificate verification by
//!   default with an opt-in strict mode
//! - **Authentication**: AUTH PLAIN
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_smtp::{Session, SessionConfig, MessagePayload, SubmitOptions, submit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> mailpost_smtp::Result<()> {
//!     let mut session = Session::new(SessionConfig::new("smtp.example.com", 25));
//!     session.ensure_ready().await?;
//!
//!     let payload = MessagePayload {
//!         header: None,
//!         body: b"Subject: Test\r\n\r\nHello, World!\r\n",
//!     };
//!     let outcome = submit(
//!         &mut session,
//!         "sender@example.com",
//!         &["recipient@example.com".to_string()],
//!         payload,
//!         &SubmitOptions::default(),
//!     )
//!     .await?;
//!     assert!(outcome.was_sent());
//!
//!     session.quit().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Session Phases
//!
//! ```text
//! Disconnected → Connected → Greeted → [Secured] → [Authenticated] → Ready
//!                                                                      │
//!                         Ready ←── RSET / end-of-DATA ──── Transaction/Data
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`session`]: Connection lifecycle and phase tracking
//! - [`transact`]: Per-message MAIL/RCPT/DATA execution
//! - [`classify`]: Failure classification by phase
//! - [`parser`]: Response parser
//! - [`types`]: Core SMTP types (replies, extensions)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod trace;
pub mod transact;
pub mod types;

pub use classify::{Verdict, classify};
pub use connection::{ServerInfo, SmtpStream, TlsMode, TlsParams, TlsProtocol};
pub use error::{Error, Result};
pub use session::{Credentials, Phase, Session, SessionConfig};
pub use trace::{NullTrace, Trace};
pub use transact::{
    Disposition, MessagePayload, Outcome, RecipientOutcome, RecipientStatus, SubmitOptions, submit,
};
pub use types::{AuthMechanism, Extension, Reply, ReplyCode};
