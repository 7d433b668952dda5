//! SMTP session management.
//!
//! A [`Session`] owns one connection and walks it through the lifecycle
//! `Disconnected → Connected → Greeted → [Secured] → [Authenticated] →
//! Ready`. Connection establishment (greeting, TLS, authentication) happens
//! at most once per connection; messages submitted afterwards reuse the
//! `Ready` session, returning to it via `RSET` or a completed `DATA`
//! exchange.

use crate::command::Command;
use crate::connection::{ServerInfo, SmtpStream, TlsMode, TlsParams};
use crate::error::{Error, Result};
use crate::parser::parse_reply_line;
use crate::trace::{NullTrace, Trace};
use crate::types::{AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Upper bound on reply lines before the server is considered misbehaving.
const MAX_REPLY_LINES: usize = 100;

/// Session lifecycle phase.
///
/// Phases only advance, except for the reset back to [`Phase::Ready`]
/// between messages and teardown to [`Phase::Disconnected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No transport.
    #[default]
    Disconnected,
    /// TCP established, greeting banner consumed.
    Connected,
    /// EHLO (or fallback HELO) accepted.
    Greeted,
    /// TLS handshake completed.
    Secured,
    /// AUTH accepted.
    Authenticated,
    /// Between transactions; MAIL may be issued.
    Ready,
    /// MAIL issued, DATA intermediate reply not yet received.
    Transaction,
    /// Inside DATA; no safe recovery except dropping the connection.
    Data,
}

/// Login credentials for SMTP AUTH.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password. May legitimately be empty.
    pub password: String,
}

/// Immutable per-connection configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Client identity sent with EHLO/HELO.
    pub helo_name: String,
    /// TLS mode.
    pub tls: TlsMode,
    /// TLS handshake parameters.
    pub tls_params: TlsParams,
    /// Optional AUTH credentials.
    pub credentials: Option<Credentials>,
    /// Deadline for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Deadline for each read or write on the established connection.
    pub io_timeout: Duration,
}

impl SessionConfig {
    /// Creates a configuration with defaults: clear text, no credentials,
    /// `localhost` client identity, 30 s connect and 60 s I/O timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            helo_name: "localhost".to_string(),
            tls: TlsMode::Off,
            tls_params: TlsParams::default(),
            credentials: None,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
        }
    }
}

/// One SMTP submission session.
///
/// The transport handle is owned exclusively by the session; transaction
/// code borrows the session for the duration of one message and never
/// retains it past teardown.
pub struct Session {
    config: SessionConfig,
    stream: Option<SmtpStream>,
    server_info: ServerInfo,
    phase: Phase,
    trace: Box<dyn Trace>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("connected", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a disconnected session. Nothing touches the network until
    /// [`Session::ensure_ready`] is called.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            stream: None,
            server_info: ServerInfo::default(),
            phase: Phase::Disconnected,
            trace: Box::new(NullTrace),
        }
    }

    /// Attaches a protocol trace sink.
    #[must_use]
    pub fn with_trace(mut self, trace: Box<dyn Trace>) -> Self {
        self.trace = trace;
        self
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true while a transport is held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns what the server has told us about itself.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Brings the session to [`Phase::Ready`], connecting and negotiating
    /// greeting, TLS, and authentication if no connection exists yet.
    ///
    /// All establishment failures are session-fatal: the transport is
    /// released before the error is returned. When mandatory TLS is
    /// unavailable the session still terminates with a polite QUIT first.
    ///
    /// # Errors
    ///
    /// Returns an error if any establishment step fails.
    pub async fn ensure_ready(&mut self) -> Result<()> {
        if self.phase == Phase::Ready {
            return Ok(());
        }
        let result = self.establish().await;
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    async fn establish(&mut self) -> Result<()> {
        self.connect().await?;
        self.greet().await?;
        self.secure().await?;
        self.authenticate().await?;
        self.phase = Phase::Ready;
        Ok(())
    }

    async fn connect(&mut self) -> Result<()> {
        debug!(host = %self.config.host, port = self.config.port, "connecting");
        let tcp = timeout(
            self.config.connect_timeout,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await
        .map_err(|_| Error::Timeout("connect"))??;
        self.stream = Some(SmtpStream::new(tcp));
        self.phase = Phase::Connected;

        let greeting = self.read_reply().await?;
        if !greeting.is_success() {
            return Err(Error::from_reply(&greeting));
        }
        self.server_info.hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        Ok(())
    }

    /// Extended greeting with a single legacy fallback.
    ///
    /// HELO is retried only when the server answered EHLO with 500 or 502,
    /// the codes that mean the command itself was not understood. Any other
    /// EHLO failure is returned with the server's own reply text intact, so
    /// the root cause is never masked by a fallback attempt.
    async fn greet(&mut self) -> Result<()> {
        let hostname = self.config.helo_name.clone();
        let reply = self
            .command(Command::Ehlo {
                hostname: hostname.clone(),
            })
            .await?;
        if reply.is_success() {
            self.record_extensions(&reply);
            self.phase = Phase::Greeted;
            return Ok(());
        }
        if !reply.code.is_command_unrecognized() {
            return Err(Error::from_reply(&reply));
        }

        debug!(code = %reply.code, "EHLO not recognized; retrying with HELO");
        let reply = self.command(Command::Helo { hostname }).await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        // A HELO peer advertises nothing.
        self.server_info.extensions.clear();
        self.phase = Phase::Greeted;
        Ok(())
    }

    async fn secure(&mut self) -> Result<()> {
        if !self.config.tls.wants_tls() {
            return Ok(());
        }
        let mandatory = self.config.tls == TlsMode::Mandatory;

        if !self.server_info.supports_starttls() {
            if mandatory {
                self.quit().await;
                return Err(Error::TlsUnavailable);
            }
            warn!("server does not advertise STARTTLS; continuing in clear text");
            return Ok(());
        }

        let reply = self.command(Command::StartTls).await?;
        if !reply.is_success() {
            if mandatory {
                let err = Error::from_reply(&reply);
                self.quit().await;
                return Err(err);
            }
            warn!(
                reply = %reply.message_text(),
                "server rejected STARTTLS; continuing in clear text"
            );
            return Ok(());
        }

        // Past the 220, the socket is committed to the handshake; a failure
        // here is fatal in either mode since clear text cannot resume.
        let stream = self
            .stream
            .take()
            .ok_or_else(|| Error::Protocol("not connected".into()))?;
        let upgraded = timeout(
            self.config.io_timeout,
            stream.upgrade_to_tls(&self.config.host, self.config.tls_params),
        )
        .await
        .map_err(|_| Error::Timeout("TLS handshake"))??;
        self.stream = Some(upgraded);
        self.phase = Phase::Secured;
        debug!("TLS established");

        // Capabilities may differ after the upgrade; ask again.
        let reply = self
            .command(Command::Ehlo {
                hostname: self.config.helo_name.clone(),
            })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        self.record_extensions(&reply);
        Ok(())
    }

    async fn authenticate(&mut self) -> Result<()> {
        let Some(credentials) = self.config.credentials.clone() else {
            return Ok(());
        };
        if !self.stream.as_ref().is_some_and(SmtpStream::is_tls) {
            warn!("authenticating over an unencrypted connection");
        }

        let blob = format!("\0{}\0{}", credentials.username, credentials.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(blob.as_bytes());
        let reply = self
            .command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: encoded,
            })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        self.phase = Phase::Authenticated;
        Ok(())
    }

    /// Starts a mail transaction. The session moves to
    /// [`Phase::Transaction`] as the command is issued, so a rejection is
    /// scoped to this message rather than the whole session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects MAIL or the write fails.
    pub(crate) async fn mail_from(&mut self, sender: &str) -> Result<()> {
        self.phase = Phase::Transaction;
        let reply = self
            .command(Command::MailFrom {
                from: sender.to_string(),
            })
            .await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        Ok(())
    }

    /// Issues RCPT and hands back the raw reply; rejections are the
    /// caller's policy decision, not an error.
    pub(crate) async fn rcpt_to(&mut self, recipient: &str) -> Result<Reply> {
        self.command(Command::RcptTo {
            to: recipient.to_string(),
        })
        .await
    }

    /// Opens the DATA phase (expects 354).
    pub(crate) async fn data_begin(&mut self) -> Result<()> {
        let reply = self.command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(Error::from_reply(&reply));
        }
        self.phase = Phase::Data;
        Ok(())
    }

    /// Writes the framed message payload (already dot-stuffed and
    /// dot-terminated) and consumes the final reply. Success returns the
    /// session to [`Phase::Ready`].
    pub(crate) async fn data_finish(&mut self, wire: &[u8]) -> Result<()> {
        self.trace
            .line(true, &format!("[{} bytes of message data]", wire.len()));
        self.write_raw(wire).await?;
        let reply = self.read_reply().await?;
        if !reply.is_success() {
            return Err(Error::from_reply(&reply));
        }
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Abandons the current transaction and returns the connection to
    /// [`Phase::Ready`] for the next message.
    ///
    /// # Errors
    ///
    /// A failed RSET leaves the connection in an unknown state, so the
    /// transport is dropped before the error is returned.
    pub async fn reset(&mut self) -> Result<()> {
        let result = async {
            let reply = self.command(Command::Rset).await?;
            if !reply.is_success() {
                return Err(Error::from_reply(&reply));
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "RSET failed; dropping connection");
                self.disconnect();
                Err(err)
            }
        }
    }

    /// Polite teardown: QUIT (failure only logged) and transport release.
    pub async fn quit(&mut self) {
        if self.stream.is_some() {
            let result = self.command(Command::Quit).await;
            match result {
                Ok(reply) if !reply.is_success() => {
                    debug!(reply = %reply.message_text(), "server grumbled at QUIT");
                }
                Err(err) => debug!(error = %err, "QUIT failed"),
                Ok(_) => {}
            }
        }
        self.disconnect();
    }

    /// Releases the transport without ceremony. Used after session-fatal
    /// failures where no further command may be written.
    pub fn disconnect(&mut self) {
        self.stream = None;
        self.server_info = ServerInfo::default();
        self.phase = Phase::Disconnected;
    }

    fn record_extensions(&mut self, reply: &Reply) {
        // First response line is the server greeting text, not an extension.
        self.server_info.extensions = reply
            .message
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
    }

    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        let wire = cmd.serialize();
        let text = String::from_utf8_lossy(&wire);
        self.trace.line(true, text.trim_end());
        self.write_raw(&wire).await?;
        self.read_reply().await
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Protocol("not connected".into()))?;
        timeout(self.config.io_timeout, stream.write_all(data))
            .await
            .map_err(|_| Error::Timeout("write"))?
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| Error::Protocol("not connected".into()))?;
            let line = timeout(self.config.io_timeout, stream.read_line())
                .await
                .map_err(|_| Error::Timeout("read"))??;
            self.trace.line(false, &line);

            let parsed = parse_reply_line(&line)?;
            let (code, last) = (parsed.code, parsed.last);
            lines.push(parsed.text.to_string());

            if last {
                return Ok(Reply::new(ReplyCode::new(code), lines));
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(Error::Protocol("reply has too many lines".into()));
            }
        }
    }
}
