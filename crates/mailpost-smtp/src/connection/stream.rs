//! Low-level SMTP stream handling.

use super::verify::AcceptAnyCertificate;
use super::{TlsParams, TlsProtocol};
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Wraps a freshly connected TCP stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        Self::Tcp(BufReader::new(stream))
    }

    /// Returns true when the transport is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line, stripped of its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the peer closed the connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )));
        }
        Ok(line.trim_end().to_string())
    }

    /// Writes and flushes data.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a TCP stream to TLS after a successful STARTTLS exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// not a valid TLS server name, or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str, params: TlsParams) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("already using TLS".into())),
        };

        let connector = tls_connector(params);
        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))?;

        let tls_stream = connector.connect(server_name, tcp_stream).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

const fn protocol_versions(min: TlsProtocol) -> &'static [&'static SupportedProtocolVersion] {
    const TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];
    match min {
        TlsProtocol::Auto | TlsProtocol::Tls12 => rustls::DEFAULT_VERSIONS,
        TlsProtocol::Tls13 => TLS13_ONLY,
    }
}

/// Builds a TLS connector honoring the verification and version policy.
fn tls_connector(params: TlsParams) -> TlsConnector {
    let builder = ClientConfig::builder_with_protocol_versions(protocol_versions(
        params.min_protocol,
    ));

    let config = if params.verify_certificates {
        let root_store = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(config))
}
