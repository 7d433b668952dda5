//! Connection management: stream handling, TLS policy, server capabilities.

mod stream;
mod verify;

pub use stream::SmtpStream;

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Whether and how strongly TLS is applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Clear text only.
    #[default]
    Off,
    /// Upgrade with STARTTLS when offered; fall back to clear text otherwise.
    Opportunistic,
    /// Require STARTTLS; abort the session when unavailable.
    Mandatory,
}

impl TlsMode {
    /// Returns true if a TLS upgrade should be attempted at all.
    #[must_use]
    pub const fn wants_tls(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Minimum accepted TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsProtocol {
    /// Accept anything rustls enables by default (currently 1.2 and 1.3).
    #[default]
    Auto,
    /// TLS 1.2 or newer.
    Tls12,
    /// TLS 1.3 only.
    Tls13,
}

/// TLS handshake parameters.
///
/// Certificate verification is permissive by default: in practice few
/// submission servers present fully valid certificates, and an encrypted
/// session with an unverified peer still beats clear text. The strict flag
/// turns verification failures into session-fatal errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsParams {
    /// Verify the server certificate against the webpki root store.
    pub verify_certificates: bool,
    /// Minimum protocol version to negotiate.
    pub min_protocol: TlsProtocol,
}

/// Server capabilities learned from the greeting and EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the greeting banner.
    pub hostname: String,
    /// Extensions advertised in the EHLO response.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if STARTTLS was advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Returns advertised authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        for ext in &self.extensions {
            if let Extension::Auth(mechanisms) = ext {
                return mechanisms.clone();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starttls_detection() {
        let mut info = ServerInfo::default();
        assert!(!info.supports_starttls());
        info.extensions.insert(Extension::parse("STARTTLS"));
        assert!(info.supports_starttls());
    }

    #[test]
    fn auth_mechanism_listing() {
        let mut info = ServerInfo::default();
        assert!(info.auth_mechanisms().is_empty());
        info.extensions.insert(Extension::parse("AUTH PLAIN LOGIN"));
        let mechs = info.auth_mechanisms();
        assert!(mechs.contains(&AuthMechanism::Plain));
        assert!(mechs.contains(&AuthMechanism::Login));
    }

    #[test]
    fn tls_mode_wants_tls() {
        assert!(!TlsMode::Off.wants_tls());
        assert!(TlsMode::Opportunistic.wants_tls());
        assert!(TlsMode::Mandatory.wants_tls());
    }
}
