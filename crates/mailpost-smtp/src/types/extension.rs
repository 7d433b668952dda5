//! SMTP extension types.

/// SMTP extensions discovered from the EHLO response.
///
/// Only the extensions the submission flow acts on are modeled; everything
/// else is retained verbatim as [`Extension::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - Authentication
    Auth(Vec<AuthMechanism>),
    /// Unrecognized extension line
    Unknown(String),
}

impl Extension {
    /// Parses an extension line from an EHLO response.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => {
                let mechanisms = parts[1..]
                    .iter()
                    .filter_map(|m| AuthMechanism::parse(m))
                    .collect();
                Self::Auth(mechanisms)
            }
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN - username and password in one base64 response
    Plain,
    /// LOGIN - legacy two-step plaintext
    Login,
}

impl AuthMechanism {
    /// Parses an authentication mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            _ => None,
        }
    }

    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_starttls() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
    }

    #[test]
    fn parse_auth_mechanisms() {
        let ext = Extension::parse("AUTH PLAIN LOGIN CRAM-MD5");
        if let Extension::Auth(mechs) = ext {
            assert_eq!(mechs, vec![AuthMechanism::Plain, AuthMechanism::Login]);
        } else {
            panic!("Expected Auth variant");
        }
    }

    #[test]
    fn parse_unknown() {
        let ext = Extension::parse("SIZE 52428800");
        assert_eq!(ext, Extension::Unknown("SIZE 52428800".to_string()));
    }

    #[test]
    fn parse_empty() {
        assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
    }

    #[test]
    fn mechanism_round_trip() {
        assert_eq!(AuthMechanism::parse("plain"), Some(AuthMechanism::Plain));
        assert_eq!(AuthMechanism::parse("LOGIN"), Some(AuthMechanism::Login));
        assert_eq!(AuthMechanism::parse("XOAUTH2"), None);
        assert_eq!(AuthMechanism::Plain.as_str(), "PLAIN");
    }
}
