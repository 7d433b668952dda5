//! Failure classification.
//!
//! Every wire failure is judged against the session phase it occurred in to
//! decide whether the connection can be salvaged for the next message.

use crate::error::Error;
use crate::session::Phase;

/// What a failure means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Drop the connection; the run cannot continue on it.
    SessionFatal,
    /// Skip this message; reset the connection and keep it for the next one.
    MessageFatal,
}

/// Classifies a failure by kind and by the phase it occurred in.
///
/// - A 421 reply means the server is closing the channel: the connection is
///   gone no matter where we were, and writing to a half-closed socket risks
///   silently lost data.
/// - Transport errors (I/O, TLS, timeout) leave the stream in an unknown
///   state and always force a disconnect.
/// - The protocol defines no recovery from a failure inside DATA, so the
///   connection is dropped rather than reused.
/// - A rejection between MAIL and the DATA intermediate reply only ruins
///   this message; RSET restores the connection for the next one.
/// - Anything earlier (connect, greeting, TLS, authentication) is part of
///   connection establishment and is session-fatal by definition.
#[must_use]
pub fn classify(error: &Error, phase: Phase) -> Verdict {
    if error.is_server_disconnect() || error.is_transport() {
        return Verdict::SessionFatal;
    }

    match phase {
        Phase::Transaction => Verdict::MessageFatal,
        _ => Verdict::SessionFatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_disconnect_is_session_fatal_everywhere() {
        let err = Error::smtp(421, "closing transmission channel");
        for phase in [
            Phase::Connected,
            Phase::Greeted,
            Phase::Ready,
            Phase::Transaction,
            Phase::Data,
        ] {
            assert_eq!(classify(&err, phase), Verdict::SessionFatal);
        }
    }

    #[test]
    fn transport_errors_are_session_fatal() {
        let err = Error::Timeout("read");
        assert_eq!(classify(&err, Phase::Transaction), Verdict::SessionFatal);
        let err = Error::Io(std::io::Error::other("broken pipe"));
        assert_eq!(classify(&err, Phase::Transaction), Verdict::SessionFatal);
    }

    #[test]
    fn rejection_during_transaction_is_message_fatal() {
        let err = Error::smtp(550, "relay denied");
        assert_eq!(classify(&err, Phase::Transaction), Verdict::MessageFatal);
    }

    #[test]
    fn rejection_inside_data_is_session_fatal() {
        let err = Error::smtp(554, "message rejected");
        assert_eq!(classify(&err, Phase::Data), Verdict::SessionFatal);
    }

    #[test]
    fn setup_failures_are_session_fatal() {
        let err = Error::smtp(554, "unwelcome");
        assert_eq!(classify(&err, Phase::Connected), Verdict::SessionFatal);
        assert_eq!(classify(&err, Phase::Greeted), Verdict::SessionFatal);
        assert_eq!(classify(&err, Phase::Ready), Verdict::SessionFatal);
    }
}
