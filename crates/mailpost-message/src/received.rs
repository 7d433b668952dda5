//! Trace header construction.

use chrono::{DateTime, FixedOffset};

/// Product token recorded in the trace header.
const PRODUCT: &str = "mailpost";

/// Formats the `Received:` trace header line, without a line terminator.
///
/// The shape is
/// `Received: by <client-identity> (<product> <platform>); <RFC 2822 date>`.
#[must_use]
pub fn received_header(client_identity: &str, when: DateTime<FixedOffset>) -> String {
    format!(
        "Received: by {client_identity} ({PRODUCT} {} {}); {}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        when.to_rfc2822()
    )
}
