//! # mailpost-message
//!
//! Message-side support for SMTP submission: non-destructive header
//! splitting, RFC address-list parsing, envelope resolution, CRLF line
//! normalization, and trace header construction.
//!
//! ## Quick Start
//!
//! ```
//! use mailpost_message::{Envelope, HeaderBlock, normalize_crlf};
//!
//! let raw = b"From: alice@example.com\nTo: bob@example.com\n\nHi!\n";
//! let (header, body) = HeaderBlock::split(raw)?;
//! let envelope = Envelope::from_headers(&header, None)?;
//! assert_eq!(envelope.sender, "alice@example.com");
//! assert_eq!(envelope.recipients, vec!["bob@example.com"]);
//!
//! // Header bytes are untouched by parsing; the wire sees what was read.
//! assert_eq!(normalize_crlf(body), b"Hi!\r\n");
//! # Ok::<(), mailpost_message::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod envelope;
mod error;
mod headers;
mod normalize;
mod received;

pub use address::parse_address_list;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use headers::HeaderBlock;
pub use normalize::normalize_crlf;
pub use received::received_header;
