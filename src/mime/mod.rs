//! Header-level MIME processing of captured transmissions

pub mod date;
pub mod header;
pub mod unfold;

pub use header::{MAILER_SIGNATURE, MailHeader, NO_SUBJECT, split_header_line, split_transmission};
pub use unfold::unfold;
