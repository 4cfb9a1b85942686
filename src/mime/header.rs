//! MIME header extraction from a DATA block

use serde::Serialize;
use tracing::debug;

use crate::mime::{date, unfold};
use crate::smtp::error::SmtpError;

/// Signature stamped on every captured message, replacing any sender value.
pub const MAILER_SIGNATURE: &str = "CatchMail!";

/// Subject stored when the header is present but blank.
pub const NO_SUBJECT: &str = "(No Subject)";

/// The headers downstream storage cares about.
///
/// Headers missing from the transmission keep their empty default, except
/// `x_mailer`, which always carries [`MAILER_SIGNATURE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailHeader {
    pub content_type: String,
    /// Multipart boundary without quotes; empty when none was declared.
    pub boundary: String,
    pub mime_version: String,
    pub subject: String,
    /// Date as produced by [`date::normalize`].
    pub date: String,
    pub x_mailer: String,
}

impl MailHeader {
    /// Parse the header section of a raw DATA block.
    ///
    /// Most headers look like `Header-Name: Some value`. Content-Type may
    /// carry parameters, the interesting one being the multipart boundary:
    ///
    /// ```text
    /// Content-Type: multipart/mixed; boundary="==abcsdfdfd=="
    /// ```
    ///
    /// Fails with [`SmtpError::MalformedMessage`] when the block has no
    /// blank line separating headers from the body.
    pub fn parse(contents: &str) -> Result<Self, SmtpError> {
        let (headers, _body) = split_transmission(contents).ok_or(SmtpError::MalformedMessage)?;

        let mut header = MailHeader {
            x_mailer: MAILER_SIGNATURE.to_string(),
            ..Default::default()
        };

        for line in unfold(headers).lines() {
            let Some((name, value)) = split_header_line(line) else {
                continue;
            };

            match name.to_ascii_lowercase().as_str() {
                "content-type" => header.set_content_type(value),
                "date" => {
                    header.date = date::normalize(value);
                    debug!(date = %header.date, "mail date");
                }
                "mime-version" => {
                    header.mime_version = value.trim().to_string();
                    debug!(mime_version = %header.mime_version, "mail MIME-Version");
                }
                "subject" => {
                    let subject = value.trim();
                    header.subject = if subject.is_empty() {
                        NO_SUBJECT.to_string()
                    } else {
                        subject.to_string()
                    };
                    debug!(subject = %header.subject, "mail subject");
                }
                _ => {}
            }
        }

        Ok(header)
    }

    /// Whether the message declares a multipart body.
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .starts_with("multipart/")
    }

    fn set_content_type(&mut self, value: &str) {
        let mut parameters = value.split(';');
        self.content_type = parameters.next().unwrap_or_default().trim().to_string();
        debug!(content_type = %self.content_type, "mail Content-Type");

        for parameter in parameters {
            let Some((name, boundary)) = parameter.split_once('=') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("boundary") {
                self.boundary = boundary.replace('"', "").trim().to_string();
                debug!(boundary = %self.boundary, "mail boundary");
            }
        }
    }
}

/// Split a DATA block into its header section and body.
///
/// The separator is the first blank line, written either as CRLF CRLF or as
/// two bare line feeds.
pub fn split_transmission(contents: &str) -> Option<(&str, &str)> {
    let crlf = contents.find("\r\n\r\n").map(|at| (at, 4));
    let lf = contents.find("\n\n").map(|at| (at, 2));

    let (at, len) = match (crlf, lf) {
        (Some(crlf), Some(lf)) => {
            if crlf.0 <= lf.0 {
                crlf
            } else {
                lf
            }
        }
        (Some(found), None) | (None, Some(found)) => found,
        (None, None) => return None,
    };

    Some((&contents[..at], &contents[at + len..]))
}

/// Split one unfolded header line into name and value at the first colon.
///
/// Everything after that colon belongs to the value, so times in `Date`
/// and colons in a `Subject` survive. The name has surrounding whitespace
/// removed; lines without a colon or with an empty name yield `None`.
pub fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}
