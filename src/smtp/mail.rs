//! Captured mail handed to downstream consumers

use std::time::SystemTime;

use serde::Serialize;

use crate::mime::{MailHeader, split_transmission};
use crate::smtp::error::SmtpError;
use crate::smtp::services::Sanitizer;

/// One message captured by the server, with its headers parsed
#[derive(Debug, Clone, Serialize)]
pub struct MailItem {
    /// Envelope sender from MAIL FROM
    pub from: String,

    /// Envelope recipients from RCPT TO
    pub to: Vec<String>,

    pub header: MailHeader,

    /// Everything after the header/body separator, undecoded
    pub body: String,

    /// The DATA block as received, CRLF line endings
    pub data: String,

    /// When the transmission completed
    pub timestamp: SystemTime,
}

impl MailItem {
    /// Build an item from an envelope and a raw DATA block.
    pub fn from_transmission(from: String, to: Vec<String>, data: String) -> Result<Self, SmtpError> {
        let header = MailHeader::parse(&data)?;
        let body = split_transmission(&data)
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();

        Ok(Self {
            from,
            to,
            header,
            body,
            data,
            timestamp: SystemTime::now(),
        })
    }

    /// Run sender, recipients and subject through `sanitizer`.
    pub fn sanitized(mut self, sanitizer: &dyn Sanitizer) -> Self {
        self.from = sanitizer.sanitize(&self.from);
        self.to = self.to.iter().map(|addr| sanitizer.sanitize(addr)).collect();
        self.header.subject = sanitizer.sanitize(&self.header.subject);
        self
    }

    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    pub fn is_from_sender(&self, sender: &str) -> bool {
        self.from == sender
    }

    pub fn subject(&self) -> &str {
        &self.header.subject
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Whether `text` appears anywhere in headers or body
    pub fn contains_text(&self, text: &str) -> bool {
        self.data.contains(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::MAILER_SIGNATURE;
    use crate::smtp::services::XssSanitizer;

    fn item(data: &str) -> MailItem {
        MailItem::from_transmission(
            "sender@example.com".to_string(),
            vec![
                "user1@example.com".to_string(),
                "user2@example.com".to_string(),
            ],
            data.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_transmission() {
        let mail = item("Subject: Test\r\nMIME-Version: 1.0\r\n\r\nHello World\r\nSecond line");

        assert_eq!(mail.subject(), "Test");
        assert_eq!(mail.header.mime_version, "1.0");
        assert_eq!(mail.header.x_mailer, MAILER_SIGNATURE);
        assert_eq!(mail.body, "Hello World\r\nSecond line");
        assert!(mail.timestamp <= SystemTime::now());
    }

    #[test]
    fn test_malformed_transmission() {
        let result = MailItem::from_transmission(
            "sender@example.com".to_string(),
            vec!["recipient@example.com".to_string()],
            "Subject: no body".to_string(),
        );
        assert!(matches!(result, Err(SmtpError::MalformedMessage)));
    }

    #[test]
    fn test_envelope_helpers() {
        let mail = item("Subject: Important Message\r\n\r\nThis is a test email");

        assert!(mail.has_recipient("user1@example.com"));
        assert!(mail.has_recipient("user2@example.com"));
        assert!(!mail.has_recipient("user3@example.com"));
        assert!(mail.is_from_sender("sender@example.com"));
        assert!(!mail.is_from_sender("other@example.com"));
        assert!(mail.contains_text("Important"));
        assert!(!mail.contains_text("not found"));
        assert_eq!(mail.data_size(), mail.data.len());
    }

    #[test]
    fn test_sanitized_subject() {
        let mail = item("Subject: <script>alert(1)</script>Hi\r\n\r\nBody").sanitized(&XssSanitizer);
        assert_eq!(mail.subject(), "Hi");
        assert_eq!(mail.from, "sender@example.com");
    }
}
