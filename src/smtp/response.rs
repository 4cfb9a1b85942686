//! SMTP replies

use std::fmt::Write;

use crate::smtp::error::SmtpError;

/// A reply sent to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    pub code: u16,
    pub message: String,
    /// Extra lines of a multiline reply, e.g. EHLO capabilities
    pub multiline: Vec<String>,
}

impl SmtpResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            multiline: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, format!("{hostname} CatchMail SMTP ready"))
    }

    pub fn helo(hostname: &str, client_domain: &str) -> Self {
        Self::new(250, format!("{hostname} Hello {client_domain}"))
    }

    #[cfg(feature = "ehlo")]
    pub fn ehlo(hostname: &str, client_domain: &str) -> Self {
        let mut response = Self::helo(hostname, client_domain);
        response.multiline = vec!["PIPELINING".to_owned(), "SIZE 10485760".to_owned()];
        response
    }

    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    /// Reply to the terminating dot of an accepted transmission.
    pub fn queued() -> Self {
        Self::new(250, "OK: message captured")
    }

    /// Reply to a transmission that was accepted but could not be handed on.
    pub fn capture_failed() -> Self {
        Self::new(451, "Local error in processing: message not captured")
    }

    pub fn quit() -> Self {
        Self::new(221, "Bye")
    }

    pub fn from_error(error: &SmtpError) -> Self {
        Self::new(error.to_response_code(), error.to_response_message())
    }

    /// Wire form, CRLF terminated. Multiline replies use `code-` on every
    /// line but the last.
    pub fn format(&self) -> String {
        let mut lines = std::iter::once(&self.message).chain(&self.multiline).peekable();
        let mut out = String::new();

        while let Some(line) = lines.next() {
            let separator = if lines.peek().is_some() { '-' } else { ' ' };
            let _ = write!(out, "{}{}{}\r\n", self.code, separator, line);
        }
        out
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_error(&self) -> bool {
        self.code >= 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(SmtpResponse::ok().format(), "250 OK\r\n");
        assert_eq!(SmtpResponse::quit().format(), "221 Bye\r\n");
    }

    #[test]
    fn test_greeting_names_host() {
        let response = SmtpResponse::greeting("capture.local");
        assert_eq!(response.code, 220);
        assert_eq!(response.message, "capture.local CatchMail SMTP ready");
    }

    #[test]
    fn test_multiline_format() {
        let mut response = SmtpResponse::new(250, "Hello");
        response.multiline = vec!["PIPELINING".to_owned(), "SIZE 1000".to_owned()];
        assert_eq!(
            response.format(),
            "250-Hello\r\n250-PIPELINING\r\n250 SIZE 1000\r\n"
        );
    }

    #[cfg(feature = "ehlo")]
    #[test]
    fn test_ehlo_response() {
        let formatted = SmtpResponse::ehlo("server.local", "client.local").format();
        assert!(formatted.starts_with("250-server.local Hello client.local\r\n"));
        assert!(formatted.ends_with("250 SIZE 10485760\r\n"));
    }

    #[test]
    fn test_from_error() {
        let response = SmtpResponse::from_error(&SmtpError::MalformedMessage);
        assert_eq!(response.code, 554);
        assert!(response.is_error());
        assert!(!response.is_success());
    }

    #[test]
    fn test_success_and_error_ranges() {
        assert!(SmtpResponse::data_start().code == 354);
        assert!(!SmtpResponse::data_start().is_error());
        assert!(SmtpResponse::queued().is_success());
        assert!(SmtpResponse::capture_failed().is_error());
        assert!(SmtpResponse::new(421, "busy").is_error());
    }
}
