//! Error types for the capture server

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No worker available to handle the connection")]
    NoWorkerAvailable,

    #[error("Worker pool needs at least one worker")]
    InvalidWorkerCount,

    #[error("Expected DATA block to contain a header section and a body section")]
    MalformedMessage,

    #[error("Invalid command")]
    InvalidCommand,

    #[error("Invalid state for command: {0}")]
    InvalidState(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("Line too long (max {max} characters)")]
    LineTooLong { max: usize },

    #[error("Path too long (max {max} characters)")]
    PathTooLong { max: usize },

    #[error("Too many recipients (max {max})")]
    TooManyRecipients { max: usize },

    #[error("Too much mail data (max {max} bytes)")]
    TooMuchData { max: usize },

    #[error("Domain name too long (max {max} characters)")]
    DomainTooLong { max: usize },

    #[error("User name too long (max {max} characters)")]
    UserTooLong { max: usize },
}

/// SMTP size limits as defined in RFC 821
pub struct SmtpLimits;

impl SmtpLimits {
    pub const USER_MAX_LENGTH: usize = 64;

    pub const DOMAIN_MAX_LENGTH: usize = 64;

    /// Reverse-path or forward-path
    pub const PATH_MAX_LENGTH: usize = 256;

    /// Including CRLF
    pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

    /// Including CRLF
    pub const REPLY_LINE_MAX_LENGTH: usize = 512;

    /// Including CRLF
    pub const TEXT_LINE_MAX_LENGTH: usize = 1000;

    pub const MAX_RECIPIENTS: usize = 100;

    /// Captured mail is held in memory until handed off
    pub const MAX_DATA_SIZE: usize = 10 * 1024 * 1024;
}

impl SmtpError {
    /// Reply code sent to the client when this error ends a command.
    pub fn to_response_code(&self) -> u16 {
        match self {
            SmtpError::Io(_) | SmtpError::NoWorkerAvailable => 421,
            SmtpError::InvalidWorkerCount => 451,
            SmtpError::MalformedMessage => 554,
            SmtpError::InvalidCommand | SmtpError::LineTooLong { .. } => 500,
            SmtpError::InvalidState(_) => 503,
            SmtpError::InvalidSyntax(_)
            | SmtpError::PathTooLong { .. }
            | SmtpError::DomainTooLong { .. }
            | SmtpError::UserTooLong { .. } => 501,
            SmtpError::TooManyRecipients { .. } | SmtpError::TooMuchData { .. } => 552,
        }
    }

    pub fn to_response_message(&self) -> String {
        match self {
            SmtpError::Io(_) => "Service not available".to_string(),
            SmtpError::NoWorkerAvailable => "Too busy, try again later".to_string(),
            SmtpError::InvalidWorkerCount => "Local error in processing".to_string(),
            SmtpError::MalformedMessage => {
                "Transaction failed: message has no header/body separator".to_string()
            }
            SmtpError::InvalidCommand => "Syntax error, command unrecognized".to_string(),
            SmtpError::InvalidState(msg) => format!("Bad sequence of commands: {msg}"),
            SmtpError::InvalidSyntax(msg) => format!("Syntax error: {msg}"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_codes() {
        assert_eq!(SmtpError::NoWorkerAvailable.to_response_code(), 421);
        assert_eq!(SmtpError::MalformedMessage.to_response_code(), 554);
        assert_eq!(SmtpError::TooMuchData { max: 1 }.to_response_code(), 552);
    }

    #[test]
    fn test_limit_messages_mention_maximum() {
        let message = SmtpError::LineTooLong { max: 512 }.to_response_message();
        assert_eq!(message, "Line too long (max 512 characters)");
    }
}
