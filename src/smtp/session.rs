//! Per-connection SMTP transaction state

use crate::smtp::error::{SmtpError, SmtpLimits};
use crate::smtp::mail::MailItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Waiting for HELO
    Initial,
    GreetingReceived,
    MailReceived,
    /// At least one RCPT accepted; DATA or more RCPT may follow
    RecipientsReceived,
    DataMode,
}

/// Transaction being built on one connection
#[derive(Debug)]
pub struct SmtpSession {
    pub state: SmtpState,
    pub from: Option<String>,
    pub to: Vec<String>,
    /// DATA lines, without terminators and with dot-stuffing removed
    pub data: Vec<String>,
    pub data_size: usize,
    pub client_domain: Option<String>,
}

impl SmtpSession {
    pub fn new() -> Self {
        Self {
            state: SmtpState::Initial,
            from: None,
            to: Vec::new(),
            data: Vec::new(),
            data_size: 0,
            client_domain: None,
        }
    }

    pub fn in_data_mode(&self) -> bool {
        self.state == SmtpState::DataMode
    }

    /// Drop the current transaction but keep the HELO identity.
    pub fn reset(&mut self) {
        self.from = None;
        self.to.clear();
        self.data.clear();
        self.data_size = 0;
        self.state = if self.client_domain.is_some() {
            SmtpState::GreetingReceived
        } else {
            SmtpState::Initial
        };
    }

    pub fn set_client_domain(&mut self, domain: String) -> Result<(), SmtpError> {
        if domain.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
            return Err(SmtpError::DomainTooLong {
                max: SmtpLimits::DOMAIN_MAX_LENGTH,
            });
        }

        self.client_domain = Some(domain);
        self.reset();
        Ok(())
    }

    pub fn set_sender(&mut self, sender: String) -> Result<(), SmtpError> {
        if sender.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }

        self.from = Some(sender);
        self.to.clear();
        self.data.clear();
        self.data_size = 0;
        self.state = SmtpState::MailReceived;
        Ok(())
    }

    pub fn add_recipient(&mut self, recipient: String) -> Result<(), SmtpError> {
        if recipient.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }

        if self.to.len() >= SmtpLimits::MAX_RECIPIENTS {
            return Err(SmtpError::TooManyRecipients {
                max: SmtpLimits::MAX_RECIPIENTS,
            });
        }

        self.to.push(recipient);
        self.state = SmtpState::RecipientsReceived;
        Ok(())
    }

    pub fn start_data_mode(&mut self) -> Result<(), SmtpError> {
        if self.state != SmtpState::RecipientsReceived {
            return Err(SmtpError::InvalidState(
                "DATA command requires RCPT first".to_string(),
            ));
        }

        self.data.clear();
        self.data_size = 0;
        self.state = SmtpState::DataMode;
        Ok(())
    }

    pub fn add_data_line(&mut self, line: String) -> Result<(), SmtpError> {
        let line_size = line.len() + 2;

        if line_size > SmtpLimits::TEXT_LINE_MAX_LENGTH {
            return Err(SmtpError::LineTooLong {
                max: SmtpLimits::TEXT_LINE_MAX_LENGTH,
            });
        }

        if self.data_size + line_size > SmtpLimits::MAX_DATA_SIZE {
            return Err(SmtpError::TooMuchData {
                max: SmtpLimits::MAX_DATA_SIZE,
            });
        }

        self.data.push(line);
        self.data_size += line_size;
        Ok(())
    }

    /// Close the DATA phase and turn the collected block into a mail item.
    ///
    /// The transaction is cleared whether or not the block parses.
    pub fn finish_data_collection(&mut self) -> Result<MailItem, SmtpError> {
        if !self.in_data_mode() {
            return Err(SmtpError::InvalidState(
                "Not in data collection mode".to_string(),
            ));
        }

        let from = self
            .from
            .take()
            .ok_or_else(|| SmtpError::InvalidState("No sender specified".to_string()))?;
        let to = std::mem::take(&mut self.to);
        let data: String = self.data.iter().map(|line| format!("{line}\r\n")).collect();

        self.reset();
        MailItem::from_transmission(from, to, data)
    }

    pub fn can_execute_command(&self, command: &str) -> bool {
        match command.to_ascii_uppercase().as_str() {
            #[cfg(feature = "ehlo")]
            "EHLO" => true,
            "HELO" | "NOOP" | "QUIT" => true,
            "MAIL" => self.state == SmtpState::GreetingReceived,
            "RCPT" => matches!(
                self.state,
                SmtpState::MailReceived | SmtpState::RecipientsReceived
            ),
            "DATA" => self.state == SmtpState::RecipientsReceived,
            "RSET" => self.state != SmtpState::Initial,
            _ => false,
        }
    }
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_for_data() -> SmtpSession {
        let mut session = SmtpSession::new();
        session.set_client_domain("client.local".to_string()).unwrap();
        session.set_sender("sender@example.com".to_string()).unwrap();
        session.add_recipient("recipient@example.com".to_string()).unwrap();
        session
    }

    #[test]
    fn test_new_session() {
        let session = SmtpSession::new();
        assert_eq!(session.state, SmtpState::Initial);
        assert!(session.from.is_none());
        assert!(!session.in_data_mode());
        assert!(session.client_domain.is_none());
    }

    #[test]
    fn test_domain_too_long() {
        let mut session = SmtpSession::new();
        let result = session.set_client_domain("a".repeat(SmtpLimits::DOMAIN_MAX_LENGTH + 1));
        assert!(matches!(result, Err(SmtpError::DomainTooLong { .. })));
    }

    #[test]
    fn test_too_many_recipients() {
        let mut session = ready_for_data();
        for i in 1..SmtpLimits::MAX_RECIPIENTS {
            session.add_recipient(format!("user{i}@example.com")).unwrap();
        }

        let result = session.add_recipient("extra@example.com".to_string());
        assert!(matches!(result, Err(SmtpError::TooManyRecipients { .. })));
    }

    #[test]
    fn test_data_collection_builds_mail_item() {
        let mut session = ready_for_data();
        session.start_data_mode().unwrap();
        assert!(session.in_data_mode());

        session.add_data_line("Subject: Test".to_string()).unwrap();
        session.add_data_line(String::new()).unwrap();
        session.add_data_line("Test body".to_string()).unwrap();

        let mail = session.finish_data_collection().unwrap();
        assert_eq!(mail.from, "sender@example.com");
        assert_eq!(mail.to, vec!["recipient@example.com"]);
        assert_eq!(mail.data, "Subject: Test\r\n\r\nTest body\r\n");
        assert_eq!(mail.body, "Test body\r\n");
        assert_eq!(mail.subject(), "Test");
        assert_eq!(session.state, SmtpState::GreetingReceived);
        assert!(session.from.is_none());
    }

    #[test]
    fn test_headers_with_empty_body() {
        let mut session = ready_for_data();
        session.start_data_mode().unwrap();
        session.add_data_line("Subject: Hi".to_string()).unwrap();
        session.add_data_line(String::new()).unwrap();

        let mail = session.finish_data_collection().unwrap();
        assert_eq!(mail.data, "Subject: Hi\r\n\r\n");
        assert_eq!(mail.subject(), "Hi");
        assert_eq!(mail.body, "");
    }

    #[test]
    fn test_malformed_data_clears_transaction() {
        let mut session = ready_for_data();
        session.start_data_mode().unwrap();
        session.add_data_line("just one line".to_string()).unwrap();

        let result = session.finish_data_collection();
        assert!(matches!(result, Err(SmtpError::MalformedMessage)));
        assert_eq!(session.state, SmtpState::GreetingReceived);
        assert!(session.to.is_empty());
    }

    #[test]
    fn test_line_too_long() {
        let mut session = ready_for_data();
        session.start_data_mode().unwrap();

        let result = session.add_data_line("a".repeat(SmtpLimits::TEXT_LINE_MAX_LENGTH));
        assert!(matches!(result, Err(SmtpError::LineTooLong { .. })));
    }

    #[test]
    fn test_can_execute_command() {
        let mut session = SmtpSession::new();
        assert!(session.can_execute_command("HELO"));
        assert!(session.can_execute_command("noop"));
        assert!(!session.can_execute_command("MAIL"));
        assert!(!session.can_execute_command("RSET"));

        session.set_client_domain("client.local".to_string()).unwrap();
        assert!(session.can_execute_command("MAIL"));
        assert!(!session.can_execute_command("RCPT"));

        session.set_sender("sender@example.com".to_string()).unwrap();
        assert!(session.can_execute_command("RCPT"));
        assert!(!session.can_execute_command("DATA"));

        session.add_recipient("recipient@example.com".to_string()).unwrap();
        assert!(session.can_execute_command("DATA"));
        assert!(session.can_execute_command("RCPT"));
    }

    #[test]
    fn test_reset_keeps_client_domain() {
        let mut session = ready_for_data();
        session.reset();

        assert_eq!(session.state, SmtpState::GreetingReceived);
        assert!(session.from.is_none());
        assert!(session.to.is_empty());
        assert_eq!(session.client_domain.as_deref(), Some("client.local"));
    }
}
