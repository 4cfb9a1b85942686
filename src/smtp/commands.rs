//! SMTP command dispatch

use crate::smtp::error::{SmtpError, SmtpLimits};
use crate::smtp::response::SmtpResponse;
use crate::smtp::services::EmailValidator;
use crate::smtp::session::SmtpSession;

/// Turns command lines into session updates and replies
pub struct SmtpCommandHandler<'a> {
    hostname: &'a str,
    validator: &'a dyn EmailValidator,
}

impl<'a> SmtpCommandHandler<'a> {
    pub fn new(hostname: &'a str, validator: &'a dyn EmailValidator) -> Self {
        Self {
            hostname,
            validator,
        }
    }

    pub fn process_command(
        &self,
        command_line: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if command_line.len() + 2 > SmtpLimits::COMMAND_LINE_MAX_LENGTH {
            return Err(SmtpError::LineTooLong {
                max: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
            });
        }

        let (verb, argument) = match command_line.split_once(char::is_whitespace) {
            Some((verb, argument)) => (verb, argument.trim()),
            None => (command_line, ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "HELO" => self.handle_helo(argument, session),
            #[cfg(feature = "ehlo")]
            "EHLO" => self
                .handle_helo(argument, session)
                .map(|_| SmtpResponse::ehlo(self.hostname, argument)),
            "MAIL" => self.handle_mail(argument, session),
            "RCPT" => self.handle_rcpt(argument, session),
            "DATA" => self.handle_data(argument, session),
            "RSET" => self.handle_rset(session),
            "NOOP" => Ok(SmtpResponse::ok()),
            "QUIT" => Ok(SmtpResponse::quit()),
            _ => Err(SmtpError::InvalidCommand),
        }
    }

    fn handle_helo(
        &self,
        argument: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if argument.is_empty() || argument.contains(char::is_whitespace) {
            return Err(SmtpError::InvalidSyntax(
                "HELO requires a single domain argument".to_string(),
            ));
        }

        session.set_client_domain(argument.to_string())?;
        Ok(SmtpResponse::helo(self.hostname, argument))
    }

    fn handle_mail(
        &self,
        argument: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("MAIL") {
            return Err(SmtpError::InvalidState(
                "MAIL command requires HELO first".to_string(),
            ));
        }

        let address = self.parse_path(argument, "FROM:")?;
        session.set_sender(address)?;
        Ok(SmtpResponse::ok())
    }

    fn handle_rcpt(
        &self,
        argument: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("RCPT") {
            return Err(SmtpError::InvalidState(
                "RCPT command requires MAIL first".to_string(),
            ));
        }

        let address = self.parse_path(argument, "TO:")?;
        session.add_recipient(address)?;
        Ok(SmtpResponse::ok())
    }

    fn handle_data(
        &self,
        argument: &str,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("DATA") {
            return Err(SmtpError::InvalidState(
                "DATA command requires RCPT first".to_string(),
            ));
        }

        if !argument.is_empty() {
            return Err(SmtpError::InvalidSyntax(
                "DATA command takes no arguments".to_string(),
            ));
        }

        session.start_data_mode()?;
        Ok(SmtpResponse::data_start())
    }

    fn handle_rset(&self, session: &mut SmtpSession) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("RSET") {
            return Err(SmtpError::InvalidState(
                "RSET command requires HELO first".to_string(),
            ));
        }

        session.reset();
        Ok(SmtpResponse::ok())
    }

    /// Extract the address from `FROM:<addr>` / `TO:<addr>`.
    fn parse_path(&self, argument: &str, keyword: &str) -> Result<String, SmtpError> {
        let has_keyword = argument
            .get(..keyword.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword));
        if !has_keyword {
            return Err(SmtpError::InvalidSyntax(format!(
                "expected '{keyword}<address>'"
            )));
        }

        let path = argument[keyword.len()..].trim();
        let address = path
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| {
                SmtpError::InvalidSyntax("address must be enclosed in angle brackets".to_string())
            })?;

        if address.is_empty() {
            return Err(SmtpError::InvalidSyntax(
                "address cannot be empty".to_string(),
            ));
        }

        self.validate_email_address(address)?;
        Ok(address.to_string())
    }

    /// Size limits first, then the injected validator decides on syntax.
    fn validate_email_address(&self, address: &str) -> Result<(), SmtpError> {
        if address.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }

        if let Some((user, domain)) = address.rsplit_once('@') {
            if user.len() > SmtpLimits::USER_MAX_LENGTH {
                return Err(SmtpError::UserTooLong {
                    max: SmtpLimits::USER_MAX_LENGTH,
                });
            }
            if domain.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
                return Err(SmtpError::DomainTooLong {
                    max: SmtpLimits::DOMAIN_MAX_LENGTH,
                });
            }
        }

        if !self.validator.validate_email_address(address) {
            return Err(SmtpError::InvalidSyntax(
                "invalid email address format".to_string(),
            ));
        }

        Ok(())
    }
}
