//! Session workers: reusable units that drive one connection at a time

use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use crate::smtp::commands::SmtpCommandHandler;
use crate::smtp::error::SmtpError;
use crate::smtp::mail::MailItem;
use crate::smtp::response::SmtpResponse;
use crate::smtp::services::{EmailValidator, Sanitizer};
use crate::smtp::session::SmtpSession;
use crate::smtp::transport::{SmtpReader, SmtpWriter};

/// What a worker holds while checked out of the pool
struct Binding {
    connection: TcpStream,
    output: Sender<MailItem>,
    reader: SmtpReader,
    writer: SmtpWriter,
}

/// Handles the SMTP conversation of whichever connection it is bound to.
///
/// Workers are created by [`WorkerPool`](crate::WorkerPool) and only ever
/// reach callers through [`WorkerPool::acquire`](crate::WorkerPool::acquire),
/// which binds them to a fresh connection.
pub struct SmtpWorker {
    id: usize,
    hostname: Arc<str>,
    validator: Arc<dyn EmailValidator>,
    sanitizer: Arc<dyn Sanitizer>,
    binding: Option<Binding>,
}

impl SmtpWorker {
    pub(crate) fn new(
        id: usize,
        hostname: Arc<str>,
        validator: Arc<dyn EmailValidator>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            id,
            hostname,
            validator,
            sanitizer,
            binding: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.binding
            .as_ref()
            .and_then(|binding| binding.connection.peer_addr().ok())
    }

    /// Attach to `connection`, replacing any previous binding.
    ///
    /// Reader and writer are built over their own handles to the connection
    /// so nothing buffered for an earlier client can leak into this one.
    pub(crate) fn bind(
        &mut self,
        connection: TcpStream,
        output: Sender<MailItem>,
    ) -> Result<(), SmtpError> {
        let reader = SmtpReader::new(connection.try_clone()?);
        let writer = SmtpWriter::new(connection.try_clone()?);

        self.binding = Some(Binding {
            connection,
            output,
            reader,
            writer,
        });
        Ok(())
    }

    /// Drop the connection and output channel.
    pub(crate) fn unbind(&mut self) {
        self.binding = None;
    }

    /// Run the SMTP conversation until the client quits or disconnects.
    ///
    /// Every accepted transmission is parsed, sanitized and sent to the
    /// output channel bound with the connection.
    pub fn work(&mut self) -> Result<(), SmtpError> {
        let binding = self
            .binding
            .as_mut()
            .ok_or_else(|| SmtpError::InvalidState("worker is not bound to a connection".into()))?;
        let handler = SmtpCommandHandler::new(&self.hostname, self.validator.as_ref());
        let sanitizer = self.sanitizer.as_ref();

        let mut session = SmtpSession::new();
        let mut data_error: Option<SmtpError> = None;

        binding
            .writer
            .send_response(&SmtpResponse::greeting(&self.hostname))?;

        while let Some(line) = binding.reader.read_line()? {
            if session.in_data_mode() {
                if line != "." {
                    if data_error.is_none() {
                        let unstuffed = if line.starts_with("..") {
                            line[1..].to_string()
                        } else {
                            line
                        };
                        data_error = session.add_data_line(unstuffed).err();
                    }
                    continue;
                }

                let response = match data_error.take() {
                    Some(error) => {
                        session.reset();
                        SmtpResponse::from_error(&error)
                    }
                    None => match session.finish_data_collection() {
                        Ok(mail) => {
                            let mail = mail.sanitized(sanitizer);
                            let from = mail.from.clone();
                            let subject = mail.subject().to_string();
                            match binding.output.send(mail) {
                                Ok(()) => {
                                    info!(worker = self.id, from = %from, subject = %subject, "mail captured");
                                    SmtpResponse::queued()
                                }
                                Err(_) => {
                                    warn!(worker = self.id, from = %from, "mail receiver is gone, message not captured");
                                    SmtpResponse::capture_failed()
                                }
                            }
                        }
                        Err(error) => SmtpResponse::from_error(&error),
                    },
                };
                binding.writer.send_response(&response)?;
                continue;
            }

            let command = line.trim();
            if command.is_empty() {
                continue;
            }

            let response = handler
                .process_command(command, &mut session)
                .unwrap_or_else(|error| SmtpResponse::from_error(&error));
            binding.writer.send_response(&response)?;

            if response.code == 221 {
                break;
            }
        }

        debug!(worker = self.id, "session finished");
        Ok(())
    }
}

impl fmt::Debug for SmtpWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpWorker")
            .field("id", &self.id)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
