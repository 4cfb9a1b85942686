//! Listener loop dispatching connections to pooled workers

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::smtp::error::SmtpError;
use crate::smtp::mail::MailItem;
use crate::smtp::pool::{DEFAULT_ACQUIRE_TIMEOUT, WorkerPool};
use crate::smtp::services::{BasicEmailValidator, EmailValidator, Sanitizer, XssSanitizer};
use crate::smtp::worker::SmtpWorker;

pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Capturing SMTP server that sends every received mail to a channel
#[derive(Clone)]
pub struct SmtpServer {
    hostname: String,
    max_workers: usize,
    acquire_timeout: Duration,
    validator: Arc<dyn EmailValidator>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl SmtpServer {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            max_workers: DEFAULT_MAX_WORKERS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            validator: Arc::new(BasicEmailValidator),
            sanitizer: Arc::new(XssSanitizer),
        }
    }

    /// Number of connections served at the same time.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// How long a new connection may wait for a free worker.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn EmailValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Bind `addr` and serve forever.
    pub fn start(&self, addr: &str, mail_sender: mpsc::Sender<MailItem>) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(addr)?;
        self.start_with_listener(listener, mail_sender)
    }

    /// Serve connections from an already bound listener.
    ///
    /// Each connection waits for a pooled worker; when none frees up in time
    /// the client gets a `421` reply and the connection is closed.
    pub fn start_with_listener(
        &self,
        listener: TcpListener,
        mail_sender: mpsc::Sender<MailItem>,
    ) -> Result<(), SmtpError> {
        let pool = Arc::new(WorkerPool::new(
            &self.hostname,
            self.max_workers,
            Arc::clone(&self.validator),
            Arc::clone(&self.sanitizer),
        )?);

        info!(addr = %listener.local_addr()?, hostname = %self.hostname, "SMTP server listening");

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "error accepting connection");
                    continue;
                }
            };

            let worker =
                match pool.acquire_timeout(stream, mail_sender.clone(), self.acquire_timeout) {
                    Ok(worker) => worker,
                    Err(e) => {
                        warn!(error = %e, "connection rejected");
                        continue;
                    }
                };

            let mut checkout = Checkout::new(Arc::clone(&pool), worker);
            thread::spawn(move || {
                let Some(worker) = checkout.worker.as_mut() else {
                    return;
                };
                if let Err(e) = worker.work() {
                    warn!(worker = worker.id(), error = %e, "error handling client");
                }
            });
        }

        Ok(())
    }
}

/// An acquired worker that goes back to its pool when dropped, unwinding
/// included.
struct Checkout {
    pool: Arc<WorkerPool>,
    worker: Option<SmtpWorker>,
}

impl Checkout {
    fn new(pool: Arc<WorkerPool>, worker: SmtpWorker) -> Self {
        Self {
            pool,
            worker: Some(worker),
        }
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.pool.release(worker);
        }
    }
}
