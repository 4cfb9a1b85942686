//! Fixed-size pool of session workers
//!
//! The pool is the server's admission control: every accepted connection
//! must obtain a worker, and when none frees up within the acquisition
//! deadline the connection is turned away instead of queued.

use std::collections::VecDeque;
use std::net::TcpStream;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::smtp::error::SmtpError;
use crate::smtp::mail::MailItem;
use crate::smtp::response::SmtpResponse;
use crate::smtp::services::{EmailValidator, Sanitizer};
use crate::smtp::transport::SmtpWriter;
use crate::smtp::worker::SmtpWorker;

/// How long [`WorkerPool::acquire`] waits for a worker.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Workers not currently serving a connection, plus a signal for waiters.
///
/// A worker is either in `available` or owned by whoever acquired it; taking
/// it out of the queue moves it, so two callers can never hold the same one.
pub struct WorkerPool {
    capacity: usize,
    available: Mutex<VecDeque<SmtpWorker>>,
    worker_returned: Condvar,
}

impl WorkerPool {
    /// Create `max_workers` workers with ids `1..=max_workers`, all queued.
    ///
    /// Every worker shares the same validator and sanitizer. A pool without
    /// workers could never admit a connection, so zero is rejected.
    pub fn new(
        hostname: &str,
        max_workers: usize,
        validator: Arc<dyn EmailValidator>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Result<Self, SmtpError> {
        if max_workers == 0 {
            return Err(SmtpError::InvalidWorkerCount);
        }

        let hostname: Arc<str> = Arc::from(hostname);
        let workers: VecDeque<SmtpWorker> = (1..=max_workers)
            .map(|id| {
                SmtpWorker::new(
                    id,
                    Arc::clone(&hostname),
                    Arc::clone(&validator),
                    Arc::clone(&sanitizer),
                )
            })
            .collect();

        info!(workers = max_workers, "worker pool configured");

        Ok(Self {
            capacity: max_workers,
            available: Mutex::new(workers),
            worker_returned: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Workers currently waiting for a connection.
    pub fn available(&self) -> usize {
        self.queue().len()
    }

    /// [`acquire_timeout`](Self::acquire_timeout) with [`DEFAULT_ACQUIRE_TIMEOUT`].
    pub fn acquire(
        &self,
        connection: TcpStream,
        output: Sender<MailItem>,
    ) -> Result<SmtpWorker, SmtpError> {
        self.acquire_timeout(connection, output, DEFAULT_ACQUIRE_TIMEOUT)
    }

    /// Take the next idle worker and bind it to `connection` and `output`.
    ///
    /// Waits up to `timeout` for a worker to be released. On expiry the
    /// client is sent a 421 reply, the connection is closed and
    /// [`SmtpError::NoWorkerAvailable`] returned; no worker leaves the queue
    /// in that case.
    pub fn acquire_timeout(
        &self,
        connection: TcpStream,
        output: Sender<MailItem>,
        timeout: Duration,
    ) -> Result<SmtpWorker, SmtpError> {
        let queue = self.queue();
        let (mut queue, _) = self
            .worker_returned
            .wait_timeout_while(queue, timeout, |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        let Some(mut worker) = queue.pop_front() else {
            drop(queue);
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "no worker available, rejecting connection"
            );
            let busy = SmtpResponse::from_error(&SmtpError::NoWorkerAvailable);
            if let Err(error) = SmtpWriter::new(connection).send_response(&busy) {
                debug!(error = %error, "could not send busy reply");
            }
            return Err(SmtpError::NoWorkerAvailable);
        };
        drop(queue);

        let peer = connection.peer_addr().ok();
        if let Err(error) = worker.bind(connection, output) {
            self.release(worker);
            return Err(error);
        }

        info!(worker = worker.id(), peer = ?peer, "worker assigned to connection");
        Ok(worker)
    }

    /// Put a worker back in the queue and wake one waiting acquirer.
    ///
    /// The worker's connection is closed here. Handing the same worker back
    /// twice is impossible since release takes it by value.
    pub fn release(&self, mut worker: SmtpWorker) {
        worker.unbind();
        self.queue().push_back(worker);
        self.worker_returned.notify_one();
    }

    // Critical sections are a single push or pop, so a poisoned queue is
    // still consistent.
    fn queue(&self) -> MutexGuard<'_, VecDeque<SmtpWorker>> {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
