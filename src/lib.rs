//! # CatchMail
//!
//! CatchMail is an SMTP server that captures mail instead of delivering it.
//!
//! Every accepted message has its MIME headers parsed and is handed to a
//! channel as a [`MailItem`], ready for storage or display.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catchmail::SmtpServer;
//! use std::sync::mpsc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let (tx, rx) = mpsc::channel();
//! let server = SmtpServer::new("test.local").with_max_workers(4);
//!
//! thread::spawn(move || {
//!     server.start("127.0.0.1:2525", tx).unwrap();
//! });
//!
//! // Application sends email to localhost:2525
//! // ...
//!
//! if let Ok(mail) = rx.recv_timeout(Duration::from_millis(100)) {
//!     println!("Received {:?} from {}", mail.subject(), mail.from);
//! }
//! ```
//!
//! ## Worker pool
//!
//! Connections are served by a fixed number of workers
//! ([`SmtpServer::with_max_workers`]). A connection that cannot get a worker
//! within the acquisition timeout (two seconds by default) gets a `421` reply
//! and is closed, so load beyond the pool size is rejected rather than queued.
//!
//! ## Header parsing
//!
//! Only Content-Type (with its multipart boundary), Date, MIME-Version and
//! Subject are extracted. Folded headers are unfolded first, header names
//! match case-insensitively, dates are normalized to `YYYY-MM-DD HH:MM:SS`
//! UTC when recognized, and every message is stamped with
//! [`MAILER_SIGNATURE`]. Bodies and attachments are not decoded.
//!
//! ## Supported SMTP commands
//!
//! `HELO`, `MAIL FROM`, `RCPT TO`, `DATA`, `RSET`, `NOOP`, `QUIT`, and `EHLO`
//! with the `ehlo` feature. RFC 821 size limits are enforced (see
//! [`SmtpLimits`]). There is no authentication, TLS or relaying.

pub mod mime;
mod smtp;

pub use mime::{MAILER_SIGNATURE, MailHeader};
pub use smtp::{
    BasicEmailValidator, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_WORKERS, EmailValidator, MailItem,
    Sanitizer, SmtpError, SmtpLimits, SmtpResponse, SmtpServer, SmtpSession, SmtpState,
    SmtpWorker, WorkerPool, XssSanitizer,
};
