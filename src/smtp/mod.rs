//! SMTP protocol plumbing: sessions, workers and the pool that admits them

pub mod commands;
pub mod error;
pub mod mail;
pub mod pool;
pub mod response;
pub mod server;
pub mod services;
pub mod session;
pub mod transport;
pub mod worker;

pub use error::{SmtpError, SmtpLimits};
pub use mail::MailItem;
pub use pool::{DEFAULT_ACQUIRE_TIMEOUT, WorkerPool};
pub use response::SmtpResponse;
pub use server::{DEFAULT_MAX_WORKERS, SmtpServer};
pub use services::{BasicEmailValidator, EmailValidator, Sanitizer, XssSanitizer};
pub use session::{SmtpSession, SmtpState};
pub use worker::SmtpWorker;
