use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use catchmail::{DEFAULT_MAX_WORKERS, MailItem, SmtpServer};
use clap::Parser;

/// Capture mail sent over SMTP and print it as JSON lines
#[derive(Debug, Parser)]
#[command(name = "catchmail", version, about)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "CATCHMAIL_ADDR", default_value = "127.0.0.1:2525")]
    addr: String,

    /// Hostname announced in greetings
    #[arg(long, env = "CATCHMAIL_HOSTNAME", default_value = "catchmail.local")]
    hostname: String,

    /// Connections served at the same time
    #[arg(long, env = "CATCHMAIL_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// How long a connection waits for a free worker
    #[arg(long, default_value_t = 2000)]
    acquire_timeout_ms: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let server = SmtpServer::new(&cli.hostname)
        .with_max_workers(cli.workers)
        .with_acquire_timeout(Duration::from_millis(cli.acquire_timeout_ms));

    let (tx, rx) = mpsc::channel::<MailItem>();

    thread::spawn(move || {
        for mail in rx {
            match serde_json::to_string(&mail) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not serialize captured mail"),
            }
        }
    });

    server
        .start(&cli.addr, tx)
        .with_context(|| format!("failed to serve SMTP on {}", cli.addr))
}

/// Log to stderr so stdout carries only captured mail.
fn setup_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
