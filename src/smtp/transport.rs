//! Line reader and reply writer bound to one connection

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use crate::smtp::error::{SmtpError, SmtpLimits};
use crate::smtp::response::SmtpResponse;

/// Reads protocol lines from a client.
#[derive(Debug)]
pub struct SmtpReader {
    inner: BufReader<TcpStream>,
    buffer: Vec<u8>,
}

impl SmtpReader {
    pub fn new(connection: TcpStream) -> Self {
        Self {
            inner: BufReader::new(connection),
            buffer: Vec::new(),
        }
    }

    /// Next line without its CRLF or LF, `None` once the client hung up.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_line(&mut self) -> Result<Option<String>, SmtpError> {
        self.buffer.clear();
        if self.inner.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buffer);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Writes replies to a client.
#[derive(Debug)]
pub struct SmtpWriter {
    inner: TcpStream,
}

impl SmtpWriter {
    pub fn new(connection: TcpStream) -> Self {
        Self { inner: connection }
    }

    pub fn send_response(&mut self, response: &SmtpResponse) -> Result<(), SmtpError> {
        let formatted = response.format();
        if formatted.len() > SmtpLimits::REPLY_LINE_MAX_LENGTH && response.multiline.is_empty() {
            let truncated = SmtpResponse::new(response.code, "Response too long (truncated)");
            self.inner.write_all(truncated.format().as_bytes())?;
        } else {
            self.inner.write_all(formatted.as_bytes())?;
        }
        self.inner.flush()?;
        Ok(())
    }
}
