//! Progress lines read by the process that launches the uploader.
//!
//! Lines starting with `DATA: ` carry messages for the caller, and every run ends with
//! exactly one `END DATA: ` line. Diagnostics go through `tracing` instead, which writes
//! to stderr.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Prefix of lines the caller consumes.
pub const DATA_PREFIX: &str = "DATA: ";

/// Prefix of the final line of a run.
pub const END_PREFIX: &str = "END DATA: ";

/// Writes progress lines to stdout, or to any other writer.
pub struct Reporter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    /// Create a reporter writing to `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Create a reporter writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Create a reporter writing to a buffer, returned alongside it.
    pub fn buffered() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        (Self::new(captured.clone()), captured)
    }

    /// A plain progress line.
    pub fn progress(&self, message: &str) {
        self.write_line(message);
    }

    /// A line for the caller.
    pub fn data(&self, message: &str) {
        self.write_line(&format!("{}{}", DATA_PREFIX, message));
    }

    /// The last line of a run.
    pub fn end(&self, message: &str) {
        self.write_line(&format!("{}{}", END_PREFIX, message));
    }

    fn write_line(&self, line: &str) {
        let Ok(mut out) = self.out.lock() else {
            warn!(line, "Reporter output is poisoned");
            return;
        };
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!(line, error = %e, "Failed to write progress line");
        }
    }
}

/// Shared in-memory sink for a [`Reporter`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    /// Lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.buffer
            .lock()
            .map(|buffer| {
                String::from_utf8_lossy(&buffer)
                    .lines()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "captured output is poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
