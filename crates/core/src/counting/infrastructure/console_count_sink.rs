use std::io::Write;

use crate::counting::domain::count_sink::{format_count_line, CountSink, CountSinkError};

/// Echoes each count line to a writer, stdout by default.
pub struct ConsoleCountSink<W: Write = std::io::Stdout> {
    out: W,
}

impl ConsoleCountSink {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleCountSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CountSink for ConsoleCountSink<W> {
    fn record(&mut self, count: usize) -> Result<(), CountSinkError> {
        writeln!(self.out, "{}", format_count_line(count)).map_err(CountSinkError::Console)?;
        self.out.flush().map_err(CountSinkError::Console)
    }
}
