use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::counting::domain::count_sink::{format_count_line, CountSink, CountSinkError};

/// Appends one line per count to a text file.
///
/// The file is opened in append mode for every event, so external rotation
/// or truncation between events is picked up.
pub struct FileCountSink {
    path: PathBuf,
}

impl FileCountSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CountSink for FileCountSink {
    fn record(&mut self, count: usize) -> Result<(), CountSinkError> {
        let append_err = |source| CountSinkError::Append {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        writeln!(file, "{}", format_count_line(count)).map_err(append_err)?;
        file.flush().map_err(append_err)
    }
}
