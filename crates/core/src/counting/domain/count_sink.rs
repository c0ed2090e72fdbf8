use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountSinkError {
    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write count to console: {0}")]
    Console(#[source] std::io::Error),
}

/// Receives each people count the moment it is measured.
pub trait CountSink {
    fn record(&mut self, count: usize) -> Result<(), CountSinkError>;
}

/// The line written for one detection event, without the trailing newline.
pub fn format_count_line(count: usize) -> String {
    format!("Number of people detected: {count}")
}

/// Forwards every count to each sink in order, stopping at the first error.
#[derive(Default)]
pub struct CountSinks {
    sinks: Vec<Box<dyn CountSink>>,
}

impl CountSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn CountSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl CountSink for CountSinks {
    fn record(&mut self, count: usize) -> Result<(), CountSinkError> {
        for sink in &mut self.sinks {
            sink.record(count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording(Rc<RefCell<Vec<(u8, usize)>>>, u8);

    impl CountSink for Recording {
        fn record(&mut self, count: usize) -> Result<(), CountSinkError> {
            self.0.borrow_mut().push((self.1, count));
            Ok(())
        }
    }

    struct Failing;

    impl CountSink for Failing {
        fn record(&mut self, _count: usize) -> Result<(), CountSinkError> {
            Err(CountSinkError::Console(std::io::Error::other("closed")))
        }
    }

    #[test]
    fn test_format_count_line() {
        assert_eq!(format_count_line(0), "Number of people detected: 0");
        assert_eq!(format_count_line(12), "Number of people detected: 12");
    }

    #[test]
    fn test_forwards_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sinks = CountSinks::new()
            .with(Box::new(Recording(log.clone(), 1)))
            .with(Box::new(Recording(log.clone(), 2)));
        assert_eq!(sinks.len(), 2);

        sinks.record(3).unwrap();
        assert_eq!(*log.borrow(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn test_stops_at_first_error() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sinks = CountSinks::new()
            .with(Box::new(Failing))
            .with(Box::new(Recording(log.clone(), 1)));

        assert!(sinks.record(1).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_empty_is_ok() {
        let mut sinks = CountSinks::new();
        assert!(sinks.is_empty());
        assert!(sinks.record(5).is_ok());
    }
}
