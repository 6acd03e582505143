//! Simulated RFID reader for tests and the loopback demo.
//!
//! Records how often scanning was started and stopped.  Availability is an
//! atomic flag so a test can unplug the reader while the relay holds it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::application::relay_scans::{RfidReader, ScanError};

/// A reader that performs no I/O.
pub struct SimulatedRfidReader {
    available: AtomicBool,
    /// Number of successful `start_scan` calls.
    pub starts: AtomicUsize,
    /// Number of successful `stop_scan` calls.
    pub stops: AtomicUsize,
    /// When `true`, `start_scan` and `stop_scan` return `ScanError::Hardware`.
    pub should_fail: bool,
}

impl SimulatedRfidReader {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn command(&self, counter: &AtomicUsize) -> Result<(), ScanError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(ScanError::Unavailable);
        }
        if self.should_fail {
            return Err(ScanError::Hardware("simulated reader fault".to_string()));
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for SimulatedRfidReader {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RfidReader for SimulatedRfidReader {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn start_scan(&self) -> Result<(), ScanError> {
        self.command(&self.starts)
    }

    fn stop_scan(&self) -> Result<(), ScanError> {
        self.command(&self.stops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reader_counts_commands() {
        let reader = SimulatedRfidReader::default();

        reader.start_scan().unwrap();
        reader.stop_scan().unwrap();
        reader.stop_scan().unwrap();

        assert_eq!(reader.start_count(), 1);
        assert_eq!(reader.stop_count(), 2);
    }

    #[test]
    fn test_unplugged_reader_refuses_to_start() {
        let reader = SimulatedRfidReader::new(true);
        reader.set_available(false);

        assert!(!reader.is_available());
        assert!(matches!(reader.start_scan(), Err(ScanError::Unavailable)));
        assert_eq!(reader.start_count(), 0);
    }

    #[test]
    fn test_failing_reader_reports_hardware_error() {
        let reader = SimulatedRfidReader {
            should_fail: true,
            ..SimulatedRfidReader::default()
        };

        assert!(matches!(reader.start_scan(), Err(ScanError::Hardware(_))));
    }
}
