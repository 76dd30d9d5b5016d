//! Test doubles for crates building on the transfer primitives.
//!
//! Compiled only for this crate's tests or with the `test-util` feature.

use crate::ProgressSink;

/// Sink that keeps every event, for assertions in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub started: Option<(u64, u64)>,
    pub advances: Vec<u64>,
    pub finished: bool,
}

impl RecordingSink {
    /// Sum of all advances.
    pub fn total_advanced(&self) -> u64 {
        self.advances.iter().sum()
    }
}

impl ProgressSink for RecordingSink {
    fn on_start(&mut self, _name: &str, total: u64, already_confirmed: u64) {
        self.started = Some((total, already_confirmed));
    }

    fn on_advance(&mut self, bytes_delta: u64) {
        self.advances.push(bytes_delta);
    }

    fn on_finish(&mut self) {
        self.finished = true;
    }
}
