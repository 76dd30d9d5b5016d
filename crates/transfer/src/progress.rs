/// Receiver of byte-advance events from an upload.
///
/// All calls happen on the task driving the transfer loop, one at a time.
/// The sink owns any rendering concerns (percentages, rates, ETAs); the
/// upload engine only reports what the server acknowledged.
pub trait ProgressSink {
    /// Called once before the first chunk is sent.
    ///
    /// `already_confirmed` is the offset the server reported at the start of
    /// the run; it is non-zero when a previous run is being resumed.
    fn on_start(&mut self, _name: &str, _total: u64, _already_confirmed: u64) {}

    /// Called once per acknowledged chunk with the number of newly
    /// acknowledged bytes.
    fn on_advance(&mut self, bytes_delta: u64);

    /// Called after the upload was finalized.
    fn on_finish(&mut self) {}
}

/// Sink that discards every event (silent mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_advance(&mut self, _bytes_delta: u64) {}
}
