use std::io::IsTerminal;

use gxupload_transfer::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {binary_bytes_per_sec} eta {eta}";

/// Terminal progress bar for one file.
///
/// Redraws only when bytes are acknowledged; there is no background tick.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let bar = if std::io::stderr().is_terminal() {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarSink {
    fn on_start(&mut self, name: &str, total: u64, already_confirmed: u64) {
        self.bar.set_message(name.to_string());
        self.bar.set_length(total);
        self.bar.set_position(already_confirmed);
        // Rate and ETA cover this run's bytes only.
        self.bar.reset_eta();
    }

    fn on_advance(&mut self, bytes_delta: u64) {
        self.bar.inc(bytes_delta);
    }

    fn on_finish(&mut self) {
        self.bar.finish();
    }
}

impl Drop for BarSink {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_tracks_resumed_and_new_bytes() {
        let mut sink = BarSink::new();
        sink.on_start("reads.fq", 100, 40);
        sink.on_advance(30);
        sink.on_advance(30);
        assert_eq!(sink.position(), 100);
        sink.on_finish();
    }
}
