//! Display sinks
//!
//! A node reports three independent streams: what it sends, what it
//! receives, and periodic dumps of its chain. How they are rendered is up to
//! the sink.

use log::info;
use std::sync::Mutex;

pub trait DisplaySink: Send + Sync {
    fn print_sending_log(&self, text: &str);
    fn print_received_log(&self, text: &str);
    fn print_blockchain_log(&self, text: &str);
}

/// Writes each stream through `log` under its own target, so
/// `RUST_LOG=received=info` shows only inbound traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogView;

impl DisplaySink for LogView {
    fn print_sending_log(&self, text: &str) {
        info!(target: "sending", "{text}");
    }

    fn print_received_log(&self, text: &str) {
        info!(target: "received", "{text}");
    }

    fn print_blockchain_log(&self, text: &str) {
        info!(target: "blockchain", "{text}");
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct BufferedView {
    sending: Mutex<Vec<String>>,
    received: Mutex<Vec<String>>,
    blockchain: Mutex<Vec<String>>,
}

impl BufferedView {
    pub fn new() -> BufferedView {
        BufferedView::default()
    }

    pub fn sending(&self) -> Vec<String> {
        self.sending
            .lock()
            .expect("Failed to acquire lock on view - this should never happen")
            .clone()
    }

    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .expect("Failed to acquire lock on view - this should never happen")
            .clone()
    }

    pub fn blockchain(&self) -> Vec<String> {
        self.blockchain
            .lock()
            .expect("Failed to acquire lock on view - this should never happen")
            .clone()
    }
}

fn push(stream: &Mutex<Vec<String>>, text: &str) {
    stream
        .lock()
        .expect("Failed to acquire lock on view - this should never happen")
        .push(text.to_string());
}

impl DisplaySink for BufferedView {
    fn print_sending_log(&self, text: &str) {
        push(&self.sending, text);
    }

    fn print_received_log(&self, text: &str) {
        push(&self.received, text);
    }

    fn print_blockchain_log(&self, text: &str) {
        push(&self.blockchain, text);
    }
}

/// Section header used in the sending and received streams
pub fn banner(title: &str) -> String {
    let delimiter = "-".repeat(20);
    format!("{delimiter}{title}{delimiter}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_view_keeps_streams_apart() {
        let view = BufferedView::new();
        view.print_sending_log("out");
        view.print_received_log("in");
        view.print_received_log("in again");

        assert_eq!(view.sending(), vec!["out"]);
        assert_eq!(view.received().len(), 2);
        assert!(view.blockchain().is_empty());
    }

    #[test]
    fn test_banner() {
        assert_eq!(
            banner("SENDING NEW BLOCK"),
            "--------------------SENDING NEW BLOCK--------------------"
        );
    }
}
