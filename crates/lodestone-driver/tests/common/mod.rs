//! Shared fixtures for the driver integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lodestone_core::{CardId, DeviceName};
use lodestone_driver::ReaderHandler;

/// One recorded callback invocation, reduced to plain strings for asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Detected { reader: String, card: String },
    Lost { reader: String, card: String },
    Traits { reader: String, traits: Vec<String> },
}

/// A [`ReaderHandler`] that records every invocation in order.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Callback>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingHandler::default())
    }

    pub fn calls(&self) -> Vec<Callback> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReaderHandler for RecordingHandler {
    fn card_detected(&self, reader: &DeviceName, card: &CardId) {
        self.calls.lock().unwrap().push(Callback::Detected {
            reader: reader.to_string(),
            card: card.to_string(),
        });
    }

    fn card_lost(&self, reader: &DeviceName, card: &CardId) {
        self.calls.lock().unwrap().push(Callback::Lost {
            reader: reader.to_string(),
            card: card.to_string(),
        });
    }

    fn traits_detected(&self, reader: &DeviceName, traits: &[String]) {
        self.calls.lock().unwrap().push(Callback::Traits {
            reader: reader.to_string(),
            traits: traits.to_vec(),
        });
    }
}

/// Poll `predicate` until it holds, panicking after 200 polls.
///
/// The tests run under paused time, so the sleeps between polls advance
/// virtual time and cost nothing real.
pub async fn wait_until(what: &str, mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {what}");
}
