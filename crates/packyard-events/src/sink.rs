use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use crate::RegistryEvent;

/// Consumer of registry events.
///
/// Search indexers, audit logs and tests each provide their own implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RegistryEvent);
}

/// Forwards events through an mpsc channel.
///
/// The receiving end can live on another thread, e.g. a search index
/// updater draining removals in the background.
pub struct ChannelSink {
    sender: Mutex<Sender<RegistryEvent>>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<RegistryEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: RegistryEvent) {
        if let Ok(sender) = self.sender.lock() {
            // a dropped receiver just means nobody is listening anymore
            let _ = sender.send(event);
        }
    }
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RegistryEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RegistryEvent>>,
}

impl RecordingSink {
    /// Returns a copy of the recorded events.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Drains the recorded events.
    pub fn take(&self) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RegistryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
