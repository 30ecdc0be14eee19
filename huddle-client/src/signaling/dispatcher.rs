use dashmap::DashMap;
use huddle_core::{InboundSignal, SignalKind};
use std::sync::Arc;

pub type SignalHandler = Arc<dyn Fn(&InboundSignal) + Send + Sync>;

/// Dispatch table from event name to its subscribers.
///
/// Handlers for one name run synchronously in registration order. Clones
/// share the same table.
#[derive(Clone, Default)]
pub struct SignalDispatcher {
    handlers: Arc<DashMap<SignalKind, Vec<SignalHandler>>>,
}

impl SignalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: SignalKind, handler: SignalHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Invokes every handler registered for the signal's name and returns
    /// how many ran.
    pub fn dispatch(&self, signal: &InboundSignal) -> usize {
        // Handlers may register more handlers, so the shard lock is released first.
        let handlers: Vec<SignalHandler> = match self.handlers.get(&signal.kind()) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };

        for handler in &handlers {
            handler(signal);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: SignalKind) -> usize {
        self.handlers.get(&kind).map_or(0, |entry| entry.len())
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }
}
