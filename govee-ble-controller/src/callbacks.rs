//! State observers

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use govee_proto::LightState;
use log::error;

pub type Callback = Arc<dyn Fn(&LightState) + Send + Sync>;

/// Token returned by registration, used to unregister exactly that entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Default)]
pub struct CallbackRegistry {
    next_id: u64,
    entries: Vec<(CallbackId, Callback)>,
}

impl CallbackRegistry {
    pub fn register(&mut self, callback: Callback) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Returns whether `id` was still registered
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot in registration order, so callbacks run without the registry locked
    pub fn snapshot(&self) -> Vec<Callback> {
        self.entries.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

/// Run every callback in order. A panicking callback is logged and skipped.
pub fn fire(name: &str, callbacks: &[Callback], state: &LightState) {
    for callback in callbacks {
        if catch_unwind(AssertUnwindSafe(|| callback(state))).is_err() {
            error!("{}: state callback panicked", name);
        }
    }
}
