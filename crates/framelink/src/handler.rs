use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Opaque token identifying one handler registration.
///
/// Returned by [`Adapter::on`](crate::Adapter::on) and consumed by
/// [`Adapter::off`](crate::Adapter::off). Every registration gets a fresh
/// id, so registering the same closure twice yields two independently
/// removable entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A registered handler with its concrete message type erased.
pub(crate) type ErasedHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

#[derive(Clone)]
pub(crate) struct HandlerEntry {
    pub(crate) id: HandlerId,
    pub(crate) func: ErasedHandler,
}

/// Name-keyed handler lists.
///
/// Registration may race the dispatch loop, so every access goes through
/// the lock; the loop takes a per-frame snapshot and invokes handlers with
/// the lock released.
#[derive(Default)]
pub(crate) struct HandlerTable {
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Vec<HandlerEntry>>>,
}

impl HandlerTable {
    pub(crate) fn add(&self, name: &str, func: ErasedHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.lock();
        entries
            .entry(name.to_string())
            .or_default()
            .push(HandlerEntry { id, func });
        id
    }

    pub(crate) fn remove(&self, name: &str, id: HandlerId) {
        let mut entries = self.lock();
        if let Some(list) = entries.get_mut(name) {
            list.retain(|entry| entry.id != id);
        }
    }

    pub(crate) fn remove_all(&self, name: &str) {
        self.lock().remove(name);
    }

    /// The current handler list for a name, in registration order.
    pub(crate) fn snapshot(&self, name: &str) -> Vec<HandlerEntry> {
        self.lock().get(name).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<HandlerEntry>>> {
        // Handler lists stay consistent across a panic elsewhere; recover.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
