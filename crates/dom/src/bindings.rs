//! Side tables keyed by node identity.
//!
//! Handler and mount bookkeeping lives beside the tree, never on it. A
//! handler slot is shared with every queued event it produced, so marking it
//! stale invalidates those events in place.

use crate::native::NativeMount;
use core_types::NodeKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use vdom::Handler;

/// One installed event listener.
#[derive(Debug)]
pub struct HandlerSlot {
    pub handler: Handler,
    stale: AtomicBool,
}

impl HandlerSlot {
    pub fn new(handler: Handler) -> Arc<Self> {
        Arc::new(Self {
            handler,
            stale: AtomicBool::new(false),
        })
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Relaxed);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct Bindings {
    handlers: HashMap<NodeKey, HashMap<String, Arc<HandlerSlot>>>,
    mounts: HashMap<NodeKey, Box<dyn NativeMount>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a listener under a key. A previous occupant is marked stale
    /// first, so there is exactly one live listener per key and in-flight
    /// events of the old one die with it.
    pub fn set_event(&mut self, node: NodeKey, name: &str, handler: Handler) {
        let slots = self.handlers.entry(node).or_default();
        if let Some(old) = slots.insert(name.to_string(), HandlerSlot::new(handler)) {
            old.mark_stale();
        }
    }

    /// Mark stale and forget. False when no listener occupied the key.
    pub fn remove_event(&mut self, node: NodeKey, name: &str) -> bool {
        let Some(slots) = self.handlers.get_mut(&node) else {
            return false;
        };
        let Some(old) = slots.remove(name) else {
            return false;
        };
        old.mark_stale();
        true
    }

    pub fn slot(&self, node: NodeKey, name: &str) -> Option<Arc<HandlerSlot>> {
        self.handlers.get(&node)?.get(name).cloned()
    }

    pub fn add_mount(&mut self, root: NodeKey, mount: Box<dyn NativeMount>) {
        self.mounts.insert(root, mount);
    }

    pub fn has_mount(&self, node: NodeKey) -> bool {
        self.mounts.contains_key(&node)
    }

    pub fn take_mount(&mut self, node: NodeKey) -> Option<Box<dyn NativeMount>> {
        self.mounts.remove(&node)
    }

    pub fn put_mount(&mut self, node: NodeKey, mount: Box<dyn NativeMount>) {
        self.mounts.insert(node, mount);
    }

    /// Forget every binding owned by removed keys. Their handler slots are
    /// marked stale so queued events from the dead subtree stop mattering
    /// even before the ancestry check would catch them.
    pub fn purge(&mut self, removed: &[NodeKey]) {
        for key in removed {
            if let Some(slots) = self.handlers.remove(key) {
                for slot in slots.values() {
                    slot.mark_stale();
                }
            }
            self.mounts.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use vdom::Handle;

    fn handler(id: u64) -> Handler {
        Handler {
            name: "succeed".to_string(),
            args: Value::Null,
            handle: Handle { id, maps: None },
        }
    }

    #[test]
    fn set_event_supersedes_previous_slot() {
        let mut bindings = Bindings::new();
        let node = NodeKey(1);
        bindings.set_event(node, "click", handler(1));
        let first = bindings.slot(node, "click").expect("slot");
        bindings.set_event(node, "click", handler(2));
        let second = bindings.slot(node, "click").expect("slot");
        assert!(first.is_stale());
        assert!(!second.is_stale());
        assert_eq!(second.handler.handle.id, 2);
    }

    #[test]
    fn remove_event_marks_stale_and_forgets() {
        let mut bindings = Bindings::new();
        let node = NodeKey(1);
        bindings.set_event(node, "click", handler(1));
        let slot = bindings.slot(node, "click").expect("slot");
        assert!(bindings.remove_event(node, "click"));
        assert!(slot.is_stale());
        assert!(bindings.slot(node, "click").is_none());
        assert!(!bindings.remove_event(node, "click"));
    }

    #[test]
    fn purge_invalidates_handlers_of_removed_keys() {
        let mut bindings = Bindings::new();
        let node = NodeKey(4);
        bindings.set_event(node, "keydown", handler(9));
        let slot = bindings.slot(node, "keydown").expect("slot");
        bindings.purge(&[node]);
        assert!(slot.is_stale());
        assert!(bindings.slot(node, "keydown").is_none());
    }
}
