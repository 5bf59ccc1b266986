//! Declared-subscription reconciliation.

use bus::EventSink;
use core_types::SubId;
use registry::{Registry, Subscription};
use std::collections::{HashMap, HashSet};
use vdom::Sub;

#[derive(Default)]
pub struct SubscriptionSet {
    active: HashMap<SubId, Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: SubId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<SubId> {
        self.active.keys().copied().collect()
    }

    /// Align running producers with the declared set: start the new ids,
    /// tear down the vanished ones. Identity is the handle id alone; args
    /// changes to a running subscription are deliberately ignored, so a
    /// server that needs new args must rotate the id.
    pub fn reconcile(&mut self, declared: &[Sub], registry: &Registry, sink: &EventSink) {
        for sub in declared {
            let id = sub.handle.id;
            if self.active.contains_key(&id) {
                continue;
            }
            match registry.start_subscription(&sub.name, sub.handle.clone(), &sub.args, sink.clone())
            {
                Ok(subscription) => {
                    self.active.insert(id, subscription);
                }
                Err(err) => log::error!("subscription {} failed to start: {err:?}", sub.name),
            }
        }

        let declared_ids: HashSet<SubId> = declared.iter().map(|sub| sub.handle.id).collect();
        let gone: Vec<SubId> = self
            .active
            .keys()
            .copied()
            .filter(|id| !declared_ids.contains(id))
            .collect();
        for id in gone {
            if let Some(subscription) = self.active.remove(&id) {
                subscription.shutdown();
            }
        }
    }

    /// Tear down everything; used on runtime shutdown.
    pub fn shutdown_all(&mut self) {
        for (_, subscription) in self.active.drain() {
            subscription.shutdown();
        }
    }
}
