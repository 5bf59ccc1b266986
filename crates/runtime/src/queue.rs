//! The pending-event queue and staleness classification.
//!
//! The queue exclusively owns events between enqueue and dequeue; each is
//! consumed at most once. Between those two points a patch cycle may have
//! superseded the listener or detached the source node; such events are
//! stale and must not produce a request.

use core_types::NodeKey;
use dom::{HandlerSlot, LiveTree};
use std::collections::VecDeque;
use std::sync::Arc;
use vdom::Msg;

/// Where an event came from. Only interactions can go stale; command
/// results and subscription ticks are tied to no node.
pub enum Origin {
    Interaction {
        target: NodeKey,
        slot: Arc<HandlerSlot>,
    },
    Synthetic,
}

pub struct QueuedEvent {
    pub msg: Msg,
    pub origin: Origin,
}

impl QueuedEvent {
    pub fn interaction(msg: Msg, target: NodeKey, slot: Arc<HandlerSlot>) -> Self {
        Self {
            msg,
            origin: Origin::Interaction { target, slot },
        }
    }

    pub fn synthetic(msg: Msg) -> Self {
        Self {
            msg,
            origin: Origin::Synthetic,
        }
    }

    pub fn is_stale(&self, tree: &LiveTree) -> bool {
        match &self.origin {
            Origin::Synthetic => false,
            Origin::Interaction { target, slot } => {
                slot.is_stale() || !tree.is_attached(*target)
            }
        }
    }
}

#[derive(Default)]
pub struct PendingQueue {
    events: VecDeque<QueuedEvent>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, event: QueuedEvent) {
        self.events.push_back(event);
    }

    pub fn push_front(&mut self, event: QueuedEvent) {
        self.events.push_front(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pop the oldest event that is still live, dropping stale ones on the
    /// way.
    pub fn pop_live(&mut self, tree: &LiveTree) -> Option<QueuedEvent> {
        while let Some(event) = self.events.pop_front() {
            if event.is_stale(tree) {
                log::debug!("dropping stale event for handle {}", event.msg.id);
                continue;
            }
            return Some(event);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use vdom::{Handle, Handler, MsgValue};

    fn msg(id: u64) -> Msg {
        Msg {
            id,
            maps: None,
            value: MsgValue::Nothing,
        }
    }

    fn slot() -> Arc<HandlerSlot> {
        HandlerSlot::new(Handler {
            name: "succeed".to_string(),
            args: Value::Null,
            handle: Handle { id: 1, maps: None },
        })
    }

    #[test]
    fn synthetic_events_are_never_stale() {
        let tree = LiveTree::new();
        let event = QueuedEvent::synthetic(msg(1));
        assert!(!event.is_stale(&tree));
    }

    #[test]
    fn superseded_handler_makes_an_event_stale() {
        let tree = LiveTree::new();
        let slot = slot();
        let event = QueuedEvent::interaction(msg(1), tree.root(), slot.clone());
        assert!(!event.is_stale(&tree));
        slot.mark_stale();
        assert!(event.is_stale(&tree));
    }

    #[test]
    fn pop_live_skips_stale_heads_in_order() {
        let tree = LiveTree::new();
        let stale_slot = slot();
        stale_slot.mark_stale();
        let mut queue = PendingQueue::new();
        queue.push_back(QueuedEvent::interaction(msg(1), tree.root(), stale_slot));
        queue.push_back(QueuedEvent::synthetic(msg(2)));
        queue.push_back(QueuedEvent::synthetic(msg(3)));

        let popped = queue.pop_live(&tree).expect("live event");
        assert_eq!(popped.msg.id, 2);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn detached_target_makes_an_event_stale() {
        let mut tree = LiveTree::new();
        let root = tree.root();
        let kid = tree.alloc(dom::LiveKind::Text {
            text: "x".to_string(),
        });
        tree.attach(kid, dom::Attach::Append { parent: root }).expect("append");
        let event = QueuedEvent::interaction(msg(1), kid, slot());
        assert!(!event.is_stale(&tree));
        tree.remove_subtree(kid).expect("remove");
        assert!(event.is_stale(&tree));
    }
}
