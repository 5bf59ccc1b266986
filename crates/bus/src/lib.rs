//! Loop ingress.
//!
//! Everything that wants the runtime's attention (interaction handlers,
//! subscription producers, the transport, the scheduler) posts a
//! `LoopEvent` into one mpsc channel. The loop thread is the only consumer,
//! and the only code that ever touches the tree.

use core_types::NodeKey;
use serde_json::Value;
use std::sync::mpsc::{Receiver, Sender, channel};
use vdom::{Handler, Msg, ServerPayload};

/// Raw interaction event, as delivered by the embedder. Carries only the
/// fields the built-in decoders consume.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiEvent {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub key_code: Option<i64>,
}

#[derive(Debug)]
pub enum LoopEvent {
    /// Interaction on a live node; decoded against the node's installed
    /// listener for `name`.
    Ui {
        target: NodeKey,
        name: String,
        event: UiEvent,
    },
    /// Extension-originated occurrence: `handler` decoded over positional
    /// args instead of a UI event. Produces a synthetic (source-less) event.
    Native { handler: Handler, args: Vec<Value> },
    /// Pre-decoded inbound message (subscription tick).
    Message(Msg),
    /// Outcome of the in-flight exchange.
    Response(Result<ServerPayload, String>),
    /// Deferred pump tick.
    Pump,
    /// Tear down subscriptions and exit the run loop.
    Shutdown,
}

/// Cloneable producer half of the loop channel.
#[derive(Clone)]
pub struct EventSink(Sender<LoopEvent>);

impl EventSink {
    /// Post an event; false means the loop is gone.
    pub fn post(&self, event: LoopEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

pub struct Bus {
    pub tx: EventSink,
    pub rx: Receiver<LoopEvent>,
}

impl Bus {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx: EventSink(tx),
            rx,
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
