//! The loop controller.
//!
//! A two-state machine: `Idle` (nothing in flight, queue may hold events)
//! and `Rendering` (exactly one exchange outstanding). All mutable state
//! (tree, side tables, queue, subscriptions) belongs to the loop thread;
//! producers reach it only through the bus.
//!
//! Invariants:
//! - At most one exchange is ever in flight (single-flight). Interaction
//!   bursts accumulate in the queue instead of issuing concurrent requests.
//! - The tree is mutated only while processing a response.
//! - A failed exchange drops its triggering event (at-most-once); only the
//!   loop is re-armed.
//! - No request timeout is enforced here; a hung exchange stalls the loop
//!   until the transport gives up.

use crate::commands::stage_commands;
use crate::queue::{PendingQueue, QueuedEvent};
use crate::scheduler::{BusScheduler, Scheduler};
use crate::subs::SubscriptionSet;
use bus::{Bus, EventSink, LoopEvent, UiEvent};
use core_types::NodeKey;
use dom::{Attach, Bindings, LiveTree, NativeRegistry, TreeCx};
use net::Transport;
use registry::{DecoderInput, Registry};
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use vdom::{Handler, ServerPayload, make_message};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Rendering,
}

pub struct Runtime {
    transport: Arc<dyn Transport>,
    registry: Registry,
    natives: NativeRegistry,
    tree: LiveTree,
    bindings: Bindings,
    queue: PendingQueue,
    subs: SubscriptionSet,
    state: LoopState,
    pump_armed: bool,
    scheduler: Box<dyn Scheduler>,
    bus: Bus,
}

impl Runtime {
    /// Starts in `Rendering`: the bootstrap exchange is considered in
    /// flight from the moment the runtime exists.
    pub fn new(transport: Arc<dyn Transport>, registry: Registry, natives: NativeRegistry) -> Self {
        let bus = Bus::new();
        let scheduler = Box::new(BusScheduler::new(bus.tx.clone()));
        Self {
            transport,
            registry,
            natives,
            tree: LiveTree::new(),
            bindings: Bindings::new(),
            queue: PendingQueue::new(),
            subs: SubscriptionSet::new(),
            state: LoopState::Rendering,
            pump_armed: false,
            scheduler,
            bus,
        }
    }

    pub fn sink(&self) -> EventSink {
        self.bus.tx.clone()
    }

    pub fn tree(&self) -> &LiveTree {
        &self.tree
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subs
    }

    /// Issue the bootstrap exchange.
    pub fn start(&mut self) {
        self.state = LoopState::Rendering;
        self.transport.exchange(None, self.sink());
    }

    /// Process bus events until `Shutdown`. Runs for the life of the page.
    pub fn run(&mut self) {
        while let Ok(event) = self.bus.rx.recv() {
            if self.handle(event).is_break() {
                break;
            }
        }
        self.subs.shutdown_all();
    }

    /// Process everything currently on the bus, then return. Deterministic
    /// drive for tests and embedders with their own outer loop.
    pub fn drain(&mut self) {
        while let Ok(event) = self.bus.rx.try_recv() {
            if self.handle(event).is_break() {
                break;
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.subs.shutdown_all();
    }

    fn handle(&mut self, event: LoopEvent) -> ControlFlow<()> {
        match event {
            LoopEvent::Ui {
                target,
                name,
                event,
            } => self.on_ui(target, &name, &event),
            LoopEvent::Native { handler, args } => self.on_native(&handler, &args),
            LoopEvent::Message(msg) => self.enqueue(QueuedEvent::synthetic(msg)),
            LoopEvent::Response(result) => self.on_response(result),
            LoopEvent::Pump => {
                self.pump_armed = false;
                self.pump();
            }
            LoopEvent::Shutdown => {
                self.subs.shutdown_all();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn on_ui(&mut self, target: NodeKey, name: &str, event: &UiEvent) {
        let Some(slot) = self.bindings.slot(target, name) else {
            log::debug!("no listener for {name:?} on {target:?}");
            return;
        };
        let decoded = match self
            .registry
            .decode(&slot.handler, &DecoderInput::Ui(event))
        {
            Ok(decoded) => decoded,
            Err(err) => {
                log::error!("decoding {name:?} failed: {err:?}");
                return;
            }
        };
        // No data means the decoder declined this occurrence.
        let Some(msg) = make_message(&slot.handler.handle, decoded) else {
            return;
        };
        self.enqueue(QueuedEvent::interaction(msg, target, slot));
    }

    fn on_native(&mut self, handler: &Handler, args: &[Value]) {
        let decoded = match self.registry.decode(handler, &DecoderInput::Native(args)) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::error!("decoding native occurrence failed: {err:?}");
                return;
            }
        };
        let Some(msg) = make_message(&handler.handle, decoded) else {
            return;
        };
        self.enqueue(QueuedEvent::synthetic(msg));
    }

    fn enqueue(&mut self, event: QueuedEvent) {
        self.queue.push_back(event);
        if self.state == LoopState::Idle {
            self.schedule_pump();
        }
    }

    fn schedule_pump(&mut self) {
        if self.pump_armed {
            return;
        }
        self.pump_armed = true;
        self.scheduler.run_soon();
    }

    /// Pop the next live event and issue its exchange, if none is in
    /// flight.
    fn pump(&mut self) {
        if self.state == LoopState::Rendering {
            return;
        }
        let Some(event) = self.queue.pop_live(&self.tree) else {
            return;
        };
        self.state = LoopState::Rendering;
        self.transport.exchange(Some(event.msg), self.sink());
    }

    fn on_response(&mut self, result: Result<ServerPayload, String>) {
        match result {
            Ok(payload) => self.on_payload(payload),
            Err(err) => log::warn!("exchange failed: {err}"),
        }
        self.state = LoopState::Idle;
        self.schedule_pump();
    }

    fn on_payload(&mut self, payload: ServerPayload) {
        let sink = self.sink();
        if let Some(patch) = &payload.patch {
            let mut cx = TreeCx {
                tree: &mut self.tree,
                bindings: &mut self.bindings,
                natives: &self.natives,
                sink: &sink,
            };
            let root = cx.tree.root();
            if let Err(err) = cx.apply_patch(root, patch, Attach::Root) {
                // Commands and subscriptions of a response whose patch
                // failed are not trusted either.
                log::error!("patch application failed: {err:?}");
                return;
            }
        }
        stage_commands(&payload.commands, &self.registry, &mut self.queue);
        self.subs.reconcile(&payload.subs, &self.registry, &sink);
    }
}
