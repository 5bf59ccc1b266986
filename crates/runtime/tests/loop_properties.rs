//! End-to-end properties of the message loop, driven deterministically with
//! a scripted transport: single-flight, staleness, command ordering, and
//! the bootstrap→interaction→patch round trip.

use bus::{EventSink, LoopEvent, UiEvent};
use core_types::NodeKey;
use dom::NativeRegistry;
use net::Transport;
use registry::Registry;
use runtime::{LoopState, Runtime};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vdom::{Msg, ServerPayload};

struct ScriptedTransport {
    responses: Mutex<VecDeque<ServerPayload>>,
    sent: Mutex<Vec<Option<Msg>>>,
    hold: AtomicBool,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
        })
    }

    fn script(&self, payload_json: &str) {
        let payload = serde_json::from_str(payload_json).expect("scripted payload");
        self.responses.lock().unwrap().push_back(payload);
    }

    /// While held, exchanges are recorded but never answered; the test
    /// releases them by posting `LoopEvent::Response` itself.
    fn hold(&self, on: bool) {
        self.hold.store(on, Ordering::Relaxed);
    }

    fn sent_ids(&self) -> Vec<Option<u64>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|msg| msg.as_ref().map(|m| m.id))
            .collect()
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_sent(&self) -> Option<Msg> {
        self.sent.lock().unwrap().last().cloned().flatten()
    }
}

impl Transport for ScriptedTransport {
    fn exchange(&self, msg: Option<Msg>, reply: EventSink) {
        self.sent.lock().unwrap().push(msg);
        if self.hold.load(Ordering::Relaxed) {
            return;
        }
        let result = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "script exhausted".to_string());
        reply.post(LoopEvent::Response(result));
    }
}

fn new_runtime(transport: Arc<ScriptedTransport>) -> Runtime {
    Runtime::new(transport, Registry::with_builtins(), NativeRegistry::new())
}

fn respond(rt: &mut Runtime, payload_json: &str) {
    let payload = serde_json::from_str(payload_json).expect("payload");
    rt.sink().post(LoopEvent::Response(Ok(payload)));
    rt.drain();
}

fn click(rt: &mut Runtime, target: NodeKey) {
    rt.sink().post(LoopEvent::Ui {
        target,
        name: "click".to_string(),
        event: UiEvent::default(),
    });
    rt.drain();
}

/// Bootstrap payload: one button (click → succeed, handle 7) holding the
/// text "0".
const BOOT: &str = r#"{
    "patch": {"edits": [{"appendNode": {"html": {"element": {
        "tagName": "button",
        "events": {"click": {"handler": {"name": "succeed", "args": {}, "handle": {"handle": {"id": 7}}}}},
        "kids": [{"txt": {"contents": "0"}}]
    }}}}]},
    "commands": [],
    "subs": []
}"#;

fn boot(rt: &mut Runtime, transport: &ScriptedTransport) -> NodeKey {
    transport.script(BOOT);
    rt.start();
    rt.drain();
    assert_eq!(rt.state(), LoopState::Idle);
    rt.tree().child_at(rt.tree().root(), 0).expect("button")
}

#[test]
fn bootstrap_click_and_patch_round_trip() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    let text = rt.tree().child_at(button, 0).expect("text node");
    assert_eq!(rt.tree().text(text), Some("0"));

    transport.script(
        r#"{"patch": {"patches": [
            {"patch": {"pos": 0, "patches": [
                {"patch": {"pos": 0, "edits": [{"setText": {"contents": "1"}}]}}
            ]}}
        ]}}"#,
    );
    click(&mut rt, button);

    assert_eq!(transport.sent_count(), 2, "bootstrap plus one interaction");
    let msg = transport.last_sent().expect("interaction message");
    assert_eq!(
        serde_json::to_value(&msg).expect("serialize"),
        json!({"id": 7, "type": "nothing"})
    );
    assert_eq!(rt.tree().text(text), Some("1"));
}

#[test]
fn single_flight_holds_the_second_interaction() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button);
    click(&mut rt, button);

    assert_eq!(transport.sent_count(), 2, "bootstrap plus exactly one in flight");
    assert_eq!(rt.state(), LoopState::Rendering);
    assert_eq!(rt.pending(), 1, "second interaction waits in queue");

    respond(&mut rt, "{}");
    assert_eq!(transport.sent_count(), 3, "queued interaction follows the response");
}

#[test]
fn command_results_run_before_waiting_user_events() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button); // in flight
    click(&mut rt, button); // u1, waiting

    respond(
        &mut rt,
        r#"{"commands": [
            {"command": {"name": "random", "args": {"from": 1, "to": 1}, "handle": {"handle": {"id": 101}}}},
            {"command": {"name": "random", "args": {"from": 2, "to": 2}, "handle": {"handle": {"id": 102}}}}
        ]}"#,
    );
    respond(&mut rt, "{}");
    respond(&mut rt, "{}");
    respond(&mut rt, "{}");

    assert_eq!(
        transport.sent_ids(),
        vec![None, Some(7), Some(101), Some(102), Some(7)],
        "c1 then c2 ahead of the waiting u1"
    );
}

#[test]
fn detached_source_makes_a_waiting_event_stale() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button); // in flight
    click(&mut rt, button); // waiting

    // The in-flight response removes the button; the waiting click's source
    // is now detached and must not produce a request.
    respond(&mut rt, r#"{"patch": {"edits": [{"removeNode": {}}]}}"#);

    assert_eq!(transport.sent_count(), 2, "no exchange for the stale click");
    assert_eq!(rt.pending(), 0);
    assert_eq!(rt.state(), LoopState::Idle);
}

#[test]
fn superseded_handler_invalidates_its_waiting_event() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button); // in flight
    click(&mut rt, button); // waiting, produced by handler 7

    respond(
        &mut rt,
        r#"{"patch": {"patches": [
            {"patch": {"pos": 0, "edits": [
                {"setEvent": {"name": "click", "handler": {"handler": {"name": "succeed", "args": {}, "handle": {"handle": {"id": 8}}}}}}
            ]}}
        ]}}"#,
    );

    assert_eq!(transport.sent_count(), 2, "superseded click never goes out");
    assert_eq!(rt.pending(), 0);

    // A fresh click decodes through the new handler.
    click(&mut rt, button);
    assert_eq!(transport.sent_count(), 3);
    assert_eq!(transport.last_sent().map(|m| m.id), Some(8));
}

#[test]
fn failed_patch_drops_the_whole_response() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button);

    // setText on an element is a protocol violation; the commands and subs
    // of the same response must not take effect.
    respond(
        &mut rt,
        r#"{
            "patch": {"edits": [{"setText": {"contents": "x"}}]},
            "commands": [{"command": {"name": "random", "args": {"from": 1, "to": 1}, "handle": {"handle": {"id": 50}}}}],
            "subs": [{"subscription": {"name": "timeEvery", "args": {"interval": 60000}, "handle": {"handle": {"id": 60}}}}]
        }"#,
    );

    assert_eq!(rt.pending(), 0, "no command staged from the poisoned response");
    assert!(!rt.subscriptions().contains(60), "no subscription started");
    assert_eq!(rt.state(), LoopState::Idle, "loop re-armed");
}

#[test]
fn transport_failure_rearms_without_retrying() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button);
    assert_eq!(transport.sent_count(), 2);

    rt.sink()
        .post(LoopEvent::Response(Err("connection refused".to_string())));
    rt.drain();

    assert_eq!(rt.state(), LoopState::Idle);
    assert_eq!(transport.sent_count(), 2, "the failed event is not retried");

    // The loop still works for the next interaction.
    click(&mut rt, button);
    assert_eq!(transport.sent_count(), 3);
}

#[test]
fn declared_subscriptions_follow_the_latest_response() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    let button = boot(&mut rt, &transport);

    transport.hold(true);
    click(&mut rt, button);
    respond(
        &mut rt,
        r#"{"subs": [
            {"subscription": {"name": "timeEvery", "args": {"interval": 60000}, "handle": {"handle": {"id": 1}}}},
            {"subscription": {"name": "timeEvery", "args": {"interval": 60000}, "handle": {"handle": {"id": 2}}}}
        ]}"#,
    );
    let mut ids = rt.subscriptions().ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);

    click(&mut rt, button);
    respond(
        &mut rt,
        r#"{"subs": [
            {"subscription": {"name": "timeEvery", "args": {"interval": 60000}, "handle": {"handle": {"id": 2}}}},
            {"subscription": {"name": "timeEvery", "args": {"interval": 60000}, "handle": {"handle": {"id": 3}}}}
        ]}"#,
    );
    let mut ids = rt.subscriptions().ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3], "tracked ids equal the declared set");

    rt.sink().post(LoopEvent::Shutdown);
    rt.drain();
    assert!(rt.subscriptions().ids().is_empty(), "shutdown tears everything down");
}

#[test]
fn native_occurrences_reach_the_queue_without_a_source_node() {
    let transport = ScriptedTransport::new();
    let mut rt = new_runtime(transport.clone());
    boot(&mut rt, &transport);

    let handler = serde_json::from_str(
        r#"{"handler": {"name": "targetValue", "args": {}, "handle": {"handle": {"id": 33}}}}"#,
    )
    .expect("handler");
    rt.sink().post(LoopEvent::Native {
        handler,
        args: vec![json!("picked")],
    });
    rt.drain();

    assert_eq!(transport.sent_count(), 2);
    let msg = transport.last_sent().expect("native message");
    assert_eq!(
        serde_json::to_value(&msg).expect("serialize"),
        json!({"id": 33, "type": "string", "value": "picked"})
    );
}
