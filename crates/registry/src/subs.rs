//! Subscription producers.
//!
//! A producer runs on its own thread and only ever posts `LoopEvent`s; it
//! never touches the tree. Teardown is a disconnect on a cancel channel the
//! producer waits on between ticks, so a stopped subscription wakes and
//! exits immediately rather than sleeping out its interval.

use crate::RegistryError;
use bus::{EventSink, LoopEvent};
use serde_json::Value;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vdom::{Handle, MsgValue, make_message};

/// A running producer and the means to stop it.
pub struct Subscription {
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(cancel: Sender<()>, thread: JoinHandle<()>) -> Self {
        Self {
            cancel: Some(cancel),
            thread: Some(thread),
        }
    }

    /// Stop the producer and wait for it to exit.
    pub fn shutdown(mut self) {
        self.cancel.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Dropping the cancel sender wakes the producer; no join here so a
        // plain drop cannot block the loop.
        self.cancel.take();
    }
}

/// Posts the current unix time every `interval` milliseconds.
pub(crate) fn time_every(
    handle: Handle,
    args: &Value,
    sink: EventSink,
) -> Result<Subscription, RegistryError> {
    let millis = args
        .get("interval")
        .and_then(Value::as_u64)
        .filter(|ms| *ms > 0)
        .ok_or_else(|| RegistryError::BadArgs {
            entry: "timeEvery",
            detail: "missing positive integer `interval`".to_string(),
        })?;
    let interval = Duration::from_millis(millis);
    let (cancel, cancelled) = mpsc::channel::<()>();
    let thread = thread::spawn(move || {
        loop {
            match cancelled.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let value = MsgValue::Integer {
                        value: unix_seconds(),
                    };
                    let Some(msg) = make_message(&handle, Some(value)) else {
                        break;
                    };
                    if !sink.post(LoopEvent::Message(msg)) {
                        break;
                    }
                }
                _ => break,
            }
        }
    });
    Ok(Subscription::new(cancel, thread))
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
