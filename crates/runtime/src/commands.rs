//! Command staging.

use crate::queue::{PendingQueue, QueuedEvent};
use registry::Registry;
use vdom::{Cmd, make_message};

/// Run declared commands and stage their results at the front of the queue.
/// Front-insertion happens in reverse declaration order so the first
/// declared command is still processed first, ahead of any user events that
/// were already waiting when the response arrived.
pub fn stage_commands(commands: &[Cmd], registry: &Registry, queue: &mut PendingQueue) {
    let mut staged = Vec::new();
    for cmd in commands {
        let Cmd::Command { name, args, handle } = cmd else {
            continue; // legacy empty marker
        };
        match registry.run_command(name, args) {
            Ok(value) => {
                if let Some(msg) = make_message(handle, Some(value)) {
                    staged.push(QueuedEvent::synthetic(msg));
                }
            }
            Err(err) => log::error!("command {name} failed: {err:?}"),
        }
    }
    for event in staged.into_iter().rev() {
        queue.push_front(event);
    }
}
