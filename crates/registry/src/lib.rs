//! Named extension points: decoders, commands, subscription starters.
//!
//! The server refers to all three by name; the client resolves them here.
//! An unknown name is a protocol violation surfaced to the caller; the
//! registry never guesses.

mod commands;
mod decoders;
mod subs;

pub use crate::subs::Subscription;

use bus::{EventSink, UiEvent};
use serde_json::Value;
use std::collections::HashMap;
use vdom::{Handle, Handler, MsgValue};

#[derive(Debug)]
pub enum RegistryError {
    UnknownDecoder(String),
    UnknownCommand(String),
    UnknownSubscription(String),
    BadArgs {
        entry: &'static str,
        detail: String,
    },
}

/// What a decoder sees: a raw interaction event, or the positional args an
/// extension passed through the parallel entry point.
pub enum DecoderInput<'a> {
    Ui(&'a UiEvent),
    Native(&'a [Value]),
}

/// Decoders return `None` to decline an occurrence; nothing is sent then.
pub type DecoderFn = fn(&Value, &DecoderInput<'_>) -> Option<MsgValue>;
pub type CommandFn = fn(&Value) -> Result<MsgValue, RegistryError>;
pub type SubStarterFn = fn(Handle, &Value, EventSink) -> Result<Subscription, RegistryError>;

pub struct Registry {
    decoders: HashMap<String, DecoderFn>,
    commands: HashMap<String, CommandFn>,
    subs: HashMap<String, SubStarterFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            commands: HashMap::new(),
            subs: HashMap::new(),
        }
    }

    /// The catalog the original client ships with.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_decoder("succeed", decoders::succeed);
        registry.register_decoder("targetValue", decoders::target_value);
        registry.register_decoder("targetChecked", decoders::target_checked);
        registry.register_decoder("theKeyCode", decoders::the_key_code);
        registry.register_command("random", commands::random);
        registry.register_subscription("timeEvery", subs::time_every);
        registry
    }

    pub fn register_decoder(&mut self, name: &str, decoder: DecoderFn) {
        self.decoders.insert(name.to_string(), decoder);
    }

    pub fn register_command(&mut self, name: &str, command: CommandFn) {
        self.commands.insert(name.to_string(), command);
    }

    pub fn register_subscription(&mut self, name: &str, starter: SubStarterFn) {
        self.subs.insert(name.to_string(), starter);
    }

    pub fn decode(
        &self,
        handler: &Handler,
        input: &DecoderInput<'_>,
    ) -> Result<Option<MsgValue>, RegistryError> {
        let decoder = self
            .decoders
            .get(&handler.name)
            .ok_or_else(|| RegistryError::UnknownDecoder(handler.name.clone()))?;
        Ok(decoder(&handler.args, input))
    }

    pub fn run_command(&self, name: &str, args: &Value) -> Result<MsgValue, RegistryError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| RegistryError::UnknownCommand(name.to_string()))?;
        command(args)
    }

    pub fn start_subscription(
        &self,
        name: &str,
        handle: Handle,
        args: &Value,
        sink: EventSink,
    ) -> Result<Subscription, RegistryError> {
        let starter = self
            .subs
            .get(name)
            .ok_or_else(|| RegistryError::UnknownSubscription(name.to_string()))?;
        starter(handle, args, sink)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
