//! Server payload decoding.
//!
//! Every exchange, bootstrap and steady-state alike, returns the same
//! shape: `{patch, commands, subs}`. Command and subscription entries use
//! the same single-key tagging and handle envelopes as the rest of the
//! protocol.

use crate::edit::Patch;
use crate::types::{Handle, HandleEnvelope};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ServerPayload {
    #[serde(default)]
    pub patch: Option<Patch>,
    #[serde(default)]
    pub commands: Vec<Cmd>,
    #[serde(default)]
    pub subs: Vec<Sub>,
}

/// One declared command. `None` is a legacy empty marker the executor skips.
#[derive(Clone, Debug, PartialEq)]
pub enum Cmd {
    None,
    Command {
        name: String,
        args: Value,
        handle: Handle,
    },
}

impl<'de> Deserialize<'de> for Cmd {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        enum Wire {
            #[serde(rename = "none")]
            None(Value),
            #[serde(rename = "command")]
            Command(Body),
        }
        #[derive(Deserialize)]
        struct Body {
            name: String,
            #[serde(default)]
            args: Value,
            handle: HandleEnvelope,
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::None(_) => Cmd::None,
            Wire::Command(body) => Cmd::Command {
                name: body.name,
                args: body.args,
                handle: body.handle.handle,
            },
        })
    }
}

/// One declared subscription; identity is `handle.id`.
#[derive(Clone, Debug, PartialEq)]
pub struct Sub {
    pub name: String,
    pub args: Value,
    pub handle: Handle,
}

impl<'de> Deserialize<'de> for Sub {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            subscription: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            name: String,
            #[serde(default)]
            args: Value,
            handle: HandleEnvelope,
        }
        let Envelope { subscription } = Envelope::deserialize(deserializer)?;
        Ok(Sub {
            name: subscription.name,
            args: subscription.args,
            handle: subscription.handle.handle,
        })
    }
}

/// Decode failures are protocol violations: a shape this client does not
/// know means a client/server version mismatch, not a transient condition.
#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
}

pub fn parse_payload(bytes: &[u8]) -> Result<ServerPayload, DecodeError> {
    serde_json::from_slice(bytes).map_err(DecodeError::Json)
}
