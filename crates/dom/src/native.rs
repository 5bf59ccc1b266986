//! The native-extension contract.
//!
//! A `native` virtual node opts its whole subtree out of generic building
//! and patching: the builder registered under its kind constructs the live
//! root, and the returned mount absorbs every future edit addressed to it,
//! `setExtra` payloads included. The generic engine reaches extensions only
//! through this registry.

use crate::TreeCx;
use crate::tree::{Attach, DomError};
use core_types::NodeKey;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use vdom::{Edit, Handler};

/// Everything a builder receives besides the sink: the virtual node's
/// identity and payload, borrowed from the incoming patch.
pub struct NativeSpec<'a> {
    pub id: &'a str,
    pub attrs: &'a BTreeMap<String, String>,
    pub props: &'a BTreeMap<String, Value>,
    pub events: &'a BTreeMap<String, Handler>,
    pub extra: &'a BTreeMap<String, Value>,
}

/// A built native subtree: its live root plus the object that owns it from
/// now on.
pub struct Mounted {
    pub root: NodeKey,
    pub mount: Box<dyn NativeMount>,
}

pub trait NativeMount {
    /// Apply a node-local edit stream to the owned subtree, with the same
    /// attach-sink discipline as the generic applier: `attach` is where a
    /// `replace` edit must build its replacement.
    fn patch(&mut self, cx: &mut TreeCx<'_>, edits: &[Edit], attach: Attach) -> Result<(), DomError>;
}

/// Builders must attach the root they create through the given sink.
pub type NativeBuilder =
    fn(&mut TreeCx<'_>, Attach, &NativeSpec<'_>) -> Result<Mounted, DomError>;

#[derive(Default)]
pub struct NativeRegistry {
    builders: HashMap<String, NativeBuilder>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: &str, builder: NativeBuilder) {
        self.builders.insert(kind.to_string(), builder);
    }

    pub fn builder(&self, kind: &str) -> Option<NativeBuilder> {
        self.builders.get(kind).copied()
    }
}
