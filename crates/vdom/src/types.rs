use core_types::MsgId;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Virtual presentation node, as computed by the server.
///
/// The wire form is externally tagged by a single key:
/// `{"txt": {..}}`, `{"element": {..}}` or `{"native": {..}}`. An unknown
/// tag fails decoding; there is no fallback variant.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub enum VNode {
    #[serde(rename = "txt")]
    Text { contents: String },
    #[serde(rename = "element")]
    Element {
        #[serde(rename = "tagName")]
        tag_name: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        props: BTreeMap<String, Value>,
        #[serde(default)]
        events: BTreeMap<String, Handler>,
        #[serde(default)]
        kids: Vec<VNode>,
    },
    /// An opaque subtree: built and patched by the extension registered
    /// under `kind`, never by the generic engine.
    #[serde(rename = "native")]
    Native {
        kind: String,
        id: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        props: BTreeMap<String, Value>,
        #[serde(default)]
        events: BTreeMap<String, Handler>,
        #[serde(default)]
        extra: BTreeMap<String, Value>,
    },
}

impl VNode {
    pub fn kind(&self) -> &'static str {
        match self {
            VNode::Text { .. } => "txt",
            VNode::Element { .. } => "element",
            VNode::Native { .. } => "native",
        }
    }
}

/// Routing target for messages produced by a handler or command.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Handle {
    pub id: MsgId,
    #[serde(default)]
    pub maps: Option<Vec<String>>,
}

/// Names a decoder plus the handle the decoded message routes to.
///
/// The server double-wraps both levels on the wire:
/// `{"handler": {"name", "args", "handle": {"handle": {"id", "maps"}}}}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Handler {
    pub name: String,
    pub args: Value,
    pub handle: Handle,
}

#[derive(Deserialize)]
pub(crate) struct HandleEnvelope {
    pub(crate) handle: Handle,
}

impl<'de> Deserialize<'de> for Handler {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            handler: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            name: String,
            #[serde(default)]
            args: Value,
            handle: HandleEnvelope,
        }
        let Envelope { handler } = Envelope::deserialize(deserializer)?;
        Ok(Handler {
            name: handler.name,
            args: handler.args,
            handle: handler.handle.handle,
        })
    }
}
