//! Node-local edit protocol.
//!
//! This module defines the tree-diff operations emitted by the server and
//! applied by the `dom` crate.
//!
//! Invariants:
//! - Edits within one patch node are applied in array order.
//! - `replace` is terminal for its node: no later local edit is applied and
//!   the child-patch list must be empty.
//! - A patch addressing an extension-owned node carries no child patches;
//!   its edit list is forwarded to the extension verbatim.
//! - `removeNode` always targets the trailing child (the server diff
//!   normalizes removals to tail position).
//! - `setExtra` is only meaningful to extensions; the generic applier
//!   rejects it.
//! - Unknown edit tags fail decoding (client/server version mismatch).

use crate::types::{Handler, VNode};
use serde::Deserialize;
use serde_json::Value;

/// One atomic mutation instruction.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub enum Edit {
    #[serde(rename = "setAttr")]
    SetAttr { name: String, val: String },
    #[serde(rename = "removeAttr")]
    RemoveAttr { name: String },
    #[serde(rename = "setProp")]
    SetProp { name: String, val: Value },
    #[serde(rename = "removeProp")]
    RemoveProp { name: String },
    #[serde(rename = "setEvent")]
    SetEvent { name: String, handler: Handler },
    #[serde(rename = "removeEvent")]
    RemoveEvent { name: String },
    #[serde(rename = "setText")]
    SetText { contents: String },
    #[serde(rename = "removeNode")]
    RemoveNode {},
    #[serde(rename = "appendNode")]
    AppendNode { html: VNode },
    #[serde(rename = "replace")]
    Replace { html: VNode },
    #[serde(rename = "setExtra")]
    SetExtra { name: String, value: Value },
}

impl Edit {
    pub fn kind(&self) -> &'static str {
        match self {
            Edit::SetAttr { .. } => "setAttr",
            Edit::RemoveAttr { .. } => "removeAttr",
            Edit::SetProp { .. } => "setProp",
            Edit::RemoveProp { .. } => "removeProp",
            Edit::SetEvent { .. } => "setEvent",
            Edit::RemoveEvent { .. } => "removeEvent",
            Edit::SetText { .. } => "setText",
            Edit::RemoveNode {} => "removeNode",
            Edit::AppendNode { .. } => "appendNode",
            Edit::Replace { .. } => "replace",
            Edit::SetExtra { .. } => "setExtra",
        }
    }
}

/// A positionally-addressed diff: local edits for one node plus nested
/// patches for its children.
///
/// Wire form: `{"patch": {"pos": n, "edits": [..], "patches": [..]}}`,
/// every field optional. `pos` addresses a child position in the parent and
/// is meaningless on the root patch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    pub pos: usize,
    pub edits: Vec<Edit>,
    pub kids: Vec<Patch>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.kids.is_empty()
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            patch: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            pos: usize,
            #[serde(default)]
            edits: Vec<Edit>,
            #[serde(default)]
            patches: Vec<Patch>,
        }
        let Envelope { patch } = Envelope::deserialize(deserializer)?;
        Ok(Patch {
            pos: patch.pos,
            edits: patch.edits,
            kids: patch.patches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_patch() {
        let input = r#"{
            "patch": {
                "edits": [{"setAttr": {"name": "class", "val": "on"}}],
                "patches": [
                    {"patch": {"pos": 2, "edits": [{"setText": {"contents": "1"}}]}}
                ]
            }
        }"#;
        let patch: Patch = serde_json::from_str(input).expect("decode");
        assert_eq!(patch.pos, 0);
        assert_eq!(patch.edits.len(), 1);
        assert_eq!(patch.kids.len(), 1);
        assert_eq!(patch.kids[0].pos, 2);
        assert_eq!(
            patch.kids[0].edits[0],
            Edit::SetText {
                contents: "1".to_string()
            }
        );
    }

    #[test]
    fn decodes_remove_node_with_empty_body() {
        let edit: Edit = serde_json::from_str(r#"{"removeNode": {}}"#).expect("decode");
        assert_eq!(edit, Edit::RemoveNode {});
    }

    #[test]
    fn rejects_unknown_edit_tag() {
        let err = serde_json::from_str::<Edit>(r#"{"swapNode": {"pos": 1}}"#).expect_err("must fail");
        assert!(err.to_string().contains("swapNode"), "error names the tag: {err}");
    }

    #[test]
    fn empty_patch_decodes_to_default() {
        let patch: Patch = serde_json::from_str(r#"{"patch": {}}"#).expect("decode");
        assert!(patch.is_empty());
    }
}
