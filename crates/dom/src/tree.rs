//! The live presentation tree.
//!
//! Arena-backed: records live in a vec, and a key→index map tracks which
//! keys still exist. Removal drops keys from the map without reusing them,
//! so a stale key held by a queued event simply stops resolving.
//!
//! Invariants:
//! - A node has at most one parent; only the root has none while attached.
//! - Keys are non-zero and never reallocated within one tree.
//! - The root always exists; replacing it rebinds `root` atomically with the
//!   removal of the old subtree.
//! - Child order is explicit and positional, matching the server diff.

use core_types::NodeKey;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// What a live node is. Extension ownership is not recorded here; the
/// mount side-table in [`crate::Bindings`] is the single marker for that.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveKind {
    Text {
        text: String,
    },
    Element {
        tag: String,
        namespace: Option<String>,
        attrs: BTreeMap<String, String>,
        props: BTreeMap<String, Value>,
    },
}

impl LiveKind {
    fn allows_children(&self) -> bool {
        matches!(self, LiveKind::Element { .. })
    }
}

/// Sink describing where a freshly built node lands.
#[derive(Clone, Copy, Debug)]
pub enum Attach {
    /// Become the tree root, discarding the previous root subtree.
    Root,
    /// Append as the parent's new last child.
    Append { parent: NodeKey },
    /// Take over an existing child's position, discarding its subtree.
    Replace { parent: NodeKey, child: NodeKey },
    /// Stay unattached; the caller captures the key.
    Detached,
}

#[derive(Debug)]
pub enum DomError {
    MissingNode(NodeKey),
    NotAText(NodeKey),
    NotAnElement(NodeKey),
    NotAContainer(NodeKey),
    NoChildren(NodeKey),
    MissingChild { parent: NodeKey, pos: usize },
    NotAChild { parent: NodeKey, child: NodeKey },
    CannotRemoveRoot(NodeKey),
    MissingEventHandler { node: NodeKey, name: String },
    UnknownNativeKind(String),
    OpaqueChildPatch(NodeKey),
    ChildPatchAfterReplace(NodeKey),
    ExtraOnGenericNode(NodeKey),
    BadExtra { node: NodeKey, detail: String },
}

struct NodeRecord {
    kind: LiveKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

pub struct LiveTree {
    nodes: Vec<NodeRecord>,
    live: HashMap<NodeKey, usize>,
    root: NodeKey,
    next: u32,
}

impl LiveTree {
    /// A fresh tree holding only the mount point the bootstrap patch will
    /// address.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            live: HashMap::new(),
            root: NodeKey::INVALID,
            next: 1,
        };
        let root = tree.alloc(LiveKind::Element {
            tag: "div".to_string(),
            namespace: None,
            attrs: BTreeMap::from([("id".to_string(), "root".to_string())]),
            props: BTreeMap::new(),
        });
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn alloc(&mut self, kind: LiveKind) -> NodeKey {
        let key = NodeKey(self.next);
        self.next += 1;
        let index = self.nodes.len();
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.live.insert(key, index);
        key
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.live.contains_key(&key)
    }

    /// Link `key` per the sink. Returns every key removed to make room
    /// (the displaced subtree for `Root` and `Replace`).
    pub fn attach(&mut self, key: NodeKey, attach: Attach) -> Result<Vec<NodeKey>, DomError> {
        self.index_of(key)?;
        match attach {
            Attach::Root => {
                let old = self.root;
                let removed = self.remove_subtree_inner(old)?;
                self.root = key;
                Ok(removed)
            }
            Attach::Append { parent } => {
                let parent_index = self.index_of(parent)?;
                if !self.nodes[parent_index].kind.allows_children() {
                    return Err(DomError::NotAContainer(parent));
                }
                self.nodes[parent_index].children.push(key);
                let index = self.index_of(key)?;
                self.nodes[index].parent = Some(parent);
                Ok(Vec::new())
            }
            Attach::Replace { parent, child } => {
                let parent_index = self.index_of(parent)?;
                let pos = self.nodes[parent_index]
                    .children
                    .iter()
                    .position(|k| *k == child)
                    .ok_or(DomError::NotAChild { parent, child })?;
                let removed = self.remove_subtree_inner(child)?;
                let parent_index = self.index_of(parent)?;
                self.nodes[parent_index].children.insert(pos, key);
                let index = self.index_of(key)?;
                self.nodes[index].parent = Some(parent);
                Ok(removed)
            }
            Attach::Detached => Ok(Vec::new()),
        }
    }

    /// Unlink and forget a whole subtree. The root itself can only be
    /// displaced through [`Attach::Root`].
    pub fn remove_subtree(&mut self, key: NodeKey) -> Result<Vec<NodeKey>, DomError> {
        if key == self.root {
            return Err(DomError::CannotRemoveRoot(key));
        }
        self.remove_subtree_inner(key)
    }

    fn remove_subtree_inner(&mut self, key: NodeKey) -> Result<Vec<NodeKey>, DomError> {
        let index = self.index_of(key)?;
        if let Some(parent) = self.nodes[index].parent.take() {
            if let Some(&parent_index) = self.live.get(&parent) {
                self.nodes[parent_index].children.retain(|k| *k != key);
            }
        }
        let mut removed = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(index) = self.live.remove(&current) {
                removed.push(current);
                stack.extend(self.nodes[index].children.iter().copied());
            }
        }
        Ok(removed)
    }

    /// True while the node is reachable from the root by walking ancestry.
    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            let Some(&index) = self.live.get(&current) else {
                return false;
            };
            if current == self.root {
                return true;
            }
            match self.nodes[index].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        match self.live.get(&key) {
            Some(&index) => &self.nodes[index].children,
            None => &[],
        }
    }

    pub fn child_at(&self, parent: NodeKey, pos: usize) -> Option<NodeKey> {
        self.children(parent).get(pos).copied()
    }

    pub fn last_child(&self, parent: NodeKey) -> Option<NodeKey> {
        self.children(parent).last().copied()
    }

    pub fn kind(&self, key: NodeKey) -> Option<&LiveKind> {
        self.live.get(&key).map(|&index| &self.nodes[index].kind)
    }

    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key)? {
            LiveKind::Text { text } => Some(text),
            LiveKind::Element { .. } => None,
        }
    }

    pub fn attr(&self, key: NodeKey, name: &str) -> Option<&str> {
        match self.kind(key)? {
            LiveKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            LiveKind::Text { .. } => None,
        }
    }

    pub fn prop(&self, key: NodeKey, name: &str) -> Option<&Value> {
        match self.kind(key)? {
            LiveKind::Element { props, .. } => props.get(name),
            LiveKind::Text { .. } => None,
        }
    }

    pub fn set_text(&mut self, key: NodeKey, contents: &str) -> Result<(), DomError> {
        let index = self.index_of(key)?;
        match &mut self.nodes[index].kind {
            LiveKind::Text { text } => {
                text.clear();
                text.push_str(contents);
                Ok(())
            }
            LiveKind::Element { .. } => Err(DomError::NotAText(key)),
        }
    }

    pub fn set_attr(&mut self, key: NodeKey, name: &str, val: &str) -> Result<(), DomError> {
        let attrs = self.attrs_mut(key)?;
        attrs.insert(name.to_string(), val.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        let attrs = self.attrs_mut(key)?;
        attrs.remove(name);
        Ok(())
    }

    pub fn set_prop(&mut self, key: NodeKey, name: &str, val: Value) -> Result<(), DomError> {
        let props = self.props_mut(key)?;
        props.insert(name.to_string(), val);
        Ok(())
    }

    pub fn remove_prop(&mut self, key: NodeKey, name: &str) -> Result<(), DomError> {
        let props = self.props_mut(key)?;
        props.remove(name);
        Ok(())
    }

    /// Pre-order walk of a subtree, the tree's own traversal order.
    pub fn descendants(&self, from: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    fn index_of(&self, key: NodeKey) -> Result<usize, DomError> {
        self.live.get(&key).copied().ok_or(DomError::MissingNode(key))
    }

    fn attrs_mut(&mut self, key: NodeKey) -> Result<&mut BTreeMap<String, String>, DomError> {
        let index = self.index_of(key)?;
        match &mut self.nodes[index].kind {
            LiveKind::Element { attrs, .. } => Ok(attrs),
            LiveKind::Text { .. } => Err(DomError::NotAnElement(key)),
        }
    }

    fn props_mut(&mut self, key: NodeKey) -> Result<&mut BTreeMap<String, Value>, DomError> {
        let index = self.index_of(key)?;
        match &mut self.nodes[index].kind {
            LiveKind::Element { props, .. } => Ok(props),
            LiveKind::Text { .. } => Err(DomError::NotAnElement(key)),
        }
    }
}

impl Default for LiveTree {
    fn default() -> Self {
        Self::new()
    }
}
