//! Application of server patches to the live tree.
//!
//! Contract:
//! - Local edits run in array order; `replace` is terminal for its node.
//! - An extension-owned node gets its edit list forwarded verbatim to its
//!   mount; child patches under it are a protocol violation.
//! - Child patches are resolved by position against the live child list as
//!   it stands after the local edits.
//! - An edit addressed to the wrong node kind is a protocol violation, not
//!   a best-effort mutation.

use crate::TreeCx;
use crate::tree::{Attach, DomError};
use core_types::NodeKey;
use vdom::{Edit, Patch};

impl TreeCx<'_> {
    /// Apply one patch node, then recurse into the child positions it
    /// names. `attach` is where a `replace` edit builds the successor.
    pub fn apply_patch(
        &mut self,
        node: NodeKey,
        patch: &Patch,
        attach: Attach,
    ) -> Result<(), DomError> {
        if let Some(mut mount) = self.bindings.take_mount(node) {
            let result = mount.patch(self, &patch.edits, attach);
            if self.tree.contains(node) {
                self.bindings.put_mount(node, mount);
            }
            result?;
            if !patch.kids.is_empty() {
                return Err(DomError::OpaqueChildPatch(node));
            }
            return Ok(());
        }

        let replaced = self.apply_edits(node, &patch.edits, attach)?;
        if replaced {
            if !patch.kids.is_empty() {
                return Err(DomError::ChildPatchAfterReplace(node));
            }
            return Ok(());
        }

        for kid in &patch.kids {
            let child = self
                .tree
                .child_at(node, kid.pos)
                .ok_or(DomError::MissingChild {
                    parent: node,
                    pos: kid.pos,
                })?;
            self.apply_patch(child, kid, Attach::Replace { parent: node, child })?;
        }
        Ok(())
    }

    /// Returns true when a `replace` ended the edit stream for this node.
    fn apply_edits(
        &mut self,
        node: NodeKey,
        edits: &[Edit],
        attach: Attach,
    ) -> Result<bool, DomError> {
        for edit in edits {
            match edit {
                Edit::SetAttr { name, val } => self.tree.set_attr(node, name, val)?,
                Edit::RemoveAttr { name } => self.tree.remove_attr(node, name)?,
                Edit::SetProp { name, val } => self.tree.set_prop(node, name, val.clone())?,
                Edit::RemoveProp { name } => self.tree.remove_prop(node, name)?,
                Edit::SetEvent { name, handler } => {
                    self.bindings.set_event(node, name, handler.clone());
                }
                Edit::RemoveEvent { name } => {
                    if !self.bindings.remove_event(node, name) {
                        return Err(DomError::MissingEventHandler {
                            node,
                            name: name.clone(),
                        });
                    }
                }
                Edit::SetText { contents } => self.tree.set_text(node, contents)?,
                Edit::RemoveNode {} => {
                    let last = self.tree.last_child(node).ok_or(DomError::NoChildren(node))?;
                    self.remove_subtree(last)?;
                }
                Edit::AppendNode { html } => {
                    self.build(html, Attach::Append { parent: node })?;
                }
                Edit::Replace { html } => {
                    self.build(html, attach)?;
                    return Ok(true);
                }
                Edit::SetExtra { .. } => return Err(DomError::ExtraOnGenericNode(node)),
            }
        }
        Ok(false)
    }
}
