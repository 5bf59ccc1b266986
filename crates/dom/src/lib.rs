mod apply;
mod bindings;
mod build;
mod native;
mod tree;

pub use crate::bindings::{Bindings, HandlerSlot};
pub use crate::native::{Mounted, NativeBuilder, NativeMount, NativeRegistry, NativeSpec};
pub use crate::tree::{Attach, DomError, LiveKind, LiveTree};

use bus::EventSink;

/// Mutable context threaded through building and patching.
///
/// Both the generic engine and every native extension work through the same
/// two operations on this context, `build` and `apply_patch`; extensions are
/// reached only by registry lookup, never special-cased.
pub struct TreeCx<'a> {
    pub tree: &'a mut LiveTree,
    pub bindings: &'a mut Bindings,
    pub natives: &'a NativeRegistry,
    pub sink: &'a EventSink,
}

impl TreeCx<'_> {
    /// Link a freshly allocated node and purge bindings of whatever the
    /// sink displaced.
    pub(crate) fn attach_new(&mut self, key: core_types::NodeKey, attach: Attach) -> Result<(), DomError> {
        let removed = self.tree.attach(key, attach)?;
        self.bindings.purge(&removed);
        Ok(())
    }

    /// Drop a subtree together with its handler and mount bookkeeping.
    pub fn remove_subtree(&mut self, key: core_types::NodeKey) -> Result<(), DomError> {
        let removed = self.tree.remove_subtree(key)?;
        self.bindings.purge(&removed);
        Ok(())
    }
}
