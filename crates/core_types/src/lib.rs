/// Server-side routing id carried by a message handle.
pub type MsgId = u64;

/// Identity of a declared subscription (its handle id).
pub type SubId = u64;

/// Stable identity of a live presentation node.
///
/// Allocated by the client when a node is built and never reused within a
/// runtime instance, so a key held by a queued event stays meaningful after
/// the node is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);
}
