use crate::index::{DefaultIx, NodeIndex};
use crate::tree::RbTree;

/// Lifecycle checkpoints reported to a [`Probe`] while the tree mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// A new node was linked by the plain BST insert, before rebalancing.
    BstInserted,
    /// The insert finished and all invariants hold again.
    InsertDone,
    /// The red-uncle case recolored parent, uncle and grandparent.
    UncleRecolored,
    /// The straight-line case recolored the parent black.
    ParentRecolored,
    /// The straight-line case recolored the grandparent red.
    GrandparentRecolored,
    /// A left rotation completed.
    RotatedLeft,
    /// A right rotation completed.
    RotatedRight,
}

/// Observer for intermediate rebalancing steps.
///
/// A probe installed with [`RbTree::set_probe`] is called after every
/// checkpoint with a shared view of the tree and the node the step worked
/// on; [`RbTree::key_at`] resolves that node to its key. The probe is
/// purely observational and must not assume the color or balance
/// invariants hold between the checkpoints of a single operation.
pub trait Probe<K, Ix = DefaultIx> {
    fn checkpoint(&mut self, at: Checkpoint, tree: &RbTree<K, Ix>, node: NodeIndex<Ix>);
}
