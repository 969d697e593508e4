use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::error::{TreeError, TreeResult};
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::node::{Color, Node};
use crate::probe::{Checkpoint, Probe};

/// An ordered-key container backed by a red-black tree.
pub struct RbTree<K, Ix = DefaultIx> {
    /// Vector that stores nodes, slot 0 holding the shared sentinel
    pub(crate) nodes: Vec<Node<K, Ix>>,
    /// Root of the tree
    pub(crate) root: NodeIndex<Ix>,
    /// Number of keys in the tree
    pub(crate) len: usize,
    /// Optional instrumentation sink
    probe: Option<Box<dyn Probe<K, Ix>>>,
}

impl<K, Ix> RbTree<K, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Creates a new `RbTree` with estimated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = vec![Self::new_sentinel()];
        nodes.reserve(capacity);
        RbTree {
            nodes,
            root: Self::sentinel(),
            len: 0,
            probe: None,
        }
    }

    /// Insert a key into the tree.
    ///
    /// A key that is already present is rejected before anything is
    /// allocated, leaving the tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateKey`] when the key is already present.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes
    /// for its index type.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree::{RbTree, TreeError};
    ///
    /// let mut tree = RbTree::new();
    /// assert!(tree.insert(2).is_ok());
    /// assert!(tree.insert(1).is_ok());
    /// assert_eq!(tree.insert(2), Err(TreeError::DuplicateKey));
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K) -> TreeResult<()> {
        let mut parent = Self::sentinel();
        let mut cursor = self.root;
        while !self.node_ref(cursor, Node::is_sentinel) {
            parent = cursor;
            cursor = match key.cmp(self.node_ref(cursor, Node::key)) {
                Ordering::Less => self.node_ref(cursor, Node::left),
                Ordering::Greater => self.node_ref(cursor, Node::right),
                Ordering::Equal => {
                    trace!("insert rejected, duplicate key");
                    return Err(TreeError::DuplicateKey);
                }
            };
        }

        let z = NodeIndex::new(self.nodes.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != z,
            "Reached maximum number of nodes"
        );
        self.nodes.push(Self::new_node(key));
        if self.node_ref(parent, Node::is_sentinel) {
            self.root = z;
        } else if self.node_ref(z, Node::key) < self.node_ref(parent, Node::key) {
            let _prev = self.attach_left(parent, z);
        } else {
            let _prev = self.attach_right(parent, z);
        }
        self.len = self.len.wrapping_add(1);

        self.notify(Checkpoint::BstInserted, z);
        self.insert_fixup(z);
        self.notify(Checkpoint::InsertDone, z);
        trace!(len = self.len, "inserted new key");
        Ok(())
    }

    /// Remove a key from the tree. Removing a key that is not present is a
    /// no-op.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree::RbTree;
    ///
    /// let mut tree = RbTree::new();
    /// let _ = tree.insert(1);
    /// let _ = tree.insert(2);
    /// tree.remove(&1);
    /// tree.remove(&7);
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[inline]
    pub fn remove(&mut self, key: &K) {
        if let Some(target) = self.search_node(key) {
            let splice = self.remove_inner(target);
            // Swap the spliced node with the last node stored in the
            // vector and update indices
            let _removed = self.nodes.swap_remove(splice.index());
            let old = NodeIndex::<Ix>::new(self.nodes.len());
            self.update_idx(old, splice);
            trace!(len = self.len, "removed key");
        } else {
            trace!("remove skipped, key not present");
        }
    }

    /// Return a reference to the stored key equal to the given one.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree::RbTree;
    ///
    /// let mut tree = RbTree::new();
    /// let _ = tree.insert(7);
    /// assert_eq!(tree.find(&7), Some(&7));
    /// assert_eq!(tree.find(&5), None);
    /// ```
    #[inline]
    pub fn find(&self, key: &K) -> Option<&K> {
        self.search_node(key)
            .map(|node_idx| self.node_ref(node_idx, Node::key))
    }

    /// Check if the tree contains the given key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree::RbTree;
    ///
    /// let mut tree = RbTree::new();
    /// let _ = tree.insert(7);
    /// assert!(tree.contains(&7));
    /// assert!(!tree.contains(&5));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.search_node(key).is_some()
    }

    /// Key stored at `node`, or `None` for the sentinel or an index that is
    /// no longer in the arena. This is the read-only view a [`Probe`] uses
    /// to resolve checkpoint nodes.
    #[inline]
    #[must_use]
    pub fn key_at(&self, node: NodeIndex<Ix>) -> Option<&K> {
        self.nodes.get(node.index()).and_then(|n| n.key.as_ref())
    }

    /// Install an instrumentation probe, replacing any previous one.
    #[inline]
    pub fn set_probe(&mut self, probe: Box<dyn Probe<K, Ix>>) {
        self.probe = Some(probe);
    }

    /// Remove and return the installed probe, if any.
    #[inline]
    pub fn take_probe(&mut self) -> Option<Box<dyn Probe<K, Ix>>> {
        self.probe.take()
    }

    /// Remove all keys from the tree
    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::new_sentinel());
        self.root = Self::sentinel();
        self.len = 0;
    }

    /// Return the number of keys in the tree.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the tree contains no keys.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> RbTree<K>
where
    K: Ord,
{
    /// Create an empty `RbTree`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Self::new_sentinel()],
            root: Self::sentinel(),
            len: 0,
            probe: None,
        }
    }
}

impl<K> Default for RbTree<K>
where
    K: Ord,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, Ix> fmt::Debug for RbTree<K, Ix>
where
    K: fmt::Debug,
    Ix: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbTree")
            .field("nodes", &self.nodes)
            .field("root", &self.root)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<K, Ix> RbTree<K, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Create the shared sentinel node. It is permanently black; its child
    /// links are never rewritten, while its parent link is scratch storage
    /// for the remove fixup.
    fn new_sentinel() -> Node<K, Ix> {
        Node {
            key: None,
            left: NodeIndex::new(0),
            right: NodeIndex::new(0),
            parent: NodeIndex::new(0),
            color: Color::Black,
        }
    }

    /// Create a new tree node, red and detached.
    fn new_node(key: K) -> Node<K, Ix> {
        Node {
            key: Some(key),
            left: Self::sentinel(),
            right: Self::sentinel(),
            parent: Self::sentinel(),
            color: Color::Red,
        }
    }

    /// Get the sentinel node index
    fn sentinel() -> NodeIndex<Ix> {
        NodeIndex::new(0)
    }
}

impl<K, Ix> RbTree<K, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Search for the node holding exactly the given key.
    fn search_node(&self, key: &K) -> Option<NodeIndex<Ix>> {
        let mut x = self.root;
        while !self.node_ref(x, Node::is_sentinel) {
            x = match key.cmp(self.node_ref(x, Node::key)) {
                Ordering::Less => self.node_ref(x, Node::left),
                Ordering::Greater => self.node_ref(x, Node::right),
                Ordering::Equal => return Some(x),
            };
        }
        None
    }

    /// Splice a node out of the tree and repair the black-height.
    ///
    /// Returns the index of the node that was physically unlinked, which
    /// differs from `z` when `z` has two children: then the in-order
    /// successor is unlinked instead and its key moves into `z` in place.
    /// The caller releases the returned slot.
    fn remove_inner(&mut self, z: NodeIndex<Ix>) -> NodeIndex<Ix> {
        let splice = if self.left_ref(z, Node::is_sentinel) || self.right_ref(z, Node::is_sentinel)
        {
            z
        } else {
            self.tree_minimum(self.node_ref(z, Node::right))
        };
        let replacement = if self.left_ref(splice, Node::is_sentinel) {
            self.node_ref(splice, Node::right)
        } else {
            self.node_ref(splice, Node::left)
        };
        let splice_color = self.node_ref(splice, Node::color);

        // Relink the replacement into the splice target's former slot. A
        // sentinel replacement inherits the parent link here, which is the
        // phantom leaf the fixup starts from.
        if self.parent_ref(splice, Node::is_sentinel) {
            self.root = replacement;
            self.node_mut(replacement, Node::set_parent(Self::sentinel()));
        } else if self.is_left_child(splice) {
            let parent = self.node_ref(splice, Node::parent);
            let _prev = self.attach_left(parent, replacement);
        } else {
            let parent = self.node_ref(splice, Node::parent);
            let _prev = self.attach_right(parent, replacement);
        }

        // A successor splice moves only the key; colors and links stay put.
        if splice != z {
            let key = self.node_mut(splice, Node::take_key);
            self.node_mut(z, Node::set_key(key));
        }

        if matches!(splice_color, Color::Black) {
            self.remove_fixup(replacement);
        }

        self.len = self.len.wrapping_sub(1);
        splice
    }

    /// Restore red-black tree properties after an insert.
    fn insert_fixup(&mut self, mut z: NodeIndex<Ix>) {
        while self.parent_ref(z, Node::is_red) {
            if self.grand_parent_ref(z, Node::is_sentinel) {
                break;
            }
            if self.is_left_child(self.node_ref(z, Node::parent)) {
                let uncle = self.grand_parent_ref(z, Node::right);
                if self.node_ref(uncle, Node::is_red) {
                    self.parent_mut(z, Node::set_color(Color::Black));
                    self.node_mut(uncle, Node::set_color(Color::Black));
                    self.grand_parent_mut(z, Node::set_color(Color::Red));
                    z = self.parent_ref(z, Node::parent);
                    self.notify(Checkpoint::UncleRecolored, z);
                } else {
                    if self.is_right_child(z) {
                        z = self.node_ref(z, Node::parent);
                        self.left_rotate(z);
                    }
                    self.parent_mut(z, Node::set_color(Color::Black));
                    self.notify(Checkpoint::ParentRecolored, z);
                    self.grand_parent_mut(z, Node::set_color(Color::Red));
                    self.notify(Checkpoint::GrandparentRecolored, z);
                    self.right_rotate(self.parent_ref(z, Node::parent));
                }
            } else {
                let uncle = self.grand_parent_ref(z, Node::left);
                if self.node_ref(uncle, Node::is_red) {
                    self.parent_mut(z, Node::set_color(Color::Black));
                    self.node_mut(uncle, Node::set_color(Color::Black));
                    self.grand_parent_mut(z, Node::set_color(Color::Red));
                    z = self.parent_ref(z, Node::parent);
                    self.notify(Checkpoint::UncleRecolored, z);
                } else {
                    if self.is_left_child(z) {
                        z = self.node_ref(z, Node::parent);
                        self.right_rotate(z);
                    }
                    self.parent_mut(z, Node::set_color(Color::Black));
                    self.notify(Checkpoint::ParentRecolored, z);
                    self.grand_parent_mut(z, Node::set_color(Color::Red));
                    self.notify(Checkpoint::GrandparentRecolored, z);
                    self.left_rotate(self.parent_ref(z, Node::parent));
                }
            }
        }
        self.node_mut(self.root, Node::set_color(Color::Black));
    }

    /// Restore red-black tree properties after a remove.
    fn remove_fixup(&mut self, mut x: NodeIndex<Ix>) {
        while x != self.root && self.node_ref(x, Node::is_black) {
            let mut w;
            if self.is_left_child(x) {
                w = self.parent_ref(x, Node::right);
                if self.node_ref(w, Node::is_red) {
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.parent_mut(x, Node::set_color(Color::Red));
                    self.left_rotate(self.node_ref(x, Node::parent));
                    w = self.parent_ref(x, Node::right);
                }
                if self.node_ref(w, Node::is_sentinel) {
                    break;
                }
                if self.left_ref(w, Node::is_black) && self.right_ref(w, Node::is_black) {
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = self.node_ref(x, Node::parent);
                } else {
                    if self.right_ref(w, Node::is_black) {
                        self.left_mut(w, Node::set_color(Color::Black));
                        self.node_mut(w, Node::set_color(Color::Red));
                        self.right_rotate(w);
                        w = self.parent_ref(x, Node::right);
                    }
                    self.node_mut(w, Node::set_color(self.parent_ref(x, Node::color)));
                    self.parent_mut(x, Node::set_color(Color::Black));
                    self.right_mut(w, Node::set_color(Color::Black));
                    self.left_rotate(self.node_ref(x, Node::parent));
                    x = self.root;
                }
            } else {
                w = self.parent_ref(x, Node::left);
                if self.node_ref(w, Node::is_red) {
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.parent_mut(x, Node::set_color(Color::Red));
                    self.right_rotate(self.node_ref(x, Node::parent));
                    w = self.parent_ref(x, Node::left);
                }
                if self.node_ref(w, Node::is_sentinel) {
                    break;
                }
                if self.right_ref(w, Node::is_black) && self.left_ref(w, Node::is_black) {
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = self.node_ref(x, Node::parent);
                } else {
                    if self.left_ref(w, Node::is_black) {
                        self.right_mut(w, Node::set_color(Color::Black));
                        self.node_mut(w, Node::set_color(Color::Red));
                        self.left_rotate(w);
                        w = self.parent_ref(x, Node::left);
                    }
                    self.node_mut(w, Node::set_color(self.parent_ref(x, Node::color)));
                    self.parent_mut(x, Node::set_color(Color::Black));
                    self.left_mut(w, Node::set_color(Color::Black));
                    self.right_rotate(self.node_ref(x, Node::parent));
                    x = self.root;
                }
            }
        }
        self.node_mut(x, Node::set_color(Color::Black));
    }

    /// Binary tree left rotate.
    ///
    /// # Panics
    ///
    /// Panics when the pivot has no right child; the fixup logic never
    /// rotates such a node, so hitting this is a bug in the caller.
    fn left_rotate(&mut self, x: NodeIndex<Ix>) {
        assert!(
            !self.right_ref(x, Node::is_sentinel),
            "left rotation requires a right child"
        );
        let y = self.node_ref(x, Node::right);

        if self.is_right_child(x) {
            let parent = self.node_ref(x, Node::parent);
            let _prev = self.attach_right(parent, y);
        } else if self.is_left_child(x) {
            let parent = self.node_ref(x, Node::parent);
            let _prev = self.attach_left(parent, y);
        } else {
            self.root = y;
        }
        let _prev = self.attach_right(x, self.node_ref(y, Node::left));
        let _prev = self.attach_left(y, x);

        self.notify(Checkpoint::RotatedLeft, x);
    }

    /// Binary tree right rotate.
    ///
    /// # Panics
    ///
    /// Panics when the pivot has no left child; the fixup logic never
    /// rotates such a node, so hitting this is a bug in the caller.
    fn right_rotate(&mut self, x: NodeIndex<Ix>) {
        assert!(
            !self.left_ref(x, Node::is_sentinel),
            "right rotation requires a left child"
        );
        let y = self.node_ref(x, Node::left);

        if self.is_right_child(x) {
            let parent = self.node_ref(x, Node::parent);
            let _prev = self.attach_right(parent, y);
        } else if self.is_left_child(x) {
            let parent = self.node_ref(x, Node::parent);
            let _prev = self.attach_left(parent, y);
        } else {
            self.root = y;
        }
        let _prev = self.attach_left(x, self.node_ref(y, Node::right));
        let _prev = self.attach_right(y, x);

        self.notify(Checkpoint::RotatedRight, x);
    }

    /// Attach `child` as the left child of `node`, detaching it from any
    /// previous parent and evicting the slot's previous occupant, whose
    /// back-reference is cleared and which is returned. Attaching the node
    /// already in the slot is a no-op returning `None`.
    ///
    /// The attach operations never touch key or color and are the sole
    /// mechanism by which rotations and splices rewire the tree. Attaching
    /// the sentinel records the phantom parent read by the remove fixup
    /// and skips the detach walk, since the sentinel's parent is scratch.
    fn attach_left(&mut self, node: NodeIndex<Ix>, child: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        if self.node_ref(node, Node::left) == child {
            return None;
        }
        self.detach_from_parent(child);
        self.node_mut(child, Node::set_parent(node));

        let prev = self.node_ref(node, Node::left);
        self.node_mut(node, Node::set_left(child));
        if self.node_ref(prev, Node::is_sentinel) {
            return None;
        }
        self.node_mut(prev, Node::set_parent(Self::sentinel()));
        Some(prev)
    }

    /// Attach `child` as the right child of `node`; see [`Self::attach_left`].
    fn attach_right(&mut self, node: NodeIndex<Ix>, child: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        if self.node_ref(node, Node::right) == child {
            return None;
        }
        self.detach_from_parent(child);
        self.node_mut(child, Node::set_parent(node));

        let prev = self.node_ref(node, Node::right);
        self.node_mut(node, Node::set_right(child));
        if self.node_ref(prev, Node::is_sentinel) {
            return None;
        }
        self.node_mut(prev, Node::set_parent(Self::sentinel()));
        Some(prev)
    }

    /// Clear the child slot through which the previous parent reached
    /// `node`. Identity of the slot is decided by index comparison, never
    /// by key.
    fn detach_from_parent(&mut self, node: NodeIndex<Ix>) {
        if self.node_ref(node, Node::is_sentinel) || self.parent_ref(node, Node::is_sentinel) {
            return;
        }
        let parent = self.node_ref(node, Node::parent);
        if self.node_ref(parent, Node::left) == node {
            self.node_mut(parent, Node::set_left(Self::sentinel()));
        } else {
            self.node_mut(parent, Node::set_right(Self::sentinel()));
        }
    }

    /// Find the node with the minimum key of the subtree rooted at `x`.
    fn tree_minimum(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.left_ref(x, Node::is_sentinel) {
            x = self.node_ref(x, Node::left);
        }
        x
    }

    /// Check if a node is a left child of its parent.
    fn is_left_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::left) == node
    }

    /// Check if a node is a right child of its parent.
    fn is_right_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::right) == node
    }

    /// Update node indices after the arena compaction of a remove moved
    /// the node at `old` into slot `new`.
    fn update_idx(&mut self, old: NodeIndex<Ix>, new: NodeIndex<Ix>) {
        if self.root == old {
            self.root = new;
        }
        if self.nodes.get(new.index()).is_some() {
            if !self.parent_ref(new, Node::is_sentinel) {
                if self.parent_ref(new, Node::left) == old {
                    self.parent_mut(new, Node::set_left(new));
                } else {
                    self.parent_mut(new, Node::set_right(new));
                }
            }
            self.left_mut(new, Node::set_parent(new));
            self.right_mut(new, Node::set_parent(new));
        }
    }

    /// Report a checkpoint to the probe, if one is installed.
    fn notify(&mut self, at: Checkpoint, node: NodeIndex<Ix>) {
        if let Some(mut probe) = self.probe.take() {
            probe.checkpoint(at, self, node);
            self.probe = Some(probe);
        }
    }
}

// Convenient methods for reference or mutate current/parent/left/right node
impl<'a, K, Ix> RbTree<K, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn node_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    pub(crate) fn node_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        op(&mut self.nodes[node.index()])
    }

    pub(crate) fn left_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&self.nodes[idx])
    }

    pub(crate) fn right_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&self.nodes[idx])
    }

    pub(crate) fn parent_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent().index();
        op(&self.nodes[idx])
    }

    fn grand_parent_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        let parent_idx = self.nodes[node.index()].parent().index();
        let grand_parent_idx = self.nodes[parent_idx].parent().index();
        op(&self.nodes[grand_parent_idx])
    }

    fn left_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&mut self.nodes[idx])
    }

    fn right_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&mut self.nodes[idx])
    }

    fn parent_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent().index();
        op(&mut self.nodes[idx])
    }

    fn grand_parent_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        let parent_idx = self.nodes[node.index()].parent().index();
        let grand_parent_idx = self.nodes[parent_idx].parent().index();
        op(&mut self.nodes[grand_parent_idx])
    }
}
