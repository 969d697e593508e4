//! `rb-tree` is an ordered-key container based on a red-black tree.
//!
//! It implements the full insertion and deletion functionality of a
//! red-black tree, so every mutating operation finishes in at most
//! O(logN) time. Duplicate keys are rejected on insert; removing an
//! absent key is a silent no-op.
//!
//! To safely and efficiently handle the parent/child back-references a
//! red-black tree needs for its ascending fixup passes, `rb-tree` stores
//! all nodes in a vector and links them with plain indices instead of
//! pointers. The parent link is thereby a non-owning index, so there is
//! no reference cycle to manage and dropping the tree drops every node
//! with the vector.
//!
//! The rebalancing machinery can be observed through an optional
//! [`Probe`], which is called after every intermediate recoloring and
//! rotation step of an insert or remove.
//!
//! # Example
//!
//! ```rust
//! use rb_tree::RbTree;
//!
//! let mut tree = RbTree::new();
//! tree.insert(2)?;
//! tree.insert(1)?;
//! assert_eq!(tree.find(&1), Some(&1));
//! tree.remove(&1);
//! assert!(!tree.contains(&1));
//! # Ok::<(), rb_tree::TreeError>(())
//! ```

mod error;
mod index;
mod node;
mod probe;
mod tree;

#[cfg(test)]
mod tests;

pub use error::{TreeError, TreeResult};
pub use index::{DefaultIx, IndexType, NodeIndex};
pub use probe::{Checkpoint, Probe};
pub use tree::RbTree;
