use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::index::NodeIndex;
use crate::node::{Color, Node};

use super::*;

struct KeyGenerator {
    rng: StdRng,
    unique: HashSet<i32>,
    limit: i32,
}

impl KeyGenerator {
    fn new(seed: [u8; 32]) -> Self {
        const LIMIT: i32 = 1_000_000;
        Self {
            rng: SeedableRng::from_seed(seed),
            unique: HashSet::new(),
            limit: LIMIT,
        }
    }

    fn next(&mut self) -> i32 {
        self.rng.gen_range(0..self.limit)
    }

    fn next_unique(&mut self) -> i32 {
        let mut key = self.next();
        while self.unique.contains(&key) {
            key = self.next();
        }
        self.unique.insert(key);
        key
    }
}

impl RbTree<i32> {
    /// 1. Every node is either red or black.
    /// 2. The root is black.
    /// 3. Every leaf (NIL) is black.
    /// 4. If a node is red, then both its children are black.
    /// 5. For each node, all simple paths from the node to descendant
    ///    leaves contain the same number of black nodes.
    fn check_rb_properties(&self) {
        assert!(matches!(
            self.node_ref(self.root, Node::color),
            Color::Black
        ));
        self.check_children_color(self.root);
        let _ignore = self.check_black_height(self.root);
    }

    fn check_children_color(&self, x: NodeIndex<u32>) {
        if self.node_ref(x, Node::is_sentinel) {
            return;
        }
        self.check_children_color(self.node_ref(x, Node::left));
        self.check_children_color(self.node_ref(x, Node::right));
        if self.node_ref(x, Node::is_red) {
            assert!(matches!(self.left_ref(x, Node::color), Color::Black));
            assert!(matches!(self.right_ref(x, Node::color), Color::Black));
        }
    }

    fn check_black_height(&self, x: NodeIndex<u32>) -> usize {
        if self.node_ref(x, Node::is_sentinel) {
            return 0;
        }
        let lefth = self.check_black_height(self.node_ref(x, Node::left));
        let righth = self.check_black_height(self.node_ref(x, Node::right));
        assert_eq!(lefth, righth);
        if self.node_ref(x, Node::is_black) {
            return lefth + 1;
        }
        lefth
    }

    fn keys_in_order(&self) -> Vec<i32> {
        let mut keys = Vec::new();
        self.collect_keys(self.root, &mut keys);
        keys
    }

    fn collect_keys(&self, x: NodeIndex<u32>, keys: &mut Vec<i32>) {
        if self.node_ref(x, Node::is_sentinel) {
            return;
        }
        self.collect_keys(self.node_ref(x, Node::left), keys);
        keys.push(*self.node_ref(x, Node::key));
        self.collect_keys(self.node_ref(x, Node::right), keys);
    }
}

fn with_tree_and_generator(test_fn: impl Fn(RbTree<i32>, KeyGenerator)) {
    let seeds = vec![[0; 32], [1; 32], [2; 32]];
    for seed in seeds {
        let gen = KeyGenerator::new(seed);
        let tree = RbTree::new();
        test_fn(tree, gen);
    }
}

#[test]
fn red_black_properties_hold_after_every_insert() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for key in keys {
            tree.insert(key).unwrap();
            tree.check_rb_properties();
        }
    });
}

#[test]
fn red_black_properties_hold_after_every_remove() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for key in keys.clone() {
            tree.insert(key).unwrap();
        }
        for key in keys {
            tree.remove(&key);
            tree.check_rb_properties();
        }
        assert!(tree.is_empty());
    });
}

#[test]
fn in_order_traversal_is_sorted() {
    with_tree_and_generator(|mut tree, mut gen| {
        let mut keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for key in keys.clone() {
            tree.insert(key).unwrap();
        }
        keys.sort_unstable();
        assert_eq!(tree.keys_in_order(), keys);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    });
}

#[test]
fn tree_len_will_update() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for key in keys.clone() {
            tree.insert(key).unwrap();
        }
        assert_eq!(tree.len(), 100);
        for key in keys {
            tree.remove(&key);
        }
        assert_eq!(tree.len(), 0);
    });
}

#[test]
fn duplicate_insert_is_rejected_without_mutation() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for key in keys.clone() {
            tree.insert(key).unwrap();
        }
        let snapshot = tree.keys_in_order();
        let slots = tree.nodes.len();
        for key in keys {
            assert_eq!(tree.insert(key), Err(TreeError::DuplicateKey));
        }
        assert_eq!(tree.len(), 100);
        assert_eq!(tree.nodes.len(), slots);
        assert_eq!(tree.keys_in_order(), snapshot);
        tree.check_rb_properties();
    });
}

#[test]
fn remove_missing_key_is_noop() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for key in keys {
            tree.insert(key).unwrap();
        }
        assert_eq!(tree.len(), 1000);
        let snapshot = tree.keys_in_order();
        let to_remove: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for key in to_remove {
            tree.remove(&key);
        }
        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.keys_in_order(), snapshot);
    });
}

#[test]
fn removing_same_key_twice_is_safe() {
    let mut tree = RbTree::new();
    for key in [4, 2, 6, 1, 3, 5, 7] {
        tree.insert(key).unwrap();
    }
    tree.remove(&4);
    tree.remove(&4);
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.keys_in_order(), vec![1, 2, 3, 5, 6, 7]);
    tree.check_rb_properties();
}

#[test]
fn removed_key_is_gone_and_others_keep_order() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(200)
            .collect();
        for key in keys.clone() {
            tree.insert(key).unwrap();
        }
        let (removed, kept): (Vec<_>, Vec<_>) = keys
            .iter()
            .enumerate()
            .partition(|(i, _)| i % 2 == 0);
        for &(_, key) in &removed {
            tree.remove(key);
        }
        for &(_, key) in &removed {
            assert_eq!(tree.find(key), None);
        }
        let mut expected: Vec<_> = kept.into_iter().map(|(_, key)| *key).collect();
        expected.sort_unstable();
        for key in &expected {
            assert_eq!(tree.find(key), Some(key));
        }
        assert_eq!(tree.keys_in_order(), expected);
        tree.check_rb_properties();
    });
}

#[test]
fn straight_line_insert_rebalances_to_middle_root() {
    let mut tree = RbTree::new();
    tree.insert(10).unwrap();
    tree.insert(20).unwrap();
    tree.insert(30).unwrap();

    let root = tree.root;
    assert_eq!(tree.node_ref(root, Node::key), &20);
    assert!(tree.node_ref(root, Node::is_black));
    let left = tree.node_ref(root, Node::left);
    let right = tree.node_ref(root, Node::right);
    assert_eq!(tree.node_ref(left, Node::key), &10);
    assert_eq!(tree.node_ref(right, Node::key), &30);
    assert!(tree.node_ref(left, Node::is_red));
    assert!(tree.node_ref(right, Node::is_red));
    // both children are red leaves, so every path below them crosses
    // exactly one black nil
    assert!(tree.left_ref(left, Node::is_sentinel));
    assert!(tree.right_ref(left, Node::is_sentinel));
    assert!(tree.left_ref(right, Node::is_sentinel));
    assert!(tree.right_ref(right, Node::is_sentinel));
    tree.check_rb_properties();
}

#[test]
fn bent_line_insert_restores_order_and_colors() {
    let mut tree = RbTree::new();
    for key in [10, 20, 5, 1] {
        tree.insert(key).unwrap();
    }
    assert_eq!(tree.keys_in_order(), vec![1, 5, 10, 20]);
    tree.check_rb_properties();
}

#[test]
fn successor_splice_keeps_remaining_keys() {
    let mut tree = RbTree::new();
    for key in 1..=7 {
        tree.insert(key).unwrap();
    }
    tree.remove(&1);
    // 4 is an internal node with two children, forcing a successor splice
    tree.remove(&4);
    for key in [2, 3, 5, 6, 7] {
        assert_eq!(tree.find(&key), Some(&key));
    }
    assert_eq!(tree.find(&1), None);
    assert_eq!(tree.find(&4), None);
    assert_eq!(tree.keys_in_order(), vec![2, 3, 5, 6, 7]);
    tree.check_rb_properties();
}

struct RecordingProbe {
    events: Rc<RefCell<Vec<(Checkpoint, Option<i32>)>>>,
}

impl Probe<i32> for RecordingProbe {
    fn checkpoint(&mut self, at: Checkpoint, tree: &RbTree<i32>, node: NodeIndex<u32>) {
        self.events
            .borrow_mut()
            .push((at, tree.key_at(node).copied()));
    }
}

#[test]
fn probe_reports_checkpoints_in_order() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut tree = RbTree::new();
    tree.set_probe(Box::new(RecordingProbe {
        events: Rc::clone(&events),
    }));

    tree.insert(10).unwrap();
    tree.insert(20).unwrap();
    tree.insert(30).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            (Checkpoint::BstInserted, Some(10)),
            (Checkpoint::InsertDone, Some(10)),
            (Checkpoint::BstInserted, Some(20)),
            (Checkpoint::InsertDone, Some(20)),
            (Checkpoint::BstInserted, Some(30)),
            (Checkpoint::ParentRecolored, Some(30)),
            (Checkpoint::GrandparentRecolored, Some(30)),
            (Checkpoint::RotatedLeft, Some(10)),
            (Checkpoint::InsertDone, Some(30)),
        ]
    );
    assert!(tree.take_probe().is_some());
    assert!(tree.take_probe().is_none());
}

#[test]
fn uncle_recoloring_is_reported() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut tree = RbTree::new();
    for key in [10, 20, 5] {
        tree.insert(key).unwrap();
    }
    tree.set_probe(Box::new(RecordingProbe {
        events: Rc::clone(&events),
    }));

    // 5 and 20 are the red children of 10, so 1 lands under a red parent
    // with a red uncle
    tree.insert(1).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            (Checkpoint::BstInserted, Some(1)),
            (Checkpoint::UncleRecolored, Some(10)),
            (Checkpoint::InsertDone, Some(1)),
        ]
    );
    assert_eq!(tree.keys_in_order(), vec![1, 5, 10, 20]);
    tree.check_rb_properties();
}

#[test]
fn clear_resets_the_arena() {
    let mut tree = RbTree::new();
    tree.insert(1).unwrap();
    tree.insert(2).unwrap();
    tree.insert(3).unwrap();
    assert_eq!(tree.len(), 3);
    tree.clear();
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert_eq!(tree.nodes.len(), 1);
    assert!(tree.nodes[0].is_sentinel());
}

#[test]
fn interleaved_insert_remove_keeps_invariants() {
    with_tree_and_generator(|mut tree, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(400)
            .collect();
        for (i, key) in keys.iter().enumerate() {
            tree.insert(*key).unwrap();
            if i % 3 == 0 {
                tree.remove(&keys[i / 2]);
            }
        }
        tree.check_rb_properties();
        let in_order = tree.keys_in_order();
        assert_eq!(in_order.len(), tree.len());
        assert!(in_order.windows(2).all(|w| w[0] < w[1]));
    });
}
