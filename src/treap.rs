//! A randomized binary search tree (treap) keyed by an ordered key
//!
//! Every node carries a key, a value and a random `u32` priority. The tree is kept in
//! binary search order by key and in max-heap order by priority: no node has a child
//! with a higher priority than its own. Random priorities keep the expected height
//! logarithmic no matter in which order keys arrive.
//!
//! ## Differences from a textbook treap
//!
//! 1. **Duplicate keys**: equal keys are kept side by side, nothing is ever replaced
//! 2. **Split and merge only**: there are no rotations; insertion splits the subtree it
//!    takes over and removal merges the children of the removed node
//! 3. **External RNG**: priorities come from the caller's RNG, or are given explicitly
//!    via [`Treap::insert_with_priority`] so that tree shapes are reproducible
//! 4. **Band removal**: [`Treap::remove_key`] drops every entry sharing a key with two
//!    splits and one merge
//!
//! Equal keys may end up on either side of each other, so for any node the left subtree
//! holds keys `<=` its key and the right subtree keys `>=` its key.

use rand::Rng;

type Link<K, V> = Option<Box<Node<K, V>>>;

/// A node in the treap
struct Node<K, V> {
    key: K,
    value: V,
    priority: u32,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, priority: u32) -> Self {
        Node {
            key,
            value,
            priority,
            left: None,
            right: None,
        }
    }
}

/// A treap holding `(key, value)` entries in key order, duplicates allowed
pub struct Treap<K, V> {
    root: Link<K, V>,
    size: usize,
}

impl<K: Ord, V> Treap<K, V> {
    /// Create a new empty treap
    pub fn new() -> Self {
        Treap {
            root: None,
            size: 0,
        }
    }

    /// Get the number of entries in the treap
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the treap is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.root = None;
        self.size = 0;
    }

    /// Insert an entry with a priority drawn from `rng`
    pub fn insert<R: Rng>(&mut self, key: K, value: V, rng: &mut R) {
        let priority = rng.gen();
        self.insert_with_priority(key, value, priority);
    }

    /// Insert an entry with a fixed priority
    ///
    /// The entry becomes the root of the first subtree on its search path whose root
    /// has a lower priority; on a tie it keeps descending.
    pub fn insert_with_priority(&mut self, key: K, value: V, priority: u32) {
        let node = Box::new(Node::new(key, value, priority));
        self.root = Self::insert_node(self.root.take(), node);
        self.size += 1;
    }

    /// Remove every entry for which `pred` returns true, returning how many went
    ///
    /// The whole tree is scanned in pre-order. A matching node is replaced by the merge
    /// of its children and that merged subtree is not scanned again; a non-matching
    /// node always goes on to both of its children.
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let (new_root, removed) = Self::remove_node(self.root.take(), &mut pred);
        self.root = new_root;
        self.size -= removed;
        removed
    }

    /// Remove every entry whose key equals `key`, returning how many went
    pub fn remove_key(&mut self, key: &K) -> usize {
        let (before, rest) = Self::split(self.root.take(), &|k: &K| k < key);
        let (band, after) = Self::split(rest, &|k: &K| k <= key);
        let removed = Self::count(&band);
        drop(band);
        self.root = Self::merge(before, after);
        self.size -= removed;
        removed
    }

    /// Split the treap in two: `self` keeps the keys `<= key`, the returned treap gets
    /// the keys `> key`
    pub fn split_off(&mut self, key: &K) -> Self {
        let (left, right) = Self::split(self.root.take(), &|k: &K| k <= key);
        let moved = Self::count(&right);
        self.root = left;
        self.size -= moved;
        Treap {
            root: right,
            size: moved,
        }
    }

    /// Move all entries of `other` into `self`
    ///
    /// Every key in `self` must be `<=` every key in `other`. This is not checked; if it
    /// does not hold the tree loses its key order.
    pub fn append(&mut self, other: Self) {
        self.root = Self::merge(self.root.take(), other.root);
        self.size += other.size;
    }

    /// Entries with `lo <= key <= hi`, in key order
    ///
    /// Subtrees lying wholly outside the bounds are not visited.
    pub fn range(&self, lo: &K, hi: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        Self::range_node(&self.root, lo, hi, &mut out);
        out
    }

    /// Visit every entry, each node before its left subtree and that before its right
    pub fn for_each_preorder<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        Self::preorder_node(&self.root, &mut f);
    }

    /// Iterate over the entries in key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Count the nodes by walking the tree
    ///
    /// Always equal to [`Treap::len`]; kept for diagnostics.
    pub fn count_nodes(&self) -> usize {
        Self::count(&self.root)
    }

    // Insert `new` into the subtree rooted at `link`
    fn insert_node(link: Link<K, V>, mut new: Box<Node<K, V>>) -> Link<K, V> {
        match link {
            None => Some(new),
            Some(mut n) => {
                if new.priority > n.priority {
                    // The new node takes over this subtree
                    let (left, right) = Self::split(Some(n), &|k: &K| *k <= new.key);
                    new.left = left;
                    new.right = right;
                    Some(new)
                } else if new.key < n.key {
                    n.left = Self::insert_node(n.left.take(), new);
                    Some(n)
                } else {
                    n.right = Self::insert_node(n.right.take(), new);
                    Some(n)
                }
            }
        }
    }

    // Partition a subtree into the keys for which `goes_left` holds and the rest.
    // `goes_left` must be monotone: true for a prefix of the key order.
    fn split<F>(link: Link<K, V>, goes_left: &F) -> (Link<K, V>, Link<K, V>)
    where
        F: Fn(&K) -> bool,
    {
        match link {
            None => (None, None),
            Some(mut n) => {
                if goes_left(&n.key) {
                    let (left, right) = Self::split(n.right.take(), goes_left);
                    n.right = left;
                    (Some(n), right)
                } else {
                    let (left, right) = Self::split(n.left.take(), goes_left);
                    n.left = right;
                    (left, Some(n))
                }
            }
        }
    }

    // Merge two subtrees, every key in `left` being <= every key in `right`
    fn merge(left: Link<K, V>, right: Link<K, V>) -> Link<K, V> {
        match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(mut l), Some(mut r)) => {
                if l.priority > r.priority {
                    l.right = Self::merge(l.right.take(), Some(r));
                    Some(l)
                } else {
                    r.left = Self::merge(Some(l), r.left.take());
                    Some(r)
                }
            }
        }
    }

    fn remove_node<F>(link: Link<K, V>, pred: &mut F) -> (Link<K, V>, usize)
    where
        F: FnMut(&K, &V) -> bool,
    {
        match link {
            None => (None, 0),
            Some(mut n) => {
                if pred(&n.key, &n.value) {
                    let Node { left, right, .. } = *n;
                    (Self::merge(left, right), 1)
                } else {
                    let (left, left_removed) = Self::remove_node(n.left.take(), pred);
                    let (right, right_removed) = Self::remove_node(n.right.take(), pred);
                    n.left = left;
                    n.right = right;
                    (Some(n), left_removed + right_removed)
                }
            }
        }
    }

    fn range_node<'a>(link: &'a Link<K, V>, lo: &K, hi: &K, out: &mut Vec<(&'a K, &'a V)>) {
        if let Some(n) = link {
            // Equal keys can sit on both sides, so only strictly-outside keys prune
            if n.key >= *lo {
                Self::range_node(&n.left, lo, hi, out);
            }
            if n.key >= *lo && n.key <= *hi {
                out.push((&n.key, &n.value));
            }
            if n.key <= *hi {
                Self::range_node(&n.right, lo, hi, out);
            }
        }
    }

    fn preorder_node<F>(link: &Link<K, V>, f: &mut F)
    where
        F: FnMut(&K, &V),
    {
        if let Some(n) = link {
            f(&n.key, &n.value);
            Self::preorder_node(&n.left, f);
            Self::preorder_node(&n.right, f);
        }
    }

    fn count(link: &Link<K, V>) -> usize {
        match link {
            None => 0,
            Some(n) => 1 + Self::count(&n.left) + Self::count(&n.right),
        }
    }
}

impl<K: Ord, V> Default for Treap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over a [`Treap`], created by [`Treap::iter`]
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left(n.right.as_deref());
        Some((&n.key, &n.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Walk the tree checking key order and heap order; returns the node count
    fn check_node<K: Ord, V>(link: &Link<K, V>, lo: Option<&K>, hi: Option<&K>) -> usize {
        match link {
            None => 0,
            Some(n) => {
                if let Some(lo) = lo {
                    assert!(n.key >= *lo, "key below its subtree bound");
                }
                if let Some(hi) = hi {
                    assert!(n.key <= *hi, "key above its subtree bound");
                }
                for child in [&n.left, &n.right].into_iter().flatten() {
                    assert!(child.priority <= n.priority, "heap order violated");
                }
                1 + check_node(&n.left, lo, Some(&n.key)) + check_node(&n.right, Some(&n.key), hi)
            }
        }
    }

    fn check_invariants<K: Ord, V>(treap: &Treap<K, V>) {
        assert_eq!(check_node(&treap.root, None, None), treap.len());
        assert_eq!(treap.count_nodes(), treap.len());
        let keys: Vec<&K> = treap.iter().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    fn random_treap(n: usize, key_space: i64, rng: &mut StdRng) -> Treap<i64, usize> {
        let mut treap = Treap::new();
        for i in 0..n {
            let key = rng.gen_range(0..key_space);
            treap.insert(key, i, rng);
        }
        treap
    }

    #[test]
    fn test_insert_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let treap = random_treap(500, 100, &mut rng);

        assert_eq!(treap.len(), 500);
        check_invariants(&treap);
    }

    #[test]
    fn test_insert_sorted_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut treap = Treap::new();
        for i in 0..1000 {
            treap.insert(i, (), &mut rng);
        }
        check_invariants(&treap);
        let keys: Vec<i32> = treap.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_highest_priority_becomes_root() {
        let mut treap = Treap::new();
        treap.insert_with_priority(5, "a", 10);
        treap.insert_with_priority(3, "b", 20);
        treap.insert_with_priority(8, "c", 5);
        treap.insert_with_priority(1, "d", 15);

        let mut order = Vec::new();
        treap.for_each_preorder(|k, _| order.push(*k));
        assert_eq!(order, vec![3, 1, 5, 8]);
        check_invariants(&treap);
    }

    #[test]
    fn test_duplicates_on_both_sides() {
        let mut treap = Treap::new();
        // The second entry takes over the root and the first one lands on its left
        treap.insert_with_priority(100, 1, 1);
        treap.insert_with_priority(100, 2, 2);
        treap.insert_with_priority(100, 3, 0);
        check_invariants(&treap);

        let mut hits: Vec<i32> = treap.range(&100, &100).iter().map(|(_, v)| **v).collect();
        hits.sort();
        assert_eq!(hits, vec![1, 2, 3]);
    }

    #[test]
    fn test_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let treap = random_treap(300, 50, &mut rng);

        let expected: Vec<i64> = treap
            .iter()
            .map(|(k, _)| *k)
            .filter(|k| (10..=20).contains(k))
            .collect();
        let got: Vec<i64> = treap.range(&10, &20).iter().map(|(k, _)| **k).collect();
        assert_eq!(got, expected);

        assert!(treap.range(&60, &70).is_empty());
        assert!(Treap::<i64, ()>::new().range(&0, &100).is_empty());
    }

    #[test]
    fn test_split_off_and_append() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut treap = random_treap(400, 80, &mut rng);
        let before: Vec<(i64, usize)> = treap.iter().map(|(k, v)| (*k, *v)).collect();

        let upper = treap.split_off(&40);
        check_invariants(&treap);
        check_invariants(&upper);
        assert!(treap.iter().all(|(k, _)| *k <= 40));
        assert!(upper.iter().all(|(k, _)| *k > 40));
        assert_eq!(treap.len() + upper.len(), 400);

        treap.append(upper);
        check_invariants(&treap);
        let after: Vec<(i64, usize)> = treap.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_split_off_empty() {
        let mut treap: Treap<i64, ()> = Treap::new();
        let upper = treap.split_off(&0);
        assert!(treap.is_empty());
        assert!(upper.is_empty());
    }

    #[test]
    fn test_remove_key_removes_all_duplicates() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut treap = random_treap(500, 20, &mut rng);
        let expected = treap.iter().filter(|(k, _)| **k == 7).count();
        assert!(expected > 1);

        assert_eq!(treap.remove_key(&7), expected);
        check_invariants(&treap);
        assert!(treap.iter().all(|(k, _)| *k != 7));
        assert_eq!(treap.len(), 500 - expected);

        assert_eq!(treap.remove_key(&7), 0);
        assert_eq!(treap.len(), 500 - expected);
    }

    #[test]
    fn test_remove_key_at_minimum() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut treap = Treap::new();
        treap.insert(i64::MIN, 0, &mut rng);
        treap.insert(i64::MIN, 1, &mut rng);
        treap.insert(0, 2, &mut rng);

        assert_eq!(treap.remove_key(&i64::MIN), 2);
        assert_eq!(treap.len(), 1);
        check_invariants(&treap);
    }

    #[test]
    fn test_remove_where() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut treap = random_treap(200, 1000, &mut rng);

        assert_eq!(treap.remove_where(|_, v| *v == 17), 1);
        assert!(treap.iter().all(|(_, v)| *v != 17));
        assert_eq!(treap.len(), 199);
        check_invariants(&treap);

        assert_eq!(treap.remove_where(|_, v| *v == 17), 0);
        assert_eq!(treap.len(), 199);
    }

    #[test]
    fn test_remove_where_scans_both_sides() {
        let mut treap = Treap::new();
        treap.insert_with_priority(50, "keep", 100);
        treap.insert_with_priority(10, "drop", 50);
        treap.insert_with_priority(90, "drop", 50);
        treap.insert_with_priority(70, "keep", 10);

        assert_eq!(treap.remove_where(|_, v| *v == "drop"), 2);
        let keys: Vec<i32> = treap.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![50, 70]);
        check_invariants(&treap);
    }

    #[test]
    fn test_remove_where_skips_merged_subtree() {
        // The root matches; its children are merged and not scanned again
        let mut treap = Treap::new();
        treap.insert_with_priority(50, "drop", 100);
        treap.insert_with_priority(10, "drop", 50);

        assert_eq!(treap.remove_where(|_, v| *v == "drop"), 1);
        assert_eq!(treap.len(), 1);
        check_invariants(&treap);
    }

    #[test]
    fn test_random_operations_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut treap = Treap::new();
        let mut inserted = 0;
        let mut removed = 0;
        for i in 0..2000usize {
            match rng.gen_range(0..4) {
                0 => removed += treap.remove_key(&rng.gen_range(0..100)),
                1 => {
                    let target = rng.gen_range(0..i.max(1));
                    removed += treap.remove_where(|_, v| *v == target);
                }
                _ => {
                    treap.insert(rng.gen_range(0..100i64), i, &mut rng);
                    inserted += 1;
                }
            }
        }
        check_invariants(&treap);
        assert_eq!(treap.len(), inserted - removed);
    }

    #[test]
    fn test_clear() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut treap = random_treap(10, 10, &mut rng);
        treap.clear();
        assert!(treap.is_empty());
        assert_eq!(treap.count_nodes(), 0);
        assert_eq!(treap.iter().next(), None);
    }
}
