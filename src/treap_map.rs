//! The treap itself: split/merge engine and the public map surface.

use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use smallvec::SmallVec;

use crate::allocator::{ArenaAllocator, Handle, NodeAllocator};
use crate::comparator::{Comparator, OrdComparator};
use crate::node::Node;
use crate::prng::Prng48;

/// Priority seed used by [`TreapMap::new`].
///
/// There is no ambient entropy source in `no_std`, and balance quality does
/// not depend on the seed value, so a fixed constant keeps `new()` simple and
/// every run reproducible. Callers who want an unpredictable priority
/// sequence pass their own seed to [`TreapMap::with_seed`].
const DEFAULT_SEED: u64 = 0x853C_49E6_748F_EA9B;

/// Soft bound on split/merge/find recursion depth.
///
/// Expected depth is O(log n), so hitting this means the balance invariant is
/// broken, not that the tree is merely large.
const RECURSION_LIMIT: u32 = 200;

/// Inline capacity for the traversal stacks; spills to the heap only for
/// trees deeper than this.
type TraversalStack<T> = SmallVec<[T; 32]>;

/// Where keys equal to the split key land.
///
/// `Leq` sends them to the left output, `Lt` to the right. Having both modes
/// is what makes [`TreapMap::remove`] a pair of splits.
#[derive(Clone, Copy, Eq, PartialEq)]
enum SplitMode {
    Lt,
    Leq,
}

/// An ordered map based on a [treap].
///
/// A treap is a binary search tree ordered by key and simultaneously
/// max-heap-ordered by a random priority drawn once per node at insertion.
/// With independently drawn priorities the tree depth is O(log n) in
/// expectation, without any explicit rebalancing. Every mutating operation is
/// composed from two mutually-inverse primitives: *split*, which partitions a
/// tree at a key boundary by re-linking child handles, and *merge*, which
/// reassembles two key-disjoint trees.
///
/// Keys are ordered by the [`Comparator`] capability `C` (defaulting to the
/// key's own [`Ord`]); nodes are stored in the [`NodeAllocator`] capability
/// `A` (defaulting to an index-based arena with a free list). Key uniqueness
/// is maintained by [`upsert`](TreapMap::upsert): inserting an existing key
/// overwrites its value in place and never creates a second node.
///
/// The map is a single-owner, single-threaded structure: it holds no locks
/// and assumes exclusive, serialized access. Callers that share one across
/// threads must wrap every operation in their own mutual exclusion.
///
/// It is a logic error for a key to be modified in such a way that its
/// ordering under `C` relative to any other key changes while it is in the
/// map.
///
/// # Examples
///
/// ```
/// use treap_map::TreapMap;
///
/// let mut populations = TreapMap::new();
///
/// populations.upsert("Oslo", 709_000);
/// populations.upsert("Bergen", 291_000);
/// populations.upsert("Trondheim", 212_000);
///
/// // Upsert of an existing key overwrites in place.
/// populations.upsert("Bergen", 292_000);
/// assert_eq!(populations.len(), 3);
/// assert_eq!(populations.get(&"Bergen"), Some(&292_000));
///
/// // Iteration is in ascending key order.
/// let cities: Vec<&str> = populations.iter().map(|(city, _)| *city).collect();
/// assert_eq!(cities, ["Bergen", "Oslo", "Trondheim"]);
///
/// populations.remove(&"Oslo");
/// assert_eq!(populations.len(), 2);
/// ```
///
/// [treap]: https://en.wikipedia.org/wiki/Treap
pub struct TreapMap<K, V, C = OrdComparator, A = ArenaAllocator<K, V>> {
    allocator: A,
    root: Option<Handle>,
    prng: Prng48,
    len: usize,
    marker: PhantomData<(C, K, V)>,
}

impl<K, V> TreapMap<K, V> {
    /// Creates an empty map with the default comparator and arena allocator.
    ///
    /// Priorities are drawn from a fixed seed; use
    /// [`with_seed`](TreapMap::with_seed) to supply your own.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Creates an empty map whose arena can hold `capacity` nodes before
    /// growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_allocator(DEFAULT_SEED, ArenaAllocator::with_capacity(capacity))
    }
}

impl<K, V> Default for TreapMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, A> TreapMap<K, V, C, A> {
    /// Creates an empty map drawing priorities from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self
    where
        A: Default,
    {
        Self::with_allocator(seed, A::default())
    }

    /// Creates an empty map storing its nodes in `allocator`.
    ///
    /// The allocator is owned by the map and lives exactly as long as it
    /// does. Per the [`NodeAllocator`] contract, allocation failure must be
    /// fatal inside the allocator; the map performs no failure handling.
    #[must_use]
    pub fn with_allocator(seed: u64, allocator: A) -> Self {
        Self {
            allocator,
            root: None,
            prng: Prng48::new(seed),
            len: 0,
            marker: PhantomData,
        }
    }

    /// Returns the number of live key/value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K, V, C, A> TreapMap<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator<K, V>,
{
    /// Splits the subtree at `head` into two trees at the `key` boundary.
    ///
    /// Every key in the first output compares less-or-equal (`Leq` mode) or
    /// strictly less (`Lt` mode) than `key`; the rest land in the second.
    /// Nodes are re-linked, never copied; priorities, keys, and values are
    /// untouched.
    fn split(
        allocator: &mut A,
        head: Option<Handle>,
        key: &K,
        mode: SplitMode,
        depth: u32,
    ) -> (Option<Handle>, Option<Handle>) {
        debug_assert!(depth < RECURSION_LIMIT, "call-stack depth should never exceed 200");

        let Some(head) = head else {
            return (None, None);
        };

        let head_goes_left = match C::cmp(allocator.node(head).key(), key) {
            Ordering::Less => true,
            Ordering::Equal => mode == SplitMode::Leq,
            Ordering::Greater => false,
        };

        if head_goes_left {
            // `head` and its left subtree already belong left; only the right
            // subtree can still hold keys that belong right.
            let head_right = allocator.node(head).right();
            let (left, right) = Self::split(allocator, head_right, key, mode, depth + 1);
            allocator.node_mut(head).set_right(left);
            (Some(head), right)
        } else {
            let head_left = allocator.node(head).left();
            let (left, right) = Self::split(allocator, head_left, key, mode, depth + 1);
            allocator.node_mut(head).set_left(right);
            (left, Some(head))
        }
    }

    /// Merges two trees into one, preserving both invariants.
    ///
    /// Invariant: every key in `left` compares less-or-equal to every key in
    /// `right`. Not re-validated here; callers only ever hand over the two
    /// halves of a split. The exact inverse of [`split`](Self::split).
    fn merge(
        allocator: &mut A,
        left: Option<Handle>,
        right: Option<Handle>,
        depth: u32,
    ) -> Option<Handle> {
        debug_assert!(depth < RECURSION_LIMIT, "call-stack depth should never exceed 200");

        let (Some(l), Some(r)) = (left, right) else {
            return left.or(right);
        };

        if allocator.node(l).priority() > allocator.node(r).priority() {
            // `l` stays on top; everything in `r` belongs in its right spine.
            let l_right = allocator.node(l).right();
            let merged = Self::merge(allocator, l_right, Some(r), depth + 1);
            allocator.node_mut(l).set_right(merged);
            Some(l)
        } else {
            let r_left = allocator.node(r).left();
            let merged = Self::merge(allocator, Some(l), r_left, depth + 1);
            allocator.node_mut(r).set_left(merged);
            Some(r)
        }
    }

    fn find(allocator: &A, node: Option<Handle>, key: &K, depth: u32) -> Option<Handle> {
        debug_assert!(depth < RECURSION_LIMIT, "call-stack depth should never exceed 200");

        let handle = node?;
        let node = allocator.node(handle);
        match C::cmp(node.key(), key) {
            Ordering::Equal => Some(handle),
            Ordering::Less => Self::find(allocator, node.right(), key, depth + 1),
            Ordering::Greater => Self::find(allocator, node.left(), key, depth + 1),
        }
    }

    /// Inserts `key`/`value`, or overwrites the value in place if `key` is
    /// already present.
    ///
    /// The overwrite path allocates nothing and leaves the tree shape, the
    /// node's identity, and its priority untouched. The insert path draws one
    /// priority, allocates one node, and splices it in with a split and two
    /// merges.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.upsert(1, "first");
    /// map.upsert(1, "second");
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&1), Some(&"second"));
    /// ```
    pub fn upsert(&mut self, key: K, value: V) {
        if let Some(found) = Self::find(&self.allocator, self.root, &key, 0) {
            *self.allocator.node_mut(found).value_mut() = value;
        } else {
            // (LEQ_key, GT_key)
            let (leq, gt) = Self::split(&mut self.allocator, self.root.take(), &key, SplitMode::Leq, 0);
            let priority = self.prng.next();
            let node = self.allocator.allocate(Node::new(key, value, priority));
            // The LEQ half cannot contain the key, so the fresh node is its
            // maximum: merge(merge(LEQ_key, node), GT_key) is in order.
            let left = Self::merge(&mut self.allocator, leq, Some(node), 0);
            self.root = Self::merge(&mut self.allocator, left, gt, 0);
            self.len += 1;
        }

        #[cfg(debug_assertions)]
        self.verify_self();
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Removing an absent key is an observable no-op (it still performs the
    /// split/merge bookkeeping internally).
    pub fn remove(&mut self, key: &K) -> Option<V> {
        // (LEQ_key, GT_key), then (LT_key, EQ_key): keys are unique, so the
        // EQ half holds zero or one node.
        let (leq, gt) = Self::split(&mut self.allocator, self.root.take(), key, SplitMode::Leq, 0);
        let (lt, eq) = Self::split(&mut self.allocator, leq, key, SplitMode::Lt, 0);

        let removed = eq.map(|handle| {
            self.len -= 1;
            self.allocator.free(handle).into_value()
        });

        self.root = Self::merge(&mut self.allocator, lt, gt, 0);

        #[cfg(debug_assertions)]
        self.verify_self();

        removed
    }

    /// Removes every entry, freeing every node through the allocator.
    pub fn clear(&mut self) {
        // Teardown is not protected by the balance invariant the way
        // split/merge recursion is, so it must not recurse.
        let mut to_free: TraversalStack<Handle> = SmallVec::new();
        to_free.extend(self.root.take());
        while let Some(handle) = to_free.pop() {
            let node = self.allocator.free(handle);
            to_free.extend(node.left());
            to_free.extend(node.right());
        }
        self.len = 0;

        #[cfg(debug_assertions)]
        self.verify_self();
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let handle = Self::find(&self.allocator, self.root, key, 0)?;
        Some(self.allocator.node(handle).value())
    }

    /// Returns the value stored under `key` mutably, if any.
    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = Self::find(&self.allocator, self.root, key, 0)?;
        Some(self.allocator.node_mut(handle).value_mut())
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        Self::find(&self.allocator, self.root, key, 0).is_some()
    }

    /// Returns the entry with the greatest key that compares less-or-equal to
    /// `key`, or `None` if every stored key exceeds it.
    ///
    /// This is a predecessor-or-exact-match query; it never restructures the
    /// tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// map.upsert(10, "ten");
    /// map.upsert(20, "twenty");
    ///
    /// assert_eq!(map.closest_leq(&15), Some((&10, &"ten")));
    /// assert_eq!(map.closest_leq(&20), Some((&20, &"twenty")));
    /// assert_eq!(map.closest_leq(&5), None);
    /// ```
    #[must_use]
    pub fn closest_leq(&self, key: &K) -> Option<(&K, &V)> {
        let mut candidate = None;
        let mut pos = self.root;
        while let Some(handle) = pos {
            let node = self.allocator.node(handle);
            match C::cmp(node.key(), key) {
                Ordering::Equal => {
                    // Exact match; nothing can be closer.
                    candidate = Some(handle);
                    break;
                }
                Ordering::Less => {
                    // A match; look right for a closer one.
                    candidate = Some(handle);
                    pos = node.right();
                }
                Ordering::Greater => pos = node.left(),
            }
        }
        candidate.map(|handle| {
            let node = self.allocator.node(handle);
            (node.key(), node.value())
        })
    }

    /// Visits every entry in ascending key order.
    ///
    /// The walk is iterative with an explicit stack, so its cost in native
    /// stack space does not depend on the tree shape.
    pub fn visit_in_order<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let mut to_visit: TraversalStack<Handle> = SmallVec::new();
        let mut head = self.root;
        loop {
            while let Some(handle) = head {
                to_visit.push(handle);
                head = self.allocator.node(handle).left();
            }
            let Some(handle) = to_visit.pop() else {
                break;
            };
            let node = self.allocator.node(handle);
            f(node.key(), node.value());
            head = node.right();
        }
    }

    /// Visits, in ascending key order, every entry whose key lies in the
    /// half-open range `[from, to)`.
    ///
    /// Subtrees entirely outside the range are never descended into, so the
    /// cost is proportional to the number of entries visited plus the tree
    /// depth, not the size of the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::TreapMap;
    ///
    /// let mut map = TreapMap::new();
    /// for key in [1, 3, 4, 5, 7, 8, 9] {
    ///     map.upsert(key, ());
    /// }
    ///
    /// let mut seen = Vec::new();
    /// map.visit_range_in_order(&3, &8, |key, _| seen.push(*key));
    /// assert_eq!(seen, [3, 4, 5, 7]);
    /// ```
    pub fn visit_range_in_order<F>(&self, from: &K, to: &K, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let mut to_visit: TraversalStack<Handle> = SmallVec::new();
        let mut head = self.root;
        loop {
            while let Some(handle) = head {
                to_visit.push(handle);
                if C::cmp(self.allocator.node(handle).key(), from) == Ordering::Less {
                    // Strictly below `from`: nothing further left is in range.
                    break;
                }
                head = self.allocator.node(handle).left();
            }
            let Some(handle) = to_visit.pop() else {
                break;
            };
            let node = self.allocator.node(handle);
            let above_from = C::cmp(node.key(), from) != Ordering::Less;
            let below_to = C::cmp(node.key(), to) == Ordering::Less;
            if above_from && below_to {
                f(node.key(), node.value());
            }
            // At or past `to`, the right subtree is entirely out of range.
            head = if below_to { node.right() } else { None };
        }
    }

    /// Returns an iterator over the entries, ascending by key.
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter {
            allocator: &self.allocator,
            stack: SmallVec::new(),
            head: self.root,
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// Walks the whole structure and asserts the treap invariants.
    ///
    /// Runs after every mutation in debug builds and is compiled out
    /// otherwise. A failure here means split/merge has a defect, not that the
    /// caller did anything wrong.
    #[cfg(debug_assertions)]
    fn verify_self(&self) {
        // Priority and depth check via explicit-stack DFS; recursing here
        // would couple the checker to the very tree shape it is validating.
        let mut maximum_depth_found: u32 = 0;
        let mut to_visit: TraversalStack<(Handle, u64, u32)> = SmallVec::new();
        if let Some(root) = self.root {
            to_visit.push((root, u64::MAX, 0));
        }
        while let Some((handle, parent_priority, depth)) = to_visit.pop() {
            let node = self.allocator.node(handle);
            maximum_depth_found = maximum_depth_found.max(depth);
            assert!(node.priority() <= parent_priority, "broken priority invariant");
            if let Some(left) = node.left() {
                to_visit.push((left, node.priority(), depth + 1));
            }
            if let Some(right) = node.right() {
                to_visit.push((right, node.priority(), depth + 1));
            }
        }

        // Generous statistical bound: expected depth is O(log n), so exceeding
        // a scaled log2(n + 1) means the priorities are not doing their job.
        let expected_maximum_depth = 5 * (usize::BITS - (self.len + 1).leading_zeros());
        assert!(maximum_depth_found <= expected_maximum_depth, "depth unexpectedly large");

        // In-order walk: keys strictly increasing, count matching.
        let mut seen_count: usize = 0;
        let mut last_seen: Option<&K> = None;
        for (key, _) in self.iter() {
            seen_count += 1;
            if let Some(previous) = last_seen {
                assert!(
                    C::cmp(previous, key) == Ordering::Less,
                    "keys not strictly increasing in in-order traversal"
                );
            }
            last_seen = Some(key);
        }
        assert!(seen_count == self.len, "in-order node count does not match live count");
    }
}

impl<K, V, C, A> fmt::Debug for TreapMap<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
    A: NodeAllocator<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a TreapMap<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`TreapMap`], ascending by key.
///
/// Created by [`TreapMap::iter`]. Holds the explicit in-order traversal stack
/// of the map it borrows.
pub struct Iter<'a, K, V, A = ArenaAllocator<K, V>> {
    allocator: &'a A,
    stack: TraversalStack<Handle>,
    head: Option<Handle>,
    remaining: usize,
    marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V, A> Iterator for Iter<'a, K, V, A>
where
    A: NodeAllocator<K, V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let allocator: &'a A = self.allocator;
        while let Some(handle) = self.head {
            self.stack.push(handle);
            self.head = allocator.node(handle).left();
        }
        let handle = self.stack.pop()?;
        let node = allocator.node(handle);
        self.head = node.right();
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, A> ExactSizeIterator for Iter<'_, K, V, A> where A: NodeAllocator<K, V> {}

impl<K, V, A> FusedIterator for Iter<'_, K, V, A> where A: NodeAllocator<K, V> {}
