//! Node storage for [`TreapMap`](crate::TreapMap).
//!
//! The map does not touch memory directly: it asks a [`NodeAllocator`] for
//! node storage and addresses nodes through compact [`Handle`]s. The
//! production default is [`ArenaAllocator`], a slot vector with a free list.

use alloc::vec::Vec;
use core::num::NonZero;

use crate::node::Node;

// A small handle under test keeps capacity exhaustion reachable.
#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// A compact index identifying a live node inside an allocator.
///
/// Stored as `NonZero` so `Option<Handle>` child links cost no extra space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Handle(NonZero<RawHandle>);

impl Handle {
    /// The largest index a handle can represent.
    pub const MAX: usize = (RawHandle::MAX - 1) as usize;

    /// Creates a handle for `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > Handle::MAX`.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        Self(NonZero::new((index + 1) as RawHandle).unwrap())
    }

    /// Returns the index this handle was created from.
    #[inline]
    #[must_use]
    pub const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// The node-storage capability a [`TreapMap`](crate::TreapMap) is generic over.
///
/// The map performs no out-of-memory handling of its own: [`allocate`]
/// must either return a handle to the stored node or terminate the process.
/// It must never report failure through a value the map would have to check.
///
/// Handles are only ever presented back to the allocator that issued them,
/// and only while the node is live (between its `allocate` and its `free`).
/// An implementation may treat a violation of this as fatal.
///
/// [`allocate`]: NodeAllocator::allocate
pub trait NodeAllocator<K, V> {
    /// Stores `node` and returns its handle.
    fn allocate(&mut self, node: Node<K, V>) -> Handle;

    /// Releases the node at `handle`, returning it. The handle is dead
    /// afterwards and may be reissued by a later [`allocate`](Self::allocate).
    fn free(&mut self, handle: Handle) -> Node<K, V>;

    /// Returns the live node at `handle`.
    fn node(&self, handle: Handle) -> &Node<K, V>;

    /// Returns the live node at `handle` mutably.
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V>;

    /// Returns the number of live nodes.
    fn len(&self) -> usize;

    /// Returns `true` if no nodes are live.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The default [`NodeAllocator`]: a slot vector with a free list.
///
/// Freed slots are recycled before the vector grows, so long-lived maps with
/// churn do not leak slots. Exhaustion (more than [`Handle::MAX`] live nodes,
/// or the backing vector failing to grow) is fatal rather than reported.
#[derive(Clone)]
pub struct ArenaAllocator<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<Handle>,
}

impl<K, V> ArenaAllocator<K, V> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an empty arena with room for `capacity` nodes before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Returns the number of nodes the arena can hold without growing.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<K, V> Default for ArenaAllocator<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeAllocator<K, V> for ArenaAllocator<K, V> {
    fn allocate(&mut self, node: Node<K, V>) -> Handle {
        if let Some(h) = self.free.pop() {
            // Reuse a free slot/handle.
            self.slots[h.to_index()] = Some(node);
            h
        } else {
            // Strict less-than so the post-push slot count stays <= Handle::MAX.
            assert!(
                self.slots.len() < Handle::MAX,
                "`ArenaAllocator::allocate()` - arena is at maximum capacity"
            );
            self.slots.push(Some(node));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    fn free(&mut self, handle: Handle) -> Node<K, V> {
        let node =
            self.slots[handle.to_index()].take().expect("`ArenaAllocator::free()` - `handle` is dead!");
        self.free.push(handle);
        node
    }

    #[inline]
    fn node(&self, handle: Handle) -> &Node<K, V> {
        self.slots[handle.to_index()].as_ref().expect("`ArenaAllocator::node()` - `handle` is dead!")
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.slots[handle.to_index()].as_mut().expect("`ArenaAllocator::node_mut()` - `handle` is dead!")
    }

    fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // Verify our assumptions about `Handle` and the niche optimization.
    assert_eq_size!(Handle, Option<Handle>);
    assert_eq_size!(Handle, RawHandle);

    fn node(key: u32, value: u32) -> Node<u32, u32> {
        Node::new(key, value, u64::from(key))
    }

    #[test]
    #[should_panic(expected = "`Handle::from_index()` - `index` > `Handle::MAX`!")]
    fn invalid_handle() {
        let _ = Handle::from_index(Handle::MAX + 1);
    }

    #[test]
    fn free_slots_are_recycled() {
        let mut arena: ArenaAllocator<u32, u32> = ArenaAllocator::new();
        let first = arena.allocate(node(1, 10));
        arena.free(first);
        let second = arena.allocate(node(2, 20));
        assert_eq!(first, second);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn arena_capacity() {
        let arena: ArenaAllocator<u32, u32> = ArenaAllocator::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    proptest! {
        #[test]
        fn handle_round_trip(index in 0..=Handle::MAX) {
            let handle = Handle::from_index(index);
            prop_assert_eq!(handle.to_index(), index);
        }

        /// Replays random allocate/free/mutate operations against a Vec model.
        #[test]
        fn arena_behaves_like_model(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32, u32)> = Vec::new();
            let mut arena: ArenaAllocator<u32, u32> = ArenaAllocator::new();

            for operation in operations {
                match operation {
                    Operation::Allocate(key, value) => {
                        let handle = arena.allocate(node(key, value));
                        model.push((handle, key, value));
                    }
                    Operation::Get(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let (handle, key, value) = model[which % model.len()];
                        prop_assert_eq!(*arena.node(handle).key(), key);
                        prop_assert_eq!(*arena.node(handle).value(), value);
                    }
                    Operation::SetValue(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        *arena.node_mut(handle).value_mut() = value;
                        model[index].2 = value;
                    }
                    Operation::Free(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let (handle, key, value) = model.swap_remove(index);
                        let freed = arena.free(handle);
                        prop_assert_eq!(*freed.key(), key);
                        prop_assert_eq!(freed.into_value(), value);
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Allocate(u32, u32),
        Get(usize),
        SetValue(usize, u32),
        Free(usize),
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => (any::<u32>(), any::<u32>()).prop_map(|(k, v)| Operation::Allocate(k, v)),
            5 => any::<usize>().prop_map(Operation::Get),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::SetValue(which, value)),
            5 => any::<usize>().prop_map(Operation::Free),
        ]
    }
}
