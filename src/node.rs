//! The storage unit of a [`TreapMap`](crate::TreapMap).

use crate::allocator::Handle;

/// One stored key/value pair together with its treap bookkeeping.
///
/// The priority is drawn once when the node is created and never changes; the
/// key is likewise immutable while the node is live. Only the value may be
/// rewritten in place (by an upsert of an existing key). Child links are
/// handles into the owning allocator; a node exclusively owns both subtrees.
#[derive(Clone)]
pub struct Node<K, V> {
    priority: u64,
    key: K,
    value: V,
    left: Option<Handle>,
    right: Option<Handle>,
}

impl<K, V> Node<K, V> {
    pub(crate) const fn new(key: K, value: V, priority: u64) -> Self {
        Self {
            priority,
            key,
            value,
            left: None,
            right: None,
        }
    }

    /// The node's key.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// The node's value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// The node's value, mutably.
    #[inline]
    #[must_use]
    pub const fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The node's balancing priority.
    #[inline]
    #[must_use]
    pub const fn priority(&self) -> u64 {
        self.priority
    }

    /// Handle of the left (less-or-equal) subtree.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> Option<Handle> {
        self.left
    }

    /// Handle of the right (strictly greater) subtree.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) const fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) const fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    pub(crate) fn into_value(self) -> V {
        self.value
    }
}
