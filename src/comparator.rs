//! The total-order capability [`TreapMap`](crate::TreapMap) sorts by.

use core::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// The map is generic over the comparator rather than requiring `K: Ord`, so
/// a single key type can be stored under different orderings, and foreign key
/// types can be ordered without a newtype wrapper. Implementations are
/// expected to be zero-sized: the comparator is never stored or constructed,
/// only named as a type parameter.
///
/// It is a logic error for the order to change while any key is in a map.
///
/// # Example
///
/// ```
/// use core::cmp::Ordering;
/// use treap_map::{Comparator, TreapMap};
///
/// /// Orders integers descending.
/// enum Descending {}
///
/// impl Comparator<i32> for Descending {
///     fn cmp(a: &i32, b: &i32) -> Ordering {
///         b.cmp(a)
///     }
/// }
///
/// let mut map: TreapMap<i32, (), Descending> = TreapMap::with_seed(7);
/// map.upsert(1, ());
/// map.upsert(3, ());
/// map.upsert(2, ());
///
/// let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [3, 2, 1]);
/// ```
pub trait Comparator<K> {
    /// Returns the ordering of `a` relative to `b` under this total order.
    fn cmp(a: &K, b: &K) -> Ordering;
}

/// The default comparator: the key type's own [`Ord`] instance.
///
/// Uninhabited; it exists only as a type argument.
pub enum OrdComparator {}

impl<K: Ord> Comparator<K> for OrdComparator {
    #[inline]
    fn cmp(a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
