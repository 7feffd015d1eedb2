//! A randomized, self-balancing ordered map for Rust.
//!
//! This crate provides [`TreapMap`], an ordered map implemented as a treap:
//! a binary search tree ordered by key that is simultaneously heap-ordered
//! by a random priority assigned once when a node is created. Randomly drawn
//! priorities keep the tree at expected O(log n) depth without any explicit
//! rebalancing logic; every mutating operation is composed from the two
//! mutually-inverse primitives *split* and *merge*.
//!
//! # Example
//!
//! ```
//! use treap_map::TreapMap;
//!
//! let mut map = TreapMap::new();
//! map.upsert(3, "three");
//! map.upsert(1, "one");
//! map.upsert(2, "two");
//!
//! // Exact and predecessor-or-equal lookups.
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(map.closest_leq(&9), Some((&3, &"three")));
//!
//! // Iteration is always in ascending key order.
//! let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, [1, 2, 3]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Pluggable comparator** - Keys are ordered by a [`Comparator`] capability,
//!   defaulting to the key type's own [`Ord`] instance
//! - **Pluggable node storage** - Nodes live in a [`NodeAllocator`], defaulting to
//!   an index-based arena with a free list
//! - **Predecessor queries** - [`closest_leq`](TreapMap::closest_leq) in O(log n)
//! - **Range visiting** - half-open `[from, to)` in-order visiting that prunes
//!   subtrees entirely outside the range
//!
//! # Implementation
//!
//! The map stores one node per key/value pair in an arena addressed by compact
//! handles. A node's priority and key are immutable for its lifetime; only the
//! value may be rewritten in place. Split partitions a subtree at a key
//! boundary by re-linking child handles, merge is its exact inverse, and
//! upsert/remove are two or three of these primitives around a local edit.
//! Debug builds re-verify the heap invariant, a statistical depth bound, and
//! in-order key monotonicity after every mutation.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod prng;

pub mod allocator;
pub mod comparator;
pub mod node;
pub mod treap_map;

pub use allocator::{ArenaAllocator, Handle, NodeAllocator};
pub use comparator::{Comparator, OrdComparator};
pub use node::Node;
pub use treap_map::{Iter, TreapMap};
