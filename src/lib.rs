//! Arena-backed AVL trees for Rust.
//!
//! This crate provides [`AvlTree`], an ordered set, and [`AvlMap`], an ordered map, both kept
//! height-balanced by the AVL rules and ordered by a comparator chosen when the collection is
//! built:
//!
//! - [`insert`](AvlTree::insert) - O(log n), at most one rotation, duplicates rejected
//! - [`erase`](AvlTree::erase) - O(log n), successor spliced in when the node has two children
//! - [`interval`](AvlTree::interval) - predecessor, match and successor in a single descent
//! - [`cursor`](AvlTree::cursor) - a bidirectional position that steps in amortized O(1)
//!
//! # Example
//!
//! ```
//! use avl_arena::AvlTree;
//!
//! let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| a.cmp(b));
//! for key in [40, 20, 60, 10, 30, 45, 70, 42] {
//!     tree.insert(key);
//! }
//!
//! // Removing the root moves its successor (42) into its place.
//! let successor = tree.find_id(&42).unwrap();
//! assert_eq!(tree.erase(&40), Some(40));
//! assert_eq!(tree.root().unwrap().id(), successor);
//!
//! // Walk forward from 30 to the end.
//! let mut cursor = tree.cursor(&30);
//! let mut rest = Vec::new();
//! while let Some(&key) = cursor.get() {
//!     rest.push(key);
//!     cursor.move_next();
//! }
//! assert_eq!(rest, [30, 42, 45, 60, 70]);
//!
//! assert_eq!(tree.audit(), Ok(tree.height()));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Stable node ids** - Nodes live in an arena and keep their [`NodeId`] across rotations
//! - **Pluggable ordering** - Any `Fn(&T, &T) -> Ordering` is a [`Comparator`]
//! - **`tracing`** - Optional feature emitting trace events for rotations and rebalancing
//!
//! # Implementation
//!
//! Every node stores its two child links and a balance factor in `-1..=1`. Insertion remembers
//! the deepest unbalanced ancestor on the way down and repairs only that subtree. Removal records
//! the whole path and retraces it bottom-up until a subtree's height stops changing. Cursors hold
//! the stack of ancestors, so nodes need no parent links.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod audit;
mod comparator;
mod cursor;
mod node_ref;
mod raw;

pub mod avl_map;
pub mod avl_tree;

pub use audit::AuditError;
pub use avl_map::AvlMap;
pub use avl_tree::{AvlTree, Cursor};
pub use comparator::{Comparator, NaturalOrder};
pub use node_ref::{NodeId, NodeRef};
