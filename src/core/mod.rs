//! Core containers.
//!
//! This module contains:
//! - GrowableArray: the collection type used throughout the crate
//! - CategoryTree: hierarchical category index with aggregate counts

pub mod growable;
pub mod tree;

// Re-export commonly used types
pub use growable::{ArrayError, GrowableArray};
pub use tree::{
    split_path, CategoryNode, CategoryTree, NodeId, Subtree, Titled, TreeError, SEPARATOR,
};
