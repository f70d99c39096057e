//! shelf - Hierarchical library catalog
//!
//! Books are filed under user-defined category paths such as
//! `Science/Physics/Quantum`. Every category keeps a running count of the
//! books in its subtree, and borrowers are tracked per session.
//!
//! # Modules
//!
//! - `core`: Containers (GrowableArray, CategoryTree)
//! - `domain`: Data structures (Book, Borrower)
//! - `library`: Catalog, lending ledger, delimited-text import/export
//! - `config`: Layered configuration
//! - `cli`: Command-line interface and interactive shell
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell
//! shelf
//!
//! # Import a file and show the tree
//! shelf import books.csv
//! shelf list
//!
//! # List a category
//! shelf find-all Science/Physics
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use self::core::{CategoryTree, GrowableArray, NodeId, TreeError};
pub use domain::{Book, BookEdit, Borrower};
pub use library::{Catalog, CatalogError, ImportReport};
