//! Domain types for the catalog.
//!
//! This module contains:
//! - Book: the cataloged record and its field edits
//! - Borrower: lending patrons and their loans

pub mod book;
pub mod borrower;

// Re-export commonly used types
pub use book::{Book, BookEdit, BookError};
pub use borrower::{Borrower, BorrowerId, Loan};
