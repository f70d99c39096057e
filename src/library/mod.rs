//! The catalog and its collaborators.
//!
//! # Data File
//!
//! ```text
//! ~/.shelf/
//! ├── config.yaml       # Optional settings (also searched as ./.shelf/config.yaml)
//! └── catalog.csv       # Books, one per line, with their category path
//! ```
//!
//! Borrowers live only in memory for the length of a session.

pub mod catalog;
pub mod interchange;
pub mod ledger;

pub use catalog::{Catalog, CatalogError, ImportReport, SkippedLine};
pub use interchange::{BookRow, MalformedLine};
pub use ledger::{BorrowOutcome, Ledger, ReturnOutcome};
