//! The catalog: books filed under a category tree, plus the lending ledger.
//!
//! Every operation addresses categories by slash-delimited path and books by
//! title. The empty path (`""` or `"/"`) means the whole catalog for reads
//! and the root category for filing.

use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use super::interchange::{self, HEADER};
use super::ledger::{BorrowOutcome, Ledger, ReturnOutcome};
use crate::core::{
    split_path, CategoryTree, GrowableArray, NodeId, Subtree, TreeError, SEPARATOR,
};
use crate::domain::{Book, BookEdit, BookError, Borrower};

/// Errors raised by catalog mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Book(#[from] BookError),

    #[error("Book not found in the library: {0}")]
    BookNotFound(String),

    #[error("Category {0} does not exist")]
    CategoryNotFound(String),

    #[error("A book titled {title:?} already exists in category {category:?}")]
    DuplicateTitle { title: String, category: String },
}

/// A line the importer could not use
#[derive(Debug, Clone)]
pub struct SkippedLine {
    /// 1-based line number in the input
    pub line: usize,
    pub reason: String,
}

/// Summary of an import
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,

    /// Rows whose title already existed in their category
    pub duplicates: usize,

    pub malformed: GrowableArray<SkippedLine>,
}

fn is_root_path(path: &str) -> bool {
    path.is_empty() || path.strip_prefix(SEPARATOR) == Some("")
}

/// Books by category, with lending
pub struct Catalog {
    tree: CategoryTree<Book>,
    ledger: Ledger,
}

impl Catalog {
    /// Create an empty catalog; `name` becomes the root category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tree: CategoryTree::new(name),
            ledger: Ledger::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.tree.name()
    }

    pub fn tree(&self) -> &CategoryTree<Book> {
        &self.tree
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Number of books in the whole catalog
    pub fn total_books(&self) -> usize {
        self.tree.aggregate(self.tree.root()).unwrap_or(0)
    }

    fn existing_node(&self, category: &str) -> Option<NodeId> {
        if is_root_path(category) {
            Some(self.tree.root())
        } else {
            self.tree.resolve(category)
        }
    }

    fn target_node(&mut self, category: &str) -> Result<NodeId, TreeError> {
        if is_root_path(category) {
            Ok(self.tree.root())
        } else {
            self.tree.resolve_or_create(category)
        }
    }

    fn check_unique(&self, node: NodeId, title: &str) -> Result<(), CatalogError> {
        if self.tree.find_record(node, title).is_some() {
            return Err(CatalogError::DuplicateTitle {
                title: title.to_string(),
                category: self.tree.category_path(node).unwrap_or_default(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Books
    // ========================================================================

    /// File a new book under `category`, creating the category if needed
    pub fn add_book(&mut self, category: &str, book: Book) -> Result<NodeId, CatalogError> {
        book.validate()?;
        if !is_root_path(category) {
            split_path(category)?;
        }
        if let Some(existing) = self.existing_node(category) {
            self.check_unique(existing, &book.title)?;
        }

        let node = self.target_node(category)?;
        debug!(title = %book.title, category, "Filing book");
        self.tree.file_record(node, book)?;
        Ok(node)
    }

    /// First book titled `title` anywhere in the catalog
    pub fn find_book(&self, title: &str) -> Option<&Book> {
        self.tree.find_record_recursive(self.tree.root(), title)
    }

    /// Category path of the first book titled `title`
    pub fn book_category(&self, title: &str) -> Option<String> {
        let node = self.tree.locate_record(self.tree.root(), title)?;
        self.tree.category_path(node)
    }

    /// Every book under `category`, `None` if the category does not exist
    pub fn find_all(&self, category: &str) -> Option<Subtree<'_, Book>> {
        let node = self.existing_node(category)?;
        self.tree.list_subtree(node)
    }

    /// Change one field of the book titled `title`
    pub fn edit_book(&mut self, title: &str, edit: BookEdit) -> Result<(), CatalogError> {
        let root = self.tree.root();
        let node = self
            .tree
            .locate_record(root, title)
            .ok_or_else(|| CatalogError::BookNotFound(title.to_string()))?;

        if let BookEdit::Title(new_title) = &edit {
            if new_title != title {
                self.check_unique(node, new_title)?;
            }
        }

        let book = self
            .tree
            .find_record_mut(node, title)
            .ok_or_else(|| CatalogError::BookNotFound(title.to_string()))?;
        book.apply(&edit)?;

        if let BookEdit::Title(_) = &edit {
            self.ledger.rename_title(book, title);
        }
        Ok(())
    }

    /// Re-file the book titled `title` under `category`
    pub fn move_book(&mut self, title: &str, category: &str) -> Result<NodeId, CatalogError> {
        let root = self.tree.root();
        let source = self
            .tree
            .locate_record(root, title)
            .ok_or_else(|| CatalogError::BookNotFound(title.to_string()))?;

        if !is_root_path(category) {
            split_path(category)?;
        }
        if let Some(existing) = self.existing_node(category) {
            if existing == source {
                return Ok(source);
            }
            self.check_unique(existing, title)?;
        }

        let target = self.target_node(category)?;
        let book = self
            .tree
            .take_record(source, title)
            .ok_or_else(|| CatalogError::BookNotFound(title.to_string()))?;
        self.tree.file_record(target, book)?;

        debug!(title, category, "Moved book");
        Ok(target)
    }

    /// Remove the first book titled `title`, closing the loans held on it
    pub fn remove_book(&mut self, title: &str) -> bool {
        let root = self.tree.root();
        let Some(node) = self.tree.locate_record(root, title) else {
            return false;
        };
        let Some(book) = self.tree.take_record(node, title) else {
            return false;
        };
        self.ledger.release(&book);
        debug!(title, "Removed book");
        true
    }

    // ========================================================================
    // Lending
    // ========================================================================

    /// Lend a copy; `None` if no book has this title
    pub fn borrow_book(&mut self, title: &str, name: &str, id: &str) -> Option<BorrowOutcome> {
        let root = self.tree.root();
        let book = self.tree.find_record_recursive_mut(root, title)?;
        Some(self.ledger.borrow(book, name, id))
    }

    /// Take a copy back; `None` if no book has this title
    pub fn return_book(&mut self, title: &str, name: &str, id: &str) -> Option<ReturnOutcome> {
        let root = self.tree.root();
        let book = self.tree.find_record_recursive_mut(root, title)?;
        Some(self.ledger.return_book(book, name, id))
    }

    /// Borrowers holding a copy of `title` right now
    pub fn current_borrowers(&self, title: &str) -> Option<GrowableArray<&Borrower>> {
        let book = self.find_book(title)?;
        Some(
            book.current_borrowers()
                .iter()
                .filter_map(|&id| self.ledger.get(id))
                .collect(),
        )
    }

    /// Everyone who ever borrowed `title`
    pub fn all_borrowers(&self, title: &str) -> Option<GrowableArray<&Borrower>> {
        let book = self.find_book(title)?;
        Some(
            book.all_borrowers()
                .iter()
                .filter_map(|&id| self.ledger.get(id))
                .collect(),
        )
    }

    pub fn borrower(&self, name: &str, id: &str) -> Option<&Borrower> {
        self.ledger.find(name, id).and_then(|b| self.ledger.get(b))
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub fn add_category(&mut self, path: &str) -> Result<NodeId, CatalogError> {
        Ok(self.tree.resolve_or_create(path)?)
    }

    pub fn find_category(&self, path: &str) -> bool {
        self.tree.resolve(path).is_some()
    }

    /// Remove a category with all its books. Returns the number of books removed.
    pub fn remove_category(&mut self, path: &str) -> Result<usize, CatalogError> {
        split_path(path)?;
        let node = self
            .tree
            .resolve(path)
            .ok_or_else(|| CatalogError::CategoryNotFound(path.to_string()))?;
        let parent = self.tree.parent(node).ok_or(TreeError::StaleNode)?;
        let name = self
            .tree
            .node(node)
            .map(|n| n.name().to_string())
            .ok_or(TreeError::StaleNode)?;

        if let Some(subtree) = self.tree.list_subtree(node) {
            for book in subtree.records.iter() {
                self.ledger.release(book);
            }
        }

        Ok(self.tree.remove_child(parent, &name)?)
    }

    /// Rename the last segment of `path`
    pub fn rename_category(&mut self, path: &str, new_name: &str) -> Result<(), CatalogError> {
        split_path(path)?;
        let node = self
            .tree
            .resolve(path)
            .ok_or_else(|| CatalogError::CategoryNotFound(path.to_string()))?;
        let parent = self.tree.parent(node).ok_or(TreeError::StaleNode)?;
        let old = self
            .tree
            .node(node)
            .map(|n| n.name().to_string())
            .ok_or(TreeError::StaleNode)?;

        self.tree.rename_child(parent, &old, new_name)?;
        Ok(())
    }

    pub fn render(&self) -> String {
        self.tree.render()
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Import books from delimited text. The first line is a header.
    pub fn import_str(&mut self, text: &str) -> ImportReport {
        let mut report = ImportReport::default();

        for (index, line) in text.lines().enumerate().skip(1) {
            let number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let row = match interchange::parse_line(line) {
                Ok(row) => row,
                Err(e) => {
                    warn!(line = number, error = %e, "Skipping malformed line");
                    report.malformed.push(SkippedLine {
                        line: number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.add_book(&row.category, row.book) {
                Ok(_) => report.imported += 1,
                Err(CatalogError::DuplicateTitle { title, category }) => {
                    debug!(line = number, title, category, "Skipping duplicate title");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(line = number, error = %e, "Skipping unusable line");
                    report.malformed.push(SkippedLine {
                        line: number,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Render the whole catalog as delimited text, header included
    pub fn export_string(&self) -> String {
        self.export_rows().0
    }

    /// Exported text and the number of rows written to it
    fn export_rows(&self) -> (String, usize) {
        let mut out = String::from(HEADER);
        out.push('\n');
        let written = self
            .tree
            .export_subtree(self.tree.root(), |book, category| -> Result<(), Infallible> {
                out.push_str(&interchange::format_row(book, category));
                out.push('\n');
                Ok(())
            });
        let written = match written {
            Ok(count) => count,
            Err(never) => match never {},
        };
        (out, written)
    }

    /// Import books from a file
    #[instrument(skip(self))]
    pub async fn import_file(&mut self, path: &Path) -> Result<ImportReport> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

        let report = self.import_str(&text);
        info!(
            imported = report.imported,
            duplicates = report.duplicates,
            malformed = report.malformed.len(),
            "Imported catalog"
        );
        Ok(report)
    }

    /// Export the whole catalog to a file. Returns the number of books written.
    #[instrument(skip(self))]
    pub async fn export_file(&self, path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let (text, written) = self.export_rows();
        fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write catalog file: {}", path.display()))?;

        info!(books = written, "Exported catalog");
        Ok(written)
    }
}
