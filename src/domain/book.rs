//! Catalog records.
//!
//! A `Book` is owned by exactly one category node. Its borrower links are
//! non-owning handles into the lending ledger.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::borrower::BorrowerId;
use crate::core::{GrowableArray, Titled};

/// Validation errors for book fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("Number of available copies ({available}) cannot exceed total copies ({total})")]
    CopiesExceedTotal { available: u32, total: u32 },

    #[error("Book title cannot be empty")]
    EmptyTitle,

    #[error("Book {field} cannot contain a line break")]
    LineBreak { field: &'static str },
}

/// A cataloged book
#[derive(Debug, Serialize)]
pub struct Book {
    /// Title (natural key for lookups)
    pub title: String,

    /// Author(s)
    pub author: String,

    /// ISBN
    pub isbn: String,

    /// Year of publication
    pub publication_year: i32,

    /// Copies owned by the library
    pub total_copies: u32,

    /// Copies currently on the shelf
    pub available_copies: u32,

    /// Borrowers currently holding a copy
    #[serde(skip)]
    pub(crate) current_borrowers: GrowableArray<BorrowerId>,

    /// Everyone who has ever borrowed this book
    #[serde(skip)]
    pub(crate) all_borrowers: GrowableArray<BorrowerId>,
}

impl Book {
    /// Create a new book with no borrowers
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        publication_year: i32,
        total_copies: u32,
        available_copies: u32,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            publication_year,
            total_copies,
            available_copies,
            current_borrowers: GrowableArray::new(),
            all_borrowers: GrowableArray::new(),
        }
    }

    /// Check the field invariants expected by the catalog
    pub fn validate(&self) -> Result<(), BookError> {
        if self.title.is_empty() {
            return Err(BookError::EmptyTitle);
        }
        check_single_line("title", &self.title)?;
        check_single_line("author", &self.author)?;
        check_single_line("ISBN", &self.isbn)?;
        check_copies(self.total_copies, self.available_copies)
    }

    pub fn current_borrowers(&self) -> &GrowableArray<BorrowerId> {
        &self.current_borrowers
    }

    pub fn all_borrowers(&self) -> &GrowableArray<BorrowerId> {
        &self.all_borrowers
    }

    /// Apply a single field edit, leaving the book unchanged on error
    pub fn apply(&mut self, edit: &BookEdit) -> Result<(), BookError> {
        match edit {
            BookEdit::Title(title) => {
                if title.is_empty() {
                    return Err(BookError::EmptyTitle);
                }
                check_single_line("title", title)?;
                self.title = title.clone();
            }
            BookEdit::Author(author) => {
                check_single_line("author", author)?;
                self.author = author.clone();
            }
            BookEdit::Isbn(isbn) => {
                check_single_line("ISBN", isbn)?;
                self.isbn = isbn.clone();
            }
            BookEdit::PublicationYear(year) => self.publication_year = *year,
            BookEdit::TotalCopies(total) => {
                check_copies(*total, self.available_copies)?;
                self.total_copies = *total;
            }
            BookEdit::AvailableCopies(available) => {
                check_copies(self.total_copies, *available)?;
                self.available_copies = *available;
            }
        }
        Ok(())
    }
}

fn check_single_line(field: &'static str, value: &str) -> Result<(), BookError> {
    if value.contains(['\n', '\r']) {
        return Err(BookError::LineBreak { field });
    }
    Ok(())
}

fn check_copies(total: u32, available: u32) -> Result<(), BookError> {
    if available > total {
        return Err(BookError::CopiesExceedTotal { available, total });
    }
    Ok(())
}

impl Titled for Book {
    fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Author(s): {}", self.author)?;
        writeln!(f, "ISBN : {}", self.isbn)?;
        writeln!(f, "Year : {}", self.publication_year)?;
        writeln!(f, "Total Copies : {}", self.total_copies)?;
        write!(f, "Available Copies : {}", self.available_copies)
    }
}

/// A single-field change to a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEdit {
    Title(String),
    Author(String),
    Isbn(String),
    PublicationYear(i32),
    TotalCopies(u32),
    AvailableCopies(u32),
}
