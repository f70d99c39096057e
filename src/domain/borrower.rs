//! Borrowers and their loans.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::GrowableArray;

/// Handle to a borrower registered in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BorrowerId(usize);

impl BorrowerId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// An open loan of one copy
#[derive(Debug, Clone, Serialize)]
pub struct Loan {
    /// Title of the borrowed book
    pub title: String,

    /// When the copy was issued
    pub borrowed_at: DateTime<Utc>,
}

/// A library patron, identified by the `(name, id)` pair
#[derive(Debug, Clone, Serialize)]
pub struct Borrower {
    pub name: String,
    pub id: String,

    /// Copies currently held
    loans: GrowableArray<Loan>,

    /// Every title ever borrowed, in first-borrow order
    history: GrowableArray<String>,
}

impl Borrower {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            loans: GrowableArray::new(),
            history: GrowableArray::new(),
        }
    }

    pub fn matches(&self, name: &str, id: &str) -> bool {
        self.name == name && self.id == id
    }

    pub fn loans(&self) -> &GrowableArray<Loan> {
        &self.loans
    }

    pub fn history(&self) -> &GrowableArray<String> {
        &self.history
    }

    pub fn has_loan(&self, title: &str) -> bool {
        self.loans.iter().any(|loan| loan.title == title)
    }

    pub(crate) fn open_loan(&mut self, title: &str) {
        self.loans.push(Loan {
            title: title.to_string(),
            borrowed_at: Utc::now(),
        });
        if !self.history.iter().any(|t| t == title) {
            self.history.push(title.to_string());
        }
    }

    pub(crate) fn close_loan(&mut self, title: &str) -> Option<Loan> {
        let position = self.loans.position(|loan| loan.title == title)?;
        self.loans.remove(position).ok()
    }

    /// Follow a book's title change. `holding` renames one open loan too.
    pub(crate) fn rename_title(&mut self, old: &str, new: &str, holding: bool) {
        if holding {
            if let Some(loan) = self.loans.iter_mut().find(|loan| loan.title == old) {
                loan.title = new.to_string();
            }
        }
        if self.history.iter().any(|t| t == new) {
            return;
        }
        if let Some(title) = self.history.iter_mut().find(|t| t.as_str() == old) {
            *title = new.to_string();
        }
    }
}

impl fmt::Display for Borrower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}
