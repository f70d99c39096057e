//! Borrower registry and loan bookkeeping.
//!
//! The ledger owns every borrower seen in a session. Books and borrowers
//! refer to each other only through `BorrowerId` handles and titles, so
//! neither side owns the other.

use tracing::debug;

use crate::core::GrowableArray;
use crate::domain::{Book, Borrower, BorrowerId};

/// Result of a borrow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowOutcome {
    /// A copy was issued
    Issued,

    /// The borrower already holds a copy of this book
    AlreadyBorrowing,

    /// No copies left on the shelf
    Unavailable,
}

/// Result of a return request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned,

    /// The borrower holds no copy of this book
    NotBorrowing,
}

/// Every borrower known to the catalog
#[derive(Debug, Default)]
pub struct Ledger {
    borrowers: GrowableArray<Borrower>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.borrowers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.borrowers.is_empty()
    }

    pub fn get(&self, id: BorrowerId) -> Option<&Borrower> {
        self.borrowers.get(id.index()).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Borrower> {
        self.borrowers.iter()
    }

    /// Look up a borrower by identity
    pub fn find(&self, name: &str, id: &str) -> Option<BorrowerId> {
        self.borrowers
            .position(|b| b.matches(name, id))
            .map(BorrowerId::new)
    }

    fn find_or_register(&mut self, name: &str, id: &str) -> BorrowerId {
        if let Some(existing) = self.find(name, id) {
            return existing;
        }
        self.borrowers.push(Borrower::new(name, id));
        debug!(name, id, "Registered borrower");
        BorrowerId::new(self.borrowers.len() - 1)
    }

    /// Issue one copy of `book` to the borrower `(name, id)`
    pub fn borrow(&mut self, book: &mut Book, name: &str, id: &str) -> BorrowOutcome {
        if book.available_copies == 0 {
            return BorrowOutcome::Unavailable;
        }

        if let Some(existing) = self.find(name, id) {
            if book.current_borrowers.contains(&existing) {
                return BorrowOutcome::AlreadyBorrowing;
            }
        }

        let borrower_id = self.find_or_register(name, id);
        if !book.all_borrowers.contains(&borrower_id) {
            book.all_borrowers.push(borrower_id);
        }
        book.current_borrowers.push(borrower_id);
        book.available_copies -= 1;

        if let Ok(borrower) = self.borrowers.get_mut(borrower_id.index()) {
            borrower.open_loan(&book.title);
        }

        debug!(title = %book.title, name, "Issued copy");
        BorrowOutcome::Issued
    }

    /// Take back the copy of `book` held by `(name, id)`
    pub fn return_book(&mut self, book: &mut Book, name: &str, id: &str) -> ReturnOutcome {
        let Some(borrower_id) = self.find(name, id) else {
            return ReturnOutcome::NotBorrowing;
        };
        let Some(position) = book.current_borrowers.position(|&b| b == borrower_id) else {
            return ReturnOutcome::NotBorrowing;
        };

        let _ = book.current_borrowers.remove(position);
        if book.available_copies < book.total_copies {
            book.available_copies += 1;
        }
        if let Ok(borrower) = self.borrowers.get_mut(borrower_id.index()) {
            borrower.close_loan(&book.title);
        }

        debug!(title = %book.title, name, "Returned copy");
        ReturnOutcome::Returned
    }

    /// Close the loans held on a book leaving the catalog, one per holder
    pub fn release(&mut self, book: &Book) {
        for &holder in book.current_borrowers.iter() {
            if let Ok(borrower) = self.borrowers.get_mut(holder.index()) {
                borrower.close_loan(&book.title);
            }
        }
        debug!(title = %book.title, holders = book.current_borrowers.len(), "Released loans");
    }

    /// Follow a title change of `book`, previously titled `old`.
    ///
    /// Only borrowers linked to this book are touched; loans of another book
    /// sharing the old title keep it.
    pub fn rename_title(&mut self, book: &Book, old: &str) {
        for &holder in book.all_borrowers.iter() {
            let holding = book.current_borrowers.contains(&holder);
            if let Ok(borrower) = self.borrowers.get_mut(holder.index()) {
                borrower.rename_title(old, &book.title, holding);
            }
        }
    }
}
