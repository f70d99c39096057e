//! Lending Integration Tests
//!
//! Borrow and return flows through the catalog, including category removal.

use shelf::domain::{Book, BookEdit};
use shelf::library::{BorrowOutcome, Catalog, ReturnOutcome};

fn catalog() -> Catalog {
    let mut catalog = Catalog::new("Library");
    catalog
        .add_book("Fiction", Book::new("Dune", "Frank Herbert", "1", 1965, 2, 2))
        .unwrap();
    catalog
        .add_book("Fiction", Book::new("Emma", "Jane Austen", "2", 1815, 1, 1))
        .unwrap();
    catalog
}

#[test]
fn test_copies_track_loans() {
    let mut catalog = catalog();

    assert_eq!(catalog.borrow_book("Dune", "Ada", "1"), Some(BorrowOutcome::Issued));
    assert_eq!(catalog.borrow_book("Dune", "Bob", "2"), Some(BorrowOutcome::Issued));
    assert_eq!(catalog.borrow_book("Dune", "Cy", "3"), Some(BorrowOutcome::Unavailable));
    assert_eq!(catalog.find_book("Dune").unwrap().available_copies, 0);

    assert_eq!(catalog.return_book("Dune", "Bob", "2"), Some(ReturnOutcome::Returned));
    assert_eq!(catalog.return_book("Dune", "Bob", "2"), Some(ReturnOutcome::NotBorrowing));
    assert_eq!(catalog.find_book("Dune").unwrap().available_copies, 1);

    let names: Vec<String> = catalog
        .all_borrowers("Dune")
        .unwrap()
        .iter()
        .map(|b| b.to_string())
        .collect();
    assert_eq!(names, vec!["Ada(1)", "Bob(2)"]);
}

#[test]
fn test_borrower_history_spans_books() {
    let mut catalog = catalog();
    catalog.borrow_book("Dune", "Ada", "1");
    catalog.borrow_book("Emma", "Ada", "1");
    catalog.return_book("Dune", "Ada", "1");

    let ada = catalog.borrower("Ada", "1").unwrap();
    let history: Vec<&String> = ada.history().iter().collect();
    assert_eq!(history, vec!["Dune", "Emma"]);
    assert!(!ada.has_loan("Dune"));
    assert!(ada.has_loan("Emma"));
    assert_eq!(catalog.ledger().len(), 1);
}

#[test]
fn test_removed_book_closes_loans() {
    let mut catalog = catalog();
    catalog.borrow_book("Emma", "Ada", "1");

    assert!(catalog.remove_book("Emma"));
    assert!(catalog.borrower("Ada", "1").unwrap().loans().is_empty());
    assert_eq!(catalog.borrow_book("Emma", "Ada", "1"), None);
}

#[test]
fn test_renamed_book_keeps_borrowers() {
    let mut catalog = catalog();
    catalog.borrow_book("Dune", "Ada", "1");
    catalog
        .edit_book("Dune", BookEdit::Title("Dune (1965)".to_string()))
        .unwrap();

    assert_eq!(catalog.current_borrowers("Dune (1965)").unwrap().len(), 1);
    assert_eq!(
        catalog.return_book("Dune (1965)", "Ada", "1"),
        Some(ReturnOutcome::Returned)
    );
}

#[test]
fn test_removing_one_of_two_same_titled_books() {
    let mut catalog = catalog();
    catalog
        .add_book("SciFi", Book::new("Dune", "Frank Herbert", "3", 1965, 1, 1))
        .unwrap();
    assert_eq!(catalog.borrow_book("Dune", "Ada", "1"), Some(BorrowOutcome::Issued));
    assert_eq!(catalog.book_category("Dune").as_deref(), Some("Fiction"));

    assert!(catalog.remove_book("Dune"));
    assert!(catalog.borrower("Ada", "1").unwrap().loans().is_empty());
    assert_eq!(catalog.book_category("Dune").as_deref(), Some("SciFi"));

    // The surviving copy was never lent to Ada
    assert_eq!(
        catalog.return_book("Dune", "Ada", "1"),
        Some(ReturnOutcome::NotBorrowing)
    );
    assert_eq!(catalog.borrow_book("Dune", "Ada", "1"), Some(BorrowOutcome::Issued));
    assert_eq!(catalog.borrower("Ada", "1").unwrap().loans().len(), 1);
}

#[test]
fn test_renaming_one_of_two_same_titled_books() {
    let mut catalog = catalog();
    catalog
        .add_book("Archive", Book::new("Dune", "Frank Herbert", "3", 1965, 1, 1))
        .unwrap();
    catalog.borrow_book("Dune", "Ada", "1");

    // Fiction's copy moves behind Archive, so Bob gets the archived one
    catalog.move_book("Dune", "Zeta").unwrap();
    assert_eq!(catalog.book_category("Dune").as_deref(), Some("Archive"));
    catalog.borrow_book("Dune", "Bob", "2");

    catalog
        .edit_book("Dune", BookEdit::Title("Dune (Archive)".to_string()))
        .unwrap();

    let ada = catalog.borrower("Ada", "1").unwrap();
    assert!(ada.has_loan("Dune"));
    assert!(!ada.has_loan("Dune (Archive)"));

    let bob = catalog.borrower("Bob", "2").unwrap();
    assert!(bob.has_loan("Dune (Archive)"));
    assert_eq!(bob.history()[0], "Dune (Archive)");

    assert_eq!(
        catalog.return_book("Dune", "Ada", "1"),
        Some(ReturnOutcome::Returned)
    );
    assert_eq!(
        catalog.return_book("Dune (Archive)", "Bob", "2"),
        Some(ReturnOutcome::Returned)
    );
}

#[test]
fn test_removed_category_closes_loans() {
    let mut catalog = catalog();
    catalog
        .add_book("SciFi", Book::new("Dune", "Frank Herbert", "3", 1965, 1, 1))
        .unwrap();
    catalog.borrow_book("Emma", "Ada", "1");
    catalog.borrow_book("Dune", "Ada", "1");

    assert_eq!(catalog.remove_category("Fiction").unwrap(), 2);
    assert!(catalog.borrower("Ada", "1").unwrap().loans().is_empty());
    assert_eq!(catalog.find_book("Dune").unwrap().available_copies, 1);
}
