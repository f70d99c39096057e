//! Category Tree Integration Tests
//!
//! Aggregate counts, path resolution and subtree removal on a tree of books.

use shelf::core::{CategoryTree, TreeError};
use shelf::domain::Book;

fn book(title: &str) -> Book {
    Book::new(title, "Author", "isbn", 2001, 1, 1)
}

/// Every node's aggregate equals its own records plus its children's aggregates
fn assert_aggregates_consistent(tree: &CategoryTree<Book>) {
    let mut pending = vec![tree.root()];
    while let Some(id) = pending.pop() {
        let node = tree.node(id).unwrap();
        let children: usize = node
            .children()
            .iter()
            .map(|&child| tree.aggregate(child).unwrap())
            .sum();
        assert_eq!(
            node.aggregate(),
            node.records().len() + children,
            "aggregate mismatch at {}",
            node.name()
        );
        pending.extend(node.children().iter().copied());
    }
}

#[test]
fn test_filing_under_fresh_path_creates_each_segment_once() {
    let mut tree = CategoryTree::new("Library");
    let leaf = tree.resolve_or_create("A/B/C").unwrap();
    for i in 0..5 {
        tree.file_record(leaf, book(&format!("book-{}", i))).unwrap();
    }

    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.aggregate(tree.root()), Some(5));
    assert_eq!(tree.resolve_or_create("A/B/C").unwrap(), leaf);
    assert_eq!(tree.node_count(), 4);
    assert_aggregates_consistent(&tree);
}

#[test]
fn test_remove_then_find_is_absent() {
    let mut tree = CategoryTree::new("Library");
    let physics = tree.resolve_or_create("Science/Physics").unwrap();
    let science = tree.resolve("Science").unwrap();
    tree.file_record(physics, book("Q")).unwrap();
    tree.file_record(physics, book("R")).unwrap();

    assert!(tree.remove_record(physics, "Q"));
    assert!(tree.find_record(physics, "Q").is_none());
    assert!(tree.find_record_recursive(tree.root(), "Q").is_none());
    assert_eq!(tree.aggregate(physics), Some(1));
    assert_eq!(tree.aggregate(science), Some(1));
    assert_eq!(tree.aggregate(tree.root()), Some(1));
    assert_aggregates_consistent(&tree);
}

#[test]
fn test_remove_subtree_subtracts_from_every_ancestor() {
    let mut tree = CategoryTree::new("Library");
    let deep = tree.resolve_or_create("A/B/C/D").unwrap();
    let b = tree.resolve("A/B").unwrap();
    let a = tree.resolve("A").unwrap();
    tree.file_record(deep, book("1")).unwrap();
    tree.file_record(deep, book("2")).unwrap();
    tree.file_record(b, book("3")).unwrap();
    tree.file_record(a, book("4")).unwrap();

    let removed = tree.remove_child(b, "C").unwrap();
    assert_eq!(removed, 2);
    assert_eq!(tree.aggregate(b), Some(1));
    assert_eq!(tree.aggregate(a), Some(2));
    assert_eq!(tree.aggregate(tree.root()), Some(2));
    assert_eq!(tree.resolve("A/B/C/D"), None);
    assert!(tree.node(deep).is_none());
    assert_aggregates_consistent(&tree);
}

#[test]
fn test_structural_errors_leave_tree_unchanged() {
    let mut tree: CategoryTree<Book> = CategoryTree::new("Library");
    let root = tree.root();
    tree.resolve_or_create("Fiction").unwrap();

    assert!(matches!(
        tree.insert_child(root, "Fiction"),
        Err(TreeError::DuplicateChild { .. })
    ));
    assert!(matches!(
        tree.remove_child(root, "Poetry"),
        Err(TreeError::ChildNotFound { .. })
    ));
    assert_eq!(tree.resolve_or_create(""), Err(TreeError::EmptyPath));
    assert_eq!(tree.node_count(), 2);
}

#[test]
fn test_render_three_children() {
    let mut tree: CategoryTree<Book> = CategoryTree::new("Library");
    tree.resolve_or_create("Arts").unwrap();
    tree.resolve_or_create("History").unwrap();
    tree.resolve_or_create("Science").unwrap();

    let rendered = tree.render();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec!["Library(0)", "├── Arts(0)", "├── History(0)", "└── Science(0)"]
    );
}

#[test]
fn test_list_and_export_agree_with_aggregate() {
    let mut tree = CategoryTree::new("Library");
    let quantum = tree.resolve_or_create("Science/Physics/Quantum").unwrap();
    let science = tree.resolve("Science").unwrap();
    tree.file_record(science, book("Cosmos")).unwrap();
    tree.file_record(quantum, book("QED")).unwrap();

    let listed = tree.list_subtree(science).unwrap();
    assert_eq!(listed.total, 2);
    assert_eq!(listed.records.len(), 2);

    let mut paths = Vec::new();
    let written = tree
        .export_subtree(science, |book, path| -> Result<(), ()> {
            paths.push(format!("{}@{}", book.title, path));
            Ok(())
        })
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(paths, vec!["Cosmos@Science", "QED@Science/Physics/Quantum"]);
}
