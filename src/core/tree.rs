//! Hierarchical category index.
//!
//! A `CategoryTree` is a literal reflection of user-chosen category paths
//! such as `Science/Physics/Quantum`. Records are filed at any node (leaf or
//! interior) and every node caches the number of records in its subtree:
//!
//! ```text
//! aggregate(node) == records(node).len() + sum(aggregate(child))
//! ```
//!
//! The invariant is repaired synchronously by walking the parent chain on
//! every insert and removal.
//!
//! Nodes live in an arena of slots addressed by [`NodeId`] handles. A handle
//! carries the generation of its slot, so a handle into a removed subtree
//! resolves to nothing even after the slot has been recycled.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::growable::{ArrayError, GrowableArray};

/// Path segment separator
pub const SEPARATOR: char = '/';

/// Anything the tree can file: records are keyed by title
pub trait Titled {
    fn title(&self) -> &str;
}

/// Handle to a node in a `CategoryTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Structural errors raised by tree mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Child with name {name} already exists in {parent}")]
    DuplicateChild { parent: String, name: String },

    #[error("Child with name {name} not found in {parent}")]
    ChildNotFound { parent: String, name: String },

    #[error("Category path is empty")]
    EmptyPath,

    #[error("Invalid category segment in path: {path:?}")]
    EmptySegment { path: String },

    #[error("Category name {name:?} contains a line break")]
    LineBreak { name: String },

    #[error("Category no longer exists")]
    StaleNode,

    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// One taxonomy segment
#[derive(Debug)]
pub struct CategoryNode<R> {
    name: String,
    parent: Option<NodeId>,
    children: GrowableArray<NodeId>,
    records: GrowableArray<R>,
    aggregate: usize,
}

impl<R> CategoryNode<R> {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: GrowableArray::new(),
            records: GrowableArray::new(),
            aggregate: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent handle (`None` for the root)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in insertion order
    pub fn children(&self) -> &GrowableArray<NodeId> {
        &self.children
    }

    /// Records filed directly at this node
    pub fn records(&self) -> &GrowableArray<R> {
        &self.records
    }

    /// Records in this node's whole subtree
    pub fn aggregate(&self) -> usize {
        self.aggregate
    }
}

/// Flattened view of a subtree
#[derive(Debug)]
pub struct Subtree<'a, R> {
    /// Records in depth-first pre-order
    pub records: GrowableArray<&'a R>,

    /// Aggregate count of the subtree root
    pub total: usize,
}

struct Slot<R> {
    generation: u32,
    node: Option<CategoryNode<R>>,
}

/// Rooted category index over records of type `R`
pub struct CategoryTree<R> {
    slots: GrowableArray<Slot<R>>,
    free: GrowableArray<usize>,
    root: NodeId,
}

/// Split a category path into segments.
///
/// One leading and one trailing separator are ignored. The empty path is
/// rejected: the root is never addressed by a path.
pub fn split_path(path: &str) -> Result<GrowableArray<&str>, TreeError> {
    let trimmed = path.strip_prefix(SEPARATOR).unwrap_or(path);
    let trimmed = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(TreeError::EmptyPath);
    }

    let mut segments = GrowableArray::new();
    for segment in trimmed.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(TreeError::EmptySegment {
                path: path.to_string(),
            });
        }
        check_line_breaks(segment)?;
        segments.push(segment);
    }
    Ok(segments)
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(TreeError::EmptySegment {
            path: name.to_string(),
        });
    }
    check_line_breaks(name)
}

/// Names are written one record per line, so they cannot span lines
fn check_line_breaks(name: &str) -> Result<(), TreeError> {
    if name.contains(['\n', '\r']) {
        return Err(TreeError::LineBreak {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl<R: Titled> CategoryTree<R> {
    /// Create a tree whose root carries the catalog name
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut slots = GrowableArray::new();
        slots.push(Slot {
            generation: 0,
            node: Some(CategoryNode::new(root_name, None)),
        });

        Self {
            slots,
            free: GrowableArray::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Catalog name (the root's name)
    pub fn name(&self) -> &str {
        self.node(self.root).map(CategoryNode::name).unwrap_or_default()
    }

    /// Look up a live node
    pub fn node(&self, id: NodeId) -> Option<&CategoryNode<R>> {
        let slot = self.slots.get(id.index).ok()?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut CategoryNode<R>> {
        let slot = self.slots.get_mut(id.index).ok()?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn aggregate(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(CategoryNode::aggregate)
    }

    /// Child handles in insertion order
    pub fn children(&self, id: NodeId) -> Option<&GrowableArray<NodeId>> {
        self.node(id).map(CategoryNode::children)
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Find a direct child by name (linear scan)
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).is_some_and(|n| n.name == name))
    }

    /// Whether `id` is the last entry in its parent's child list
    pub fn is_last_child(&self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        self.node(parent)
            .and_then(|p| p.children.back().ok())
            .is_some_and(|&last| last == id)
    }

    /// Slash-joined names from the root's child down to `id`.
    ///
    /// The root itself has the empty path.
    pub fn category_path(&self, id: NodeId) -> Option<String> {
        let mut names = GrowableArray::new();
        let mut cursor = self.node(id)?;
        while let Some(parent) = cursor.parent {
            names.push(cursor.name.as_str());
            cursor = self.node(parent)?;
        }

        let mut path = String::new();
        for name in names.iter().rev() {
            if !path.is_empty() {
                path.push(SEPARATOR);
            }
            path.push_str(name);
        }
        Some(path)
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    /// Resolve a path without creating anything
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        let segments = split_path(path).ok()?;
        let mut current = self.root;
        for segment in segments.iter() {
            current = self.child(current, segment)?;
        }
        Some(current)
    }

    /// Resolve a path, creating missing segments on the way down
    pub fn resolve_or_create(&mut self, path: &str) -> Result<NodeId, TreeError> {
        let segments = split_path(path)?;
        let mut current = self.root;
        for segment in segments.iter() {
            current = match self.child(current, segment) {
                Some(existing) => existing,
                None => self.insert_child(current, segment)?,
            };
        }
        Ok(current)
    }

    // ========================================================================
    // Node mutation
    // ========================================================================

    fn alloc(&mut self, node: CategoryNode<R>) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Ok(slot) = self.slots.get_mut(index) {
                slot.node = Some(node);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }

        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Release a subtree's slots, dropping every node and record in it
    fn release(&mut self, id: NodeId) {
        let mut pending = GrowableArray::new();
        pending.push(id);

        while let Some(next) = pending.pop() {
            let Ok(slot) = self.slots.get_mut(next.index) else {
                continue;
            };
            if slot.generation != next.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                pending.extend(node.children);
                self.free.push(next.index);
            }
        }
    }

    /// Add `delta` to `start` and every ancestor
    fn credit_chain(&mut self, start: NodeId, delta: usize) {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let Some(node) = self.node_mut(id) else { break };
            node.aggregate += delta;
            cursor = node.parent;
        }
    }

    /// Subtract `delta` from `start` and every ancestor
    fn debit_chain(&mut self, start: NodeId, delta: usize) {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let Some(node) = self.node_mut(id) else { break };
            debug_assert!(node.aggregate >= delta, "aggregate underflow");
            node.aggregate -= delta;
            cursor = node.parent;
        }
    }

    /// Create a new child named `name` under `parent`
    pub fn insert_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        validate_name(name)?;
        let parent_node = self.node(parent).ok_or(TreeError::StaleNode)?;
        if self.child(parent, name).is_some() {
            return Err(TreeError::DuplicateChild {
                parent: parent_node.name.clone(),
                name: name.to_string(),
            });
        }

        let id = self.alloc(CategoryNode::new(name, Some(parent)));
        self.node_mut(parent)
            .ok_or(TreeError::StaleNode)?
            .children
            .push(id);

        debug!(category = name, "Created category node");
        Ok(id)
    }

    /// Remove the child `name` of `parent` and its whole subtree.
    ///
    /// Returns the number of records discarded with the subtree.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Result<usize, TreeError> {
        let parent_node = self.node(parent).ok_or(TreeError::StaleNode)?;
        let position = parent_node
            .children
            .position(|&c| self.node(c).is_some_and(|n| n.name == name))
            .ok_or_else(|| TreeError::ChildNotFound {
                parent: parent_node.name.clone(),
                name: name.to_string(),
            })?;

        let child = parent_node.children[position];
        let removed = self.aggregate(child).unwrap_or(0);

        self.node_mut(parent)
            .ok_or(TreeError::StaleNode)?
            .children
            .remove(position)?;
        self.debit_chain(parent, removed);
        self.release(child);

        debug!(category = name, records = removed, "Removed category subtree");
        Ok(removed)
    }

    /// Rename the child `old` of `parent`
    pub fn rename_child(
        &mut self,
        parent: NodeId,
        old: &str,
        new: &str,
    ) -> Result<NodeId, TreeError> {
        validate_name(new)?;
        let parent_name = self.node(parent).ok_or(TreeError::StaleNode)?.name.clone();
        let child = self
            .child(parent, old)
            .ok_or_else(|| TreeError::ChildNotFound {
                parent: parent_name.clone(),
                name: old.to_string(),
            })?;

        if old != new && self.child(parent, new).is_some() {
            return Err(TreeError::DuplicateChild {
                parent: parent_name,
                name: new.to_string(),
            });
        }

        if let Some(node) = self.node_mut(child) {
            node.name = new.to_string();
        }
        Ok(child)
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// File a record at `node`.
    ///
    /// Duplicate titles are not rejected here.
    pub fn file_record(&mut self, node: NodeId, record: R) -> Result<(), TreeError> {
        self.node_mut(node)
            .ok_or(TreeError::StaleNode)?
            .records
            .push(record);
        self.credit_chain(node, 1);
        Ok(())
    }

    /// Detach the first record titled `title` filed directly at `node`
    pub fn take_record(&mut self, node: NodeId, title: &str) -> Option<R> {
        let target = self.node_mut(node)?;
        let position = target.records.position(|r| r.title() == title)?;
        let record = target.records.remove(position).ok()?;
        self.debit_chain(node, 1);
        Some(record)
    }

    /// Remove the first record titled `title` filed directly at `node`
    pub fn remove_record(&mut self, node: NodeId, title: &str) -> bool {
        self.take_record(node, title).is_some()
    }

    /// Find a record filed directly at `node`
    pub fn find_record(&self, node: NodeId, title: &str) -> Option<&R> {
        self.node(node)?.records.iter().find(|r| r.title() == title)
    }

    pub fn find_record_mut(&mut self, node: NodeId, title: &str) -> Option<&mut R> {
        self.node_mut(node)?
            .records
            .iter_mut()
            .find(|r| r.title() == title)
    }

    /// Node holding the first record titled `title` in `start`'s subtree.
    ///
    /// Search order: the node's own records, then each child's subtree in
    /// insertion order.
    pub fn locate_record(&self, start: NodeId, title: &str) -> Option<NodeId> {
        let node = self.node(start)?;
        if node.records.iter().any(|r| r.title() == title) {
            return Some(start);
        }
        node.children
            .iter()
            .find_map(|&child| self.locate_record(child, title))
    }

    pub fn find_record_recursive(&self, start: NodeId, title: &str) -> Option<&R> {
        let node = self.locate_record(start, title)?;
        self.find_record(node, title)
    }

    pub fn find_record_recursive_mut(&mut self, start: NodeId, title: &str) -> Option<&mut R> {
        let node = self.locate_record(start, title)?;
        self.find_record_mut(node, title)
    }

    /// Remove the first record titled `title` anywhere under `start`
    pub fn remove_record_recursive(&mut self, start: NodeId, title: &str) -> bool {
        match self.locate_record(start, title) {
            Some(node) => self.remove_record(node, title),
            None => false,
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first pre-order walk; the first visitor error stops the walk
    fn try_walk<'a, E, F>(&'a self, id: NodeId, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(NodeId, &'a CategoryNode<R>) -> Result<(), E>,
    {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        visit(id, node)?;
        for &child in node.children.iter() {
            self.try_walk(child, visit)?;
        }
        Ok(())
    }

    /// Every record under `node` in pre-order, with the subtree's aggregate
    pub fn list_subtree(&self, node: NodeId) -> Option<Subtree<'_, R>> {
        let total = self.aggregate(node)?;
        let mut records = GrowableArray::new();
        let _ = self.try_walk(node, &mut |_, n| -> Result<(), std::convert::Infallible> {
            records.extend(n.records.iter());
            Ok(())
        });
        Some(Subtree { records, total })
    }

    /// Hand every record under `node` to `sink` together with its category
    /// path. Returns the number of records written.
    pub fn export_subtree<E, F>(&self, node: NodeId, mut sink: F) -> Result<usize, E>
    where
        F: FnMut(&R, &str) -> Result<(), E>,
    {
        let mut written = 0;
        self.try_walk::<E, _>(node, &mut |id, n| {
            let path = self.category_path(id).unwrap_or_default();
            for record in n.records.iter() {
                sink(record, &path)?;
                written += 1;
            }
            Ok(())
        })?;
        Ok(written)
    }

    /// ASCII rendering of the whole tree
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        padding: &str,
        marker: &str,
    ) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        writeln!(f, "{}{}{}({})", padding, marker, node.name, node.aggregate)?;

        let padding = if self.is_root(id) {
            padding.to_string()
        } else if self.is_last_child(id) {
            format!("{}    ", padding)
        } else {
            format!("{}│   ", padding)
        };

        for &child in node.children.iter() {
            let marker = if self.is_last_child(child) { "└── " } else { "├── " };
            self.fmt_node(f, child, &padding, marker)?;
        }
        Ok(())
    }
}

impl<R: Titled> fmt::Display for CategoryTree<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root, "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str);

    impl Titled for Item {
        fn title(&self) -> &str {
            self.0
        }
    }

    fn tree() -> CategoryTree<Item> {
        CategoryTree::new("Library")
    }

    #[test]
    fn test_split_path() {
        let segments = split_path("/Science/Physics/").unwrap();
        assert_eq!(segments.iter().copied().collect::<Vec<_>>(), vec!["Science", "Physics"]);

        assert_eq!(split_path(""), Err(TreeError::EmptyPath));
        assert_eq!(split_path("/"), Err(TreeError::EmptyPath));
        assert!(matches!(split_path("A//B"), Err(TreeError::EmptySegment { .. })));
    }

    #[test]
    fn test_empty_path_never_reaches_root() {
        let mut tree = tree();
        assert_eq!(tree.resolve(""), None);
        assert_eq!(tree.resolve("/"), None);
        assert_eq!(tree.resolve_or_create(""), Err(TreeError::EmptyPath));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_resolve_or_create_is_idempotent() {
        let mut tree = tree();
        let created = tree.resolve_or_create("A/B/C").unwrap();
        assert_eq!(tree.node_count(), 4);

        let again = tree.resolve_or_create("/A/B/C").unwrap();
        assert_eq!(created, again);
        assert_eq!(tree.resolve("A/B/C"), Some(created));
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.category_path(created).as_deref(), Some("A/B/C"));
    }

    #[test]
    fn test_resolve_missing_creates_nothing() {
        let mut tree = tree();
        tree.resolve_or_create("A").unwrap();
        assert_eq!(tree.resolve("A/B"), None);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_insert_duplicate_child() {
        let mut tree = tree();
        let root = tree.root();
        tree.insert_child(root, "Fiction").unwrap();

        let result = tree.insert_child(root, "Fiction");
        assert!(matches!(result, Err(TreeError::DuplicateChild { .. })));
        assert_eq!(tree.node(root).unwrap().children().len(), 1);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = tree();
        let root = tree.root();
        let b = tree.insert_child(root, "B").unwrap();
        let a = tree.insert_child(root, "A").unwrap();

        let children = tree.children(root).unwrap();
        assert_eq!(children.iter().copied().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(tree.parent(a), Some(root));
        assert!(tree.children(a).unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_child() {
        let mut tree = tree();
        let root = tree.root();
        let result = tree.remove_child(root, "Nope");
        assert_eq!(
            result,
            Err(TreeError::ChildNotFound {
                parent: "Library".to_string(),
                name: "Nope".to_string()
            })
        );
    }

    #[test]
    fn test_file_and_remove_record_repairs_aggregates() {
        let mut tree = tree();
        let physics = tree.resolve_or_create("Science/Physics").unwrap();
        let science = tree.resolve("Science").unwrap();
        let root = tree.root();

        tree.file_record(physics, Item("Q")).unwrap();
        tree.file_record(science, Item("Overview")).unwrap();
        assert_eq!(tree.aggregate(root), Some(2));
        assert_eq!(tree.aggregate(science), Some(2));
        assert_eq!(tree.aggregate(physics), Some(1));

        assert!(tree.remove_record_recursive(root, "Q"));
        assert_eq!(tree.aggregate(root), Some(1));
        assert_eq!(tree.aggregate(science), Some(1));
        assert_eq!(tree.aggregate(physics), Some(0));
        assert!(tree.find_record_recursive(root, "Q").is_none());

        assert!(!tree.remove_record(physics, "Q"));
    }

    #[test]
    fn test_recursive_search_order() {
        let mut tree = tree();
        let a = tree.resolve_or_create("A").unwrap();
        let a1 = tree.resolve_or_create("A/1").unwrap();
        let b = tree.resolve_or_create("B").unwrap();

        tree.file_record(b, Item("dup")).unwrap();
        tree.file_record(a1, Item("dup")).unwrap();
        tree.file_record(a, Item("own")).unwrap();

        // A's subtree is searched before B
        assert_eq!(tree.locate_record(tree.root(), "dup"), Some(a1));
        assert_eq!(tree.locate_record(a, "own"), Some(a));

        assert!(tree.remove_record_recursive(tree.root(), "dup"));
        assert_eq!(tree.locate_record(tree.root(), "dup"), Some(b));
    }

    #[test]
    fn test_remove_child_subtracts_subtree() {
        let mut tree = tree();
        let c = tree.resolve_or_create("A/B/C").unwrap();
        let b = tree.resolve("A/B").unwrap();
        let a = tree.resolve("A").unwrap();
        let other = tree.resolve_or_create("Other").unwrap();

        tree.file_record(c, Item("1")).unwrap();
        tree.file_record(c, Item("2")).unwrap();
        tree.file_record(b, Item("3")).unwrap();
        tree.file_record(other, Item("4")).unwrap();
        assert_eq!(tree.aggregate(tree.root()), Some(4));

        let removed = tree.remove_child(a, "B").unwrap();
        assert_eq!(removed, 3);
        assert_eq!(tree.aggregate(a), Some(0));
        assert_eq!(tree.aggregate(tree.root()), Some(1));
        assert_eq!(tree.resolve("A/B"), None);
        assert_eq!(tree.resolve("A/B/C"), None);
        assert!(!tree.contains(b));
        assert!(!tree.contains(c));
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut tree = tree();
        let old = tree.resolve_or_create("Old").unwrap();
        tree.remove_child(tree.root(), "Old").unwrap();

        let new = tree.resolve_or_create("New").unwrap();
        assert_ne!(old, new);
        assert!(tree.node(old).is_none());
        assert_eq!(tree.file_record(old, Item("x")), Err(TreeError::StaleNode));
        assert_eq!(tree.aggregate(tree.root()), Some(0));
    }

    #[test]
    fn test_rename_child() {
        let mut tree = tree();
        let root = tree.root();
        let fiction = tree.resolve_or_create("Fiction/Classics").unwrap();
        tree.resolve_or_create("Poetry").unwrap();

        let renamed = tree.rename_child(root, "Fiction", "Novels").unwrap();
        assert_eq!(tree.resolve("Novels/Classics"), Some(fiction));
        assert_eq!(tree.resolve("Novels"), Some(renamed));

        let clash = tree.rename_child(root, "Novels", "Poetry");
        assert!(matches!(clash, Err(TreeError::DuplicateChild { .. })));
    }

    #[test]
    fn test_list_subtree_matches_aggregate() {
        let mut tree = tree();
        let x = tree.resolve_or_create("X").unwrap();
        let y = tree.resolve_or_create("X/Y").unwrap();
        let z = tree.resolve_or_create("X/Z").unwrap();
        tree.file_record(z, Item("z1")).unwrap();
        tree.file_record(y, Item("y1")).unwrap();
        tree.file_record(x, Item("x1")).unwrap();
        tree.file_record(y, Item("y2")).unwrap();

        let subtree = tree.list_subtree(x).unwrap();
        let titles: Vec<_> = subtree.records.iter().map(|r| r.0).collect();
        assert_eq!(titles, vec!["x1", "y1", "y2", "z1"]);
        assert_eq!(subtree.total, subtree.records.len());
    }

    #[test]
    fn test_export_subtree_paths() {
        let mut tree = tree();
        let root = tree.root();
        let quantum = tree.resolve_or_create("Science/Physics/Quantum").unwrap();
        tree.file_record(quantum, Item("q")).unwrap();
        tree.file_record(root, Item("loose")).unwrap();

        let mut rows = Vec::new();
        let written = tree
            .export_subtree(root, |item, path| -> Result<(), ()> {
                rows.push((item.0, path.to_string()));
                Ok(())
            })
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            rows,
            vec![
                ("loose", String::new()),
                ("q", "Science/Physics/Quantum".to_string())
            ]
        );
    }

    #[test]
    fn test_export_stops_on_sink_error() {
        let mut tree = tree();
        let a = tree.resolve_or_create("A").unwrap();
        tree.file_record(a, Item("1")).unwrap();
        tree.file_record(a, Item("2")).unwrap();

        let mut seen = 0;
        let result = tree.export_subtree(tree.root(), |_, _| {
            seen += 1;
            Err("disk full")
        });
        assert_eq!(result, Err("disk full"));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_render_marks_last_child() {
        let mut tree = tree();
        let first = tree.resolve_or_create("First").unwrap();
        tree.resolve_or_create("Second").unwrap();
        tree.resolve_or_create("First/Inner").unwrap();
        let third = tree.resolve_or_create("Third").unwrap();
        tree.file_record(first, Item("a")).unwrap();

        assert!(!tree.is_last_child(first));
        assert!(tree.is_last_child(third));
        assert!(!tree.is_last_child(tree.root()));

        let expected = "\
Library(1)
├── First(1)
│   └── Inner(0)
├── Second(0)
└── Third(0)
";
        assert_eq!(tree.render(), expected);
    }
}
