//! The inheritance forest.
//!
//! Each file has at most one parent (the component it extends). Parent keys
//! are the source of truth; child sets are derived from them. Readers work
//! on an `Arc<Forest>` snapshot while writers clone on write.

use crate::node::FileId;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("inheritance cycle: {child} cannot extend {parent}")]
    Cycle { child: FileId, parent: FileId },
}

/// Parent edges between files.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    /// Every file the forest knows, roots included.
    nodes: BTreeSet<FileId>,
    /// file -> the file it extends
    parents: HashMap<FileId, FileId>,
    /// file -> files extending it
    children: BTreeMap<FileId, BTreeSet<FileId>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a file as a root if it is not known yet.
    pub fn insert(&mut self, node: FileId) {
        self.nodes.insert(node);
    }

    pub fn contains(&self, node: &FileId) -> bool {
        self.nodes.contains(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, node: &FileId) -> Option<&FileId> {
        self.parents.get(node)
    }

    pub fn children(&self, node: &FileId) -> impl Iterator<Item = &FileId> {
        self.children.get(node).into_iter().flatten()
    }

    /// Point `node` at `parent`, or make it a root with `None`.
    ///
    /// An edge to the node itself or to one of its descendants fails with
    /// [`GraphError::Cycle`] and leaves the forest untouched.
    pub fn set_parent(&mut self, node: &FileId, parent: Option<&FileId>) -> Result<(), GraphError> {
        if let Some(parent) = parent {
            if parent == node || self.ancestors(parent).contains(node) {
                return Err(GraphError::Cycle {
                    child: node.clone(),
                    parent: parent.clone(),
                });
            }
        }

        self.detach(node);
        self.nodes.insert(node.clone());
        if let Some(parent) = parent {
            self.nodes.insert(parent.clone());
            self.parents.insert(node.clone(), parent.clone());
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(node.clone());
        }
        Ok(())
    }

    fn detach(&mut self, node: &FileId) {
        if let Some(old) = self.parents.remove(node) {
            if let Some(siblings) = self.children.get_mut(&old) {
                siblings.remove(node);
                if siblings.is_empty() {
                    self.children.remove(&old);
                }
            }
        }
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: &FileId) -> Vec<FileId> {
        let mut chain = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parents.get(current) {
            // Edges are checked on insertion; the bound only guards reads
            // of a forest built some other way.
            if chain.len() > self.nodes.len() {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// Every file that extends `node` directly or indirectly, breadth first.
    pub fn descendants(&self, node: &FileId) -> Vec<FileId> {
        let mut result = Vec::new();
        let mut queue: VecDeque<&FileId> = self.children(node).collect();
        while let Some(current) = queue.pop_front() {
            result.push(current.clone());
            queue.extend(self.children(current));
        }
        result
    }

    /// All files with parents before children.
    pub fn topological_order(&self) -> Vec<FileId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut queue: VecDeque<&FileId> = self
            .nodes
            .iter()
            .filter(|node| !self.parents.contains_key(*node))
            .collect();
        while let Some(current) = queue.pop_front() {
            result.push(current.clone());
            queue.extend(self.children(current));
        }
        result
    }

    /// Forget `node`. Its children become roots and are returned.
    pub fn remove(&mut self, node: &FileId) -> Vec<FileId> {
        self.detach(node);
        self.nodes.remove(node);
        let orphans: Vec<FileId> = self
            .children
            .remove(node)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for orphan in &orphans {
            self.parents.remove(orphan);
        }
        orphans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> FileId {
        FileId::new(format!("/w/{}.vue", name))
    }

    fn chain() -> Forest {
        // a <- b <- c, a <- d
        let mut forest = Forest::new();
        forest.set_parent(&id("b"), Some(&id("a"))).unwrap();
        forest.set_parent(&id("c"), Some(&id("b"))).unwrap();
        forest.set_parent(&id("d"), Some(&id("a"))).unwrap();
        forest
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let forest = chain();
        assert_eq!(forest.ancestors(&id("c")), vec![id("b"), id("a")]);
        assert_eq!(forest.descendants(&id("a")), vec![id("b"), id("d"), id("c")]);
        assert!(forest.descendants(&id("c")).is_empty());
    }

    #[test]
    fn test_cycle_is_rejected_and_forest_unchanged() {
        let mut forest = chain();
        let err = forest.set_parent(&id("a"), Some(&id("c"))).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                child: id("a"),
                parent: id("c"),
            }
        );
        assert_eq!(forest.parent(&id("a")), None);
        assert_eq!(forest.ancestors(&id("c")), vec![id("b"), id("a")]);

        assert!(forest.set_parent(&id("a"), Some(&id("a"))).is_err());
        assert_eq!(forest.parent(&id("a")), None);
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut forest = chain();
        forest.set_parent(&id("c"), Some(&id("d"))).unwrap();
        assert_eq!(forest.children(&id("b")).count(), 0);
        assert_eq!(forest.children(&id("d")).cloned().collect::<Vec<_>>(), vec![id("c")]);
        forest.set_parent(&id("c"), None).unwrap();
        assert_eq!(forest.parent(&id("c")), None);
        assert!(forest.contains(&id("c")));
    }

    #[test]
    fn test_topological_order_puts_parents_first() {
        let mut forest = chain();
        forest.insert(id("z"));
        let order = forest.topological_order();
        let position = |name: &str| order.iter().position(|n| *n == id(name)).unwrap();
        assert_eq!(order.len(), 5);
        assert!(position("a") < position("b"));
        assert!(position("b") < position("c"));
        assert!(position("a") < position("d"));
    }

    #[test]
    fn test_remove_orphans_children() {
        let mut forest = chain();
        let orphans = forest.remove(&id("b"));
        assert_eq!(orphans, vec![id("c")]);
        assert_eq!(forest.parent(&id("c")), None);
        assert!(!forest.contains(&id("b")));
        assert_eq!(forest.descendants(&id("a")), vec![id("d")]);
    }
}
