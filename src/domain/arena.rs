use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// One business object in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoNode {
    /// `BO_GUID` of the object row
    pub id: String,
    /// Display label (description, name or id)
    pub name: String,
    /// Arena indices of child nodes, in relation-row order
    pub children: Vec<Index>,
}

impl BoNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }
}

impl fmt::Display for BoNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Outcome of [`NodeArena::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    New(Index),
    /// The id was already present; its value was replaced in place.
    Replaced(Index),
}

impl Inserted {
    pub fn index(self) -> Index {
        match self {
            Inserted::New(idx) | Inserted::Replaced(idx) => idx,
        }
    }
}

/// Arena of business objects with an insertion-ordered id lookup.
///
/// Every node is stored once. The id lookup and the `children` lists of
/// other nodes hold indices into the same arena, so a node linked under
/// several parents is shared, not copied.
///
/// Re-inserting an existing id replaces the stored node but keeps the
/// position of its first occurrence.
#[derive(Debug, Default)]
pub struct NodeArena {
    arena: Arena<BoNode>,
    order: Vec<Index>,
    by_id: HashMap<String, Index>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, node: BoNode) -> Inserted {
        match self.by_id.get(&node.id) {
            Some(&idx) => {
                self.arena[idx] = node;
                Inserted::Replaced(idx)
            }
            None => {
                let id = node.id.clone();
                let idx = self.arena.insert(node);
                self.order.push(idx);
                self.by_id.insert(id, idx);
                Inserted::New(idx)
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    /// Append `child` to the children of `parent`. Returns false if
    /// `parent` is not in the arena.
    #[instrument(level = "trace", skip(self))]
    pub fn link(&mut self, parent: Index, child: Index) -> bool {
        match self.arena.get_mut(parent) {
            Some(node) => {
                node.children.push(child);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, idx: Index) -> Option<&BoNode> {
        self.arena.get(idx)
    }

    /// Nodes in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &BoNode)> + '_ {
        self.order
            .iter()
            .filter_map(move |&idx| self.arena.get(idx).map(|node| (idx, node)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
