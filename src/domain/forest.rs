//! The built hierarchy and its renderings.
//!
//! All walks over the forest use an explicit stack. Hierarchies can be
//! arbitrarily deep, so nothing here recurses per tree level: not rendering,
//! not JSON output, not dropping the rendered nodes.

use std::collections::HashSet;
use std::io;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use termtree::Tree;
use tracing::{instrument, warn};

use crate::domain::arena::{BoNode, NodeArena};
use crate::domain::error::DomainError;

/// Owned, nested form of one node: the JSON wire shape.
///
/// Dropping a node releases its subtree iteratively. The derived
/// `Serialize` recurses, so deep forests are written with
/// [`Forest::write_json`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestNode {
    pub id: String,
    pub name: String,
    pub children: Vec<ForestNode>,
}

impl ForestNode {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ForestNode>) -> Self {
        self.children = children;
        self
    }
}

impl Drop for ForestNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Upper bounds on the rendered output of a forest.
///
/// Shared nodes are rendered under every parent, so the rendered size can
/// grow much faster than the number of objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Longest root-to-leaf path, in nodes
    pub max_depth: usize,
    /// Total nodes in the rendered output
    pub max_nodes: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            max_nodes: 1_000_000,
        }
    }
}

/// Size of the rendered output, as measured by [`Forest::extent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub depth: usize,
    pub nodes: usize,
    /// False when counting stopped at the node budget.
    pub complete: bool,
}

/// Arena of all business objects plus the ordered list of roots.
#[derive(Debug, Default)]
pub struct Forest {
    arena: NodeArena,
    roots: Vec<Index>,
}

impl Forest {
    pub fn new(arena: NodeArena, roots: Vec<Index>) -> Self {
        Self { arena, roots }
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_ids(&self) -> Vec<&str> {
        self.roots
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| node.id.as_str())
            .collect()
    }

    pub fn node(&self, idx: Index) -> Option<&BoNode> {
        self.arena.get(idx)
    }

    /// Look up a node by `BO_GUID`, root or not.
    pub fn find(&self, id: &str) -> Option<&BoNode> {
        self.arena.lookup(id).and_then(|idx| self.arena.get(idx))
    }

    /// Number of distinct business objects, reachable from a root or not.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order walk over every tree, roots in order.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Longest root-to-leaf path, counted in nodes. Zero for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|visit| visit.depth + 1).max().unwrap_or(0)
    }

    /// Depth and node count of the rendered output, counting at most
    /// `node_budget` nodes.
    pub fn extent(&self, node_budget: usize) -> Extent {
        let mut extent = Extent {
            depth: 0,
            nodes: 0,
            complete: true,
        };
        for visit in self.iter() {
            if extent.nodes == node_budget {
                extent.complete = false;
                break;
            }
            extent.nodes += 1;
            extent.depth = extent.depth.max(visit.depth + 1);
        }
        extent
    }

    /// Fail when the rendered output would exceed `limits`.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self, limits: RenderLimits) -> Result<Extent, DomainError> {
        let extent = self.extent(limits.max_nodes);
        if !extent.complete {
            return Err(DomainError::TooManyNodes {
                max: limits.max_nodes,
            });
        }
        if extent.depth > limits.max_depth {
            return Err(DomainError::TooDeep {
                depth: extent.depth,
                max: limits.max_depth,
            });
        }
        Ok(extent)
    }

    /// Render every root as an owned nested tree.
    ///
    /// A node shared by several parents is rendered under each of them.
    /// A node reached again while it is already on the current path closes a
    /// cycle: it is rendered once more with no children and the walk stops there.
    #[instrument(level = "debug", skip(self))]
    pub fn to_nodes(&self) -> Vec<ForestNode> {
        struct Frame<'a> {
            index: Index,
            node: ForestNode,
            pending: std::slice::Iter<'a, Index>,
        }

        let mut rendered = Vec::with_capacity(self.roots.len());
        let mut on_path: HashSet<Index> = HashSet::new();

        for &root in &self.roots {
            let Some(bo) = self.arena.get(root) else {
                continue;
            };
            on_path.insert(root);
            let mut stack = vec![Frame {
                index: root,
                node: ForestNode::leaf(bo.id.clone(), bo.name.clone()),
                pending: bo.children.iter(),
            }];

            while let Some(frame) = stack.last_mut() {
                if let Some(&child) = frame.pending.next() {
                    let Some(bo) = self.arena.get(child) else {
                        continue;
                    };
                    let node = ForestNode::leaf(bo.id.clone(), bo.name.clone());
                    if on_path.contains(&child) {
                        warn!("cycle through {}, truncating children", bo.id);
                        frame.node.children.push(node);
                    } else {
                        on_path.insert(child);
                        stack.push(Frame {
                            index: child,
                            node,
                            pending: bo.children.iter(),
                        });
                    }
                    continue;
                }

                let Some(done) = stack.pop() else {
                    break;
                };
                on_path.remove(&done.index);
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => rendered.push(done.node),
                }
            }
        }
        rendered
    }

    /// Write the forest as a JSON array of `{id, name, children}` objects.
    ///
    /// Produces the same bytes as serializing [`to_nodes`](Self::to_nodes)
    /// with the same formatter, without building the nested nodes.
    pub fn write_json<W, F>(&self, writer: &mut W, formatter: &mut F) -> serde_json::Result<()>
    where
        W: io::Write,
        F: Formatter,
    {
        self.emit_json(writer, formatter).map_err(serde_json::Error::io)
    }

    /// Compact JSON bytes.
    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_json(&mut out, &mut CompactFormatter)?;
        Ok(out)
    }

    /// Indented JSON bytes.
    pub fn to_json_vec_pretty(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_json(&mut out, &mut PrettyFormatter::new())?;
        Ok(out)
    }

    fn emit_json<W, F>(&self, writer: &mut W, f: &mut F) -> io::Result<()>
    where
        W: io::Write,
        F: Formatter,
    {
        enum Step {
            Open { index: Index, first: bool },
            Close { index: Index, on_path: bool },
        }

        let present = |indices: &[Index]| -> Vec<Index> {
            indices
                .iter()
                .copied()
                .filter(|&idx| self.arena.get(idx).is_some())
                .collect()
        };
        let push_children = |steps: &mut Vec<Step>, children: Vec<Index>| {
            for (pos, index) in children.into_iter().enumerate().rev() {
                steps.push(Step::Open {
                    index,
                    first: pos == 0,
                });
            }
        };

        let mut on_path: HashSet<Index> = HashSet::new();
        let mut steps = Vec::new();
        push_children(&mut steps, present(&self.roots));

        f.begin_array(writer)?;
        while let Some(step) = steps.pop() {
            match step {
                Step::Open { index, first } => {
                    let Some(node) = self.arena.get(index) else {
                        continue;
                    };
                    f.begin_array_value(writer, first)?;
                    f.begin_object(writer)?;
                    write_field(writer, f, "id", &node.id, true)?;
                    write_field(writer, f, "name", &node.name, false)?;
                    f.begin_object_key(writer, false)?;
                    write_str(writer, "children")?;
                    f.end_object_key(writer)?;
                    f.begin_object_value(writer)?;
                    f.begin_array(writer)?;

                    let back_edge = on_path.contains(&index);
                    steps.push(Step::Close {
                        index,
                        on_path: !back_edge,
                    });
                    if back_edge {
                        warn!("cycle through {}, truncating children", node.id);
                    } else {
                        on_path.insert(index);
                        push_children(&mut steps, present(&node.children));
                    }
                }
                Step::Close { index, on_path: pushed } => {
                    f.end_array(writer)?;
                    f.end_object_value(writer)?;
                    f.end_object(writer)?;
                    f.end_array_value(writer)?;
                    if pushed {
                        on_path.remove(&index);
                    }
                }
            }
        }
        f.end_array(writer)
    }

    /// One `termtree` per root, labelled `name (id)`.
    pub fn to_termtree(&self) -> Vec<Tree<String>> {
        fn label(node: &BoNode) -> String {
            format!("{} ({})", node.name, node.id)
        }

        let mut trees = Vec::with_capacity(self.roots.len());
        // Open subtrees along the current path; a finished subtree is
        // attached to its parent when the walk moves back up.
        let mut open: Vec<Tree<String>> = Vec::new();
        for visit in self.iter() {
            while open.len() > visit.depth {
                close_subtree(&mut open, &mut trees);
            }
            open.push(Tree::new(label(visit.node)));
        }
        while !open.is_empty() {
            close_subtree(&mut open, &mut trees);
        }
        trees
    }
}

fn close_subtree(open: &mut Vec<Tree<String>>, trees: &mut Vec<Tree<String>>) {
    if let Some(done) = open.pop() {
        match open.last_mut() {
            Some(parent) => {
                parent.push(done);
            }
            None => trees.push(done),
        }
    }
}

fn write_str<W: io::Write>(writer: &mut W, value: &str) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value).map_err(io::Error::from)
}

fn write_field<W, F>(writer: &mut W, f: &mut F, key: &str, value: &str, first: bool) -> io::Result<()>
where
    W: io::Write,
    F: Formatter,
{
    f.begin_object_key(writer, first)?;
    write_str(writer, key)?;
    f.end_object_key(writer)?;
    f.begin_object_value(writer)?;
    write_str(writer, value)?;
    f.end_object_value(writer)
}

/// A node reached by [`ForestIterator`].
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub index: Index,
    pub node: &'a BoNode,
    /// 0 for roots
    pub depth: usize,
    /// The node is one of its own ancestors; its children are not visited.
    pub back_edge: bool,
}

pub struct ForestIterator<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, usize)>,
    path: Vec<Index>,
    on_path: HashSet<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest) -> Self {
        // Push roots in reverse order for left-to-right traversal
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self {
            forest,
            stack,
            path: Vec::new(),
            on_path: HashSet::new(),
        }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, depth)) = self.stack.pop() {
            let Some(node) = self.forest.arena.get(index) else {
                continue;
            };
            while self.path.len() > depth {
                if let Some(left) = self.path.pop() {
                    self.on_path.remove(&left);
                }
            }
            let back_edge = self.on_path.contains(&index);
            if !back_edge {
                self.path.push(index);
                self.on_path.insert(index);
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
            }
            return Some(Visit {
                index,
                node,
                depth,
                back_edge,
            });
        }
        None
    }
}
