//! Graph builder: object and relation rows to a forest of business objects.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use crate::domain::arena::{BoNode, Inserted, NodeArena};
use crate::domain::forest::Forest;
use crate::domain::rows::{ingest_objects, ingest_relations, ObjectRow, RelationRow, Row};

/// Builds the business object hierarchy.
///
/// The builder never fails. Malformed input shrinks the result instead:
/// - a repeated `BO_GUID` replaces the earlier object (first position kept)
/// - a relation naming an unknown parent or child is dropped
///
/// Links are added without cycle detection; see [`Forest::to_nodes`] for how
/// cycles are rendered.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Ingest raw sheet rows, then [`build`](Self::build).
    pub fn build_from_rows(&self, object_rows: &[Row], relation_rows: &[Row]) -> Forest {
        let objects = ingest_objects(object_rows);
        let relations = ingest_relations(relation_rows);
        self.build(&objects, &relations)
    }

    #[instrument(level = "debug", skip_all, fields(objects = objects.len(), relations = relations.len()))]
    pub fn build(&self, objects: &[ObjectRow], relations: &[RelationRow]) -> Forest {
        let mut arena = NodeArena::new();

        for object in objects {
            let node = BoNode::new(object.id.clone(), object.display_name());
            if let Inserted::Replaced(_) = arena.insert(node) {
                debug!("duplicate BO_GUID {}, keeping later row", object.id);
            }
        }

        let mut linked = 0usize;
        for relation in relations {
            let (Some(parent_id), Some(child_id)) = (&relation.parent, &relation.child) else {
                continue;
            };
            match (arena.lookup(parent_id), arena.lookup(child_id)) {
                (Some(parent), Some(child)) => {
                    arena.link(parent, child);
                    linked += 1;
                }
                _ => trace!("dropping dangling relation {} -> {}", parent_id, child_id),
            }
        }

        // Root status comes from the raw relation rows, dropped links included.
        let referenced: HashSet<&str> = relations
            .iter()
            .filter_map(|relation| relation.child.as_deref())
            .collect();

        let roots = arena
            .iter()
            .filter(|(_, node)| !referenced.contains(node.id.as_str()))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();

        debug!(
            "build: nodes={}, links={}, roots={}",
            arena.len(),
            linked,
            roots.len()
        );
        Forest::new(arena, roots)
    }
}
