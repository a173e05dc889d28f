//! Domain layer: rows, arena, graph builder
//!
//! This layer is independent of external concerns (no I/O, no HTTP, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod forest;
pub mod rows;

pub use arena::{BoNode, Inserted, NodeArena};
pub use builder::GraphBuilder;
pub use error::DomainError;
pub use forest::{Extent, Forest, ForestIterator, ForestNode, RenderLimits, Visit};
pub use rows::{
    ingest_objects, ingest_relations, CellValue, ObjectRow, RelationRow, Row, RowSchema,
    OBJECT_SCHEMA, OBJECT_SHEET, RELATION_SCHEMA, RELATION_SHEET,
};
