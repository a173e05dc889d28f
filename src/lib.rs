//! bograph: business object hierarchies from spreadsheets.
//!
//! A workbook with a `Bo List` sheet (one business object per row) and a
//! `Relations` sheet (one parent -> child edge per row) is turned into a
//! forest of objects that no relation names as a child.
//!
//! Layers, innermost first:
//! - [`domain`]: rows, node arena, [`domain::GraphBuilder`], [`domain::Forest`]
//! - [`application`]: [`application::ForestService`]
//! - [`infrastructure`]: calamine workbooks, upload storage, service container
//! - [`server`] and [`cli`]: the HTTP and command-line front ends
//!
//! ```
//! use bograph::domain::{GraphBuilder, ObjectRow, RelationRow};
//!
//! let objects = vec![
//!     ObjectRow::new("A").with_name("Alpha"),
//!     ObjectRow::new("B").with_name("Beta"),
//! ];
//! let relations = vec![RelationRow::new("A", "B")];
//!
//! let forest = GraphBuilder::new().build(&objects, &relations);
//! assert_eq!(forest.root_ids(), vec!["A"]);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod server;
pub mod util;
