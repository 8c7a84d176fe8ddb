//! MeSH vocabulary loading: descriptor and supplementary concept files
//! into `mesh_term`, `mesh_relationship`, and the derived `mesh_ancestor`
//! closure table.

pub mod ancestor;
pub mod descriptor;
pub mod runner;
pub mod supplement;
pub mod table;
mod trace;

pub use runner::{ANCESTOR_TABLE, RELATIONSHIP_TABLE, TERM_TABLE, find_mesh_files, load_mesh};
pub use table::TableBuffer;
