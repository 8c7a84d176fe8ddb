//! Schema induction and relational mapping for citation XML.
//!
//! Two phases share one traversal discipline: [`CitationAnalyzer`] learns a
//! relational schema from a sample of records, and [`CitationMapper`] later
//! maps full records onto that schema, rebuilt from the sink's catalog.

pub mod analyzer;
pub mod dates;
pub mod document;
pub mod mapper;
pub mod path;
pub mod schema;

pub use analyzer::CitationAnalyzer;
pub use mapper::{CitationMapper, LoadMode, MalformedRecord, MapOutcome};
pub use schema::InducedSchema;
