//! Medload Core - Common infrastructure for the Medline loading pipeline
//!
//! This crate provides the pieces shared by the schema engine, the
//! database layer, and the MeSH loader: the XML tree model, the row sink
//! contract, gzip input handling, and logging.

pub mod input;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod xml;

// Re-exports for convenience
pub use input::{list_xml_gz, open_xml_gz, sample_xml_gz};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use sink::{FieldInfo, FieldType, MemSink, RowSink, RowValues, SqlType, is_integer};
pub use xml::{Element, Node, parse_document, parse_str};
