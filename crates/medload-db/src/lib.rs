//! DuckDB storage for the Medline loading pipeline.

pub mod abbrev;
mod db;

pub use abbrev::abbreviate;
pub use db::Db;
