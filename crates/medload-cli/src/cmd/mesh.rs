//! Mesh subcommand - load the MeSH vocabulary tables

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use medload_core::{RowSink, fmt_num};
use medload_db::Db;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct MeshArgs {
    /// Folder containing the desc*.gz and supp*.gz MeSH files
    #[arg(short, long)]
    pub folder: PathBuf,

    /// Database file (default: from config)
    #[arg(short, long)]
    pub database: Option<PathBuf>,
}

pub fn run(args: MeshArgs, config: &Config) -> Result<()> {
    let db_path = args.database.unwrap_or_else(|| config.database.path.clone());
    let mut db = Db::open(&db_path)?;

    db.begin_batch()?;
    medload_mesh::load_mesh(&args.folder, &mut db)?;
    db.commit_batch()?;

    log::info!(
        "MeSH loaded: {} terms, {} relationships, {} ancestor pairs",
        fmt_num(db.count(medload_mesh::TERM_TABLE)? as usize),
        fmt_num(db.count(medload_mesh::RELATIONSHIP_TABLE)? as usize),
        fmt_num(db.count(medload_mesh::ANCESTOR_TABLE)? as usize)
    );
    Ok(())
}
