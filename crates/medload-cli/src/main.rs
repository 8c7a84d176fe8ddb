//! medload - Medline citation XML to DuckDB
//!
//! Two-phase loading: `analyze` induces a relational schema from a sample
//! of citation files, `load` maps whole files onto that schema. `mesh`
//! loads the MeSH vocabulary alongside.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "medload")]
#[command(about = "Medline citation XML to DuckDB")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./medload.toml or ~/.config/medload/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Induce the database schema from a sample of citation files
    Analyze(cmd::analyze::AnalyzeArgs),
    /// Load citation files into the database
    Load(cmd::load::LoadArgs),
    /// Load the MeSH vocabulary tables
    Mesh(cmd::mesh::MeshArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(medload_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    medload_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Analyze(args) => cmd::analyze::run(args, &config, &progress),
        Command::Load(args) => cmd::load::run(args, &config, &progress),
        Command::Mesh(args) => cmd::mesh::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Database",
                &config.database.path.display().to_string(),
            ]);
            table.add_row(vec![
                "Analyze max files",
                &config.analyze.max_files.to_string(),
            ]);
            table.add_row(vec![
                "Load batch size",
                &config.load.batch_size.to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
