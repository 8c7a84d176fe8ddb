//! Analyze subcommand - induce the relational schema from a file sample

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use medload_core::{SharedProgress, open_xml_gz, parse_document, sample_xml_gz};
use medload_db::Db;
use medload_engine::{CitationAnalyzer, dates, document};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Folder containing *.xml.gz citation files
    #[arg(short, long)]
    pub folder: PathBuf,

    /// Database file (default: from config)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Maximum number of files to sample
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Print every induced column with its type
    #[arg(long)]
    pub print: bool,
}

pub fn run(args: AnalyzeArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let max_files = args.max_files.unwrap_or(config.analyze.max_files);
    let files = sample_xml_gz(&args.folder, max_files)?;
    if files.is_empty() {
        bail!("no *.xml.gz files found in {}", args.folder.display());
    }
    log::info!("Analyzing {} files from {}", files.len(), args.folder.display());

    let pb = progress.file_bar(files.len() as u64);
    let mut analyzer = CitationAnalyzer::new();
    let mut records = 0usize;
    for file in &files {
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            pb.set_message(name.to_string());
        }
        let root = parse_document(open_xml_gz(file)?)
            .with_context(|| format!("failed to parse {}", file.display()))?;
        for citation in document::citations(&root) {
            analyzer.analyze(citation);
            records += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let schema = analyzer.finish();
    log::info!(
        "Induced {} tables from {} records",
        schema.table_count(),
        medload_core::fmt_num(records)
    );

    let db_path = args.database.unwrap_or_else(|| config.database.path.clone());
    let mut db = Db::open(&db_path)?;
    schema.create_tables(&mut db)?;
    dates::create_table(&mut db)?;
    log::info!("Schema written to {}", db_path.display());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    if args.print {
        table.set_header(vec![
            Cell::new("Table").fg(Color::Cyan),
            Cell::new("Column").fg(Color::Cyan),
            Cell::new("Type").fg(Color::Cyan),
        ]);
        for name in schema.table_names() {
            let Some(fields) = schema.fields(name) else {
                continue;
            };
            for (field, ty) in fields {
                table.add_row(vec![
                    name.to_string(),
                    field.clone(),
                    ty.sql_type().as_str().to_string(),
                ]);
            }
        }
    } else {
        table.set_header(vec![
            Cell::new("Table").fg(Color::Cyan),
            Cell::new("Columns").fg(Color::Cyan),
        ]);
        for name in schema.table_names() {
            let columns = schema.fields(name).map(|f| f.len()).unwrap_or(0);
            table.add_row(vec![name.to_string(), columns.to_string()]);
        }
    }
    progress.println(format!("\n{table}"));
    Ok(())
}
