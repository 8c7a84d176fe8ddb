//! Load subcommand - map citation files onto the induced schema

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use medload_core::{RowSink, SharedProgress, fmt_num, list_xml_gz, open_xml_gz, parse_document};
use medload_db::Db;
use medload_engine::{CitationMapper, LoadMode, MalformedRecord, MapOutcome, dates, document};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Folder containing *.xml.gz citation files
    #[arg(short, long)]
    pub folder: PathBuf,

    /// Database file (default: from config)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Replace records that are already in the database (for update files);
    /// without this flag existing records are skipped (for baseline files)
    #[arg(long)]
    pub overwrite: bool,

    /// Number of documents per transaction
    #[arg(long)]
    pub batch_size: Option<usize>,
}

pub fn run(args: LoadArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let files = list_xml_gz(&args.folder)?;
    if files.is_empty() {
        bail!("no *.xml.gz files found in {}", args.folder.display());
    }
    let mode = if args.overwrite {
        LoadMode::Overwrite
    } else {
        LoadMode::SkipExisting
    };
    let batch_size = args.batch_size.unwrap_or(config.load.batch_size).max(1);

    let db_path = args.database.unwrap_or_else(|| config.database.path.clone());
    let mut db = Db::open(&db_path)?;
    let mapper = CitationMapper::from_catalog(&db, mode)?;
    log::info!(
        "Loading {} files into {} ({} tables)",
        files.len(),
        db_path.display(),
        mapper.table_names().count()
    );

    let pb = progress.file_bar(files.len() as u64);
    let mut loaded = 0usize;
    let mut skipped = 0usize;
    let mut deleted = 0usize;
    let mut failed = 0usize;
    let mut pending = 0usize;

    db.begin_batch()?;
    for file in &files {
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            pb.set_message(name.to_string());
        }
        let root = parse_document(open_xml_gz(file)?)
            .with_context(|| format!("failed to parse {}", file.display()))?;

        for citation in document::citations(&root) {
            match mapper.map_citation(citation, &mut db) {
                Ok(MapOutcome::Loaded) => {
                    dates::insert_date(citation, args.overwrite, &mut db)?;
                    loaded += 1;
                }
                Ok(MapOutcome::Skipped) => skipped += 1,
                // A malformed record costs only itself; a write failure
                // aborts the whole run.
                Err(err) if err.is::<MalformedRecord>() => {
                    log::error!("Skipping record in {}: {err:#}", file.display());
                    failed += 1;
                }
                Err(err) => return Err(err),
            }
            pending += 1;
            if pending >= batch_size {
                db.commit_batch()?;
                db.begin_batch()?;
                pending = 0;
            }
        }

        // Delete directives only take effect on update files; a baseline
        // load must not destroy anything.
        if args.overwrite {
            for (pmid, version) in document::deleted_identifiers(&root) {
                mapper.delete(&pmid, &version, &mut db)?;
                db.delete_for_key(&[dates::TABLE.to_string()], &pmid, &version)?;
                deleted += 1;
            }
        }
        pb.inc(1);
    }
    db.commit_batch()?;
    pb.finish_and_clear();

    log::info!(
        "Done: {} loaded, {} skipped, {} deleted, {} failed",
        fmt_num(loaded),
        fmt_num(skipped),
        fmt_num(deleted),
        fmt_num(failed)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use medload_core::{ProgressContext, parse_str};
    use medload_engine::CitationAnalyzer;

    const RECORD: &str = "<MedlineCitationSet><MedlineCitation>\
        <PMID Version=\"1\">77</PMID>\
        <Article><ArticleTitle>Kept</ArticleTitle></Article>\
        </MedlineCitation></MedlineCitationSet>";

    const DELETE: &str = "<MedlineCitationSet>\
        <DeleteCitation><PMID Version=\"1\">77</PMID></DeleteCitation>\
        </MedlineCitationSet>";

    fn write_gz(dir: &Path, name: &str, content: &str) {
        let mut enc =
            GzEncoder::new(File::create(dir.join(name)).unwrap(), Compression::default());
        enc.write_all(content.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    fn prepare_db(path: &Path, docs: &[&str]) {
        let mut analyzer = CitationAnalyzer::new();
        for doc in docs {
            let root = parse_str(doc).unwrap();
            for citation in document::citations(&root) {
                analyzer.analyze(citation);
            }
        }
        let mut db = Db::open(path).unwrap();
        analyzer.finish().create_tables(&mut db).unwrap();
        dates::create_table(&mut db).unwrap();
    }

    fn run_load(folder: &Path, database: &Path, overwrite: bool) -> Result<()> {
        let args = LoadArgs {
            folder: folder.to_path_buf(),
            database: Some(database.to_path_buf()),
            overwrite,
            batch_size: None,
        };
        run(args, &Config::default(), &Arc::new(ProgressContext::new()))
    }

    fn citation_count(database: &Path) -> u64 {
        Db::open(database).unwrap().count("MedlineCitation").unwrap()
    }

    #[test]
    fn delete_directives_are_ignored_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("medline.duckdb");
        prepare_db(&db_path, &[RECORD]);

        let baseline = dir.path().join("baseline");
        std::fs::create_dir(&baseline).unwrap();
        write_gz(&baseline, "base.xml.gz", RECORD);
        run_load(&baseline, &db_path, false).unwrap();
        assert_eq!(citation_count(&db_path), 1);

        let update = dir.path().join("update");
        std::fs::create_dir(&update).unwrap();
        write_gz(&update, "upd.xml.gz", DELETE);

        // A baseline run must leave the record alone.
        run_load(&update, &db_path, false).unwrap();
        assert_eq!(citation_count(&db_path), 1);

        // An update run applies the directive.
        run_load(&update, &db_path, true).unwrap();
        assert_eq!(citation_count(&db_path), 0);
    }

    #[test]
    fn malformed_record_does_not_abort_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("medline.duckdb");
        prepare_db(&db_path, &[RECORD]);

        let folder = dir.path().join("files");
        std::fs::create_dir(&folder).unwrap();
        write_gz(
            &folder,
            "mixed.xml.gz",
            "<MedlineCitationSet>\
             <MedlineCitation><Article><ArticleTitle>No id</ArticleTitle></Article>\
             </MedlineCitation>\
             <MedlineCitation><PMID Version=\"1\">77</PMID>\
             <Article><ArticleTitle>Kept</ArticleTitle></Article></MedlineCitation>\
             </MedlineCitationSet>",
        );
        run_load(&folder, &db_path, false).unwrap();
        assert_eq!(citation_count(&db_path), 1);
    }
}
