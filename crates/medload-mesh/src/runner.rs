//! Whole-folder MeSH load: one descriptor file, one supplement file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::info;
use rustc_hash::FxHashMap;

use medload_core::{RowSink, open_xml_gz};

use crate::ancestor::write_ancestors;
use crate::descriptor::parse_descriptors;
use crate::supplement::parse_supplement;
use crate::table::TableBuffer;

pub const TERM_TABLE: &str = "mesh_term";
pub const RELATIONSHIP_TABLE: &str = "mesh_relationship";
pub const ANCESTOR_TABLE: &str = "mesh_ancestor";

/// Locate the gzipped descriptor (`desc*`) and supplement (`supp*`) files.
/// Exactly one of each is expected.
pub fn find_mesh_files(folder: &Path) -> Result<(PathBuf, PathBuf)> {
    let mut descriptor: Option<PathBuf> = None;
    let mut supplement: Option<PathBuf> = None;
    for entry in std::fs::read_dir(folder)
        .with_context(|| format!("failed to read folder: {}", folder.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".gz") {
            continue;
        }
        if name.starts_with("desc") {
            if descriptor.is_some() {
                bail!("multiple main MeSH files found in {}", folder.display());
            }
            descriptor = Some(path);
        } else if name.starts_with("supp") {
            if supplement.is_some() {
                bail!("multiple supplementary MeSH files found in {}", folder.display());
            }
            supplement = Some(path);
        }
    }
    match (descriptor, supplement) {
        (Some(d), Some(s)) => Ok((d, s)),
        (None, _) => bail!("no main MeSH file (desc*.gz) found in {}", folder.display()),
        (_, None) => bail!(
            "no supplementary MeSH file (supp*.gz) found in {}",
            folder.display()
        ),
    }
}

/// Parse both vocabulary files and derive the ancestor table.
pub fn load_mesh(folder: &Path, sink: &mut dyn RowSink) -> Result<()> {
    let (descriptor_file, supplement_file) = find_mesh_files(folder)?;

    let mut tree_number_to_ui = FxHashMap::default();
    let mut terms = TableBuffer::new(TERM_TABLE);
    let mut relationships = TableBuffer::new(RELATIONSHIP_TABLE);

    info!("Parsing {}", descriptor_file.display());
    parse_descriptors(
        open_xml_gz(&descriptor_file)?,
        &mut terms,
        &mut relationships,
        &mut tree_number_to_ui,
        sink,
    )?;
    info!("Parsing {}", supplement_file.display());
    parse_supplement(open_xml_gz(&supplement_file)?, &mut terms, &mut relationships, sink)?;
    terms.close(sink)?;
    relationships.close(sink)?;

    info!("Deriving ancestor table from {} tree numbers", tree_number_to_ui.len());
    let mut ancestors = TableBuffer::new(ANCESTOR_TABLE);
    write_ancestors(&tree_number_to_ui, &mut ancestors, sink)?;
    ancestors.close(sink)?;
    Ok(())
}
