//! Mapping of citation records onto a previously induced schema.
//!
//! The mapper runs in a different process than the analyzer, so it rebuilds
//! its routing and validation state from the sink's durable catalog. The
//! traversal mirrors the analyzer's: a child path that has its own table is
//! routed there; everything else flattens into the current table's row.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Context, Result, bail};
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};

use medload_core::{Element, FieldInfo, RowSink, RowValues, is_integer};

use crate::path::{
    ORDER_SUFFIX, OTHER_PMID, OTHER_PMID_VERSION, PMID, PMID_VERSION, PathName, ROOT_TABLE, concat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Delete any existing rows for a record, then insert the new ones.
    Overwrite,
    /// Leave records that are already present untouched.
    SkipExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    Loaded,
    Skipped,
}

/// A record whose structure prevents mapping, such as a missing or empty
/// PMID. Callers may skip such a record on its own; every other mapping
/// error is a write failure and aborts the batch.
#[derive(Debug)]
pub struct MalformedRecord(String);

impl MalformedRecord {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MalformedRecord {}

#[derive(Debug)]
pub struct CitationMapper {
    mode: LoadMode,
    /// Known citation tables, lowercase.
    tables: BTreeSet<String>,
    /// Lowercase table name to its lowercase field names.
    fields: FxHashMap<String, FxHashSet<String>>,
    /// Lowercase table name to its column catalog, for value validation.
    catalogs: FxHashMap<String, Vec<FieldInfo>>,
}

impl CitationMapper {
    /// Rebuild mapper state from the sink's catalog.
    pub fn from_catalog(sink: &dyn RowSink, mode: LoadMode) -> Result<Self> {
        let root_lc = ROOT_TABLE.to_lowercase();
        let mut tables = BTreeSet::new();
        let mut fields = FxHashMap::default();
        let mut catalogs = FxHashMap::default();
        for name in sink.table_names()? {
            let lc = name.to_lowercase();
            if !lc.starts_with(&root_lc) {
                continue;
            }
            let catalog = sink
                .column_catalog(&name)
                .with_context(|| format!("failed to read columns of {name}"))?;
            fields.insert(
                lc.clone(),
                catalog
                    .iter()
                    .map(|c| c.name.to_lowercase())
                    .collect::<FxHashSet<_>>(),
            );
            catalogs.insert(lc.clone(), catalog);
            tables.insert(lc);
        }
        if !tables.contains(&root_lc) {
            bail!("no citation tables found in the database; run analyze first");
        }
        Ok(Self {
            mode,
            tables,
            fields,
            catalogs,
        })
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    /// The composite identifier of a citation record.
    pub fn identifier(citation: &Element) -> Result<(String, String)> {
        let Some(pmid_el) = citation.find_child(PMID) else {
            return Err(MalformedRecord::new("citation record has no PMID element").into());
        };
        let pmid = pmid_el.deep_text();
        if pmid.is_empty() {
            return Err(MalformedRecord::new("citation record has an empty PMID").into());
        }
        let Some(version) = pmid_el.attribute("Version") else {
            return Err(MalformedRecord::new("PMID element has no Version attribute").into());
        };
        Ok((pmid, version.to_string()))
    }

    /// Map one record into rows. Existing rows are handled per [`LoadMode`].
    pub fn map_citation(
        &self,
        citation: &Element,
        sink: &mut dyn RowSink,
    ) -> Result<MapOutcome> {
        let (pmid, version) = Self::identifier(citation)?;
        let root_lc = ROOT_TABLE.to_lowercase();
        if sink.exists(&root_lc, &pmid, &version)? {
            match self.mode {
                LoadMode::SkipExisting => return Ok(MapOutcome::Skipped),
                LoadMode::Overwrite => self.delete(&pmid, &version, sink)?,
            }
        }

        let mut keys = RowValues::new();
        keys.insert(PMID.to_string(), pmid);
        keys.insert(PMID_VERSION.to_string(), version);
        self.emit_table(citation, ROOT_TABLE, &keys, sink)?;
        Ok(MapOutcome::Loaded)
    }

    /// Remove every row belonging to a record, across all citation tables.
    pub fn delete(&self, pmid: &str, version: &str, sink: &mut dyn RowSink) -> Result<()> {
        let tables: Vec<String> = self.tables.iter().cloned().collect();
        sink.delete_for_key(&tables, pmid, version)
    }

    /// Emit one row for `table` rooted at `el`, recursing into sub-tables
    /// first so child rows precede their parent's.
    fn emit_table(
        &self,
        el: &Element,
        table: &str,
        keys: &RowValues,
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        let mut row = RowValues::new();
        self.collect_node(el, &PathName::root(), table, &mut row, keys, sink)?;

        if !table.eq_ignore_ascii_case(ROOT_TABLE) {
            if let Some(v) = row.remove(PMID) {
                row.insert(OTHER_PMID.to_string(), v);
            }
            if let Some(v) = row.remove(PMID_VERSION) {
                row.insert(OTHER_PMID_VERSION.to_string(), v);
            }
        }
        for (k, v) in keys {
            row.insert(k.clone(), v.clone());
        }
        self.insert_checked(table, row, sink)
    }

    fn collect_node(
        &self,
        el: &Element,
        path: &PathName,
        table: &str,
        row: &mut RowValues,
        keys: &RowValues,
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        if el.is_text_bearing() {
            row.insert(path.field_name().to_string(), el.deep_text());
        }
        for (attr, value) in &el.attributes {
            row.insert(concat(path.as_str(), attr), value.clone());
        }
        if el.is_text_bearing() {
            return Ok(());
        }

        // Position counters, one per sub-table name under this element.
        let mut order: FxHashMap<String, u32> = FxHashMap::default();
        for child in el.child_elements() {
            let child_path = path.child(&child.name);
            let sub_table = concat(table, child_path.as_str());
            if self.tables.contains(&sub_table.to_lowercase()) {
                let n = order.entry(sub_table.clone()).or_insert(0);
                *n += 1;
                let mut child_keys = keys.clone();
                child_keys.insert(format!("{sub_table}{ORDER_SUFFIX}"), n.to_string());
                self.emit_table(child, &sub_table, &child_keys, sink)?;
            } else {
                self.collect_node(child, &child_path, table, row, keys, sink)?;
            }
        }
        Ok(())
    }

    /// Validate a row against the catalog, then hand it to the sink.
    ///
    /// Unknown fields are dropped, non-integer values in numeric columns are
    /// dropped, and over-long values in length-limited columns are truncated;
    /// each with a warning.
    fn insert_checked(
        &self,
        table: &str,
        mut row: RowValues,
        sink: &mut dyn RowSink,
    ) -> Result<()> {
        let lc = table.to_lowercase();
        if let Some(known) = self.fields.get(&lc) {
            let unknown: Vec<String> = row
                .keys()
                .filter(|k| !known.contains(&k.to_lowercase()))
                .cloned()
                .collect();
            for field in unknown {
                warn!(
                    "Ignoring field '{field}' in table '{table}': not present when the schema was created"
                );
                row.remove(&field);
            }
        }
        if let Some(catalog) = self.catalogs.get(&lc) {
            for column in catalog {
                let Some(key) = row
                    .keys()
                    .find(|k| k.eq_ignore_ascii_case(&column.name))
                    .cloned()
                else {
                    continue;
                };
                if column.sql_type.is_numeric() {
                    if !is_integer(&row[&key]) {
                        warn!(
                            "Removing value '{}' from numeric column '{}' in table '{table}'",
                            row[&key], column.name
                        );
                        row.remove(&key);
                    }
                } else if let Some(max) = column.sql_type.declared_length() {
                    if row[&key].chars().count() > max {
                        warn!(
                            "Truncating value of column '{}' in table '{table}' to {max} characters",
                            column.name
                        );
                        let truncated: String = row[&key].chars().take(max).collect();
                        row.insert(key, truncated);
                    }
                }
            }
        }
        sink.insert_row(&lc, &row)
    }
}
