//! Row sink contract between the schema engine and the database layer.
//!
//! The analyzer emits DDL through [`RowSink::create_table`]; the mapper
//! reconstructs its validation schema from [`RowSink::column_catalog`] and
//! emits rows through [`RowSink::insert_row`]. The two phases never share
//! in-process state: the catalog is the durable contract between them.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};

/// A single row: field name to string value.
pub type RowValues = BTreeMap<String, String>;

/// Inferred scalar type for one field across all observed values.
///
/// Monotonic: starts numeric with length 0, only ever widens
/// (numeric to text, length up), never narrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub is_numeric: bool,
    pub max_length: usize,
}

impl Default for FieldType {
    fn default() -> Self {
        Self {
            is_numeric: true,
            max_length: 0,
        }
    }
}

impl FieldType {
    pub fn new(is_numeric: bool, max_length: usize) -> Self {
        Self {
            is_numeric,
            max_length,
        }
    }

    /// Fold one observed value into the type.
    pub fn observe(&mut self, value: &str) {
        if self.is_numeric && !is_integer(value) {
            self.is_numeric = false;
        }
        let len = value.chars().count();
        if len > self.max_length {
            self.max_length = len;
        }
    }

    /// Map the inferred type to a dialect-neutral SQL type.
    pub fn sql_type(&self) -> SqlType {
        if self.is_numeric {
            if self.max_length < 10 {
                SqlType::Integer
            } else {
                SqlType::BigInt
            }
        } else if self.max_length > 255 {
            SqlType::Text
        } else {
            SqlType::Varchar(255)
        }
    }
}

/// Whether the value parses as a (signed) integer.
pub fn is_integer(value: &str) -> bool {
    value.parse::<i64>().is_ok()
}

/// Dialect-neutral column type used at the sink boundary.
///
/// The sink owns the mapping to vendor DDL; the engine only decides
/// between these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    BigInt,
    /// Variable-length text with a declared maximum (in characters).
    Varchar(usize),
    /// Unbounded text; never truncated.
    Text,
    Date,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Varchar(_) => "VARCHAR",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SqlType::Integer | SqlType::BigInt)
    }

    /// Declared maximum length, for variable-length text columns only.
    pub fn declared_length(&self) -> Option<usize> {
        match self {
            SqlType::Varchar(n) => Some(*n),
            _ => None,
        }
    }

    pub fn parse(name: &str, length: Option<usize>) -> Result<SqlType> {
        match name {
            "INTEGER" => Ok(SqlType::Integer),
            "BIGINT" => Ok(SqlType::BigInt),
            "VARCHAR" => Ok(SqlType::Varchar(length.unwrap_or(255))),
            "TEXT" => Ok(SqlType::Text),
            "DATE" => Ok(SqlType::Date),
            other => Err(anyhow!("unknown column type in catalog: {other}")),
        }
    }
}

/// One column as recorded in the durable catalog.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub sql_type: SqlType,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Destination for induced tables and mapped rows.
///
/// Implementations own DDL generation, escaping, and batching. A write
/// failure is fatal for the batch; the sink does not retry.
pub trait RowSink {
    /// Create `table` with the given columns, dropping any previous version.
    fn create_table(
        &mut self,
        table: &str,
        columns: &[FieldInfo],
        primary_key: &[String],
    ) -> Result<()>;

    /// Insert a single row. Fields absent from the row are stored as NULL.
    fn insert_row(&mut self, table: &str, row: &RowValues) -> Result<()>;

    /// Insert a batch of uniform rows.
    fn insert_rows(&mut self, table: &str, rows: &[RowValues]) -> Result<()> {
        for row in rows {
            self.insert_row(table, row)?;
        }
        Ok(())
    }

    /// Delete all rows matching the composite identifier from every listed table.
    fn delete_for_key(&mut self, tables: &[String], pmid: &str, version: &str) -> Result<()>;

    /// Whether a row with the composite identifier exists in `table`.
    fn exists(&self, table: &str, pmid: &str, version: &str) -> Result<bool>;

    /// All tables known to the catalog, in logical (unabbreviated) names.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Column metadata for one table, used by the mapper for validation.
    fn column_catalog(&self, table: &str) -> Result<Vec<FieldInfo>>;

    /// Start buffering writes; a no-op for unbatched sinks.
    fn begin_batch(&mut self) -> Result<()> {
        Ok(())
    }

    /// Flush buffered writes. Failure aborts the batch.
    fn commit_batch(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink used by engine tests and as a reference implementation
/// of the contract.
#[derive(Debug, Default)]
pub struct MemSink {
    tables: BTreeMap<String, MemTable>,
}

#[derive(Debug, Default)]
pub struct MemTable {
    pub columns: Vec<FieldInfo>,
    pub primary_key: Vec<String>,
    pub rows: Vec<RowValues>,
}

impl MemSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&MemTable> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn rows(&self, table: &str) -> &[RowValues] {
        self.table(table).map(|t| t.rows.as_slice()).unwrap_or(&[])
    }
}

fn key_matches(row: &RowValues, pmid: &str, version: &str) -> bool {
    let get = |name: &str| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };
    get("PMID") == Some(pmid) && get("PMID_Version") == Some(version)
}

impl RowSink for MemSink {
    fn create_table(
        &mut self,
        table: &str,
        columns: &[FieldInfo],
        primary_key: &[String],
    ) -> Result<()> {
        self.tables.insert(
            table.to_lowercase(),
            MemTable {
                columns: columns.to_vec(),
                primary_key: primary_key.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn insert_row(&mut self, table: &str, row: &RowValues) -> Result<()> {
        let t = self
            .tables
            .get_mut(&table.to_lowercase())
            .ok_or_else(|| anyhow!("no such table: {table}"))?;
        t.rows.push(row.clone());
        Ok(())
    }

    fn delete_for_key(&mut self, tables: &[String], pmid: &str, version: &str) -> Result<()> {
        for table in tables {
            if let Some(t) = self.tables.get_mut(&table.to_lowercase()) {
                t.rows.retain(|row| !key_matches(row, pmid, version));
            }
        }
        Ok(())
    }

    fn exists(&self, table: &str, pmid: &str, version: &str) -> Result<bool> {
        Ok(self
            .rows(table)
            .iter()
            .any(|row| key_matches(row, pmid, version)))
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn column_catalog(&self, table: &str) -> Result<Vec<FieldInfo>> {
        self.table(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| anyhow!("no such table: {table}"))
    }
}
