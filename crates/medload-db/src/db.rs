//! DuckDB-backed row sink.
//!
//! Physical table and column names are abbreviated; the logical names and
//! the declared column types live in the `medload_columns` catalog table,
//! which is what the mapper reads back. DuckDB does not retain VARCHAR
//! lengths in its own metadata, so the catalog is authoritative.

use std::path::Path;

use anyhow::{Context, Result};
use duckdb::{Connection, params, params_from_iter};

use medload_core::{FieldInfo, RowSink, RowValues, SqlType};

use crate::abbrev::abbreviate;

const CATALOG_TABLE: &str = "medload_columns";

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {CATALOG_TABLE} (
                 table_name VARCHAR NOT NULL,
                 column_name VARCHAR NOT NULL,
                 sql_type VARCHAR NOT NULL,
                 max_length INTEGER
             )"
        ))
        .context("failed to create the column catalog")?;
        Ok(Self { conn })
    }

    /// Direct access for ad-hoc queries; the loading paths go through
    /// [`RowSink`].
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Row count of a table, by logical name.
    pub fn count(&self, table: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM \"{}\"", abbreviate(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    fn column_decl(column: &FieldInfo) -> String {
        let ty = match column.sql_type {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Date => "DATE".to_string(),
        };
        format!("\"{}\" {ty}", abbreviate(&column.name))
    }
}

impl RowSink for Db {
    fn create_table(
        &mut self,
        table: &str,
        columns: &[FieldInfo],
        primary_key: &[String],
    ) -> Result<()> {
        let physical = abbreviate(table);
        let mut parts: Vec<String> = columns.iter().map(Db::column_decl).collect();
        if !primary_key.is_empty() {
            let keys: Vec<String> = primary_key
                .iter()
                .map(|k| format!("\"{}\"", abbreviate(k)))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        self.conn
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS \"{physical}\";
                 CREATE TABLE \"{physical}\" ({});",
                parts.join(", ")
            ))
            .with_context(|| format!("failed to create table {table}"))?;
        log::debug!("Created table {table} as {physical}");

        self.conn.execute(
            &format!("DELETE FROM {CATALOG_TABLE} WHERE table_name = ?"),
            params![table],
        )?;
        let mut stmt = self
            .conn
            .prepare(&format!("INSERT INTO {CATALOG_TABLE} VALUES (?, ?, ?, ?)"))?;
        for column in columns {
            stmt.execute(params![
                table,
                column.name,
                column.sql_type.as_str(),
                column.sql_type.declared_length().map(|n| n as i64)
            ])?;
        }
        Ok(())
    }

    fn insert_row(&mut self, table: &str, row: &RowValues) -> Result<()> {
        if row.is_empty() {
            return Ok(());
        }
        let physical = abbreviate(table);
        let columns: Vec<String> = row
            .keys()
            .map(|k| format!("\"{}\"", abbreviate(k)))
            .collect();
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{physical}\" ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(row.values().map(String::as_str)))
            .with_context(|| format!("failed to insert into {table}"))?;
        Ok(())
    }

    fn insert_rows(&mut self, table: &str, rows: &[RowValues]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let physical = abbreviate(table);
        // Union of keys across the batch; absent fields become NULL.
        let names: Vec<&String> = rows
            .iter()
            .flat_map(|r| r.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<String> = names
            .iter()
            .map(|k| format!("\"{}\"", abbreviate(k)))
            .collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{physical}\" ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        for row in rows {
            let values = names.iter().map(|k| row.get(*k).map(String::as_str));
            stmt.execute(params_from_iter(values))
                .with_context(|| format!("failed to insert into {table}"))?;
        }
        Ok(())
    }

    fn delete_for_key(&mut self, tables: &[String], pmid: &str, version: &str) -> Result<()> {
        for table in tables {
            let physical = abbreviate(table);
            let mut stmt = self.conn.prepare_cached(&format!(
                "DELETE FROM \"{physical}\" WHERE pmid = ? AND pmid_version = ?"
            ))?;
            stmt.execute(params![pmid, version])
                .with_context(|| format!("failed to delete from {table}"))?;
        }
        Ok(())
    }

    fn exists(&self, table: &str, pmid: &str, version: &str) -> Result<bool> {
        let physical = abbreviate(table);
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT 1 FROM \"{physical}\" WHERE pmid = ? AND pmid_version = ? LIMIT 1"
        ))?;
        let mut rows = stmt.query(params![pmid, version])?;
        Ok(rows.next()?.is_some())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT table_name FROM {CATALOG_TABLE} ORDER BY table_name"
        ))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn column_catalog(&self, table: &str) -> Result<Vec<FieldInfo>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT column_name, sql_type, max_length FROM {CATALOG_TABLE}
             WHERE table_name = ? ORDER BY column_name"
        ))?;
        let rows = stmt
            .query_map(params![table], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(name, ty, len)| {
                let sql_type = SqlType::parse(&ty, len.map(|n| n as usize))?;
                Ok(FieldInfo::new(name, sql_type))
            })
            .collect()
    }

    fn begin_batch(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .context("failed to begin transaction")
    }

    fn commit_batch(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("failed to commit transaction")
    }
}
