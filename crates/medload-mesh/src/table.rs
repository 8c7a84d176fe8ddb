//! Buffered table writer with first-row schema inference.
//!
//! The vocabulary tables are small and flat, so the first row decides the
//! column set and types: INTEGER where the value parses as one, VARCHAR
//! otherwise. Rows are flushed in batches.

use anyhow::Result;

use medload_core::{FieldInfo, RowSink, RowValues, SqlType, is_integer};

const BATCH_SIZE: usize = 1000;
const TEXT_WIDTH: usize = 512;

pub struct TableBuffer {
    table: String,
    created: bool,
    rows: Vec<RowValues>,
}

impl TableBuffer {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            created: false,
            rows: Vec::new(),
        }
    }

    pub fn write(&mut self, row: RowValues, sink: &mut dyn RowSink) -> Result<()> {
        if !self.created {
            let columns: Vec<FieldInfo> = row
                .iter()
                .map(|(name, value)| {
                    let ty = if is_integer(value) {
                        SqlType::Integer
                    } else {
                        SqlType::Varchar(TEXT_WIDTH)
                    };
                    FieldInfo::new(name.clone(), ty)
                })
                .collect();
            sink.create_table(&self.table, &columns, &[])?;
            self.created = true;
        }
        self.rows.push(row);
        if self.rows.len() >= BATCH_SIZE {
            self.flush(sink)?;
        }
        Ok(())
    }

    fn flush(&mut self, sink: &mut dyn RowSink) -> Result<()> {
        sink.insert_rows(&self.table, &self.rows)?;
        self.rows.clear();
        Ok(())
    }

    /// Flush remaining rows. Must be called once writing is done.
    pub fn close(&mut self, sink: &mut dyn RowSink) -> Result<()> {
        if self.created {
            self.flush(sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medload_core::MemSink;

    fn row(ui: &str, supplement: &str) -> RowValues {
        let mut row = RowValues::new();
        row.insert("ui".into(), ui.into());
        row.insert("supplement".into(), supplement.into());
        row
    }

    #[test]
    fn first_row_decides_types() {
        let mut sink = MemSink::new();
        let mut buffer = TableBuffer::new("mesh_term");
        buffer.write(row("D000001", "0"), &mut sink).unwrap();
        buffer.close(&mut sink).unwrap();

        let table = sink.table("mesh_term").unwrap();
        let ui = table.columns.iter().find(|c| c.name == "ui").unwrap();
        assert_eq!(ui.sql_type, SqlType::Varchar(512));
        let supplement = table
            .columns
            .iter()
            .find(|c| c.name == "supplement")
            .unwrap();
        assert_eq!(supplement.sql_type, SqlType::Integer);
        assert_eq!(sink.rows("mesh_term").len(), 1);
    }

    #[test]
    fn batches_flush_at_threshold() {
        let mut sink = MemSink::new();
        let mut buffer = TableBuffer::new("mesh_term");
        for i in 0..BATCH_SIZE + 5 {
            buffer.write(row(&format!("D{i:06}"), "0"), &mut sink).unwrap();
        }
        // One full batch flushed, the remainder still buffered.
        assert_eq!(sink.rows("mesh_term").len(), BATCH_SIZE);
        buffer.close(&mut sink).unwrap();
        assert_eq!(sink.rows("mesh_term").len(), BATCH_SIZE + 5);
    }

    #[test]
    fn close_without_rows_creates_nothing() {
        let mut sink = MemSink::new();
        let mut buffer = TableBuffer::new("mesh_term");
        buffer.close(&mut sink).unwrap();
        assert!(sink.table("mesh_term").is_none());
    }
}
