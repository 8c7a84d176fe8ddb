//! Frozen result of schema induction.

use std::collections::BTreeMap;

use anyhow::Result;

use medload_core::{FieldInfo, FieldType, RowSink};

use crate::path::{ORDER_SUFFIX, PMID, PMID_VERSION};

/// The complete induced schema: tables and typed columns, in deterministic
/// (sorted) order. Produced once by the analyzer and written to a sink;
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InducedSchema {
    tables: BTreeMap<String, BTreeMap<String, FieldType>>,
}

impl InducedSchema {
    pub(crate) fn new(tables: BTreeMap<String, BTreeMap<String, FieldType>>) -> Self {
        Self { tables }
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn fields(&self, table: &str) -> Option<&BTreeMap<String, FieldType>> {
        self.tables.get(table)
    }

    /// Composite key of a table: the record identifier plus every
    /// sibling-position column.
    pub fn primary_key(&self, table: &str) -> Vec<String> {
        let mut key = vec![PMID.to_string(), PMID_VERSION.to_string()];
        if let Some(fields) = self.tables.get(table) {
            key.extend(
                fields
                    .keys()
                    .filter(|f| f.ends_with(ORDER_SUFFIX))
                    .cloned(),
            );
        }
        key
    }

    /// Create every table on the sink, columns in sorted order.
    pub fn create_tables(&self, sink: &mut dyn RowSink) -> Result<()> {
        for (table, fields) in &self.tables {
            let columns: Vec<FieldInfo> = fields
                .iter()
                .map(|(name, ty)| FieldInfo::new(name.clone(), ty.sql_type()))
                .collect();
            sink.create_table(table, &columns, &self.primary_key(table))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::CitationAnalyzer;
    use medload_core::{MemSink, SqlType, parse_str};

    #[test]
    fn primary_key_includes_order_columns() {
        let mut analyzer = CitationAnalyzer::new();
        analyzer.analyze(
            &parse_str(
                "<MedlineCitation><L><X>1</X><X>2</X></L></MedlineCitation>",
            )
            .unwrap(),
        );
        let schema = analyzer.finish();
        assert_eq!(
            schema.primary_key("MedlineCitation"),
            vec!["PMID".to_string(), "PMID_Version".to_string()]
        );
        assert_eq!(
            schema.primary_key("MedlineCitation_L_X"),
            vec![
                "PMID".to_string(),
                "PMID_Version".to_string(),
                "MedlineCitation_L_X_Order".to_string()
            ]
        );
    }

    #[test]
    fn create_tables_emits_typed_columns() {
        let mut analyzer = CitationAnalyzer::new();
        analyzer.analyze(
            &parse_str("<MedlineCitation><PMID Version=\"1\">42</PMID></MedlineCitation>")
                .unwrap(),
        );
        let schema = analyzer.finish();

        let mut sink = MemSink::new();
        schema.create_tables(&mut sink).unwrap();
        let table = sink.table("MedlineCitation").unwrap();
        let pmid = table.columns.iter().find(|c| c.name == "PMID").unwrap();
        assert_eq!(pmid.sql_type, SqlType::Integer);
        let version = table
            .columns
            .iter()
            .find(|c| c.name == "PMID_Version")
            .unwrap();
        assert_eq!(version.sql_type, SqlType::Integer);
    }
}
