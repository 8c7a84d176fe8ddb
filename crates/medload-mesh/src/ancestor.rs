//! Transitive closure of the MeSH tree.
//!
//! A descriptor can sit at several places in the tree, so a pair of terms
//! may be connected along routes of different lengths; both the shortest
//! and the longest are kept.

use anyhow::Result;
use rustc_hash::FxHashMap;

use medload_core::{RowSink, RowValues};

use crate::table::TableBuffer;

pub fn write_ancestors(
    tree_number_to_ui: &FxHashMap<String, String>,
    out: &mut TableBuffer,
    sink: &mut dyn RowSink,
) -> Result<()> {
    // (descendant, ancestor) to (min, max) route length.
    let mut pairs: FxHashMap<(String, String), (usize, usize)> = FxHashMap::default();
    for (tree_number, descendant) in tree_number_to_ui {
        let parts: Vec<&str> = tree_number.split('.').collect();
        for i in 0..parts.len() {
            let distance = parts.len() - i - 1;
            let prefix = parts[..=i].join(".");
            let Some(ancestor) = tree_number_to_ui.get(&prefix) else {
                continue;
            };
            let entry = pairs
                .entry((descendant.clone(), ancestor.clone()))
                .or_insert((distance, distance));
            if distance < entry.0 {
                entry.0 = distance;
            }
            if distance > entry.1 {
                entry.1 = distance;
            }
        }
    }

    for ((descendant, ancestor), (min, max)) in pairs {
        let mut row = RowValues::new();
        row.insert("ancestor_ui".to_string(), ancestor);
        row.insert("descendant_ui".to_string(), descendant);
        row.insert("min_distance".to_string(), min.to_string());
        row.insert("max_distance".to_string(), max.to_string());
        out.write(row, sink)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medload_core::MemSink;

    fn index(entries: &[(&str, &str)]) -> FxHashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn pair<'a>(
        rows: &'a [RowValues],
        descendant: &str,
        ancestor: &str,
    ) -> &'a RowValues {
        rows.iter()
            .find(|r| r["descendant_ui"] == descendant && r["ancestor_ui"] == ancestor)
            .unwrap()
    }

    #[test]
    fn distances_cover_all_routes() {
        // D3 reaches D1 directly (C01.002 route) and via D2 (C01.001.002).
        let tree = index(&[
            ("C01", "D1"),
            ("C01.001", "D2"),
            ("C01.001.002", "D3"),
            ("C01.002", "D3"),
        ]);
        let mut sink = MemSink::new();
        let mut out = TableBuffer::new("mesh_ancestor");
        write_ancestors(&tree, &mut out, &mut sink).unwrap();
        out.close(&mut sink).unwrap();

        let rows = sink.rows("mesh_ancestor");
        let d3_d1 = pair(rows, "D3", "D1");
        assert_eq!(d3_d1["min_distance"], "1");
        assert_eq!(d3_d1["max_distance"], "2");
        let d3_d2 = pair(rows, "D3", "D2");
        assert_eq!(d3_d2["min_distance"], "1");
        assert_eq!(d3_d2["max_distance"], "1");
        // Self pairs at distance zero.
        assert_eq!(pair(rows, "D1", "D1")["min_distance"], "0");
    }

    #[test]
    fn unknown_prefixes_are_skipped() {
        // No record for C01, so D2 only pairs with itself.
        let tree = index(&[("C01.001", "D2")]);
        let mut sink = MemSink::new();
        let mut out = TableBuffer::new("mesh_ancestor");
        write_ancestors(&tree, &mut out, &mut sink).unwrap();
        out.close(&mut sink).unwrap();
        let rows = sink.rows("mesh_ancestor");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["descendant_ui"], "D2");
        assert_eq!(rows[0]["ancestor_ui"], "D2");
    }
}
