//! Streaming parser for the main MeSH descriptor file.
//!
//! Emits one `mesh_term` row per DescriptorRecord, a `mesh_relationship`
//! row per pharmacological action, and fills the tree number index used
//! later to derive the ancestor table.

use std::io::BufRead;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use rustc_hash::FxHashMap;

use medload_core::{RowSink, RowValues};

use crate::table::TableBuffer;

const RECORD: &str = "DescriptorRecordSet.DescriptorRecord";

pub fn parse_descriptors<R: BufRead>(
    input: R,
    terms: &mut TableBuffer,
    relationships: &mut TableBuffer,
    tree_number_to_ui: &mut FxHashMap<String, String>,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut trace = crate::trace::Trace::default();
    let mut text = String::new();
    let mut row = RowValues::new();
    let mut ui = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("XML parse error in MeSH descriptor file")?
        {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "DescriptorRecord" {
                    row = RowValues::new();
                    ui.clear();
                }
                trace.push(name);
                text.clear();
            }
            Event::Text(e) => {
                text.push_str(&e.unescape().context("text decode error")?);
            }
            Event::End(_) => {
                let path = trace.path();
                match path.as_str() {
                    "DescriptorRecordSet.DescriptorRecord.DescriptorUI" => {
                        ui = text.trim().to_string();
                        row.insert("ui".to_string(), ui.clone());
                    }
                    "DescriptorRecordSet.DescriptorRecord.DescriptorName.String" => {
                        row.insert("name".to_string(), text.trim().to_string());
                    }
                    "DescriptorRecordSet.DescriptorRecord.TreeNumberList.TreeNumber" => {
                        tree_number_to_ui.insert(text.trim().to_string(), ui.clone());
                    }
                    "DescriptorRecordSet.DescriptorRecord.PharmacologicalActionList.PharmacologicalAction.DescriptorReferredTo.DescriptorUI" => {
                        let mut rel = RowValues::new();
                        rel.insert("ui_1".to_string(), ui.clone());
                        rel.insert("ui_2".to_string(), text.trim().to_string());
                        rel.insert(
                            "relationship_id".to_string(),
                            "Pharmacological action".to_string(),
                        );
                        relationships.write(rel, sink)?;
                    }
                    RECORD => {
                        row.insert("supplement".to_string(), "0".to_string());
                        terms.write(std::mem::take(&mut row), sink)?;
                    }
                    _ => {}
                }
                trace.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medload_core::MemSink;

    const SAMPLE: &str = "<DescriptorRecordSet>\
        <DescriptorRecord>\
        <DescriptorUI>D000001</DescriptorUI>\
        <DescriptorName><String>Calcimycin</String></DescriptorName>\
        <TreeNumberList><TreeNumber>D03.633.100</TreeNumber></TreeNumberList>\
        <PharmacologicalActionList><PharmacologicalAction>\
        <DescriptorReferredTo><DescriptorUI>D000900</DescriptorUI></DescriptorReferredTo>\
        </PharmacologicalAction></PharmacologicalActionList>\
        </DescriptorRecord>\
        <DescriptorRecord>\
        <DescriptorUI>D000002</DescriptorUI>\
        <DescriptorName><String>Temefos</String></DescriptorName>\
        </DescriptorRecord>\
        </DescriptorRecordSet>";

    #[test]
    fn records_become_term_rows() {
        let mut sink = MemSink::new();
        let mut terms = TableBuffer::new("mesh_term");
        let mut rels = TableBuffer::new("mesh_relationship");
        let mut tree = FxHashMap::default();
        parse_descriptors(SAMPLE.as_bytes(), &mut terms, &mut rels, &mut tree, &mut sink)
            .unwrap();
        terms.close(&mut sink).unwrap();
        rels.close(&mut sink).unwrap();

        let rows = sink.rows("mesh_term");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ui"], "D000001");
        assert_eq!(rows[0]["name"], "Calcimycin");
        assert_eq!(rows[0]["supplement"], "0");
        assert_eq!(rows[1]["ui"], "D000002");

        assert_eq!(tree.get("D03.633.100").map(String::as_str), Some("D000001"));

        let rels = sink.rows("mesh_relationship");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0]["ui_1"], "D000001");
        assert_eq!(rels[0]["ui_2"], "D000900");
        assert_eq!(rels[0]["relationship_id"], "Pharmacological action");
    }
}
