//! Streaming parser for the supplementary MeSH concept file.
//!
//! Supplementary records land in the same `mesh_term` table with
//! `supplement = 1`, plus "Maps to" and "Pharmacological action" rows in
//! `mesh_relationship`.

use std::io::BufRead;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use medload_core::{RowSink, RowValues};

use crate::table::TableBuffer;

const RECORD: &str = "SupplementalRecordSet.SupplementalRecord";

pub fn parse_supplement<R: BufRead>(
    input: R,
    terms: &mut TableBuffer,
    relationships: &mut TableBuffer,
    sink: &mut dyn RowSink,
) -> Result<()> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut trace = crate::trace::Trace::default();
    let mut text = String::new();
    let mut row = RowValues::new();
    let mut record_name = String::new();
    let mut ui = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("XML parse error in MeSH supplement file")?
        {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "SupplementalRecord" {
                    row = RowValues::new();
                    record_name.clear();
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
                    "SupplementalRecordSet.SupplementalRecord.SupplementalRecordUI" => {
                        ui = text.trim().to_string();
                        row.insert("ui".to_string(), ui.clone());
                    }
                    "SupplementalRecordSet.SupplementalRecord.SupplementalRecordName.String" => {
                        if !record_name.is_empty() {
                            record_name.push(' ');
                        }
                        record_name.push_str(text.trim());
                    }
                    "SupplementalRecordSet.SupplementalRecord.HeadingMappedToList.HeadingMappedTo.DescriptorReferredTo.DescriptorUI" => {
                        let mut rel = RowValues::new();
                        rel.insert("ui_1".to_string(), ui.clone());
                        // Starred UIs mark major headings; the star is not
                        // part of the identifier.
                        rel.insert("ui_2".to_string(), text.trim().replace('*', ""));
                        rel.insert("relationship_id".to_string(), "Maps to".to_string());
                        relationships.write(rel, sink)?;
                    }
                    "SupplementalRecordSet.SupplementalRecord.PharmacologicalActionList.PharmacologicalAction.DescriptorReferredTo.DescriptorUI" => {
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
                        row.insert("name".to_string(), std::mem::take(&mut record_name));
                        row.insert("supplement".to_string(), "1".to_string());
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

    const SAMPLE: &str = "<SupplementalRecordSet>\
        <SupplementalRecord>\
        <SupplementalRecordUI>C000002</SupplementalRecordUI>\
        <SupplementalRecordName><String>bevonium</String></SupplementalRecordName>\
        <HeadingMappedToList><HeadingMappedTo>\
        <DescriptorReferredTo><DescriptorUI>*D001561</DescriptorUI></DescriptorReferredTo>\
        </HeadingMappedTo></HeadingMappedToList>\
        </SupplementalRecord>\
        </SupplementalRecordSet>";

    #[test]
    fn supplement_rows_are_flagged_and_mapped() {
        let mut sink = MemSink::new();
        let mut terms = TableBuffer::new("mesh_term");
        let mut rels = TableBuffer::new("mesh_relationship");
        parse_supplement(SAMPLE.as_bytes(), &mut terms, &mut rels, &mut sink).unwrap();
        terms.close(&mut sink).unwrap();
        rels.close(&mut sink).unwrap();

        let rows = sink.rows("mesh_term");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ui"], "C000002");
        assert_eq!(rows[0]["name"], "bevonium");
        assert_eq!(rows[0]["supplement"], "1");

        let rels = sink.rows("mesh_relationship");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0]["ui_2"], "D001561");
        assert_eq!(rels[0]["relationship_id"], "Maps to");
    }
}
