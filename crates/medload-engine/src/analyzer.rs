//! Schema induction over a sample of citation records.
//!
//! The analyzer walks every record it is fed and accumulates, per table,
//! the set of fields seen and a [`FieldType`] per field. Repeated sibling
//! elements promote a path to its own table. [`CitationAnalyzer::finish`]
//! turns the accumulated state into an [`InducedSchema`].

use std::collections::BTreeMap;

use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};

use medload_core::{Element, FieldType};

use crate::path::{
    ORDER_SUFFIX, OTHER_PMID, OTHER_PMID_VERSION, PMID, PMID_VERSION, PathName, ROOT_TABLE,
    concat, is_legal_name,
};
use crate::schema::InducedSchema;

pub struct CitationAnalyzer {
    /// Table name to the set of field names observed in it.
    tables: FxHashMap<String, FxHashSet<String>>,
    /// Fully qualified field name (table_field) to its inferred type.
    types: FxHashMap<String, FieldType>,
}

impl Default for CitationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationAnalyzer {
    pub fn new() -> Self {
        let mut tables = FxHashMap::default();
        tables.insert(ROOT_TABLE.to_string(), FxHashSet::default());
        Self {
            tables,
            types: FxHashMap::default(),
        }
    }

    /// Fold one citation record into the accumulated schema.
    pub fn analyze(&mut self, citation: &Element) {
        self.analyze_node(citation, &PathName::root(), ROOT_TABLE);
    }

    fn analyze_node(&mut self, el: &Element, path: &PathName, table: &str) {
        for (attr, value) in &el.attributes {
            let field = concat(path.as_str(), attr);
            if is_legal_name(&field) {
                self.register(table, &field, value);
            } else {
                warn!("Skipping attribute with illegal name: {field}");
            }
        }

        if el.is_text_bearing() {
            self.register(table, path.field_name(), &el.deep_text());
            return;
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for child in el.child_elements() {
            let child_path = path.child(&child.name);
            if !is_legal_name(child_path.as_str()) {
                warn!("Skipping element with illegal name: {}", child_path.as_str());
                continue;
            }
            let sub_table = concat(table, child_path.as_str());
            if !seen.insert(child.name.as_str()) {
                // Second occurrence of the same tag under this parent:
                // the path gets its own table.
                self.tables.entry(sub_table.clone()).or_default();
                self.analyze_node(child, &PathName::root(), &sub_table);
            } else if self.tables.contains_key(&sub_table) {
                // Promoted by an earlier record; route even the first
                // occurrence there.
                self.analyze_node(child, &PathName::root(), &sub_table);
            } else {
                self.analyze_node(child, &child_path, table);
            }
        }
    }

    fn register(&mut self, table: &str, field: &str, value: &str) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(field.to_string());
        self.types
            .entry(concat(table, field))
            .or_default()
            .observe(value);
    }

    /// Finalize: remove fields that migrated into promoted tables, inject
    /// key columns, and freeze into an immutable schema.
    pub fn finish(mut self) -> InducedSchema {
        self.cleanup();
        self.add_keys();

        let mut out: BTreeMap<String, BTreeMap<String, FieldType>> = BTreeMap::new();
        for (table, fields) in &self.tables {
            let mut columns = BTreeMap::new();
            for field in fields {
                let ty = self
                    .types
                    .get(&concat(table, field))
                    .copied()
                    .unwrap_or_default();
                columns.insert(field.clone(), ty);
            }
            out.insert(table.clone(), columns);
        }
        InducedSchema::new(out)
    }

    /// A field whose qualified name falls under another table's name was
    /// registered before that path was promoted; its values now live in the
    /// promoted table. Matching is by plain name prefix across the
    /// accumulated table set.
    fn cleanup(&mut self) {
        let names: Vec<String> = self.tables.keys().cloned().collect();
        for table in &names {
            let fields = match self.tables.get(table) {
                Some(f) => f,
                None => continue,
            };
            let doomed: Vec<String> = fields
                .iter()
                .filter(|field| {
                    let qualified = concat(table, field);
                    names
                        .iter()
                        .any(|other| !table.starts_with(other.as_str()) && qualified.starts_with(other.as_str()))
                })
                .cloned()
                .collect();
            if doomed.is_empty() {
                continue;
            }
            if let Some(fields) = self.tables.get_mut(table) {
                for field in &doomed {
                    fields.remove(field);
                }
            }
            for field in &doomed {
                self.types.remove(&concat(table, field));
            }
        }
    }

    fn add_keys(&mut self) {
        let names: Vec<String> = self.tables.keys().cloned().collect();
        for table in &names {
            // Sibling-position columns of every ancestor table, found by
            // truncating the name at underscores.
            let mut order_fields: Vec<String> = Vec::new();
            let mut ancestor = table.clone();
            while let Some(idx) = ancestor.rfind('_') {
                ancestor.truncate(idx);
                if ancestor != ROOT_TABLE && self.tables.contains_key(&ancestor) {
                    order_fields.push(format!("{ancestor}{ORDER_SUFFIX}"));
                }
            }
            if table != ROOT_TABLE {
                order_fields.push(format!("{table}{ORDER_SUFFIX}"));

                // A sub-table may carry references to other citations; the
                // key column names are reserved for the owning record.
                self.rename_field(table, PMID, OTHER_PMID);
                self.rename_field(table, PMID_VERSION, OTHER_PMID_VERSION);
            }

            let Some(fields) = self.tables.get_mut(table) else {
                continue;
            };
            for order in order_fields {
                fields.insert(order.clone());
                self.types.insert(concat(table, &order), FieldType::new(true, 3));
            }
            fields.insert(PMID.to_string());
            self.types
                .insert(concat(table, PMID), FieldType::new(true, 8));
            fields.insert(PMID_VERSION.to_string());
            self.types
                .insert(concat(table, PMID_VERSION), FieldType::new(true, 1));
        }
    }

    fn rename_field(&mut self, table: &str, from: &str, to: &str) {
        let Some(fields) = self.tables.get_mut(table) else {
            return;
        };
        if fields.remove(from) {
            fields.insert(to.to_string());
            if let Some(ty) = self.types.remove(&concat(table, from)) {
                self.types.insert(concat(table, to), ty);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medload_core::parse_str;

    fn analyze_all(docs: &[&str]) -> InducedSchema {
        let mut analyzer = CitationAnalyzer::new();
        for doc in docs {
            analyzer.analyze(&parse_str(doc).unwrap());
        }
        analyzer.finish()
    }

    #[test]
    fn scalar_fields_land_in_root_table() {
        let schema = analyze_all(&[
            "<MedlineCitation><PMID Version=\"1\">123</PMID>\
             <Article><ArticleTitle>Hi</ArticleTitle></Article></MedlineCitation>",
        ]);
        let root = schema.fields(ROOT_TABLE).unwrap();
        assert!(root.contains_key("Article_ArticleTitle"));
        assert!(root.contains_key("PMID"));
        assert!(root.contains_key("PMID_Version"));
    }

    #[test]
    fn repeated_sibling_promotes_sub_table() {
        let schema = analyze_all(&[
            "<MedlineCitation><PMID Version=\"1\">1</PMID><AuthorList>\
             <Author><LastName>Smith</LastName></Author>\
             <Author><LastName>Jones</LastName></Author>\
             </AuthorList></MedlineCitation>",
        ]);
        let sub = schema
            .fields("MedlineCitation_AuthorList_Author")
            .unwrap();
        assert!(sub.contains_key("LastName"));
        assert!(sub.contains_key("MedlineCitation_AuthorList_Author_Order"));
        assert!(sub.contains_key("PMID"));
        // The first occurrence's fields were cleaned out of the root table.
        let root = schema.fields(ROOT_TABLE).unwrap();
        assert!(!root.contains_key("AuthorList_Author_LastName"));
    }

    #[test]
    fn promotion_carries_across_records() {
        // Record two repeats Keyword; record one's single Keyword must not
        // survive in the root table after cleanup.
        let schema = analyze_all(&[
            "<MedlineCitation><KeywordList><Keyword>a</Keyword></KeywordList></MedlineCitation>",
            "<MedlineCitation><KeywordList>\
             <Keyword>b</Keyword><Keyword>c</Keyword>\
             </KeywordList></MedlineCitation>",
        ]);
        assert!(schema.fields("MedlineCitation_KeywordList_Keyword").is_some());
        let root = schema.fields(ROOT_TABLE).unwrap();
        assert!(!root.contains_key("KeywordList_Keyword"));
    }

    #[test]
    fn promotion_is_order_insensitive() {
        let a = [
            "<MedlineCitation><L><X>1</X></L></MedlineCitation>",
            "<MedlineCitation><L><X>1</X><X>2</X></L></MedlineCitation>",
        ];
        let b = [a[1], a[0]];
        let left = analyze_all(&a);
        let right = analyze_all(&b);
        assert_eq!(
            left.table_names().collect::<Vec<_>>(),
            right.table_names().collect::<Vec<_>>()
        );
        assert_eq!(
            left.fields("MedlineCitation_L_X").unwrap().keys().collect::<Vec<_>>(),
            right.fields("MedlineCitation_L_X").unwrap().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn nested_sub_table_gets_ancestor_order_column() {
        let schema = analyze_all(&[
            "<MedlineCitation><AuthorList>\
             <Author><Aff>x</Aff><Aff>y</Aff></Author>\
             <Author><Aff>z</Aff></Author>\
             </AuthorList></MedlineCitation>",
        ]);
        let aff = schema
            .fields("MedlineCitation_AuthorList_Author_Aff")
            .unwrap();
        assert!(aff.contains_key("MedlineCitation_AuthorList_Author_Order"));
        assert!(aff.contains_key("MedlineCitation_AuthorList_Author_Aff_Order"));
    }

    #[test]
    fn pmid_reference_renamed_in_sub_table() {
        let schema = analyze_all(&[
            "<MedlineCitation><CommentsCorrectionsList>\
             <CommentsCorrections><PMID Version=\"1\">11</PMID></CommentsCorrections>\
             <CommentsCorrections><PMID Version=\"1\">12</PMID></CommentsCorrections>\
             </CommentsCorrectionsList></MedlineCitation>",
        ]);
        let sub = schema
            .fields("MedlineCitation_CommentsCorrectionsList_CommentsCorrections")
            .unwrap();
        assert!(sub.contains_key("Other_PMID"));
        assert!(sub.contains_key("Other_PMID_Version"));
        // Injected keys use the reserved names.
        assert!(sub.contains_key("PMID"));
        assert!(sub.contains_key("PMID_Version"));
    }

    #[test]
    fn field_types_widen_monotonically() {
        let schema = analyze_all(&[
            "<MedlineCitation><N>5</N></MedlineCitation>",
            "<MedlineCitation><N>notanumber</N></MedlineCitation>",
        ]);
        let root = schema.fields(ROOT_TABLE).unwrap();
        assert!(!root["N"].is_numeric);
        assert_eq!(root["N"].max_length, "notanumber".len());
    }

    #[test]
    fn text_bearing_element_keeps_attributes_but_not_children() {
        let schema = analyze_all(&[
            "<MedlineCitation><Abstract>\
             <AbstractText Label=\"BG\">text <i>markup</i></AbstractText>\
             </Abstract></MedlineCitation>",
        ]);
        let root = schema.fields(ROOT_TABLE).unwrap();
        assert!(root.contains_key("Abstract_AbstractText"));
        assert!(root.contains_key("Abstract_AbstractText_Label"));
        assert!(!root.contains_key("Abstract_AbstractText_i"));
    }
}
