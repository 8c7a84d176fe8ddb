//! Locating citation records and deletion directives inside a distribution
//! file, independent of the surrounding envelope (MedlineCitationSet,
//! PubmedArticleSet, or anything else).

use crate::path::{PMID, ROOT_TABLE};
use medload_core::Element;

/// All citation records in the document, in document order. Matching
/// elements are not searched for nested matches.
pub fn citations(root: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    collect(root, &mut out);
    out
}

fn collect<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    if el.name == ROOT_TABLE {
        out.push(el);
        return;
    }
    for child in el.child_elements() {
        collect(child, out);
    }
}

/// Identifiers listed under DeleteCitation directives: records the source
/// has retracted and that should be purged from the database.
pub fn deleted_identifiers(root: &Element) -> Vec<(String, String)> {
    let mut out = Vec::new();
    collect_deleted(root, &mut out);
    out
}

fn collect_deleted(el: &Element, out: &mut Vec<(String, String)>) {
    if el.name == "DeleteCitation" {
        for pmid in el.child_elements().filter(|c| c.name == PMID) {
            let id = pmid.deep_text();
            if !id.is_empty() {
                let version = pmid.attribute("Version").unwrap_or("1").to_string();
                out.push((id, version));
            }
        }
        return;
    }
    for child in el.child_elements() {
        collect_deleted(child, out);
    }
}
