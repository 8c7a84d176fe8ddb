//! Abbreviation of physical identifiers.
//!
//! Induced names concatenate whole element paths and easily exceed what is
//! comfortable to type in SQL, so recurring long words are shortened in the
//! physical schema. The logical names stay in the catalog; only the DDL and
//! DML layer sees the abbreviated forms.

const REPLACEMENTS: [(&str, &str); 5] = [
    ("medlinecitation", "medcit"),
    ("article", "art"),
    ("investigator", "inv"),
    ("affiliation", "aff"),
    ("databank", "db"),
];

/// Physical identifier for a logical table or column name: lowercased,
/// with long recurring words shortened.
pub fn abbreviate(name: &str) -> String {
    let mut out = name.to_lowercase();
    for (from, to) in REPLACEMENTS {
        out = out.replace(from, to);
    }
    out
}
