//! Canonical naming for derived tables and fields.
//!
//! Every table and field name in the system is produced by the single
//! [`concat`] function over element-path segments, so the analyzer and the
//! mapper are guaranteed to compute identical names for identical XML
//! structures.

/// Root table; the citation root element name.
pub const ROOT_TABLE: &str = "MedlineCitation";
/// Composite key columns present on every table.
pub const PMID: &str = "PMID";
pub const PMID_VERSION: &str = "PMID_Version";
/// Suffix of the injected sibling-position columns.
pub const ORDER_SUFFIX: &str = "_Order";
/// Field name used for the text value of a table root element.
pub const VALUE_FIELD: &str = "Value";
/// Reserved-name renames applied on non-root tables.
pub const OTHER_PMID: &str = "Other_PMID";
pub const OTHER_PMID_VERSION: &str = "Other_PMID_Version";

/// Join two name segments with an underscore; an empty prefix yields the
/// suffix unchanged.
pub fn concat(pre: &str, post: &str) -> String {
    if pre.is_empty() {
        post.to_string()
    } else {
        format!("{pre}_{post}")
    }
}

/// Whether a derived name is usable as a column name: letters, digits and
/// underscore only. Empty names are legal (they become [`VALUE_FIELD`]).
pub fn is_legal_name(name: &str) -> bool {
    name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Element path relative to the current table root, canonicalized as
/// underscore-joined segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathName(String);

impl PathName {
    /// The empty path: the table root itself.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn child(&self, tag: &str) -> Self {
        Self(concat(&self.0, tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Field name for a value observed at this path; the table root's own
    /// value goes into the literal [`VALUE_FIELD`] column.
    pub fn field_name(&self) -> &str {
        if self.0.is_empty() {
            VALUE_FIELD
        } else {
            &self.0
        }
    }
}
