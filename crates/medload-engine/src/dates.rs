//! Best-effort publication date per citation.
//!
//! Dates in citation records are scattered and messy: a structured
//! ArticleDate when present, otherwise the journal issue's PubDate, which
//! may itself degrade to a free-text MedlineDate. Missing parts default to
//! the first month or day. Records without a recoverable year get no row.

use anyhow::Result;
use chrono::NaiveDate;
use log::warn;

use medload_core::{Element, FieldInfo, RowSink, SqlType};

use crate::mapper::CitationMapper;

/// Table holding one date per citation.
pub const TABLE: &str = "pmid_to_date";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn create_table(sink: &mut dyn RowSink) -> Result<()> {
    let columns = [
        FieldInfo::new("pmid", SqlType::Integer),
        FieldInfo::new("pmid_version", SqlType::Integer),
        FieldInfo::new("date", SqlType::Date),
    ];
    sink.create_table(
        TABLE,
        &columns,
        &["pmid".to_string(), "pmid_version".to_string()],
    )
}

/// Derive the citation's date and store it. Returns quietly when no date
/// can be reconstructed.
pub fn insert_date(citation: &Element, overwrite: bool, sink: &mut dyn RowSink) -> Result<()> {
    let (pmid, version) = CitationMapper::identifier(citation)?;
    if sink.exists(TABLE, &pmid, &version)? {
        if overwrite {
            sink.delete_for_key(&[TABLE.to_string()], &pmid, &version)?;
        } else {
            return Ok(());
        }
    }

    let Some(date) = derive_date(citation) else {
        warn!("No date could be derived for PMID {pmid}");
        return Ok(());
    };

    let mut row = medload_core::RowValues::new();
    row.insert("pmid".to_string(), pmid);
    row.insert("pmid_version".to_string(), version);
    row.insert("date".to_string(), date.format("%Y-%m-%d").to_string());
    sink.insert_row(TABLE, &row)
}

fn derive_date(citation: &Element) -> Option<NaiveDate> {
    let article = citation.find_child("Article");
    let article_date = article.and_then(|a| a.find_child("ArticleDate"));
    let pub_date = article
        .and_then(|a| a.find_child("Journal"))
        .and_then(|j| j.find_child("JournalIssue"))
        .and_then(|i| i.find_child("PubDate"));
    let medline_date = pub_date
        .and_then(|p| p.find_child("MedlineDate"))
        .map(|m| m.deep_text());

    let year: i32 = child_text(article_date, "Year")
        .and_then(|y| y.parse().ok())
        .or_else(|| child_text(pub_date, "Year").and_then(|y| y.parse().ok()))
        .or_else(|| medline_date.as_deref().and_then(find_year))?;

    let month = match child_text(article_date, "Month")
        .or_else(|| child_text(pub_date, "Month"))
    {
        // An explicit month that cannot be read means the record's date is
        // not trustworthy; give up rather than guess.
        Some(m) => parse_month(&m)?,
        None => medline_date
            .as_deref()
            .and_then(find_month_name)
            .unwrap_or(1),
    };

    let day = child_text(article_date, "Day")
        .or_else(|| child_text(pub_date, "Day"))
        .and_then(|d| d.parse().ok())
        .unwrap_or(1);

    NaiveDate::from_ymd_opt(year, month, day)
}

fn child_text(el: Option<&Element>, name: &str) -> Option<String> {
    let text = el?.find_child(name)?.deep_text();
    if text.is_empty() { None } else { Some(text) }
}

/// A month given either as a number or as an English three-letter name.
fn parse_month(value: &str) -> Option<u32> {
    if let Ok(n) = value.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = value.get(0..3)?;
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(prefix))
        .map(|i| i as u32 + 1)
}

/// First plausible four-digit year (19xx or 20xx) in free text.
fn find_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    for window in bytes.windows(4) {
        let century = matches!((window[0], window[1]), (b'1', b'9') | (b'2', b'0'));
        if century && window[2].is_ascii_digit() && window[3].is_ascii_digit() {
            let year = (window[0] - b'0') as i32 * 1000
                + (window[1] - b'0') as i32 * 100
                + (window[2] - b'0') as i32 * 10
                + (window[3] - b'0') as i32;
            return Some(year);
        }
    }
    None
}

fn find_month_name(text: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| text.contains(m))
        .map(|i| i as u32 + 1)
}
