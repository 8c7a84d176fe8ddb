//! Analyze a small corpus, freeze the schema, and map records through a
//! fresh mapper built only from the sink's catalog.

use medload_core::{MemSink, parse_str};
use medload_engine::{CitationAnalyzer, CitationMapper, LoadMode, dates};

const REC_ONE: &str = "<MedlineCitation><PMID Version=\"1\">100</PMID>\
    <Article><ArticleTitle>First</ArticleTitle>\
    <AuthorList><Author><LastName>Solo</LastName></Author></AuthorList>\
    </Article></MedlineCitation>";

const REC_TWO: &str = "<MedlineCitation><PMID Version=\"1\">200</PMID>\
    <Article><ArticleTitle>Second</ArticleTitle>\
    <AuthorList>\
    <Author><LastName>Smith</LastName><Initials>A</Initials></Author>\
    <Author><LastName>Jones</LastName></Author>\
    </AuthorList>\
    <ArticleDate><Year>2015</Year><Month>6</Month><Day>1</Day></ArticleDate>\
    </Article></MedlineCitation>";

#[test]
fn corpus_to_rows() {
    let mut analyzer = CitationAnalyzer::new();
    analyzer.analyze(&parse_str(REC_ONE).unwrap());
    analyzer.analyze(&parse_str(REC_TWO).unwrap());
    let schema = analyzer.finish();

    let mut sink = MemSink::new();
    schema.create_tables(&mut sink).unwrap();
    dates::create_table(&mut sink).unwrap();

    // The mapper sees only what the sink's catalog retained.
    let mapper = CitationMapper::from_catalog(&sink, LoadMode::Overwrite).unwrap();
    for doc in [REC_ONE, REC_TWO] {
        let citation = parse_str(doc).unwrap();
        mapper.map_citation(&citation, &mut sink).unwrap();
        dates::insert_date(&citation, true, &mut sink).unwrap();
    }

    // Author was promoted by record two; record one's single author is
    // routed to the sub-table as well.
    let authors = sink.rows("medlinecitation_article_authorlist_author");
    assert_eq!(authors.len(), 3);
    let solo = authors.iter().find(|r| r["LastName"] == "Solo").unwrap();
    assert_eq!(solo["PMID"], "100");
    assert_eq!(solo["MedlineCitation_Article_AuthorList_Author_Order"], "1");
    let smith = authors.iter().find(|r| r["LastName"] == "Smith").unwrap();
    assert_eq!(smith["Initials"], "A");

    // Root rows no longer carry the flattened author fields.
    let roots = sink.rows("medlinecitation");
    assert_eq!(roots.len(), 2);
    for row in roots {
        assert!(!row.contains_key("Article_AuthorList_Author_LastName"));
    }

    // Only record two has a reconstructable date.
    let dates_rows = sink.rows(dates::TABLE);
    assert_eq!(dates_rows.len(), 1);
    assert_eq!(dates_rows[0]["pmid"], "200");
    assert_eq!(dates_rows[0]["date"], "2015-06-01");
}
