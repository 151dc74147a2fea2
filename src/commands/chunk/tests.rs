use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::*;

const SAMPLE_PAGES: [&str; 2] = [
    "HOUSING MAINTENANCE CODE
SUBCHAPTER 1

GENERAL PROVISIONS
ARTICLE 1 - Short Title and Definitions
§ 27-2001 Short title. This chapter shall be known as the housing maintenance code.
§ 27-2004 Definitions. a. When used in this chapter the term dwelling is defined in section 27-2001.",
    "SUBCHAPTER 2 - Maintenance, Services and Utilities
ARTICLE 1
Responsibilities of Owners
§ 27-2005 Duties of owner. a. The owner of a multiple dwelling shall keep the premises in good repair.
See § 27-2004 and § 27-2004 for definitions. Also 27-2005 itself.
§ 27-2006 Heat. The owner shall supply heat as required by § 27-9999.",
];

fn grammar() -> HmcGrammar {
    HmcGrammar::new().expect("grammar should compile")
}

fn document(pages: &[&str]) -> ExtractedDocument {
    let pages = pages
        .iter()
        .map(|page| page.to_string())
        .collect::<Vec<String>>();
    document_from_pages(&pages, 0)
}

fn pipeline(pages: &[&str]) -> PipelineOutcome {
    run_pipeline(
        &document(pages),
        &grammar(),
        &ExportSettings::default(),
        "test-digest",
    )
}

fn record<'a>(outcome: &'a PipelineOutcome, chunk_id: &str) -> &'a ExportRecord {
    outcome
        .records
        .iter()
        .find(|record| record.chunk_id == chunk_id)
        .unwrap_or_else(|| panic!("missing record {chunk_id}"))
}

fn issue_kinds(outcome: &PipelineOutcome) -> Vec<IssueKind> {
    outcome.report.issues.iter().map(|issue| issue.kind).collect()
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let dirs = ChunkType::ALL
        .into_iter()
        .map(ChunkType::dir_name)
        .chain(["metadata"]);
    for dir in dirs {
        for entry in fs::read_dir(root.join(dir)).expect("list export dir") {
            let path = entry.expect("dir entry").path();
            let bytes = fs::read(&path).expect("read export file");
            files.insert(path.strip_prefix(root).expect("relative").to_path_buf(), bytes);
        }
    }
    files
}

#[test]
fn subchapter_title_on_following_line_is_consumed() {
    let lines = document(&[
        "SUBCHAPTER 3\n\nPHYSICAL AND OCCUPANCY STANDARDS FOR DWELLING UNITS\nARTICLE 1 - Light",
    ])
    .lines;
    let scan = detect_structure(&lines, &grammar());

    assert_eq!(scan.headings.len(), 2);
    let subchapter = &scan.headings[0];
    assert_eq!(subchapter.kind, ChunkType::Subchapter);
    assert_eq!(subchapter.identifier, "3");
    assert_eq!(
        subchapter.title,
        "PHYSICAL AND OCCUPANCY STANDARDS FOR DWELLING UNITS"
    );
    assert_eq!(subchapter.title_line_index, Some(2));
    assert!(scan.body.is_empty());
    assert_eq!(scan.blank_line_count, 1);
}

#[test]
fn heading_never_takes_another_heading_as_title() {
    let lines = document(&["SUBCHAPTER 4\nARTICLE 1 - Heat"]).lines;
    let scan = detect_structure(&lines, &grammar());

    assert_eq!(scan.headings.len(), 2);
    assert_eq!(scan.headings[0].title, "");
    assert_eq!(scan.headings[1].kind, ChunkType::Article);
    assert_eq!(scan.headings[1].title, "Heat");
}

#[test]
fn prose_mentions_and_contents_lines_stay_body() {
    let lines = document(&[
        "SUBCHAPTER 1 ........ 5\nas required by article 4 of subchapter 2\nThe provisions of § 27-2004 apply.",
    ])
    .lines;
    let scan = detect_structure(&lines, &grammar());

    assert!(scan.headings.is_empty());
    assert_eq!(scan.body.len(), 3);
}

const WRAPPED_CITATION_PAGE: &str = "SUBCHAPTER 1 - Physical Standards
ARTICLE 1 - Painting
§27–2013 Painting. The owner shall paint as provided in
§ 27-2017 of this article and every three years thereafter.
§§ 27-2014 and 27-2017 apply here.
§ 27-2014 Cleaning. Public parts shall be kept clean.
§ 27-2017 Registration. Owners shall register.";

#[test]
fn body_lines_opening_with_a_citation_stay_body() {
    let lines = document(&[WRAPPED_CITATION_PAGE]).lines;
    let scan = detect_structure(&lines, &grammar());

    let sections = scan
        .headings
        .iter()
        .filter(|heading| heading.kind == ChunkType::Section)
        .map(|heading| heading.identifier.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(sections, vec!["27-2013", "27-2014", "27-2017"]);
    assert_eq!(scan.body.len(), 2);
    assert!(scan.body[0].text.starts_with("§ 27-2017 of this article"));
}

#[test]
fn wrapped_citation_is_recorded_as_cross_reference() {
    let outcome = pipeline(&[WRAPPED_CITATION_PAGE]);

    assert_eq!(outcome.report.counts.section_records, 3);
    assert!(outcome
        .records
        .iter()
        .all(|record| record.chunk_id != "section_27_2017_2"));
    assert!(record(&outcome, "section_27_2013")
        .content
        .contains("§ 27-2017 of this article and every three years thereafter."));

    let map = &outcome.cross_references;
    assert_eq!(map["27-2013"].outgoing, vec!["27-2014", "27-2017"]);
    assert_eq!(map["27-2017"].incoming, vec!["27-2013"]);
    assert_eq!(
        record(&outcome, "section_27_2013").cross_references,
        vec!["27-2014", "27-2017"]
    );
    assert!(outcome.report.issues.is_empty());
}

#[test]
fn page_ranges_widen_to_cover_descendants() {
    let outcome = pipeline(&[
        "SUBCHAPTER 1 - General\nARTICLE 1 - Scope",
        "§ 27-2001 Short title. Text.",
        "More text of the short title section.",
    ]);

    assert_eq!(record(&outcome, "section_27_2001").page_numbers, vec![2, 3]);
    assert_eq!(record(&outcome, "article_1_1").page_numbers, vec![1, 2, 3]);
    assert_eq!(record(&outcome, "subchapter_1").page_numbers, vec![1, 2, 3]);
}

#[test]
fn tree_index_resolves_ancestors_root_first() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let index = outcome.tree.index();

    let section = index.get("section_27_2006").expect("indexed section");
    let ancestors = index
        .ancestors(section)
        .into_iter()
        .map(|node| node.id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(ancestors, vec!["subchapter_2", "article_2_1"]);
    assert!(index.ancestors(index.get("subchapter_1").expect("root")).is_empty());
    assert!(index.get("section_27_9999").is_none());
}

#[test]
fn one_subchapter_record_per_subchapter_heading() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let counts = &outcome.report.counts;

    assert_eq!(counts.subchapter_headings, 2);
    assert_eq!(counts.subchapter_records, counts.subchapter_headings);
    assert_eq!(counts.article_records, 2);
    assert_eq!(counts.section_records, 4);
    assert_eq!(outcome.structure_map.roots, vec!["subchapter_1", "subchapter_2"]);
    assert!(outcome.report.trusted);
}

#[test]
fn section_parent_chain_runs_through_article_and_subchapter() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let section = record(&outcome, "section_27_2005");

    assert_eq!(section.parent_chunks, vec!["subchapter_2", "article_2_1"]);
    assert_eq!(section.hierarchy.title, "27");
    assert_eq!(section.hierarchy.chapter, "2");
    assert_eq!(section.hierarchy.subchapter.as_deref(), Some("2"));
    assert_eq!(section.hierarchy.article.as_deref(), Some("1"));
    assert_eq!(section.hierarchy.section.as_deref(), Some("27-2005"));
    assert_eq!(section.title, "§ 27-2005 - Duties of owner");
    assert_eq!(section.page_numbers, vec![2]);

    let article = record(&outcome, "article_2_1");
    assert_eq!(article.parent_chunks, vec!["subchapter_2"]);
    assert_eq!(article.title, "Article 1 - Responsibilities of Owners");
    assert!(record(&outcome, "subchapter_1").parent_chunks.is_empty());
}

#[test]
fn article_content_contains_its_sections_in_order() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let article = record(&outcome, "article_2_1");
    let first = record(&outcome, "section_27_2005");
    let second = record(&outcome, "section_27_2006");

    let first_at = article
        .content
        .find(&first.content)
        .expect("first section content inside article");
    let second_at = article
        .content
        .find(&second.content)
        .expect("second section content inside article");
    assert!(first_at < second_at);
    assert!(article.content.starts_with("§ 27-2005 - Duties of owner\n"));

    let subchapter = record(&outcome, "subchapter_2");
    assert!(subchapter.content.contains(&article.content));
}

#[test]
fn records_carry_length_and_token_estimates() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let section = record(&outcome, "section_27_2001");

    assert_eq!(
        section.content,
        "This chapter shall be known as the housing maintenance code."
    );
    assert_eq!(section.content_length, section.content.chars().count());
    assert_eq!(section.token_estimate, section.content_length / 4);
}

#[test]
fn every_body_line_lands_in_exactly_one_place() {
    let outcome = pipeline(&SAMPLE_PAGES);
    let counts = &outcome.report.counts;
    let node_lines = outcome
        .tree
        .nodes()
        .iter()
        .map(|node| node.body_text.lines().count())
        .sum::<usize>();

    assert_eq!(counts.preamble_line_count, 1);
    assert_eq!(outcome.tree.preamble, "HOUSING MAINTENANCE CODE");
    // Four section headings carry their first paragraph on the heading line.
    assert_eq!(node_lines + counts.preamble_line_count, counts.body_line_count + 4);
}

#[test]
fn citations_are_deduplicated_and_skip_self_references() {
    let outcome = pipeline(&SAMPLE_PAGES);

    assert_eq!(
        record(&outcome, "section_27_2005").cross_references,
        vec!["27-2004"]
    );

    let map = &outcome.cross_references;
    assert_eq!(map["27-2005"].outgoing, vec!["27-2004"]);
    assert_eq!(map["27-2004"].incoming, vec!["27-2005"]);
    assert_eq!(map["27-2004"].outgoing, vec!["27-2001"]);
    assert_eq!(map["27-2001"].incoming, vec!["27-2004"]);
    assert!(map["27-2005"].incoming.is_empty());
    assert!(map.contains_key("subchapter_1"));
}

#[test]
fn repeated_citation_is_recorded_once() {
    let outcome = pipeline(&[
        "SUBCHAPTER 3\n\nPHYSICAL AND OCCUPANCY STANDARDS FOR DWELLING UNITS
ARTICLE 1 - Light and Ventilation
§ 27-2013 Painting. Walls shall be painted as provided in § 27-2017 and again as provided in § 27-2017.
§ 27-2017 Registration. Owners shall register.",
    ]);

    let subchapter = &outcome.tree.children[0];
    assert_eq!(subchapter.identifier, "3");
    assert_eq!(
        subchapter.title,
        "PHYSICAL AND OCCUPANCY STANDARDS FOR DWELLING UNITS"
    );
    assert_eq!(outcome.cross_references["27-2013"].outgoing, vec!["27-2017"]);
    assert_eq!(outcome.report.counts.cross_references, 1);
}

#[test]
fn unknown_citation_targets_are_dangling() {
    let outcome = pipeline(&SAMPLE_PAGES);

    assert_eq!(outcome.cross_references["27-2006"].unresolved, vec!["27-9999"]);
    assert!(outcome.cross_references["27-2006"].outgoing.is_empty());
    assert_eq!(outcome.report.counts.dangling_references, 1);
    assert_eq!(issue_kinds(&outcome), vec![IssueKind::DanglingReference]);
    assert!(outcome.report.trusted);
}

#[test]
fn section_without_article_is_filed_under_unfiled_article() {
    let outcome = pipeline(&["SUBCHAPTER 1 - General\n§ 27-2001 Short title. Text."]);

    let section = record(&outcome, "section_27_2001");
    assert_eq!(section.parent_chunks, vec!["subchapter_1", "article_1_unfiled"]);
    let unfiled = record(&outcome, "article_1_unfiled");
    assert_eq!(unfiled.title, "Article unfiled - Unfiled sections");
    assert_eq!(outcome.report.counts.synthetic_articles, 1);
    assert_eq!(issue_kinds(&outcome), vec![IssueKind::OrphanSection]);
    assert!(outcome.report.trusted);
}

#[test]
fn section_before_any_subchapter_goes_to_root() {
    let outcome = pipeline(&[
        "§ 27-2001 Short title. Text.\nSUBCHAPTER 1 - General\nARTICLE 1 - Definitions\n§ 27-2002 Scope. Text.",
    ]);

    assert_eq!(outcome.tree.children[0].id, "section_27_2001");
    assert!(record(&outcome, "section_27_2001").parent_chunks.is_empty());
    assert!(issue_kinds(&outcome).contains(&IssueKind::OrphanSection));
}

#[test]
fn empty_subchapter_is_flagged() {
    let outcome = pipeline(&[
        "SUBCHAPTER 1 - Reserved\nSUBCHAPTER 2 - Services\nARTICLE 1 - Heat\n§ 27-2001 Heat. Text.",
    ]);

    let empty = outcome
        .report
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::EmptySubchapter)
        .expect("empty subchapter issue");
    assert_eq!(empty.chunk_id.as_deref(), Some("subchapter_1"));
    assert_eq!(empty.severity, Severity::Warning);
}

#[test]
fn zero_subchapters_marks_run_untrusted() {
    let outcome = pipeline(&["ARTICLE 1 - Definitions\n§ 27-2001 Short title. Text."]);

    assert!(!outcome.report.trusted);
    assert_eq!(outcome.report.error_count(), 1);
    assert_eq!(outcome.report.issues[0].kind, IssueKind::ZeroSubchapters);
    assert!(issue_kinds(&outcome).contains(&IssueKind::OrphanArticle));
    assert_eq!(outcome.records.len(), 2);
}

#[test]
fn out_of_order_subchapter_numerals_warn() {
    let outcome = pipeline(&[
        "SUBCHAPTER 2 - Services\nARTICLE 1 - Heat\n§ 27-2001 Heat. Text.
SUBCHAPTER I - General\nARTICLE 1 - Scope\n§ 27-2002 Scope. Text.",
    ]);

    let warning = outcome
        .report
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::NonMonotonicNumeral)
        .expect("non-monotonic issue");
    assert_eq!(warning.chunk_id.as_deref(), Some("subchapter_i"));
    assert!(outcome.report.trusted);
}

#[test]
fn duplicate_identifiers_get_suffixed_ids() {
    let outcome = pipeline(&[
        "SUBCHAPTER 1 - General\nARTICLE 1 - Scope\n§ 27-2001 Scope. One.\n§ 27-2001 Scope. Two.",
    ]);

    assert_eq!(record(&outcome, "section_27_2001").content, "One.");
    assert_eq!(record(&outcome, "section_27_2001_2").content, "Two.");
    assert!(issue_kinds(&outcome).contains(&IssueKind::DuplicateIdentifier));
}

#[test]
fn re_export_is_byte_identical_and_drops_stale_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();

    write_export(root, &pipeline(&SAMPLE_PAGES)).expect("first export");
    let first = snapshot(root);
    assert!(first.contains_key(&PathBuf::from("metadata/cross_references.json")));
    assert!(first.contains_key(&PathBuf::from("sections/section_27_2005.json")));

    fs::write(root.join("sections").join("stale.json"), b"{}").expect("stale file");
    let written = write_export(root, &pipeline(&SAMPLE_PAGES)).expect("second export");

    assert_eq!(snapshot(root), first);
    assert_eq!(written, 8 + 3);
}

#[test]
fn keywords_put_glossary_terms_first() {
    let keywords = extract_keywords(
        "§ 27-2031 - Heat",
        "The owner shall supply heat and hot water to every tenant.",
        &BTreeSet::new(),
        12,
    );
    assert_eq!(
        keywords,
        vec!["heat", "hot", "hot water", "owner", "supply", "tenant", "water"]
    );

    let capped = extract_keywords(
        "§ 27-2031 - Heat",
        "The owner shall supply heat and hot water to every tenant.",
        &BTreeSet::new(),
        2,
    );
    assert_eq!(capped, vec!["heat", "hot water"]);
}

#[test]
fn cited_sections_become_keywords_outside_the_cap() {
    let cited = BTreeSet::from(["27-2029".to_string()]);
    let keywords = extract_keywords(
        "§ 27-2031 - Heat",
        "Heat shall be supplied as provided in section 27-2029.",
        &cited,
        1,
    );
    assert_eq!(keywords, vec!["heat", "section-27-2029"]);

    let outcome = pipeline(&SAMPLE_PAGES);
    let subchapter = record(&outcome, "subchapter_2");
    assert!(subchapter.keywords.contains(&"section-27-2004".to_string()));
    assert!(subchapter.keywords.contains(&"section-27-9999".to_string()));
    assert!(!subchapter.keywords.contains(&"section-27-2005".to_string()));
}

#[test]
fn token_estimate_uses_character_ratio() {
    assert_eq!(estimate_tokens("abcdefgh", 4), 2);
    assert_eq!(estimate_tokens("abcdefgh", 0), 8);
}

#[test]
fn running_headers_and_page_numbers_are_stripped() {
    let mut pages = (1..=4)
        .map(|page| format!("NYC Housing Maintenance Code\nBody text {page}.\nPage {page}"))
        .collect::<Vec<String>>();
    pages[2] = "SUBCHAPTER 2 - Services\nBody text 3.\nPage 3".to_string();

    let removed = strip_page_furniture(&mut pages, &grammar());

    assert_eq!(removed, 7);
    assert_eq!(pages[0], "Body text 1.");
    assert_eq!(pages[2], "SUBCHAPTER 2 - Services\nBody text 3.");
}
