use super::answer::{NO_MATCH_ANSWER, compose_answer, format_page_range};
use super::corpus::{Corpus, load_corpus};
use super::scoring::{ScoringWeights, rank_records, score_record};
use crate::model::{ChunkType, CrossReferenceEntry, CrossReferenceMap, ExportRecord, Hierarchy};
use crate::text::query_terms;
use crate::util::write_json_pretty;

fn record(
    chunk_id: &str,
    chunk_type: ChunkType,
    title: &str,
    content: &str,
    keywords: &[&str],
    first_page: u32,
) -> ExportRecord {
    let section = (chunk_type == ChunkType::Section)
        .then(|| chunk_id.trim_start_matches("section_").replacen('_', "-", 1));
    ExportRecord {
        chunk_id: chunk_id.to_string(),
        hierarchy: Hierarchy {
            title: "27".to_string(),
            chapter: "2".to_string(),
            subchapter: None,
            article: None,
            section,
        },
        title: title.to_string(),
        content: content.to_string(),
        page_numbers: vec![first_page],
        cross_references: Vec::new(),
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        chunk_type,
        parent_chunks: Vec::new(),
        content_length: content.chars().count(),
        token_estimate: content.chars().count() / 4,
    }
}

fn corpus(records: Vec<ExportRecord>) -> Corpus {
    Corpus {
        records,
        cross_references: CrossReferenceMap::new(),
    }
}

#[test]
fn title_match_outranks_body_only_match() {
    let records = vec![
        record(
            "section_27_2031",
            ChunkType::Section,
            "§ 27-2031 - Heat",
            "The owner shall provide heat to each dwelling.",
            &[],
            40,
        ),
        record(
            "subchapter_2",
            ChunkType::Subchapter,
            "Subchapter 2 - Owner responsibilities",
            "General duties.",
            &[],
            12,
        ),
    ];

    let terms = query_terms("What are the owner responsibilities?");
    let ranked = rank_records(&records, &terms, &[], &ScoringWeights::default());

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].record.chunk_id, "subchapter_2");
    assert_eq!(ranked[0].score, 6.0);
    assert_eq!(ranked[1].score, 1.0);
}

#[test]
fn each_term_counts_once_in_its_best_category() {
    let item = record(
        "section_27_2005",
        ChunkType::Section,
        "§ 27-2005 - Duties of owner",
        "The owner of a multiple dwelling shall keep the premises in good repair.",
        &["owner", "premises", "repair"],
        7,
    );

    let terms = query_terms("owner premises repair elevator");
    let (score, matched) = score_record(&item, &terms, &[], &ScoringWeights::default());

    assert_eq!(score, 3.0 + 2.0 + 2.0);
    assert_eq!(matched, vec!["owner", "premises", "repair"]);
}

#[test]
fn ties_prefer_shallower_chunks_then_earlier_pages() {
    let records = vec![
        record("section_27_2010", ChunkType::Section, "§ 27-2010 - Heat", "", &[], 3),
        record("article_2_1", ChunkType::Article, "Article 1 - Heat", "", &[], 9),
        record("article_2_2", ChunkType::Article, "Article 2 - Heat", "", &[], 5),
    ];

    let terms = query_terms("heat");
    let ranked = rank_records(&records, &terms, &[], &ScoringWeights::default());
    let order = ranked
        .iter()
        .map(|scored| scored.record.chunk_id.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(order, vec!["article_2_2", "article_2_1", "section_27_2010"]);
}

#[test]
fn cited_section_number_gets_citation_bonus() {
    let records = vec![
        record("section_27_2004", ChunkType::Section, "§ 27-2004 - Definitions", "", &[], 2),
        record("section_27_2005", ChunkType::Section, "§ 27-2005 - Duties of owner", "", &[], 3),
    ];

    let ranked = rank_records(
        &records,
        &[],
        &["27-2004".to_string()],
        &ScoringWeights::default(),
    );

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].record.chunk_id, "section_27_2004");
    assert_eq!(ranked[0].score, 10.0);
}

#[test]
fn weights_are_configurable() {
    let item = record(
        "subchapter_1",
        ChunkType::Subchapter,
        "Subchapter 1 - General provisions",
        "",
        &[],
        1,
    );
    let weights = ScoringWeights {
        title: 0.5,
        ..ScoringWeights::default()
    };

    let (score, _) = score_record(&item, &query_terms("general"), &[], &weights);
    assert_eq!(score, 0.5);
}

#[test]
fn no_match_yields_explicit_answer() {
    let corpus = corpus(vec![record(
        "subchapter_1",
        ChunkType::Subchapter,
        "Subchapter 1 - General provisions",
        "Short title.",
        &[],
        1,
    )]);

    let terms = query_terms("elevator inspections");
    let ranked = rank_records(&corpus.records, &terms, &[], &ScoringWeights::default());
    let answer = compose_answer(&ranked, &corpus, 3);

    assert!(ranked.is_empty());
    assert_eq!(answer.answer, NO_MATCH_ANSWER);
    assert!(answer.sources.is_empty());
    assert!(answer.related_sections.is_empty());
}

#[test]
fn answer_cites_top_record_and_related_sections() {
    let mut corpus = corpus(vec![
        record(
            "section_27_2031",
            ChunkType::Section,
            "§ 27-2031 - Heat",
            "Heat shall be supplied as provided in section 27-2029.",
            &["heat"],
            40,
        ),
        record("section_27_2029", ChunkType::Section, "§ 27-2029 - Heating season", "", &[], 39),
        record("section_27_2032", ChunkType::Section, "§ 27-2032 - Hot water", "", &[], 41),
    ]);
    corpus.cross_references.insert(
        "27-2031".to_string(),
        CrossReferenceEntry {
            outgoing: vec!["27-2029".to_string()],
            incoming: vec!["27-2032".to_string(), "subchapter_2".to_string()],
            unresolved: vec!["27-9999".to_string()],
        },
    );

    let terms = query_terms("heat");
    let ranked = rank_records(&corpus.records, &terms, &[], &ScoringWeights::default());
    let answer = compose_answer(&ranked, &corpus, 1);

    assert_eq!(answer.sources, vec!["section_27_2031"]);
    assert!(answer.answer.starts_with("§ 27-2031 - Heat (p. 40): Heat shall be supplied"));
    assert_eq!(answer.related_sections, vec!["27-2029", "27-2032"]);
}

#[test]
fn page_ranges_render_like_citations() {
    assert_eq!(format_page_range(&[4]), "4");
    assert_eq!(format_page_range(&[4, 5, 6]), "4-6");
    assert_eq!(format_page_range(&[]), "unknown");
}

#[test]
fn corpus_loads_records_in_type_then_id_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    let subchapter = record("subchapter_1", ChunkType::Subchapter, "Subchapter 1", "", &[], 1);
    let second = record("section_27_2002", ChunkType::Section, "§ 27-2002", "", &[], 2);
    let first = record("section_27_2001", ChunkType::Section, "§ 27-2001", "", &[], 1);

    for item in [&second, &subchapter, &first] {
        let path = root
            .join(item.chunk_type.dir_name())
            .join(format!("{}.json", item.chunk_id));
        write_json_pretty(&path, item).expect("write record");
    }

    let loaded = load_corpus(root).expect("load corpus");
    let ids = loaded
        .records
        .iter()
        .map(|item| item.chunk_id.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(ids, vec!["subchapter_1", "section_27_2001", "section_27_2002"]);
    assert!(loaded.cross_references.is_empty());
}

#[test]
fn empty_export_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(load_corpus(dir.path()).is_err());
}
