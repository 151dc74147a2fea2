use std::collections::HashSet;

use crate::cli::QueryArgs;
use crate::model::{ChunkType, ExportRecord};
use crate::text::word_tokens;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ScoringWeights {
    pub(super) title: f64,
    pub(super) keyword: f64,
    pub(super) body: f64,
    pub(super) citation: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title: 3.0,
            keyword: 2.0,
            body: 1.0,
            citation: 10.0,
        }
    }
}

impl From<&QueryArgs> for ScoringWeights {
    fn from(args: &QueryArgs) -> Self {
        Self {
            title: args.title_weight,
            keyword: args.keyword_weight,
            body: args.body_weight,
            citation: args.citation_weight,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct ScoredRecord<'a> {
    pub(super) record: &'a ExportRecord,
    pub(super) score: f64,
    pub(super) matched_terms: Vec<String>,
}

/// Each query term counts once, in its best category: title, then keywords,
/// then body. A section cited by number in the query gets the citation bonus.
pub(super) fn score_record(
    record: &ExportRecord,
    terms: &[String],
    cited_sections: &[String],
    weights: &ScoringWeights,
) -> (f64, Vec<String>) {
    let title_tokens = word_tokens(&record.title).collect::<HashSet<String>>();
    let keyword_tokens = record
        .keywords
        .iter()
        .flat_map(|keyword| word_tokens(keyword))
        .collect::<HashSet<String>>();
    let body_tokens = word_tokens(&record.content).collect::<HashSet<String>>();

    let mut score = 0.0;
    let mut matched_terms = Vec::new();
    for term in terms {
        let weight = if title_tokens.contains(term) {
            weights.title
        } else if keyword_tokens.contains(term) {
            weights.keyword
        } else if body_tokens.contains(term) {
            weights.body
        } else {
            continue;
        };
        score += weight;
        matched_terms.push(term.clone());
    }

    if record.chunk_type == ChunkType::Section {
        if let Some(section) = record.hierarchy.section.as_deref() {
            if cited_sections.iter().any(|cited| cited == section) {
                score += weights.citation;
                matched_terms.push(section.to_string());
            }
        }
    }

    (score, matched_terms)
}

/// Records with a positive score, best first. Ties go to the shallower chunk
/// type, then the earlier first page, then the chunk id.
pub(super) fn rank_records<'a>(
    records: &'a [ExportRecord],
    terms: &[String],
    cited_sections: &[String],
    weights: &ScoringWeights,
) -> Vec<ScoredRecord<'a>> {
    let mut ranked = records
        .iter()
        .filter_map(|record| {
            let (score, matched_terms) = score_record(record, terms, cited_sections, weights);
            (score > 0.0).then_some(ScoredRecord {
                record,
                score,
                matched_terms,
            })
        })
        .collect::<Vec<ScoredRecord<'a>>>();

    ranked.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then(left.record.chunk_type.depth().cmp(&right.record.chunk_type.depth()))
            .then(first_page(left.record).cmp(&first_page(right.record)))
            .then(left.record.chunk_id.cmp(&right.record.chunk_id))
    });

    ranked
}

fn first_page(record: &ExportRecord) -> u32 {
    record.page_numbers.first().copied().unwrap_or(u32::MAX)
}
