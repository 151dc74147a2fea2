use std::collections::BTreeSet;

use serde::Serialize;

use super::corpus::Corpus;
use super::scoring::ScoredRecord;
use crate::text::snippet;

pub(super) const NO_MATCH_ANSWER: &str =
    "No relevant section found in the Housing Maintenance Code for this question.";

const ANSWER_SNIPPET_CHARS: usize = 320;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct QueryAnswer {
    pub(super) answer: String,
    pub(super) sources: Vec<String>,
    pub(super) related_sections: Vec<String>,
}

impl QueryAnswer {
    fn no_match() -> Self {
        Self {
            answer: NO_MATCH_ANSWER.to_string(),
            sources: Vec::new(),
            related_sections: Vec::new(),
        }
    }
}

/// Answer built from the top `limit` records. Related sections are the
/// resolved sections the best record cites or is cited by.
pub(super) fn compose_answer(ranked: &[ScoredRecord<'_>], corpus: &Corpus, limit: usize) -> QueryAnswer {
    let Some(top) = ranked.first() else {
        return QueryAnswer::no_match();
    };

    let record = top.record;
    let answer = format!(
        "{} (p. {}): {}",
        record.title,
        format_page_range(&record.page_numbers),
        snippet(&record.content, ANSWER_SNIPPET_CHARS)
    );

    let sources = ranked
        .iter()
        .take(limit.max(1))
        .map(|scored| scored.record.chunk_id.clone())
        .collect();

    let known_sections = corpus.section_identifiers();
    let related_sections = corpus
        .cross_references
        .get(record.reference_key())
        .map(|entry| {
            entry
                .outgoing
                .iter()
                .chain(&entry.incoming)
                .filter(|key| known_sections.contains(key.as_str()))
                .cloned()
                .collect::<BTreeSet<String>>()
        })
        .unwrap_or_default()
        .into_iter()
        .collect();

    QueryAnswer {
        answer,
        sources,
        related_sections,
    }
}

pub(super) fn format_page_range(page_numbers: &[u32]) -> String {
    match (page_numbers.first(), page_numbers.last()) {
        (Some(start), Some(end)) if start == end => start.to_string(),
        (Some(start), Some(end)) => format!("{start}-{end}"),
        _ => "unknown".to_string(),
    }
}
