use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use super::answer::{QueryAnswer, format_page_range};
use super::scoring::ScoredRecord;

#[derive(Debug, Serialize)]
struct QueryResponse<'a> {
    query: &'a str,
    limit: usize,
    returned: usize,
    #[serde(flatten)]
    answer: &'a QueryAnswer,
    results: Vec<QueryResult<'a>>,
}

#[derive(Debug, Serialize)]
struct QueryResult<'a> {
    rank: usize,
    chunk_id: &'a str,
    chunk_type: &'static str,
    title: &'a str,
    score: f64,
    pages: String,
    matched_terms: &'a [String],
}

fn results<'a>(ranked: &'a [ScoredRecord<'a>], limit: usize) -> Vec<QueryResult<'a>> {
    ranked
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, scored)| QueryResult {
            rank: index + 1,
            chunk_id: &scored.record.chunk_id,
            chunk_type: scored.record.chunk_type.as_str(),
            title: &scored.record.title,
            score: scored.score,
            pages: format_page_range(&scored.record.page_numbers),
            matched_terms: &scored.matched_terms,
        })
        .collect()
}

pub(super) fn write_json_response(
    query_text: &str,
    limit: usize,
    ranked: &[ScoredRecord<'_>],
    answer: &QueryAnswer,
) -> Result<()> {
    let results = results(ranked, limit);
    let response = QueryResponse {
        query: query_text,
        limit,
        returned: results.len(),
        answer,
        results,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize query json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_text_response(
    query_text: &str,
    limit: usize,
    ranked: &[ScoredRecord<'_>],
    answer: &QueryAnswer,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Query: {query_text}")?;
    writeln!(output, "Answer: {}", answer.answer)?;

    let results = results(ranked, limit);
    writeln!(output, "Results: {}", results.len())?;
    for result in &results {
        writeln!(
            output,
            "{}.\t{}\t{}\tpages {}",
            result.rank, result.chunk_type, result.title, result.pages
        )?;
        writeln!(
            output,
            "\tscore={:.1} chunk_id={} matched={}",
            result.score,
            result.chunk_id,
            result.matched_terms.join(",")
        )?;
    }

    if !answer.related_sections.is_empty() {
        writeln!(output, "Related sections: {}", answer.related_sections.join(", "))?;
    }

    output.flush()?;
    Ok(())
}
