use anyhow::{Result, bail};
use tracing::info;

use super::answer::compose_answer;
use super::corpus::load_corpus;
use super::output::{write_json_response, write_text_response};
use super::scoring::{ScoringWeights, rank_records};
use crate::cli::{QueryArgs, resolve_chunks_dir};
use crate::grammar::{HeadingGrammar, HmcGrammar};
use crate::text::query_terms;

pub(crate) fn run(args: QueryArgs) -> Result<()> {
    let query_text = args.query.trim();
    if query_text.is_empty() {
        bail!("query text must not be empty");
    }

    let chunks_dir = resolve_chunks_dir(&args.cache_root, args.chunks_dir.as_ref());
    let corpus = load_corpus(&chunks_dir)?;

    let grammar = HmcGrammar::new()?;
    let weights = ScoringWeights::from(&args);
    let terms = query_terms(query_text);
    let cited_sections = grammar.citations(query_text);
    let limit = args.limit.max(1);

    let ranked = rank_records(&corpus.records, &terms, &cited_sections, &weights);
    let answer = compose_answer(&ranked, &corpus, limit);

    info!(
        terms = terms.len(),
        cited_sections = cited_sections.len(),
        matches = ranked.len(),
        top = %ranked
            .first()
            .map(|scored| scored.record.chunk_id.as_str())
            .unwrap_or("none"),
        "query scored"
    );

    if args.json {
        write_json_response(query_text, limit, &ranked, &answer)
    } else {
        write_text_response(query_text, limit, &ranked, &answer)
    }
}
