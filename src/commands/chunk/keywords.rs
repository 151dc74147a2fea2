use super::*;

/// Housing Maintenance Code vocabulary; a term found in a chunk is always kept
/// ahead of frequency-ranked words.
const GLOSSARY_TERMS: &[&str] = &[
    "access",
    "apartment",
    "bathroom",
    "building",
    "common area",
    "dwelling",
    "emergency",
    "fire",
    "habitability",
    "health",
    "heat",
    "hot water",
    "inspection",
    "kitchen",
    "lead",
    "maintenance",
    "mold",
    "occupant",
    "owner",
    "pest",
    "premises",
    "repair",
    "rodent",
    "room",
    "safety",
    "sanitary",
    "tenant",
    "ventilation",
    "violation",
];

const MIN_KEYWORD_CHARS: usize = 3;

/// Deterministic keyword set: glossary terms present in the text first, then
/// the most frequent remaining content words (ties alphabetical), capped at
/// `limit`. Each cited section adds a `section-27-dddd` keyword outside the
/// cap. Returned sorted.
pub fn extract_keywords(
    title: &str,
    content: &str,
    cited_sections: &BTreeSet<String>,
    limit: usize,
) -> Vec<String> {
    let tokens = word_tokens(title)
        .chain(word_tokens(content))
        .collect::<Vec<String>>();

    let mut selected = GLOSSARY_TERMS
        .iter()
        .filter(|term| contains_phrase(&tokens, term))
        .map(|term| term.to_string())
        .take(limit)
        .collect::<BTreeSet<String>>();

    let mut counts = HashMap::<&str, usize>::new();
    for token in &tokens {
        if token.chars().count() >= MIN_KEYWORD_CHARS
            && token.chars().all(char::is_alphabetic)
            && is_content_token(token)
            && !selected.contains(token)
        {
            *counts.entry(token.as_str()).or_default() += 1;
        }
    }

    let mut ranked = counts.into_iter().collect::<Vec<(&str, usize)>>();
    ranked.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(right.0)));

    let remaining = limit.saturating_sub(selected.len());
    selected.extend(
        ranked
            .into_iter()
            .take(remaining)
            .map(|(token, _)| token.to_string()),
    );

    selected.extend(
        cited_sections
            .iter()
            .map(|section| format!("section-{section}")),
    );

    selected.into_iter().collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words = phrase.split_whitespace().collect::<Vec<&str>>();
    if words.is_empty() || tokens.len() < words.len() {
        return false;
    }

    tokens.windows(words.len()).any(|window| {
        window
            .iter()
            .zip(&words)
            .all(|(token, word)| token == word)
    })
}
