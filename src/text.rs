use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "else", "etc", "every", "few", "for", "from", "further", "had", "has", "have", "having", "he",
    "her", "here", "hereby", "herein", "hereinafter", "hereof", "hers", "him", "his", "how", "i",
    "if", "in", "into", "is", "it", "its", "itself", "may", "me", "more", "most", "must", "my",
    "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "otherwise", "our",
    "ours", "out", "over", "own", "per", "same", "shall", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "then", "there", "thereof", "thereto",
    "these", "they", "this", "those", "through", "to", "too", "under", "unless", "until", "up",
    "upon", "us", "very", "was", "we", "were", "what", "when", "where", "whether", "which",
    "while", "who", "whom", "why", "will", "with", "within", "without", "would", "you", "your",
    "yours",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Lowercased alphanumeric runs, in order of appearance.
pub fn word_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

pub fn is_content_token(token: &str) -> bool {
    token.chars().count() >= 2
        && token.chars().any(char::is_alphabetic)
        && !is_stopword(token)
}

/// Distinct content tokens of a free-text query, in first-seen order.
pub fn query_terms(query_text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word_tokens(query_text)
        .filter(|token| is_content_token(token))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn snippet(input: &str, max_chars: usize) -> String {
    let condensed = condense_whitespace(input);
    if condensed.chars().count() <= max_chars {
        return condensed;
    }

    let mut cut = condensed.chars().take(max_chars).collect::<String>();
    if let Some(index) = cut.rfind(' ') {
        cut.truncate(index);
    }
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopword_table_is_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn query_terms_drop_stopwords_and_duplicates() {
        let terms = query_terms("What are the owner's responsibilities for the owner?");
        assert_eq!(terms, vec!["owner", "responsibilities"]);
    }

    #[test]
    fn snippet_cuts_on_word_boundary() {
        assert_eq!(snippet("heat  and\nhot water supply", 12), "heat and...");
        assert_eq!(snippet("short", 12), "short");
    }
}
