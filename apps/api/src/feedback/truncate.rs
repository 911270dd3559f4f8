/// Keeps at most `word_limit` whitespace-separated words, rejoined with single spaces.
///
/// `None` returns the text untouched. Sentence boundaries are not respected.
pub fn truncate_words(text: &str, word_limit: Option<usize>) -> String {
    match word_limit {
        None => text.to_string(),
        Some(limit) => text
            .split_whitespace()
            .take(limit)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
