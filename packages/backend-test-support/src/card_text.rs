//! Card text generators for building test decks.

/// Prompt texts with one blank each, numbered from zero.
pub fn prompt_texts(prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{prefix} prompt {i}: ____."))
        .collect()
}

/// Response texts numbered from zero.
pub fn response_texts(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix} response {i}")).collect()
}

/// Response cards needed to start a match with `players` seated.
pub fn minimum_responses(players: usize) -> usize {
    20 * players
}
