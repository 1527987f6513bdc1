//! Tokenizer for pasted or uploaded key lists.

use std::collections::HashSet;

/// Characters that separate key values in imported text.
const SEPARATORS: [char; 6] = ['\n', '\r', ',', ';', '\t', ' '];

/// Split raw text into candidate key values.
///
/// Tokens are trimmed, empty tokens are dropped, and repeats within the
/// text are removed with the first occurrence kept in place.
pub fn parse_keys(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(SEPARATORS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(*token))
        .map(String::from)
        .collect()
}
