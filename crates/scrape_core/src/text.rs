/// Lines whose trimmed length is at most this many characters are noise.
pub const MIN_LINE_CHARS: usize = 20;

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keeps at most `max_chars` characters, never splitting one.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Trims every line and drops those of [`MIN_LINE_CHARS`] characters or fewer.
pub fn drop_short_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect::<Vec<_>>()
        .join("\n")
}
