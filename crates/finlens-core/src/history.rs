pub const PREVIEW_WORD_LIMIT: usize = 25;

/// Cuts `text` to its first `limit` space-separated words, marking the cut
/// with `...`.
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() > limit {
        let mut preview = words[..limit].join(" ");
        preview.push_str("...");
        preview
    } else {
        text.to_string()
    }
}

pub fn preview(text: &str) -> String {
    truncate_words(text, PREVIEW_WORD_LIMIT)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn long_queries_keep_first_25_words() {
        let expected = format!("{}...", words(25));
        assert_eq!(preview(&words(30)), expected);
    }

    #[test]
    fn short_queries_are_unchanged() {
        assert_eq!(preview(&words(20)), words(20));
        assert_eq!(preview(&words(25)), words(25));
        assert_eq!(preview(""), "");
    }
}
