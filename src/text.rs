//! Character-counted text helpers.
//!
//! Model-produced text is mostly CJK, so limits count `char`s, not bytes.

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Keep at most `max` characters, appending `...` when something was cut.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate_chars(text, max))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("移项时符号错误了哦同学请注意检查一下", 15).chars().count(), 15);
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 20), "short");
        assert_eq!(ellipsize("abcdefghijklmnopqrstuvwxyz", 20), "abcdefghijklmnopqrst...");
    }
}
