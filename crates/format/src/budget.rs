//! Token estimation and size limits.

/// Rough token count: one token per four characters, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Cut `code` to `max_lines` lines (0 = unlimited). Returns whether anything was cut.
pub fn truncate_code(code: &str, max_lines: usize) -> (String, bool) {
    let total = code.lines().count();
    if max_lines == 0 || total <= max_lines {
        return (code.to_string(), false);
    }
    let mut kept: Vec<&str> = code.lines().take(max_lines).collect();
    let marker = format!("... ({} more lines)", total - max_lines);
    kept.push(&marker);
    (kept.join("\n"), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_round_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 3);
    }

    #[test]
    fn truncation_marks_the_cut() {
        let code = "a\nb\nc\nd";
        assert_eq!(truncate_code(code, 0), (code.to_string(), false));
        assert_eq!(truncate_code(code, 4), (code.to_string(), false));
        assert_eq!(
            truncate_code(code, 2),
            ("a\nb\n... (2 more lines)".to_string(), true)
        );
    }
}
