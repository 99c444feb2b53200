use memchr::memmem;

/// Declares a lazily-built [`memmem::Finder`] for a fixed needle and
/// evaluates to a reference to it. Each call site gets its own static, so
/// the needle is compiled once per marker instead of once per scanned line.
macro_rules! finder {
    ($needle:expr) => {{
        static FINDER: std::sync::LazyLock<memchr::memmem::Finder<'static>> =
            std::sync::LazyLock::new(|| memchr::memmem::Finder::new($needle.as_bytes()));
        &*FINDER
    }};
}
pub(crate) use finder;

/// Count non-overlapping occurrences of the finder's needle in `haystack`.
pub fn count_matches(haystack: &str, finder: &memmem::Finder<'_>) -> usize {
    finder.find_iter(haystack.as_bytes()).count()
}

/// `true` if the finder's needle occurs anywhere in `haystack`.
pub fn has_match(haystack: &str, finder: &memmem::Finder<'_>) -> bool {
    finder.find(haystack.as_bytes()).is_some()
}

/// Length in bytes of the leading `=` run of `line`.
pub fn leading_eq_run(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'=').count()
}

/// Strip heading delimiters and surrounding whitespace from both ends of a
/// heading line, leaving the heading title.
pub fn trim_heading(line: &str) -> &str {
    line.trim_matches(|c| matches!(c, '=' | ' ' | '\t' | '\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_count_matches() {
        assert_eq!(count_matches("{{a}} {{b}}", finder!("{{")), 2);
        assert_eq!(count_matches("", finder!("{{")), 0);
        assert_eq!(count_matches("{ {", finder!("{{")), 0);
        // non-overlapping semantics
        assert_eq!(count_matches("{{{{", finder!("{{")), 2);
        assert_eq!(count_matches("{{{", finder!("{{")), 1);
    }

    #[test]
    fn test_has_match() {
        assert!(has_match("see <ref name=a>", finder!("<ref")));
        assert!(!has_match("see ref", finder!("<ref")));
    }

    #[test]
    fn test_leading_eq_run() {
        assert_eq!(leading_eq_run("== A =="), 2);
        assert_eq!(leading_eq_run("=== A ==="), 3);
        assert_eq!(leading_eq_run("A =="), 0);
        assert_eq!(leading_eq_run(""), 0);
    }

    #[test]
    fn test_trim_heading() {
        assert_eq!(trim_heading("== History =="), "History");
        assert_eq!(trim_heading("===Early life==="), "Early life");
        assert_eq!(trim_heading("== A == B =="), "A == B");
        assert_eq!(trim_heading("=="), "");
        assert_eq!(trim_heading("\t== Notes ==\t"), "Notes");
    }

    proptest! {
        #[test]
        fn count_matches_agrees_with_std(input in "(\\{|\\}|a|b| )*") {
            let expected = input.matches("{{").count();
            prop_assert_eq!(count_matches(&input, finder!("{{")), expected);
        }

        #[test]
        fn trim_heading_never_keeps_delimiters(input in ".*") {
            let trimmed = trim_heading(&input);
            prop_assert!(!trimmed.starts_with('='));
            prop_assert!(!trimmed.ends_with('='));
        }
    }
}
