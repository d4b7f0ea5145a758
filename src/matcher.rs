/// Case-insensitive prefix filter over an item's words.
///
/// Every query token has to be a prefix of at least one word. Tokens narrow the
/// result (AND), while a single token may hit any of the words (OR).
#[derive(Debug, Clone, Default)]
pub struct PrefixMatcher {
    tokens: Vec<String>,
}

impl PrefixMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            tokens: query.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    /// A blank query matches nothing.
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `words` must already be lower-cased, see [`lowercase_words`].
    pub fn matches(&self, words: &[String]) -> bool {
        if self.is_blank() {
            return false;
        }

        self.tokens
            .iter()
            .all(|token| words.iter().any(|word| word.starts_with(token.as_str())))
    }
}

pub fn lowercase_words(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        lowercase_words(&list.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn every_token_must_prefix_some_word() {
        let firefox = words(&["Firefox", "Browser"]);

        assert!(PrefixMatcher::new("fire brow").matches(&firefox));
        assert!(PrefixMatcher::new("brow fire").matches(&firefox));
        assert!(!PrefixMatcher::new("fire chrome").matches(&firefox));
    }

    #[test]
    fn matching_ignores_case() {
        let firefox = words(&["Firefox", "Browser"]);

        assert!(PrefixMatcher::new("FIRE").matches(&firefox));
        assert!(PrefixMatcher::new("bRoWsEr").matches(&firefox));
    }

    #[test]
    fn only_prefixes_count() {
        let firefox = words(&["Firefox"]);

        assert!(!PrefixMatcher::new("fox").matches(&firefox));
        assert!(!PrefixMatcher::new("firefoxes").matches(&firefox));
    }

    #[test]
    fn blank_query_matches_nothing() {
        let firefox = words(&["Firefox"]);

        assert!(PrefixMatcher::new("").is_blank());
        assert!(!PrefixMatcher::new("").matches(&firefox));
        assert!(!PrefixMatcher::new(" \t  ").matches(&firefox));
    }

    #[test]
    fn one_token_can_satisfy_itself_with_the_same_word_twice() {
        let editor = words(&["Text"]);

        assert!(PrefixMatcher::new("te tex").matches(&editor));
    }
}
