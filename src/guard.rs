/// Reply shown locally when a follow-up is off topic.
pub const OFF_TOPIC_REPLY: &str = "Sorry, I can only answer questions about beauty, skincare, makeup, fragrance, and L'Oréal brand products.";

const DEFAULT_KEYWORDS: &[&str] = &[
    "beauty",
    "skincare",
    "makeup",
    "fragrance",
    "hair",
    "routine",
    "product",
    "l'oréal",
    "cerave",
    "garnier",
    "lancôme",
    "nyx",
    "maybelline",
];

/// Keyword pre-filter deciding whether a question is worth a remote call.
#[derive(Debug, Clone)]
pub struct TopicGuard {
    keywords: Vec<String>,
}

impl Default for TopicGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicGuard {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS.iter().copied())
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Case-insensitive substring match against the keyword list.
    pub fn is_on_topic(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beauty_questions_pass() {
        let guard = TopicGuard::new();
        assert!(guard.is_on_topic("What's a good skincare routine?"));
        assert!(guard.is_on_topic("Is MAYBELLINE mascara waterproof?"));
        assert!(guard.is_on_topic("Which LANCÔME perfume lasts longest?"));
        assert!(guard.is_on_topic("Tips for frizzy hair"));
    }

    #[test]
    fn unrelated_questions_fail() {
        let guard = TopicGuard::new();
        assert!(!guard.is_on_topic("What's the weather?"));
        assert!(!guard.is_on_topic(""));
    }

    #[test]
    fn substring_match_is_loose() {
        assert!(TopicGuard::new().is_on_topic("Any chairs on sale?"));
    }

    #[test]
    fn custom_keywords_are_lowercased() {
        let guard = TopicGuard::with_keywords(["Nails"]);
        assert!(guard.is_on_topic("nails art"));
        assert!(!guard.is_on_topic("skincare"));
    }
}
