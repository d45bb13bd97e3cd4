//! Card selection for study sessions and listings

use serde::{Deserialize, Serialize};

use super::models::{Flashcard, LanguagePair};

/// Explicit filter configuration; every set criterion must hold for a card to match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilter {
    #[serde(default)]
    pub language_pair: Option<LanguagePair>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Require every tag instead of any
    #[serde(default)]
    pub match_all_tags: bool,
    #[serde(default)]
    pub search: Option<String>,
    /// Only cards flagged for revisit at least once
    #[serde(default)]
    pub only_revisit: bool,
    #[serde(default)]
    pub min_wrong: Option<u32>,
}

impl CardFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_pair(pair: LanguagePair) -> Self {
        Self {
            language_pair: Some(pair),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>, match_all: bool) -> Self {
        self.tags = tags;
        self.match_all_tags = match_all;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    pub fn matches(&self, card: &Flashcard) -> bool {
        self.matches_pair(card)
            && self.matches_tags(card)
            && self.matches_search(card)
            && (!self.only_revisit || card.revisit_count > 0)
            && self.min_wrong.map_or(true, |min| card.wrong_count >= min)
    }

    pub fn apply(&self, cards: Vec<Flashcard>) -> Vec<Flashcard> {
        cards.into_iter().filter(|card| self.matches(card)).collect()
    }

    fn matches_pair(&self, card: &Flashcard) -> bool {
        match &self.language_pair {
            Some(pair) => card.known_language == pair.known && card.learning_language == pair.learning,
            None => true,
        }
    }

    fn matches_tags(&self, card: &Flashcard) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        if self.match_all_tags {
            self.tags.iter().all(|tag| card.has_tag(tag))
        } else {
            self.tags.iter().any(|tag| card.has_tag(tag))
        }
    }

    fn matches_search(&self, card: &Flashcard) -> bool {
        let Some(search) = &self.search else {
            return true;
        };
        let needle = search.trim().to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        contains(&card.known)
            || contains(&card.learning)
            || card.context_known.iter().flatten().any(|c| contains(c))
            || card.context_learning.iter().flatten().any(|c| contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::models::NewFlashcard;

    fn card(known: &str, learning: &str, tags: &[&str]) -> Flashcard {
        NewFlashcard::new(known, learning, &LanguagePair::new("English", "German"))
            .with_tags(tags.iter().map(|t| t.to_string()).collect())
            .into_flashcard()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(CardFilter::new().matches(&card("a", "b", &[])));
    }

    #[test]
    fn test_language_pair() {
        let filter = CardFilter::for_pair(LanguagePair::new("English", "German"));
        assert!(filter.matches(&card("a", "b", &[])));

        let filter = CardFilter::for_pair(LanguagePair::new("German", "English"));
        assert!(!filter.matches(&card("a", "b", &[])));
    }

    #[test]
    fn test_tags_any_and_all() {
        let c = card("dog", "Hund", &["Animal", "noun"]);

        let any = CardFilter::new().with_tags(vec!["animal".into(), "verb".into()], false);
        assert!(any.matches(&c));

        let all = CardFilter::new().with_tags(vec!["animal".into(), "verb".into()], true);
        assert!(!all.matches(&c));

        let all = CardFilter::new().with_tags(vec!["animal".into(), "NOUN".into()], true);
        assert!(all.matches(&c));
    }

    #[test]
    fn test_tags_ignore_case_beyond_ascii() {
        let c = card("verb", "дієслово", &["Дієслово", "ДІЄСЛОВО", "Grün"]);
        assert_eq!(c.tags, vec!["Дієслово".to_string(), "Grün".to_string()]);

        let filter = CardFilter::new().with_tags(vec!["дієслово".into(), "GRÜN".into()], true);
        assert!(filter.matches(&c));
    }

    #[test]
    fn test_search_includes_contexts() {
        let mut c = card("dog", "Hund", &[]);
        c.context_learning = Some(vec!["Der Hund bellt".into()]);

        assert!(CardFilter::new().with_search("BELLT").matches(&c));
        assert!(!CardFilter::new().with_search("katze").matches(&c));
        assert!(CardFilter::new().with_search("   ").matches(&c));
    }

    #[test]
    fn test_revisit_and_min_wrong() {
        let mut c = card("dog", "Hund", &[]);
        let filter = CardFilter {
            only_revisit: true,
            min_wrong: Some(2),
            ..Default::default()
        };
        assert!(!filter.matches(&c));

        c.revisit_count = 1;
        c.wrong_count = 2;
        assert!(filter.matches(&c));

        let kept = filter.apply(vec![c, card("cat", "Katze", &[])]);
        assert_eq!(kept.len(), 1);
    }
}
