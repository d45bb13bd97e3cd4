//! Data models for the flashcard system

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ordered (known, learning) language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePair {
    pub known: String,
    pub learning: String,
}

impl LanguagePair {
    pub fn new(known: impl Into<String>, learning: impl Into<String>) -> Self {
        Self {
            known: known.into(),
            learning: learning.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.known, self.learning)
    }
}

/// The three per-card study counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub correct: u32,
    pub wrong: u32,
    pub revisit: u32,
}

impl CardStats {
    pub fn new(correct: u32, wrong: u32, revisit: u32) -> Self {
        Self {
            correct,
            wrong,
            revisit,
        }
    }

    /// Sum two sets of counters (used when merging duplicates)
    pub fn combined(self, other: CardStats) -> Self {
        Self {
            correct: self.correct.saturating_add(other.correct),
            wrong: self.wrong.saturating_add(other.wrong),
            revisit: self.revisit.saturating_add(other.revisit),
        }
    }
}

/// A word pair with optional example contexts and tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub known: String,
    pub learning: String,
    pub known_language: String,
    pub learning_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_known: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_learning: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub revisit_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(
        known: String,
        learning: String,
        known_language: String,
        learning_language: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            known,
            learning,
            known_language,
            learning_language,
            context_known: None,
            context_learning: None,
            tags: Vec::new(),
            correct_count: 0,
            wrong_count: 0,
            revisit_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(self.known_language.clone(), self.learning_language.clone())
    }

    pub fn stats(&self) -> CardStats {
        CardStats::new(self.correct_count, self.wrong_count, self.revisit_count)
    }

    pub fn set_stats(&mut self, stats: CardStats) {
        self.correct_count = stats.correct;
        self.wrong_count = stats.wrong;
        self.revisit_count = stats.revisit;
    }

    /// Case-insensitive tag check
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

/// Request to create a new flashcard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlashcard {
    pub known: String,
    pub learning: String,
    pub known_language: String,
    pub learning_language: String,
    #[serde(default)]
    pub context_known: Option<Vec<String>>,
    #[serde(default)]
    pub context_learning: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stats: CardStats,
}

impl NewFlashcard {
    pub fn new(known: &str, learning: &str, pair: &LanguagePair) -> Self {
        Self {
            known: known.to_string(),
            learning: learning.to_string(),
            known_language: pair.known.clone(),
            learning_language: pair.learning.clone(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_contexts(mut self, known: Vec<String>, learning: Vec<String>) -> Self {
        self.context_known = (!known.is_empty()).then_some(known);
        self.context_learning = (!learning.is_empty()).then_some(learning);
        self
    }

    pub fn into_flashcard(self) -> Flashcard {
        let mut card = Flashcard::new(
            self.known.trim().to_string(),
            self.learning.trim().to_string(),
            self.known_language.trim().to_string(),
            self.learning_language.trim().to_string(),
        );
        card.context_known = self.context_known.filter(|c| !c.is_empty());
        card.context_learning = self.context_learning.filter(|c| !c.is_empty());
        card.tags = dedup_preserving_order(self.tags);
        card.set_stats(self.stats);
        card
    }
}

/// Remove duplicates (case-insensitive) while keeping first occurrences in order
pub(crate) fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        if !out.iter().any(|v| v.to_lowercase() == key) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let card = Flashcard::new(
            "dog".to_string(),
            "собака".to_string(),
            "English".to_string(),
            "Ukrainian".to_string(),
        );
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["knownLanguage"], "English");
        assert_eq!(json["correctCount"], 0);
        assert!(json.get("contextKnown").is_none());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let json = r#"{
            "id": "7f0c4c4e-5f8a-4a4b-9a53-3c1d2c7f9b10",
            "known": "cat",
            "learning": "kot",
            "knownLanguage": "English",
            "learningLanguage": "Polish",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let card: Flashcard = serde_json::from_str(json).unwrap();
        assert_eq!(card.stats(), CardStats::default());
        assert!(card.tags.is_empty());
    }

    #[test]
    fn test_new_flashcard_trims_and_dedups_tags() {
        let pair = LanguagePair::new("English", "German");
        let card = NewFlashcard::new(" house ", "Haus", &pair)
            .with_tags(vec!["Home".into(), "home".into(), " ".into(), "noun".into()])
            .with_contexts(vec!["a big house".into()], Vec::new())
            .into_flashcard();

        assert_eq!(card.known, "house");
        assert_eq!(card.tags, vec!["Home".to_string(), "noun".to_string()]);
        assert_eq!(card.context_known, Some(vec!["a big house".to_string()]));
        assert_eq!(card.context_learning, None);
    }

    #[test]
    fn test_stats_combined() {
        let a = CardStats::new(1, 2, 3);
        let b = CardStats::new(4, 0, 1);
        assert_eq!(a.combined(b), CardStats::new(5, 2, 4));
    }
}
