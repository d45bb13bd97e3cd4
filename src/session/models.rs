//! Types shared by the study session state machine and its engine

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::flashcards::{CardStats, Flashcard};
use crate::settings::Settings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No cards available for this session")]
    NoCardsAvailable,

    #[error("Study session has stopped")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Outcome of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwipeDirection {
    /// Answered incorrectly
    Left,
    /// Answered correctly
    Right,
    /// Flag for revisit
    Down,
}

impl SwipeDirection {
    /// Counters after this outcome is applied to `stats`
    pub fn apply(self, stats: CardStats) -> CardStats {
        let mut next = stats;
        match self {
            Self::Right => next.correct = next.correct.saturating_add(1),
            Self::Left => next.wrong = next.wrong.saturating_add(1),
            Self::Down => next.revisit = next.revisit.saturating_add(1),
        }
        next
    }
}

/// A flashcard as shown during a study session. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCard {
    pub card: Flashcard,
    pub is_flipped: bool,
    /// Set while a card brought back by undo is being restored
    pub is_restoring: bool,
    pub swipe_direction: Option<SwipeDirection>,
}

impl SessionCard {
    pub fn new(card: Flashcard) -> Self {
        Self {
            card,
            is_flipped: false,
            is_restoring: false,
            swipe_direction: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.card.id
    }

    /// Same card with all transient flags cleared
    pub fn fresh(&self) -> Self {
        Self::new(self.card.clone())
    }

    /// Same card as brought back by undo
    pub fn restored(&self) -> Self {
        Self {
            is_restoring: true,
            ..self.fresh()
        }
    }

    /// Text on the face currently shown
    pub fn visible_text(&self, show_learning_first: bool) -> &str {
        if show_learning_first != self.is_flipped {
            &self.card.learning
        } else {
            &self.card.known
        }
    }

    /// Example contexts for the face currently shown
    pub fn visible_contexts(&self, show_learning_first: bool) -> &[String] {
        let contexts = if show_learning_first != self.is_flipped {
            &self.card.context_learning
        } else {
            &self.card.context_known
        };
        contexts.as_deref().unwrap_or(&[])
    }
}

/// Session status as seen by the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SessionStatus {
    Loading,
    Error {
        message: String,
    },
    Active {
        window: Vec<SessionCard>,
        progress: usize,
        total: usize,
    },
    Complete {
        has_any_cards: bool,
    },
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Complete { .. })
    }
}

/// Per-session options
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub show_learning_first: bool,
    pub restore_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            show_learning_first: false,
            restore_delay: Duration::from_millis(300),
        }
    }
}

impl From<&Settings> for SessionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            show_learning_first: settings.show_learning_first,
            restore_delay: Duration::from_millis(settings.restore_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> SessionCard {
        SessionCard::new(Flashcard::new(
            "dog".into(),
            "Hund".into(),
            "English".into(),
            "German".into(),
        ))
    }

    #[test]
    fn test_swipe_law() {
        let base = CardStats::new(3, 2, 1);
        assert_eq!(SwipeDirection::Right.apply(base), CardStats::new(4, 2, 1));
        assert_eq!(SwipeDirection::Left.apply(base), CardStats::new(3, 3, 1));
        assert_eq!(SwipeDirection::Down.apply(base), CardStats::new(3, 2, 2));
    }

    #[test]
    fn test_visible_text_follows_direction_and_flip() {
        let mut c = card();
        assert_eq!(c.visible_text(false), "dog");
        assert_eq!(c.visible_text(true), "Hund");

        c.is_flipped = true;
        assert_eq!(c.visible_text(false), "Hund");
        assert_eq!(c.visible_text(true), "dog");
    }

    #[test]
    fn test_restored_clears_flags() {
        let mut c = card();
        c.is_flipped = true;
        c.swipe_direction = Some(SwipeDirection::Left);

        let r = c.restored();
        assert!(!r.is_flipped);
        assert!(r.is_restoring);
        assert_eq!(r.swipe_direction, None);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            show_learning_first: true,
            restore_delay_ms: 50,
            ..Default::default()
        };
        let config = SessionConfig::from(&settings);
        assert!(config.show_learning_first);
        assert_eq!(config.restore_delay, Duration::from_millis(50));
    }
}
