//! Study session state machine
//!
//! The session draws from a shuffled pool into a small visible window. Index 0
//! of the window is the back of the stack; the last element is the top card,
//! the one the user is looking at. New cards enter at the back.
//!
//! [`reduce`] is a pure transition function: it never touches storage.

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::models::{SessionCard, SessionError, SessionStatus};
use crate::flashcards::Flashcard;

/// Maximum number of cards visible at once
pub const WINDOW_CAPACITY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Every card of the session in shuffled order
    pub pool: Vec<SessionCard>,
    pub window: Vec<SessionCard>,
    /// Index into `pool` of the next card to enter the window
    pub cursor: usize,
    /// Cards exited so far, net of undos
    pub progress: usize,
    /// Most recent last
    pub discard_stack: Vec<SessionCard>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    CardExited(Uuid),
    Flip(Uuid),
    Undo,
    UpdateCard(SessionCard),
    SetError(String),
    SetLoading(bool),
}

impl SessionState {
    /// State of a session whose cards are still being fetched
    pub fn loading() -> Self {
        Self {
            pool: Vec::new(),
            window: Vec::new(),
            cursor: 0,
            progress: 0,
            discard_stack: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// Visible window size limit for this session
    pub fn capacity(&self) -> usize {
        WINDOW_CAPACITY.min(self.pool.len())
    }

    pub fn is_complete(&self) -> bool {
        self.window.is_empty() && self.cursor >= self.pool.len()
    }

    pub fn top_card(&self) -> Option<&SessionCard> {
        self.window.last()
    }

    pub fn window_card(&self, id: Uuid) -> Option<&SessionCard> {
        self.window.iter().find(|c| c.id() == id)
    }

    fn window_position(&self, id: Uuid) -> Option<usize> {
        self.window.iter().position(|c| c.id() == id)
    }

    pub fn status(&self) -> SessionStatus {
        if let Some(message) = &self.error {
            SessionStatus::Error {
                message: message.clone(),
            }
        } else if self.loading {
            SessionStatus::Loading
        } else if self.is_complete() {
            SessionStatus::Complete {
                has_any_cards: !self.pool.is_empty(),
            }
        } else {
            SessionStatus::Active {
                window: self.window.clone(),
                progress: self.progress,
                total: self.pool.len(),
            }
        }
    }
}

/// Shuffle `cards` and deal the initial window
pub fn initialize(cards: Vec<Flashcard>) -> Result<SessionState, SessionError> {
    initialize_with_rng(cards, &mut rand::thread_rng())
}

pub fn initialize_with_rng<R: Rng + ?Sized>(
    mut cards: Vec<Flashcard>,
    rng: &mut R,
) -> Result<SessionState, SessionError> {
    if cards.is_empty() {
        return Err(SessionError::NoCardsAvailable);
    }

    cards.shuffle(rng);
    let pool: Vec<SessionCard> = cards.into_iter().map(SessionCard::new).collect();

    let dealt = WINDOW_CAPACITY.min(pool.len());
    let window: Vec<SessionCard> = pool[..dealt].iter().rev().cloned().collect();

    Ok(SessionState {
        pool,
        window,
        cursor: dealt,
        progress: 0,
        discard_stack: Vec::new(),
        loading: false,
        error: None,
    })
}

/// Apply one action. Actions whose target card is not visible leave the state unchanged.
pub fn reduce(mut state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::CardExited(id) => {
            let Some(pos) = state.window_position(id) else {
                return state;
            };
            let exited = state.window.remove(pos);
            state.discard_stack.push(exited);
            state.progress += 1;

            if state.cursor < state.pool.len() {
                let next = state.pool[state.cursor].fresh();
                state.window.insert(0, next);
                state.cursor += 1;
            }
        }
        SessionAction::Flip(id) => {
            if let Some(pos) = state.window_position(id) {
                let card = &mut state.window[pos];
                card.is_flipped = !card.is_flipped;
            }
        }
        SessionAction::Undo => {
            let Some(card) = state.discard_stack.pop() else {
                return state;
            };

            if state.window.len() >= state.capacity() {
                // Hand the latest pool draw back so it is dealt again.
                let latest = state.cursor.checked_sub(1).map(|i| state.pool[i].id());
                match latest.and_then(|id| state.window_position(id)) {
                    Some(pos) => {
                        state.window.remove(pos);
                        state.cursor -= 1;
                    }
                    None => {
                        state.window.remove(0);
                    }
                }
            }

            state.window.push(card.restored());
            state.progress = state.progress.saturating_sub(1);
        }
        SessionAction::UpdateCard(card) => {
            if let Some(pos) = state.window_position(card.id()) {
                state.window[pos] = card;
            }
        }
        SessionAction::SetError(message) => {
            state.error = Some(message);
            state.loading = false;
        }
        SessionAction::SetLoading(loading) => {
            state.loading = loading;
        }
    }

    state
}
