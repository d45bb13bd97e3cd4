//! Swipe-based study sessions
//!
//! This module provides:
//! - The windowed session state machine (pure reducer)
//! - Outcome recording with best-effort background persistence
//! - Undo back to each card's pre-session counters
//! - The session engine that serializes user events

pub mod engine;
pub mod models;
pub mod recorder;
pub mod state;

pub use engine::StudySession;
pub use models::*;
pub use recorder::{OutcomeRecorder, PersistenceJob, PersistenceQueue, QueueStats, WriteReason};
pub use state::{initialize, reduce, SessionAction, SessionState, WINDOW_CAPACITY};
