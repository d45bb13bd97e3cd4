//! Offline flashcards for language learning.
//!
//! Cards live in a local record store; study sessions deal them through a
//! small swipeable window and write per-card statistics back in the
//! background.

pub mod flashcards;
pub mod session;
pub mod settings;
