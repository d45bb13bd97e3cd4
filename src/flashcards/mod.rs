//! Flashcard records for Lingo
//!
//! This module provides:
//! - Word-pair flashcards with contexts, tags and study counters
//! - The record store (file-backed and in-memory)
//! - Card filtering
//! - CSV import/export

pub mod csv_io;
pub mod filter;
pub mod models;
pub mod storage;

pub use filter::CardFilter;
pub use models::*;
pub use storage::{
    lock_store, shared, FlashcardStorage, FlashcardStorageError, FlashcardStore, MemoryStore,
    SharedStore,
};
