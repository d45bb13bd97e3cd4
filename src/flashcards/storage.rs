//! Storage operations for flashcards
//!
//! Directory structure:
//! ```text
//! {data-dir}/flashcards/
//! └── {card-id}.json   # Individual card files
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::models::*;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("Merge needs at least two distinct cards")]
    MergeTooFew,

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// A store shared between the CLI, study sessions and the persistence queue
pub type SharedStore = Arc<Mutex<dyn FlashcardStore>>;

/// Wrap a concrete store for sharing
pub fn shared<S: FlashcardStore + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Lock a shared store for the duration of the returned guard
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, dyn FlashcardStore + 'static>> {
    store.lock().map_err(|_| FlashcardStorageError::LockPoisoned)
}

/// Record store for flashcards, keyed by card id.
///
/// Implementors provide the primitive operations; querying by language pair,
/// stat updates, merging and duplicate detection are built on top of them.
pub trait FlashcardStore: Send {
    fn get_all(&self) -> Result<Vec<Flashcard>>;

    fn get(&self, id: Uuid) -> Result<Flashcard>;

    /// Persist a new card and return it with its assigned id
    fn add(&mut self, card: NewFlashcard) -> Result<Flashcard>;

    /// Overwrite an existing card, refreshing `updated_at`
    fn update(&mut self, card: &Flashcard) -> Result<Flashcard>;

    fn delete(&mut self, id: Uuid) -> Result<()>;

    fn get_by_language_pair(&self, pair: &LanguagePair) -> Result<Vec<Flashcard>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|card| card.known_language == pair.known && card.learning_language == pair.learning)
            .collect())
    }

    /// Overwrite the three study counters of a card
    fn update_stats(&mut self, id: Uuid, stats: CardStats) -> Result<Flashcard> {
        let mut card = self.get(id)?;
        card.set_stats(stats);
        self.update(&card)
    }

    /// Merge duplicate cards into the first one.
    ///
    /// Contexts and tags are unioned, counters summed and every other card deleted.
    fn merge(&mut self, ids: &[Uuid]) -> Result<Flashcard> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.len() < 2 {
            return Err(FlashcardStorageError::MergeTooFew);
        }

        let mut cards = unique
            .iter()
            .map(|id| self.get(*id))
            .collect::<Result<Vec<_>>>()?;
        let mut merged = cards.remove(0);

        for other in &cards {
            merged.context_known = union_contexts(merged.context_known.take(), &other.context_known);
            merged.context_learning =
                union_contexts(merged.context_learning.take(), &other.context_learning);
            let mut tags = std::mem::take(&mut merged.tags);
            tags.extend(other.tags.iter().cloned());
            merged.tags = dedup_preserving_order(tags);
            merged.set_stats(merged.stats().combined(other.stats()));
        }

        let merged = self.update(&merged)?;
        for other in cards {
            self.delete(other.id)?;
        }

        log::info!("Merged {} cards into {}", unique.len(), merged.id);
        Ok(merged)
    }

    /// All distinct language pairs, sorted
    fn language_pairs(&self) -> Result<Vec<LanguagePair>> {
        let pairs: BTreeSet<LanguagePair> = self
            .get_all()?
            .iter()
            .map(Flashcard::language_pair)
            .collect();
        Ok(pairs.into_iter().collect())
    }

    /// Groups of cards sharing the same text within the same language pair
    fn find_duplicates(&self) -> Result<Vec<Vec<Flashcard>>> {
        let mut groups: BTreeMap<(String, String, String, String), Vec<Flashcard>> = BTreeMap::new();
        for card in self.get_all()? {
            let key = (
                card.known_language.clone(),
                card.learning_language.clone(),
                card.known.trim().to_lowercase(),
                card.learning.trim().to_lowercase(),
            );
            groups.entry(key).or_default().push(card);
        }

        Ok(groups
            .into_values()
            .filter(|group| group.len() > 1)
            .map(|mut group| {
                group.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                group
            })
            .collect())
    }
}

fn union_contexts(base: Option<Vec<String>>, other: &Option<Vec<String>>) -> Option<Vec<String>> {
    let mut values = base.unwrap_or_default();
    if let Some(extra) = other {
        for value in extra {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }
    (!values.is_empty()).then_some(values)
}

fn validate(card: &Flashcard) -> Result<()> {
    if card.known.trim().is_empty() {
        return Err(FlashcardStorageError::EmptyField("known"));
    }
    if card.learning.trim().is_empty() {
        return Err(FlashcardStorageError::EmptyField("learning"));
    }
    Ok(())
}

/// File-backed flashcard store
pub struct FlashcardStorage {
    /// Base data directory (e.g., ~/.local/share/lingo)
    data_dir: PathBuf,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Get the cards directory
    fn cards_dir(&self) -> PathBuf {
        self.data_dir.join("flashcards")
    }

    /// Get the path for a specific card
    fn card_path(&self, card_id: Uuid) -> PathBuf {
        self.cards_dir().join(format!("{}.json", card_id))
    }

    /// Initialize flashcard storage
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.cards_dir())?;
        Ok(())
    }

    fn write_card(&self, card: &Flashcard) -> Result<()> {
        self.init()?;
        fs::write(self.card_path(card.id), serde_json::to_string_pretty(card)?)?;
        Ok(())
    }
}

impl FlashcardStore for FlashcardStorage {
    fn get_all(&self) -> Result<Vec<Flashcard>> {
        let cards_dir = self.cards_dir();
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                match serde_json::from_str::<Flashcard>(&content) {
                    Ok(card) => cards.push(card),
                    Err(e) => log::warn!("Skipping unreadable card file {:?}: {}", path, e),
                }
            }
        }

        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cards)
    }

    fn get(&self, id: Uuid) -> Result<Flashcard> {
        let card_path = self.card_path(id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(id));
        }

        let content = fs::read_to_string(&card_path)?;
        let card: Flashcard = serde_json::from_str(&content)?;
        Ok(card)
    }

    fn add(&mut self, card: NewFlashcard) -> Result<Flashcard> {
        let card = card.into_flashcard();
        validate(&card)?;
        self.write_card(&card)?;
        log::debug!("Added card {} ({} / {})", card.id, card.known, card.learning);
        Ok(card)
    }

    fn update(&mut self, card: &Flashcard) -> Result<Flashcard> {
        validate(card)?;
        if !self.card_path(card.id).exists() {
            return Err(FlashcardStorageError::CardNotFound(card.id));
        }

        let mut card = card.clone();
        card.updated_at = Utc::now();
        self.write_card(&card)?;
        Ok(card)
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        let card_path = self.card_path(id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(id));
        }
        fs::remove_file(&card_path)?;
        Ok(())
    }
}

/// In-process store, used for ephemeral sessions and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: BTreeMap<Uuid, Flashcard>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlashcardStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<Flashcard>> {
        let mut cards: Vec<Flashcard> = self.cards.values().cloned().collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cards)
    }

    fn get(&self, id: Uuid) -> Result<Flashcard> {
        self.cards
            .get(&id)
            .cloned()
            .ok_or(FlashcardStorageError::CardNotFound(id))
    }

    fn add(&mut self, card: NewFlashcard) -> Result<Flashcard> {
        let card = card.into_flashcard();
        validate(&card)?;
        self.cards.insert(card.id, card.clone());
        Ok(card)
    }

    fn update(&mut self, card: &Flashcard) -> Result<Flashcard> {
        validate(card)?;
        let slot = self
            .cards
            .get_mut(&card.id)
            .ok_or(FlashcardStorageError::CardNotFound(card.id))?;
        *slot = card.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        self.cards
            .remove(&id)
            .map(|_| ())
            .ok_or(FlashcardStorageError::CardNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FlashcardStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp_dir.path().to_path_buf());
        storage.init().unwrap();
        (storage, temp_dir)
    }

    fn en_de() -> LanguagePair {
        LanguagePair::new("English", "German")
    }

    #[test]
    fn test_add_and_get_card() {
        let (mut storage, _temp) = create_test_storage();

        let created = storage
            .add(NewFlashcard::new("house", "Haus", &en_de()).with_tags(vec!["noun".into()]))
            .unwrap();
        let retrieved = storage.get(created.id).unwrap();

        assert_eq!(retrieved.known, "house");
        assert_eq!(retrieved.learning, "Haus");
        assert_eq!(retrieved.tags, vec!["noun".to_string()]);
    }

    #[test]
    fn test_add_rejects_empty_text() {
        let (mut storage, _temp) = create_test_storage();
        let err = storage.add(NewFlashcard::new("  ", "Haus", &en_de())).unwrap_err();
        assert!(matches!(err, FlashcardStorageError::EmptyField("known")));
        assert!(storage.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let (mut storage, _temp) = create_test_storage();
        let card = storage.add(NewFlashcard::new("tree", "Baum", &en_de())).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = storage.update_stats(card.id, CardStats::new(2, 1, 0)).unwrap();

        assert!(updated.updated_at > card.updated_at);
        assert_eq!(updated.created_at, card.created_at);
        assert_eq!(storage.get(card.id).unwrap().stats(), CardStats::new(2, 1, 0));
    }

    #[test]
    fn test_update_missing_card() {
        let (mut storage, _temp) = create_test_storage();
        let ghost = Flashcard::new("a".into(), "b".into(), "x".into(), "y".into());
        assert!(matches!(
            storage.update(&ghost),
            Err(FlashcardStorageError::CardNotFound(_))
        ));
    }

    #[test]
    fn test_get_by_language_pair() {
        let (mut storage, _temp) = create_test_storage();
        storage.add(NewFlashcard::new("house", "Haus", &en_de())).unwrap();
        storage
            .add(NewFlashcard::new("house", "casa", &LanguagePair::new("English", "Spanish")))
            .unwrap();

        let german = storage.get_by_language_pair(&en_de()).unwrap();
        assert_eq!(german.len(), 1);
        assert_eq!(german[0].learning, "Haus");

        let pairs = storage.language_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_delete_card() {
        let (mut storage, _temp) = create_test_storage();
        let card = storage.add(NewFlashcard::new("dog", "Hund", &en_de())).unwrap();

        storage.delete(card.id).unwrap();
        assert!(matches!(
            storage.get(card.id),
            Err(FlashcardStorageError::CardNotFound(_))
        ));
        assert!(storage.delete(card.id).is_err());
    }

    #[test]
    fn test_merge_sums_counters_and_unions() {
        let (mut storage, _temp) = create_test_storage();
        let mut first = NewFlashcard::new("dog", "Hund", &en_de())
            .with_tags(vec!["animal".into()])
            .with_contexts(vec!["my dog".into()], Vec::new());
        first.stats = CardStats::new(1, 2, 0);
        let mut second = NewFlashcard::new("dog", "Hund", &en_de())
            .with_tags(vec!["Animal".into(), "pet".into()])
            .with_contexts(vec!["my dog".into(), "a dog".into()], vec!["der Hund".into()]);
        second.stats = CardStats::new(3, 0, 1);

        let first = storage.add(first).unwrap();
        let second = storage.add(second).unwrap();

        let merged = storage.merge(&[first.id, second.id]).unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.stats(), CardStats::new(4, 2, 1));
        assert_eq!(merged.tags, vec!["animal".to_string(), "pet".to_string()]);
        assert_eq!(
            merged.context_known,
            Some(vec!["my dog".to_string(), "a dog".to_string()])
        );
        assert_eq!(merged.context_learning, Some(vec!["der Hund".to_string()]));
        assert_eq!(storage.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_requires_two_distinct_cards() {
        let mut store = MemoryStore::new();
        let card = store.add(NewFlashcard::new("dog", "Hund", &en_de())).unwrap();
        assert!(matches!(
            store.merge(&[card.id, card.id]),
            Err(FlashcardStorageError::MergeTooFew)
        ));
        assert!(store.get(card.id).is_ok());
    }

    #[test]
    fn test_lock_store_reports_poisoned_lock() {
        let store = shared(MemoryStore::new());
        let held = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            panic!("writer crashed while holding the store");
        })
        .join();

        assert!(matches!(
            lock_store(&store),
            Err(FlashcardStorageError::LockPoisoned)
        ));
    }

    #[test]
    fn test_find_duplicates() {
        let mut store = MemoryStore::new();
        store.add(NewFlashcard::new("Dog", "Hund", &en_de())).unwrap();
        store.add(NewFlashcard::new("dog ", "hund", &en_de())).unwrap();
        store.add(NewFlashcard::new("cat", "Katze", &en_de())).unwrap();
        store
            .add(NewFlashcard::new("dog", "Hund", &LanguagePair::new("English", "Dutch")))
            .unwrap();

        let groups = store.find_duplicates().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
