use std::path::{Path, PathBuf};
use std::sync::MutexGuard;

use anyhow::{bail, Context, Result};

use lingo_lib::flashcards::{lock_store, shared, CardFilter, Flashcard, FlashcardStorage, FlashcardStore, SharedStore};
use lingo_lib::settings::{resolve_data_dir, Settings, SettingsStorage};

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub settings_storage: SettingsStorage,
    pub settings: Settings,
    pub store: SharedStore,
}

impl App {
    /// Initialize from the given or default data directory
    pub fn new(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir).context("Failed to get data directory")?;

        let settings_storage = SettingsStorage::new(&data_dir);
        let settings = settings_storage
            .load()
            .context("Failed to load settings")?;

        let storage = FlashcardStorage::new(data_dir.clone());
        storage
            .init()
            .context("Failed to initialize flashcard storage")?;

        log::debug!("Using data directory {:?}", data_dir);

        Ok(Self {
            data_dir,
            settings_storage,
            settings,
            store: shared(storage),
        })
    }

    /// Lock the card store
    pub fn store(&self) -> Result<MutexGuard<'_, dyn FlashcardStore + 'static>> {
        lock_store(&self.store).context("Failed to access card store")
    }

    /// Filter scoped to the configured language pair unless `all_languages` is set
    pub fn base_filter(&self, all_languages: bool) -> CardFilter {
        if all_languages {
            CardFilter::new()
        } else {
            CardFilter::for_pair(self.settings.language_pair())
        }
    }

    pub fn list_cards(&self, filter: &CardFilter) -> Result<Vec<Flashcard>> {
        let cards = self.store()?.get_all().context("Failed to list cards")?;
        Ok(filter.apply(cards))
    }

    /// Find a card by id or unique id prefix
    pub fn find_card(&self, id_prefix: &str) -> Result<Flashcard> {
        let prefix = id_prefix.trim().to_lowercase();
        if prefix.is_empty() {
            bail!("Card id must not be empty");
        }

        let cards = self.store()?.get_all().context("Failed to list cards")?;
        let matches: Vec<&Flashcard> = cards
            .iter()
            .filter(|c| c.id.to_string().starts_with(&prefix))
            .collect();

        match matches.len() {
            0 => bail!("No card with id starting with '{}'", id_prefix),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous card id '{}'. Matches:\n{}",
                id_prefix,
                matches
                    .iter()
                    .map(|c| format!("  - {}  {} / {}", c.id, c.known, c.learning))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    pub fn save_settings(&mut self, settings: Settings) -> Result<()> {
        self.settings_storage
            .save(&settings)
            .context("Failed to save settings")?;
        self.settings = settings;
        Ok(())
    }
}

/// Split a comma-separated option into trimmed, non-empty values
pub fn split_csv_arg(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
