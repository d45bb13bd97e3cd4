use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use lingo_lib::flashcards::csv_io::{export_cards, import_cards};

use crate::app::App;
use crate::FilterArgs;

use super::build_filter;

pub fn run_import(app: &App, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let report = import_cards(BufReader::new(file), &app.settings.language_pair())
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut store = app.store()?;
    let mut imported = 0;
    for card in report.cards {
        match store.add(card) {
            Ok(_) => imported += 1,
            Err(e) => log::warn!("Skipping card during import: {}", e),
        }
    }

    println!("Imported {} cards from {}", imported, path.display());
    if !report.skipped_rows.is_empty() {
        println!(
            "  Skipped rows: {}",
            report
                .skipped_rows
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

pub fn run_export(app: &App, target: &str, args: &FilterArgs) -> Result<()> {
    let cards = app.list_cards(&build_filter(app, args))?;

    if target == "-" {
        export_cards(io::stdout().lock(), &cards).context("Failed to write CSV")?;
    } else {
        let file = File::create(target).with_context(|| format!("Failed to create {}", target))?;
        export_cards(file, &cards).context("Failed to write CSV")?;
        println!("Exported {} cards to {}", cards.len(), target);
    }
    Ok(())
}
