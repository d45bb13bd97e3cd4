use anyhow::{Context, Result};

use lingo_lib::flashcards::csv_io::split_list;
use lingo_lib::flashcards::NewFlashcard;

use crate::app::{split_csv_arg, App};
use crate::render::terminal::{paint, short_id, stats_line, truncate, Color};
use crate::{FilterArgs, OutputFormat};

use super::build_filter;

pub fn run_add(
    app: &App,
    known: &str,
    learning: &str,
    tags: Option<&str>,
    context_known: Option<&str>,
    context_learning: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let request = NewFlashcard::new(known, learning, &app.settings.language_pair())
        .with_tags(split_csv_arg(tags))
        .with_contexts(
            context_known.map(split_list).unwrap_or_default(),
            context_learning.map(split_list).unwrap_or_default(),
        );

    let card = app.store()?.add(request).context("Failed to add card")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => {
            println!("Added \"{}\" / \"{}\" ({})", card.known, card.learning, card.language_pair());
            println!("  ID: {}", card.id);
        }
    }

    Ok(())
}

pub fn run_list(app: &App, args: &FilterArgs, format: &OutputFormat, use_color: bool) -> Result<()> {
    let filter = build_filter(app, args);
    let cards = app.list_cards(&filter)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No cards.");
                return Ok(());
            }

            let known_width = cards.iter().map(|c| c.known.chars().count()).max().unwrap_or(5).clamp(5, 30);
            let learning_width = cards.iter().map(|c| c.learning.chars().count()).max().unwrap_or(8).clamp(8, 30);

            println!(
                "{:<8} {:<kw$} {:<lw$} {}",
                "ID",
                "Known",
                "Learning",
                "Stats",
                kw = known_width,
                lw = learning_width,
            );
            for card in &cards {
                let mut line = format!(
                    "{:<8} {:<kw$} {:<lw$} {}",
                    paint(&short_id(card), Color::GRAY, use_color),
                    truncate(&card.known, known_width),
                    truncate(&card.learning, learning_width),
                    stats_line(card, use_color),
                    kw = known_width,
                    lw = learning_width,
                );
                if !card.tags.is_empty() {
                    let tags = card.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ");
                    line.push_str(&format!("  {}", paint(&tags, Color::CYAN, use_color)));
                }
                println!("{}", line);
            }
            println!("\n{} cards", cards.len());
        }
    }

    Ok(())
}

pub fn run_delete(app: &App, id: &str) -> Result<()> {
    let card = app.find_card(id)?;
    app.store()?.delete(card.id).context("Failed to delete card")?;
    println!("Deleted \"{}\" / \"{}\"", card.known, card.learning);
    Ok(())
}

pub fn run_merge(app: &App, ids: &[String], format: &OutputFormat) -> Result<()> {
    let ids = ids
        .iter()
        .map(|id| app.find_card(id).map(|c| c.id))
        .collect::<Result<Vec<_>>>()?;

    let merged = app.store()?.merge(&ids).context("Failed to merge cards")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&merged)?),
        OutputFormat::Plain => {
            println!("Merged {} cards into {}", ids.len(), merged.id);
            println!("  {} / {}  {}", merged.known, merged.learning, stats_line(&merged, false));
        }
    }
    Ok(())
}

pub fn run_duplicates(app: &App, merge: bool, format: &OutputFormat) -> Result<()> {
    let groups = app.store()?.find_duplicates().context("Failed to find duplicates")?;

    if merge {
        let mut merged_count = 0;
        for group in &groups {
            let ids: Vec<_> = group.iter().map(|c| c.id).collect();
            app.store()?.merge(&ids).context("Failed to merge duplicates")?;
            merged_count += 1;
        }
        println!("Merged {} duplicate groups", merged_count);
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        OutputFormat::Plain => {
            if groups.is_empty() {
                println!("No duplicates.");
                return Ok(());
            }
            for group in &groups {
                let first = &group[0];
                println!("{} / {} ({})", first.known, first.learning, first.language_pair());
                for card in group {
                    println!("  {}  {}", short_id(card), stats_line(card, false));
                }
            }
        }
    }

    Ok(())
}
