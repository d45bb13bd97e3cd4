use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    let settings = &app.settings;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(settings)?),
        OutputFormat::Plain => {
            println!("Data directory:   {}", app.data_dir.display());
            println!("Known language:   {}", settings.known_language);
            println!("Learning language: {}", settings.learning_language);
            println!("Learning first:   {}", settings.show_learning_first);
            println!("Restore delay:    {} ms", settings.restore_delay_ms);
        }
    }
    Ok(())
}

pub fn run_set(
    app: &mut App,
    known_language: Option<String>,
    learning_language: Option<String>,
    learning_first: Option<bool>,
    restore_delay_ms: Option<u64>,
) -> Result<()> {
    let mut settings = app.settings.clone();

    if let Some(lang) = known_language {
        settings.known_language = lang;
    }
    if let Some(lang) = learning_language {
        settings.learning_language = lang;
    }
    if let Some(first) = learning_first {
        settings.show_learning_first = first;
    }
    if let Some(delay) = restore_delay_ms {
        settings.restore_delay_ms = delay;
    }

    app.save_settings(settings)?;
    println!("Settings saved ({})", app.settings.language_pair());
    Ok(())
}
