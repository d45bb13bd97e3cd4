//! CSV import and export of flashcards
//!
//! Columns: `known,learning,knownLanguage,learningLanguage,contextKnown,
//! contextLearning,tags,correctCount,wrongCount,revisitCount`. Multi-valued
//! columns are separated with `|`. Only `known` and `learning` are required.

use std::io::{Read, Write};

use thiserror::Error;

use super::models::{CardStats, Flashcard, LanguagePair, NewFlashcard};

const LIST_SEPARATOR: &str = "|";

const HEADERS: [&str; 10] = [
    "known",
    "learning",
    "knownLanguage",
    "learningLanguage",
    "contextKnown",
    "contextLearning",
    "tags",
    "correctCount",
    "wrongCount",
    "revisitCount",
];

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

pub type Result<T> = std::result::Result<T, CsvError>;

/// Cards parsed from a CSV file, plus the rows that were rejected
#[derive(Debug, Default)]
pub struct ImportReport {
    pub cards: Vec<NewFlashcard>,
    /// 1-based data row numbers that were skipped
    pub skipped_rows: Vec<usize>,
}

/// Column positions resolved from the header row
struct Columns {
    known: usize,
    learning: usize,
    known_language: Option<usize>,
    learning_language: Option<usize>,
    context_known: Option<usize>,
    context_learning: Option<usize>,
    tags: Option<usize>,
    correct: Option<usize>,
    wrong: Option<usize>,
    revisit: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            known: find("known").ok_or(CsvError::MissingColumn("known"))?,
            learning: find("learning").ok_or(CsvError::MissingColumn("learning"))?,
            known_language: find("knownLanguage"),
            learning_language: find("learningLanguage"),
            context_known: find("contextKnown"),
            context_learning: find("contextLearning"),
            tags: find("tags"),
            correct: find("correctCount"),
            wrong: find("wrongCount"),
            revisit: find("revisitCount"),
        })
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> &'a str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Split a `|`-separated list, dropping blank entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Blank counters are zero; anything else must be a non-negative integer
fn parse_count(value: &str) -> Option<u32> {
    if value.is_empty() {
        Some(0)
    } else {
        value.parse().ok()
    }
}

/// Parse cards from CSV.
///
/// Rows without a language use `default_pair`; rows with empty text on either
/// side are skipped.
pub fn import_cards<R: Read>(reader: R, default_pair: &LanguagePair) -> Result<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(reader.headers()?)?;
    let mut report = ImportReport::default();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping malformed CSV row {}: {}", row, e);
                report.skipped_rows.push(row);
                continue;
            }
        };

        let known = field(&record, Some(columns.known));
        let learning = field(&record, Some(columns.learning));
        if known.is_empty() || learning.is_empty() {
            report.skipped_rows.push(row);
            continue;
        }

        let counts = (
            parse_count(field(&record, columns.correct)),
            parse_count(field(&record, columns.wrong)),
            parse_count(field(&record, columns.revisit)),
        );
        let (Some(correct), Some(wrong), Some(revisit)) = counts else {
            log::warn!("Skipping CSV row {}: invalid counter value", row);
            report.skipped_rows.push(row);
            continue;
        };

        let known_language = match field(&record, columns.known_language) {
            "" => default_pair.known.as_str(),
            lang => lang,
        };
        let learning_language = match field(&record, columns.learning_language) {
            "" => default_pair.learning.as_str(),
            lang => lang,
        };

        let mut card = NewFlashcard::new(
            known,
            learning,
            &LanguagePair::new(known_language, learning_language),
        )
        .with_tags(split_list(field(&record, columns.tags)))
        .with_contexts(
            split_list(field(&record, columns.context_known)),
            split_list(field(&record, columns.context_learning)),
        );
        card.stats = CardStats::new(correct, wrong, revisit);

        report.cards.push(card);
    }

    log::info!(
        "Parsed {} cards from CSV ({} rows skipped)",
        report.cards.len(),
        report.skipped_rows.len()
    );
    Ok(report)
}

/// Write cards as CSV with a header row
pub fn export_cards<W: Write>(writer: W, cards: &[Flashcard]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADERS)?;

    let join = |values: &Option<Vec<String>>| {
        values
            .as_ref()
            .map(|v| v.join(LIST_SEPARATOR))
            .unwrap_or_default()
    };

    for card in cards {
        writer.write_record([
            card.known.clone(),
            card.learning.clone(),
            card.known_language.clone(),
            card.learning_language.clone(),
            join(&card.context_known),
            join(&card.context_learning),
            card.tags.join(LIST_SEPARATOR),
            card.correct_count.to_string(),
            card.wrong_count.to_string(),
            card.revisit_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pair() -> LanguagePair {
        LanguagePair::new("English", "Ukrainian")
    }

    #[test]
    fn test_import_minimal_columns() {
        let data = "known,learning\ndog,собака\ncat,кіт\n";
        let report = import_cards(data.as_bytes(), &default_pair()).unwrap();

        assert_eq!(report.cards.len(), 2);
        assert!(report.skipped_rows.is_empty());
        assert_eq!(report.cards[0].known_language, "English");
        assert_eq!(report.cards[1].learning, "кіт");
    }

    #[test]
    fn test_import_full_row() {
        let data = "Known,Learning,knownLanguage,learningLanguage,contextKnown,contextLearning,tags,correctCount,wrongCount,revisitCount\n\
                    house,Haus,English,German,a house|the house,das Haus,noun|home,3,1,2\n";
        let report = import_cards(data.as_bytes(), &default_pair()).unwrap();
        let card = report.cards[0].clone().into_flashcard();

        assert_eq!(card.learning_language, "German");
        assert_eq!(
            card.context_known,
            Some(vec!["a house".to_string(), "the house".to_string()])
        );
        assert_eq!(card.tags, vec!["noun".to_string(), "home".to_string()]);
        assert_eq!(card.stats(), CardStats::new(3, 1, 2));
    }

    #[test]
    fn test_import_skips_empty_sides() {
        let data = "known,learning\ndog,\n,кіт\nbird,птах\n";
        let report = import_cards(data.as_bytes(), &default_pair()).unwrap();

        assert_eq!(report.cards.len(), 1);
        assert_eq!(report.skipped_rows, vec![1, 2]);
    }

    #[test]
    fn test_import_skips_invalid_counters() {
        let data = "known,learning,correctCount,wrongCount\n\
                    dog,собака,2,\n\
                    cat,кіт,abc,0\n\
                    bird,птах,1,-1\n";
        let report = import_cards(data.as_bytes(), &default_pair()).unwrap();

        assert_eq!(report.cards.len(), 1);
        assert_eq!(report.cards[0].stats, CardStats::new(2, 0, 0));
        assert_eq!(report.skipped_rows, vec![2, 3]);
    }

    #[test]
    fn test_split_list_drops_blank_entries() {
        assert_eq!(split_list(" a house | |the house|"), vec!["a house", "the house"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_import_requires_columns() {
        let data = "front,back\ndog,собака\n";
        let err = import_cards(data.as_bytes(), &default_pair()).unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn("known")));
    }

    #[test]
    fn test_export_then_import_keeps_contexts_and_counts() {
        let mut card = NewFlashcard::new("tree", "дерево", &default_pair())
            .with_tags(vec!["nature".into()])
            .with_contexts(vec!["a tall tree".into(), "green tree".into()], Vec::new())
            .into_flashcard();
        card.wrong_count = 4;

        let mut out = Vec::new();
        export_cards(&mut out, &[card]).unwrap();

        let report = import_cards(out.as_slice(), &LanguagePair::new("x", "y")).unwrap();
        let back = report.cards[0].clone().into_flashcard();
        assert_eq!(back.known_language, "English");
        assert_eq!(back.context_known.as_ref().map(Vec::len), Some(2));
        assert_eq!(back.context_learning, None);
        assert_eq!(back.wrong_count, 4);
    }
}
