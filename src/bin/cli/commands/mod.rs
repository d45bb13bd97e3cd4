pub mod cards;
pub mod settings;
pub mod study;
pub mod transfer;

use lingo_lib::flashcards::CardFilter;

use crate::app::{split_csv_arg, App};
use crate::FilterArgs;

/// Build the card filter for a command from its flags
pub fn build_filter(app: &App, args: &FilterArgs) -> CardFilter {
    let mut filter = app
        .base_filter(args.all_languages)
        .with_tags(split_csv_arg(args.tags.as_deref()), args.all_tags);
    if let Some(search) = &args.search {
        filter = filter.with_search(search.as_str());
    }
    filter.only_revisit = args.revisit;
    filter.min_wrong = args.min_wrong;
    filter
}
