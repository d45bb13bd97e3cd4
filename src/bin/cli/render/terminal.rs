use lingo_lib::flashcards::Flashcard;
use lingo_lib::session::{SessionCard, SessionConfig, SwipeDirection};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Truncate to `width` characters, adding an ellipsis when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// "✓3 ✗1 ↻0" style counter summary
pub fn stats_line(card: &Flashcard, use_color: bool) -> String {
    format!(
        "{} {} {}",
        paint(&format!("✓{}", card.correct_count), Color::GREEN, use_color),
        paint(&format!("✗{}", card.wrong_count), Color::RED, use_color),
        paint(&format!("↻{}", card.revisit_count), Color::YELLOW, use_color),
    )
}

/// Short id used in listings; any unique prefix is accepted by commands
pub fn short_id(card: &Flashcard) -> String {
    card.id.to_string()[..8].to_string()
}

/// Render the card the user is studying
pub fn render_study_card(
    card: &SessionCard,
    config: &SessionConfig,
    progress: usize,
    total: usize,
    use_color: bool,
) -> String {
    let mut lines = Vec::new();

    let face = if card.is_flipped { "back" } else { "front" };
    lines.push(paint(
        &format!("[{}/{}] {}", progress + 1, total, face),
        Color::GRAY,
        use_color,
    ));
    lines.push(paint(
        card.visible_text(config.show_learning_first),
        Color::BOLD,
        use_color,
    ));

    for context in card.visible_contexts(config.show_learning_first) {
        lines.push(paint(&format!("  “{}”", context), Color::ITALIC, use_color));
    }

    if !card.card.tags.is_empty() {
        let tags = card
            .card
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(paint(&tags, Color::CYAN, use_color));
    }

    lines.join("\n")
}

pub fn describe_swipe(direction: SwipeDirection, use_color: bool) -> String {
    match direction {
        SwipeDirection::Right => paint("correct", Color::GREEN, use_color),
        SwipeDirection::Left => paint("wrong", Color::RED, use_color),
        SwipeDirection::Down => paint("flagged for revisit", Color::YELLOW, use_color),
    }
}
