use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use lingo_lib::session::{
    PersistenceQueue, SessionConfig, SessionStatus, StudySession, SwipeDirection,
};

use crate::app::App;
use crate::render::terminal::{describe_swipe, paint, render_study_card, Color};
use crate::FilterArgs;

use super::build_filter;

const HELP: &str = "[f]lip  [r]ight/correct  [l]eft/wrong  [d]own/revisit  [u]ndo  [q]uit";

enum Input {
    Flip,
    Swipe(SwipeDirection),
    Undo,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_lowercase().as_str() {
        "f" | "flip" | "" => Input::Flip,
        "r" | "right" | "y" => Input::Swipe(SwipeDirection::Right),
        "l" | "left" | "n" => Input::Swipe(SwipeDirection::Left),
        "d" | "down" => Input::Swipe(SwipeDirection::Down),
        "u" | "undo" => Input::Undo,
        "q" | "quit" | "exit" => Input::Quit,
        _ => Input::Unknown,
    }
}

/// Only undo leaves the completion screen; any other input ends the session
fn reopens_session(line: &str) -> bool {
    matches!(parse_input(line), Input::Undo)
}

pub async fn run(app: &App, args: &FilterArgs, use_color: bool) -> Result<()> {
    let queue = PersistenceQueue::start(app.store.clone());
    let config = SessionConfig::from(&app.settings);
    let session = StudySession::load(app.store.clone(), build_filter(app, args), config, queue.clone());

    let mut status = session.status();
    status
        .wait_for(|s| !matches!(s, SessionStatus::Loading))
        .await
        .context("Study session ended unexpectedly")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", paint(HELP, Color::GRAY, use_color));

    loop {
        let state = session.snapshot().await?;

        match state.status() {
            SessionStatus::Error { message } => {
                eprintln!("Could not start session: {}", message);
                break;
            }
            SessionStatus::Complete { has_any_cards } => {
                if has_any_cards {
                    println!(
                        "\n{}",
                        paint(
                            &format!("Congratulations! You studied all {} cards.", state.pool.len()),
                            Color::GREEN,
                            use_color
                        )
                    );
                    println!("{}", paint("[u]ndo last card  [q]uit", Color::GRAY, use_color));

                    let Some(line) = lines.next_line().await? else {
                        break;
                    };
                    if reopens_session(&line) {
                        session.undo()?;
                        continue;
                    }
                } else {
                    println!("No cards to study. Add some with `lingo add` or `lingo import`.");
                }
                break;
            }
            SessionStatus::Loading | SessionStatus::Active { .. } => {}
        }

        let Some(card) = state.top_card() else {
            break;
        };
        println!(
            "\n{}",
            render_study_card(card, session.config(), state.progress, state.pool.len(), use_color)
        );

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Flip => session.flip(card.id())?,
            Input::Swipe(direction) => {
                let answer = if session.config().show_learning_first {
                    &card.card.known
                } else {
                    &card.card.learning
                };
                println!("{} ({})", describe_swipe(direction, use_color), answer);
                session.swipe(card.id(), direction)?;
            }
            Input::Undo => {
                if state.discard_stack.is_empty() {
                    println!("Nothing to undo.");
                } else {
                    session.undo()?;
                }
            }
            Input::Quit => break,
            Input::Unknown => println!("{}", paint(HELP, Color::GRAY, use_color)),
        }
    }

    session.stop();
    queue.flush().await;
    let stats = queue.stats();
    if stats.failed > 0 {
        log::warn!("{} of {} statistic writes failed", stats.failed, stats.attempted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert!(matches!(parse_input(" R "), Input::Swipe(SwipeDirection::Right)));
        assert!(matches!(parse_input("left"), Input::Swipe(SwipeDirection::Left)));
        assert!(matches!(parse_input("d"), Input::Swipe(SwipeDirection::Down)));
        assert!(matches!(parse_input(""), Input::Flip));
        assert!(matches!(parse_input("u"), Input::Undo));
        assert!(matches!(parse_input("q"), Input::Quit));
        assert!(matches!(parse_input("?"), Input::Unknown));
    }

    #[test]
    fn test_completion_screen_accepts_undo() {
        assert!(reopens_session("u"));
        assert!(reopens_session(" Undo "));
        assert!(!reopens_session(""));
        assert!(!reopens_session("q"));
        assert!(!reopens_session("r"));
    }
}
