//! The interactive terminal walk through the wizard. One line of input is
//! one user action; the engine owns all state in between.

use actix_web::cookie::CookieJar;
use anyhow::Context;
use colored::*;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::browser::{load_cookie_jar, save_cookie_jar, BrowserContext};
use crate::client::ApiClient;
use crate::config::Config;
use crate::engine::{Advance, Collaborators, Engine, Focus};
use crate::resolver::CardArrival;
use crate::view;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Zero-based positions. Without a step the focused one is meant.
    Choose { step: Option<usize>, option: usize },
    Back,
    Forward,
    Reset,
    Debug,
    Help,
    Quit,
}

/// Reads one input line. Numbers on screen start at 1.
pub fn parse_command(line: &str, debug_enabled: bool) -> Result<Option<Command>, String> {
    let input = line.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let command = match input.to_ascii_lowercase().as_str() {
        "b" | "back" => Command::Back,
        "f" | "forward" => Command::Forward,
        "r" | "reset" => Command::Reset,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "d" | "debug" if debug_enabled => Command::Debug,
        other => parse_choice(other).ok_or_else(|| format!("Unknown command '{}'. Type h for help.", input))?,
    };
    Ok(Some(command))
}

fn parse_choice(input: &str) -> Option<Command> {
    let position = |raw: &str| raw.trim().parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1);
    match input.split_once('.') {
        Some((step, option)) => Some(Command::Choose {
            step: Some(position(step)?),
            option: position(option)?,
        }),
        None => Some(Command::Choose {
            step: None,
            option: position(input)?,
        }),
    }
}

/// The URL the walk starts at: the bare path, or the path with a query
/// string to restore from.
pub fn start_url(query: Option<&str>) -> String {
    match query.map(|q| q.trim().trim_start_matches('?')) {
        Some(q) if !q.is_empty() => format!("/?{}", q),
        _ => "/".to_string(),
    }
}

fn save_jar(jar: &CookieJar, path: &Path) {
    if let Err(e) = save_cookie_jar(jar, path) {
        log::warn!("Could not save cookies to {}: {}", path.display(), e);
    }
}

/// Prints the steps and, once the wizard completed, the panel as it stands.
/// Cards still loading are printed as they arrive.
fn render(engine: &Engine) {
    print!("\n{}", view::render_steps(engine));
    println!("{}", engine.url().dimmed());
    if let Some(items) = engine.panel() {
        print!("\n{}", view::render_panel(&items));
    }
}

/// The line to print for a card arrival, if it belongs to the panel shown.
fn arrival_line(engine: &Engine, arrival: &CardArrival) -> Option<String> {
    let (item, html) = engine.arrived(arrival)?;
    Some(view::render_arrival(&item, &html))
}

enum Event {
    Line(Option<String>),
    Card(CardArrival),
    Interrupted,
}

fn apply(engine: &mut Engine, step: Option<usize>, option: usize) -> Result<(), String> {
    let step = match (step, engine.traversal().focus()) {
        (Some(step), _) => step,
        (None, Focus::Step(step)) => step,
        (None, Focus::Recommendation) => {
            return Err("The wizard is complete. Use <step>.<option> to change an answer.".to_string());
        }
    };
    match engine.choose(step, option).map_err(|e| e.to_string())? {
        Advance::Complete { fallback: true, .. } => {
            log::debug!("The path ended without an explicit recommendation target.");
        }
        Advance::Complete { .. } | Advance::Step(_) => {}
    }
    Ok(())
}

pub async fn run(config: &Config, query: Option<String>, fresh: bool) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.server_url)?;
    let document = client
        .fetch_wizard()
        .await
        .with_context(|| format!("could not load the wizard from {}", config.server_url))?;
    if document.is_empty() {
        println!("{}", "The wizard has no steps configured.".yellow());
        return Ok(());
    }

    let jar_path = Path::new(&config.cookie_jar_path);
    let jar = if fresh { CookieJar::new() } else { load_cookie_jar(jar_path) };
    let ctx = BrowserContext::new(start_url(query.as_deref()), jar);
    let mut engine = Engine::new(
        Arc::new(document),
        ctx,
        config.cookies.clone(),
        Collaborators {
            content: Arc::new(client.clone()),
            usage: Arc::new(client),
            tracking_enabled: config.tracking_enabled,
        },
    );

    let mut arrivals = engine.card_arrivals();
    if let Some(source) = engine.start() {
        println!("{}", format!("Picked up where you left off (from the {}).", source.as_str()).green());
    }
    save_jar(engine.cookies(), jar_path);
    print!("{}", view::render_help(config.debug_enabled));
    render(&engine);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut prompt = true;
    loop {
        if prompt {
            print!("> ");
            let _ = std::io::stdout().flush();
        }
        prompt = true;

        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line?),
            Some(arrival) = arrivals.recv() => Event::Card(arrival),
            _ = tokio::signal::ctrl_c() => Event::Interrupted,
        };
        let line = match event {
            Event::Card(arrival) => {
                match arrival_line(&engine, &arrival) {
                    Some(text) => print!("\r{}", text),
                    None => prompt = false,
                }
                continue;
            }
            Event::Interrupted => break,
            Event::Line(Some(line)) => line,
            Event::Line(None) => {
                // Input ended: show whatever cards are still on their way.
                engine.settle().await;
                while let Ok(arrival) = arrivals.try_recv() {
                    if let Some(text) = arrival_line(&engine, &arrival) {
                        print!("{}", text);
                    }
                }
                break;
            }
        };

        let command = match parse_command(&line, config.debug_enabled) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => print!("{}", view::render_help(config.debug_enabled)),
            Command::Debug => print!("{}", view::render_debug(&engine.debug_info())),
            Command::Back => {
                if engine.back() {
                    render(&engine);
                } else {
                    println!("{}", "Nothing to go back to.".yellow());
                }
            }
            Command::Forward => {
                if engine.forward() {
                    render(&engine);
                } else {
                    println!("{}", "Nothing to go forward to.".yellow());
                }
            }
            Command::Reset => {
                engine.reset();
                render(&engine);
            }
            Command::Choose { step, option } => match apply(&mut engine, step, option) {
                Ok(()) => render(&engine),
                Err(message) => println!("{}", message.red()),
            },
        }
        save_jar(engine.cookies(), jar_path);
    }

    engine.unload(Duration::from_millis(config.beacon_timeout_ms)).await;
    save_jar(engine.cookies(), jar_path);
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::engine_at;
    use crate::wizard::fixtures;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  ", false), Ok(None));
        assert_eq!(parse_command("2", false), Ok(Some(Command::Choose { step: None, option: 1 })));
        assert_eq!(
            parse_command("3.1", false),
            Ok(Some(Command::Choose { step: Some(2), option: 0 }))
        );
        assert_eq!(parse_command("B", false), Ok(Some(Command::Back)));
        assert_eq!(parse_command("forward", false), Ok(Some(Command::Forward)));
        assert_eq!(parse_command("r", false), Ok(Some(Command::Reset)));
        assert_eq!(parse_command("q", false), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("?", false), Ok(Some(Command::Help)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("0", false).is_err());
        assert!(parse_command("1.0", false).is_err());
        assert!(parse_command("x.2", false).is_err());
        assert!(parse_command("jump", false).is_err());
        assert!(parse_command("d", false).is_err());
        assert_eq!(parse_command("d", true), Ok(Some(Command::Debug)));
    }

    #[test]
    fn test_start_url() {
        assert_eq!(start_url(None), "/");
        assert_eq!(start_url(Some("")), "/");
        assert_eq!(start_url(Some("?size=small")), "/?size=small");
        assert_eq!(start_url(Some("size=small&color=blue")), "/?size=small&color=blue");
    }

    #[actix_rt::test]
    async fn test_arrival_line_for_the_open_panel_only() {
        colored::control::set_override(false);
        let mut doc = fixtures::shoes();
        doc.recommendations[0].content_ids = vec![2];
        let (mut engine, _) = engine_at(doc, "/", CookieJar::new());
        let mut arrivals = engine.card_arrivals();
        apply(&mut engine, None, 0).unwrap();
        apply(&mut engine, None, 0).unwrap();

        let arrival = arrivals.recv().await.unwrap();
        assert_eq!(
            arrival_line(&engine, &arrival).as_deref(),
            Some("    + Blue runners: card 2\n")
        );
        engine.reset();
        assert!(arrival_line(&engine, &arrival).is_none());
    }

    #[test]
    fn test_apply_uses_the_focused_step() {
        let (mut engine, _) = engine_at(fixtures::shoes(), "/", CookieJar::new());
        apply(&mut engine, None, 1).unwrap();
        assert_eq!(engine.traversal().focus(), Focus::Step(1));
        apply(&mut engine, None, 0).unwrap();
        assert_eq!(engine.traversal().focus(), Focus::Recommendation);

        assert!(apply(&mut engine, None, 0).is_err());
        apply(&mut engine, Some(0), 0).unwrap();
        assert_eq!(engine.traversal().focus(), Focus::Step(1));
        assert!(apply(&mut engine, Some(2), 0).is_err());
    }
}
