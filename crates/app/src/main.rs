//! AI Web Studio - terminal front end.
//!
//! Reads prompts and slash commands from stdin, streams generated code into
//! per-mode buffers and mirrors the active buffer into an output directory
//! (`./studio-out` unless a directory is given as the first argument).

mod commands;
mod console;
mod preview;

use anyhow::{Context, Result};
use providers::OpenRouterClient;
use shared::agent_api::Role;
use shared::models::MODEL_CATALOG;
use shared::settings::StudioSettings;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use studio::prompts::transcript_summary;
use studio::{
    templates_for, ImageAttachment, LocalStore, Registry, StudioError, StudioSession, UndoOutcome,
    LIBRARIES,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Command, HELP};
use console::{print_line, ConsoleObserver, Transcript};
use preview::FilePreview;

fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "AI Web Studio", "AIWebStudio")
        .map(|proj| proj.config_dir().to_path_buf())
}

fn load_settings() -> StudioSettings {
    let Some(dir) = config_dir() else {
        warn!("No config directory available, using default settings");
        return StudioSettings::default();
    };
    let path = dir.join("settings.json");
    match StudioSettings::load_or_init(&path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Falling back to default settings: {:#}", e);
            StudioSettings::default()
        }
    }
}

fn open_store() -> Result<LocalStore> {
    match LocalStore::default_path() {
        Some(path) => LocalStore::open(&path)
            .with_context(|| format!("opening local storage at {}", path.display())),
        None => {
            warn!("No config directory available, settings will not persist");
            Ok(LocalStore::in_memory())
        }
    }
}

/// Report an error the way the chat pane does: as an assistant line.
fn report(transcript: &Transcript, err: &StudioError) {
    print_line(&transcript.push(Role::Assistant, format!("Error: {}", err)));
}

fn prompt_marker(session: &StudioSession) {
    let mode = session.workspace().read().active_mode();
    print!("{}> ", mode.as_str());
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("studio-out"));

    let settings = load_settings();
    let store = open_store()?.shared();
    let registry = Registry::load(store.clone());
    let backend = Arc::new(OpenRouterClient::new(&settings.api));
    let renderer = Arc::new(FilePreview::new(&out_dir));
    let session = StudioSession::start(
        &settings,
        store,
        registry,
        backend,
        renderer.clone(),
        Arc::new(ConsoleObserver::default()),
    );
    session.refresh_active();
    info!(
        "AI Web Studio ready (model {}, preview in {})",
        session.model().id,
        renderer.dir().display()
    );
    if !session.registry().read().has_credential() {
        println!("No API key set. Use /key <your OpenRouter key> to add one.");
    }
    println!("Type /help for commands.");

    let transcript = Transcript::default();
    let mut pending_image: Option<ImageAttachment> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt_marker(&session);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Invalid(msg) => println!("{}", msg),
            Command::Mode(mode) => {
                if session.set_mode(mode) {
                    println!("Switched to {} ({}), loaded the default template", mode, mode.file_name());
                } else {
                    println!("Switched to {} ({})", mode, mode.file_name());
                }
            }
            Command::Templates => {
                let mode = session.workspace().read().active_mode();
                for template in templates_for(mode) {
                    println!("  {:<10} {:<20} {}", template.key, template.name, template.description);
                }
            }
            Command::Template(key) => match session.load_template(&key) {
                Ok(template) => println!("Loaded template: {}", template.name),
                Err(e) => report(&transcript, &e),
            },
            Command::Libraries => {
                for library in LIBRARIES {
                    println!("  {:<10} {}", library.key, library.name);
                }
            }
            Command::Library(key) => match session.insert_library(&key) {
                Ok(library) => println!("Inserted {}", library.name),
                Err(e) => report(&transcript, &e),
            },
            Command::Models => {
                let current = session.model().id;
                for model in MODEL_CATALOG {
                    println!(
                        "{} {:<42} {:<24} {}{}",
                        if model.id == current { "*" } else { " " },
                        model.id,
                        model.name,
                        if model.vision { "[vision] " } else { "" },
                        if model.free { "[free]" } else { "" }
                    );
                }
            }
            Command::Model(id) => match session.registry().write().set_model(&id) {
                Ok(model) => {
                    println!("Model: {} ({})", model.name, model.id);
                    if pending_image.is_some() && !model.vision {
                        pending_image = None;
                        println!("{} doesn't support images; attachment dropped.", model.name);
                    }
                }
                Err(e) => report(&transcript, &e),
            },
            Command::Key(key) => {
                let mut registry = session.registry().write();
                match registry.set_credential(&key) {
                    Ok(()) => println!("API key: {}", registry.masked_credential()),
                    Err(e) => report(&transcript, &e),
                }
            }
            Command::Image(path) => {
                let model = session.model();
                if !model.vision {
                    report(
                        &transcript,
                        &StudioError::VisionUnsupported {
                            model: model.name.to_string(),
                        },
                    );
                    continue;
                }
                match ImageAttachment::from_path(&path) {
                    Ok(image) => {
                        println!(
                            "Image attached: {} ({}, {} KB)",
                            image.name().unwrap_or("image"),
                            image.mime(),
                            image.size() / 1024
                        );
                        pending_image = Some(image);
                    }
                    Err(e) => report(&transcript, &e),
                }
            }
            Command::DropImage => {
                pending_image = None;
                println!("Image removed.");
            }
            Command::Undo => match session.undo() {
                UndoOutcome::Empty => println!("Nothing to undo."),
                UndoOutcome::Restored => println!("Reverted the last AI change."),
                UndoOutcome::RestoredOther(mode) => {
                    println!("Reverted the last AI change (switched to {}).", mode)
                }
            },
            Command::Clear => {
                session.clear_history();
                transcript.clear();
                println!("Conversation cleared.");
            }
            Command::Save(target) => {
                let (mode, code) = {
                    let ws = session.workspace().read();
                    (ws.active_mode(), ws.text().to_string())
                };
                let written = match target {
                    Some(path) => std::fs::write(&path, &code)
                        .map(|_| path.clone())
                        .with_context(|| format!("writing {}", path.display())),
                    None => preview::export(&out_dir, mode, &code),
                };
                match written {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => println!("Save failed: {:#}", e),
                }
            }
            Command::Show => {
                let ws = session.workspace().read();
                println!("--- {} ---\n{}", ws.active_mode().file_name(), ws.text());
            }
            Command::Status => {
                let registry = session.registry().read();
                let ws = session.workspace().read();
                println!(
                    "mode: {}  model: {}  key: {}  image: {}  history: {} exchanges  transcript: {} lines  undo: {}  queued: {}",
                    ws.active_mode(),
                    registry.model().id,
                    registry.masked_credential(),
                    pending_image.as_ref().and_then(|i| i.name()).unwrap_or("none"),
                    session.history().lock().exchanges(),
                    transcript.len(),
                    ws.undo_depth(),
                    session.pending()
                );
            }
            Command::Prompt(text) => {
                let has_image = pending_image.is_some();
                transcript.push(Role::User, transcript_summary(&text, has_image));

                let pending = match session.submit(&text, pending_image.take()) {
                    Ok(pending) => pending,
                    Err(e) => {
                        report(&transcript, &e);
                        continue;
                    }
                };
                let mode = pending.mode();
                match pending.wait().await {
                    Ok(result) => {
                        session.apply(mode, &result);
                        let line = transcript.push(Role::Assistant, result.history_summary());
                        print_line(&line);
                    }
                    Err(e) => report(&transcript, &e),
                }
            }
        }
    }

    println!();
    session.shutdown().await;
    Ok(())
}
