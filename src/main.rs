//! Flappy entry point
//!
//! Sets up logging, settings, the terminal and audio, then runs the game loop
//! until the player quits.

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec2;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

use flappy::{Difficulty, Settings};
use flappy::audio::{Mixer, SilentMixer};
use flappy::platform::terminal::{TerminalCanvas, TerminalGuard, spawn_event_pump};
use flappy::scene::Scene;

const LOG_FILE: &str = "flappy.log";
const CONFIG_ENV: &str = "FLAPPY_CONFIG";
const DEFAULT_CONFIG: &str = "flappy.json";
/// Overrides the preset from the settings file
const DIFFICULTY_ENV: &str = "FLAPPY_DIFFICULTY";
/// Input events buffered between the reader thread and the loop
const EVENT_QUEUE: usize = 64;

fn main() -> ExitCode {
    init_logging();
    log::info!("Flappy starting...");

    match run() {
        Ok(()) => {
            log::info!("Bye");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("flappy: {err}");
            ExitCode::FAILURE
        }
    }
}

/// The terminal belongs to the game, so the log goes to a file
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut settings = Settings::load(&config)?;
    if !config.exists() {
        // Starter file to tweak
        if let Err(err) = settings.save(&config) {
            log::warn!("Could not write {}: {err}", config.display());
        }
    }

    if let Ok(name) = std::env::var(DIFFICULTY_ENV) {
        match Difficulty::from_str(&name) {
            Some(preset) => {
                settings.apply_preset(preset);
                settings.validate()?;
                log::info!("Difficulty {} from {DIFFICULTY_ENV}", preset.as_str());
            }
            None => log::warn!("Unknown difficulty {name:?} in {DIFFICULTY_ENV}"),
        }
    }

    #[cfg(feature = "audio")]
    match flappy::audio::KiraMixer::new() {
        Ok(mixer) => return play(&settings, mixer),
        Err(err) => log::warn!("No audio device, playing silently: {err}"),
    }

    play(&settings, SilentMixer::new())
}

fn play<M>(settings: &Settings, mut mixer: M) -> Result<(), Box<dyn Error>>
where
    M: Mixer + 'static,
    M::Sound: 'static,
{
    if let Some(music) = &settings.assets.music {
        if let Err(err) = mixer.play_music(music) {
            log::warn!("Music disabled: {err}");
        }
    }

    let _terminal = TerminalGuard::enter()?;
    let logical = Vec2::new(settings.screen.width, settings.screen.height);
    let mut canvas = TerminalCanvas::stdout(logical)?;
    let scene = Scene::new(&mut canvas, mixer, settings)?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    spawn_event_pump(events_tx)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        let mut errors = scene.run(events_rx, canvas);
        while let Some(err) = errors.recv().await {
            log::error!("{err}");
        }
    });
    Ok(())
}
