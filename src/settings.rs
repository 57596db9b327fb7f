//! Game settings and tuning
//!
//! Loaded from a JSON file at startup. Every field falls back to the defaults
//! in [`crate::consts`], so a settings file only needs the values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Vertical opening between the top and bottom pipe
    pub fn gap_height(&self) -> f32 {
        match self {
            Difficulty::Easy => 220.0,
            Difficulty::Normal => PIPE_GAP_HEIGHT,
            Difficulty::Hard => 140.0,
        }
    }

    /// Pipe scroll speed in pixels per tick
    pub fn scroll_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.5,
            Difficulty::Normal => SCROLL_SPEED,
            Difficulty::Hard => 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdSettings {
    /// Fixed horizontal position (left edge)
    pub x: f32,
    /// Starting top edge, restored on restart
    pub start_y: f32,
    pub width: f32,
    pub height: f32,
    /// Added to the vertical velocity every tick
    pub gravity: f32,
    /// Vertical velocity a flap sets (negative = up)
    pub jump_impulse: f32,
    /// Ticks per animation frame
    pub frame_ticks: u32,
}

impl Default for BirdSettings {
    fn default() -> Self {
        Self {
            x: BIRD_X,
            start_y: BIRD_START_Y,
            width: BIRD_WIDTH,
            height: BIRD_HEIGHT,
            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            frame_ticks: BIRD_FRAME_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeSettings {
    /// Number of pipe pairs in the ring
    pub count: usize,
    /// Horizontal distance between neighbouring pipes
    pub spacing: f32,
    pub width: f32,
    pub gap_height: f32,
    /// Shortest pipe stub allowed above or below a gap
    pub min_length: f32,
    pub scroll_speed: f32,
    /// Left edge of the first pipe on a fresh layout
    pub start_x: f32,
    /// How far past the right edge a recycled pipe may reappear
    pub recycle_offset: f32,
}

impl Default for PipeSettings {
    fn default() -> Self {
        Self {
            count: PIPE_COUNT,
            spacing: PIPE_SPACING,
            width: PIPE_WIDTH,
            gap_height: PIPE_GAP_HEIGHT,
            min_length: PIPE_MIN_LENGTH,
            scroll_speed: SCROLL_SPEED,
            start_x: SCREEN_WIDTH,
            recycle_offset: RECYCLE_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub tick_ms: u64,
    pub game_over_pause_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            game_over_pause_ms: GAME_OVER_PAUSE_MS,
        }
    }
}

impl TimingSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn game_over_pause(&self) -> Duration {
        Duration::from_millis(self.game_over_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: PathBuf,
    pub game_over: PathBuf,
    pub bird_frames: Vec<PathBuf>,
    pub pipe: PathBuf,
    pub death_sound: PathBuf,
    /// Background music; optional, a missing track only logs a warning
    pub music: Option<PathBuf>,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            background: PathBuf::from(BACKGROUND_IMAGE),
            game_over: PathBuf::from(GAME_OVER_IMAGE),
            bird_frames: (1..=BIRD_FRAME_COUNT)
                .map(|i| PathBuf::from(format!("res/img/bird_frame_{i}.png")))
                .collect(),
            pipe: PathBuf::from(PIPE_IMAGE),
            death_sound: PathBuf::from(DEATH_SOUND),
            music: Some(PathBuf::from(MUSIC)),
        }
    }
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preset the pipe tuning was derived from
    pub difficulty: Difficulty,
    pub screen: ScreenSettings,
    pub bird: BirdSettings,
    pub pipes: PipeSettings,
    pub timing: TimingSettings,
    pub assets: AssetPaths,
    /// Fixed RNG seed for reproducible pipe layouts (random when absent)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            screen: ScreenSettings::default(),
            bird: BirdSettings::default(),
            pipes: PipeSettings::default(),
            timing: TimingSettings::default(),
            assets: AssetPaths::default(),
            seed: None,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates the pipe tuning)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.pipes.gap_height = preset.gap_height();
        self.pipes.scroll_speed = preset.scroll_speed();
    }

    /// Seed to use for this run
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Check the values the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |reason: &str| Err(SettingsError::Invalid(reason.to_string()));

        if self.timing.tick_ms == 0 || self.timing.game_over_pause_ms == 0 {
            return invalid("tick and game-over pause must be positive");
        }
        if self.screen.width <= 0.0 || self.screen.height <= 0.0 {
            return invalid("screen size must be positive");
        }
        if self.pipes.count == 0 {
            return invalid("at least one pipe is required");
        }
        if self.pipes.spacing <= 0.0 || self.pipes.width <= 0.0 || self.pipes.gap_height <= 0.0 {
            return invalid("pipe spacing, width and gap height must be positive");
        }
        // Pipes only get recycled once they leave on the left
        if !self.pipes.scroll_speed.is_finite() || self.pipes.scroll_speed <= 0.0 {
            return invalid("pipe scroll speed must be a positive number");
        }
        if self.pipes.gap_height + 2.0 * self.pipes.min_length > self.screen.height {
            return invalid("pipe gap and stubs do not fit on screen");
        }
        // A recycled pipe must land past the right edge, or spacing drifts
        let ring = self.pipes.count as f32 * self.pipes.spacing;
        let reach = self.screen.width + self.pipes.recycle_offset.max(0.0);
        if ring < reach + self.pipes.width + self.pipes.scroll_speed {
            return invalid("pipe count * spacing must cover the screen, one pipe and one scroll step");
        }
        if self.assets.bird_frames.is_empty() {
            return invalid("at least one bird frame is required");
        }
        Ok(())
    }

    /// Load settings from a JSON file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        settings.validate()?;
        log::info!(
            "Loaded settings from {} ({})",
            path.display(),
            settings.difficulty.as_str()
        );
        Ok(settings)
    }

    /// Parse settings JSON. The difficulty preset fills in the pipe tuning
    /// the file leaves out; values the file sets win.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let mut settings = Self::deserialize(&value)?;

        let pipe_field = |key: &str| value.get("pipes").and_then(|p| p.get(key)).is_some();
        let preset = settings.difficulty;
        if !pipe_field("gap_height") {
            settings.pipes.gap_height = preset.gap_height();
        }
        if !pipe_field("scroll_speed") {
            settings.pipes.scroll_speed = preset.scroll_speed();
        }
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
        for preset in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert!(Settings::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_preset_applies_pipe_tuning() {
        let settings = Settings::from_preset(Difficulty::Hard);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.pipes.gap_height, 140.0);
        assert_eq!(settings.pipes.scroll_speed, 2.5);
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("EASY"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "pipes": { "count": 5 }, "seed": 7 }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.pipes.count, 5);
        assert_eq!(settings.pipes.spacing, PIPE_SPACING);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.bird.gravity, GRAVITY);
        assert_eq!(settings.assets.bird_frames.len(), BIRD_FRAME_COUNT);
    }

    #[test]
    fn test_short_ring_rejected() {
        let mut settings = Settings::default();
        settings.pipes.count = 2;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_gap_must_fit() {
        let mut settings = Settings::default();
        settings.pipes.gap_height = 550.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_scroll_speed_must_be_positive() {
        for speed in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let mut settings = Settings::default();
            settings.pipes.scroll_speed = speed;
            assert!(
                matches!(settings.validate(), Err(SettingsError::Invalid(_))),
                "scroll speed {speed} accepted"
            );
        }
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut settings = Settings::default();
        settings.timing.tick_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("flappy-settings-does-not-exist.json");
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.pipes.count, PIPE_COUNT);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("flappy-settings-{}.json", std::process::id()));
        let mut settings = Settings::from_preset(Difficulty::Easy);
        settings.seed = Some(42);
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.difficulty, Difficulty::Easy);
        assert_eq!(loaded.seed, Some(42));
        assert_eq!(loaded.pipes.gap_height, 220.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_applies_difficulty_preset() {
        let path = std::env::temp_dir().join(format!("flappy-hard-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "difficulty": "Hard" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.pipes.gap_height, Difficulty::Hard.gap_height());
        assert_eq!(settings.pipes.scroll_speed, Difficulty::Hard.scroll_speed());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_explicit_pipe_tuning_beats_preset() {
        let json = r#"{ "difficulty": "Easy", "pipes": { "gap_height": 200.0 } }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.pipes.gap_height, 200.0);
        assert_eq!(settings.pipes.scroll_speed, Difficulty::Easy.scroll_speed());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = std::env::temp_dir().join(format!("flappy-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_timing_durations() {
        let timing = TimingSettings::default();
        assert_eq!(timing.tick_period(), Duration::from_millis(10));
        assert_eq!(timing.game_over_pause(), Duration::from_secs(3));
    }
}
