//! Flappy - a single-screen obstacle-avoidance arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bird physics, pipe field, collisions)
//! - `scene`: Game loop, death/restart state machine, frame compositing
//! - `platform`: Render target and input abstraction (terminal + headless)
//! - `audio`: Sound effect and music playback
//! - `settings`: Data-driven game tuning

pub mod audio;
pub mod error;
pub mod platform;
pub mod scene;
pub mod settings;
pub mod sim;

pub use error::{AssetError, AudioError, RenderError, SceneError, SettingsError};
pub use scene::{Scene, SceneState};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Logical screen size (all simulation coordinates are in these pixels)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Fixed simulation tick (100 Hz)
    pub const TICK_MS: u64 = 10;
    /// How long the game-over screen blocks the loop
    pub const GAME_OVER_PAUSE_MS: u64 = 3_000;

    /// Bird defaults - the bird never moves horizontally
    pub const BIRD_X: f32 = 10.0;
    pub const BIRD_START_Y: f32 = 300.0;
    pub const BIRD_WIDTH: f32 = 50.0;
    pub const BIRD_HEIGHT: f32 = 43.0;
    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.1;
    /// Velocity set by a flap (negative = up)
    pub const JUMP_IMPULSE: f32 = -5.0;
    /// Ticks each animation frame stays on screen
    pub const BIRD_FRAME_TICKS: u32 = 10;

    /// Pipe defaults
    pub const PIPE_COUNT: usize = 4;
    pub const PIPE_SPACING: f32 = 230.0;
    pub const PIPE_WIDTH: f32 = 52.0;
    pub const PIPE_GAP_HEIGHT: f32 = 180.0;
    /// Shortest visible pipe stub above or below a gap
    pub const PIPE_MIN_LENGTH: f32 = 50.0;
    /// Leftward scroll per tick
    pub const SCROLL_SPEED: f32 = 2.0;
    /// Extra distance past the right edge where recycled pipes reappear
    pub const RECYCLE_OFFSET: f32 = 0.0;

    /// Asset paths
    pub const BACKGROUND_IMAGE: &str = "res/img/background.png";
    pub const GAME_OVER_IMAGE: &str = "res/img/GAME-OVER.png";
    pub const PIPE_IMAGE: &str = "res/img/pipe.png";
    pub const BIRD_FRAME_COUNT: usize = 4;
    pub const DEATH_SOUND: &str = "res/music/razor.wav";
    pub const MUSIC: &str = "res/music/theme.wav";
}
