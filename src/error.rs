//! Error types shared by the scene, platform and settings layers

use std::fmt;
use std::path::{Path, PathBuf};

/// A texture, sound or music file could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetError {
    pub path: PathBuf,
    pub reason: String,
}

impl AssetError {
    pub fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not load {}: {}", self.path.display(), self.reason)
    }
}

impl std::error::Error for AssetError {}

/// A draw call on the render target failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub reason: String,
}

impl RenderError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for RenderError {}

/// A sound could not be played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioError {
    pub reason: String,
}

impl AudioError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio playback failed: {}", self.reason)
    }
}

impl std::error::Error for AudioError {}

/// The part of a frame that was being drawn when a render error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Background,
    Bird,
    Pipes,
    GameOver,
    Present,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Bird => "bird",
            Layer::Pipes => "pipes",
            Layer::GameOver => "game over",
            Layer::Present => "frame",
        }
    }
}

/// Errors reported by the scene, either at construction or per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A resource could not be loaded (fatal when building the scene)
    Asset(AssetError),
    /// A draw step failed; the rest of the frame was skipped
    Render { layer: Layer, source: RenderError },
}

impl SceneError {
    pub fn render(layer: Layer, source: RenderError) -> Self {
        SceneError::Render { layer, source }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Asset(err) => err.fmt(f),
            SceneError::Render { layer, source } => {
                write!(f, "could not draw {}: {}", layer.as_str(), source)
            }
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Asset(err) => Some(err),
            SceneError::Render { source, .. } => Some(source),
        }
    }
}

impl From<AssetError> for SceneError {
    fn from(err: AssetError) -> Self {
        SceneError::Asset(err)
    }
}

/// Problems reading or validating the settings file
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "could not read settings: {err}"),
            SettingsError::Parse(err) => write!(f, "malformed settings: {err}"),
            SettingsError::Invalid(reason) => write!(f, "invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err)
    }
}
