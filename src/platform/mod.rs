//! Platform abstraction layer
//!
//! The scene only talks to the outside world through:
//! - [`Canvas`]: texture loading and frame compositing
//! - [`InputEvent`]: a closed set of input events fed through a channel
//!
//! Implementations:
//! - `terminal`: true-colour half-block rendering + crossterm input
//! - `headless`: records every call, used by tests

pub mod headless;
pub mod terminal;

use std::path::Path;

use crate::error::{AssetError, RenderError};
use crate::sim::Rect;

/// Mirroring applied when copying a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Vertical,
}

/// A render target that can load textures and composite them into frames
pub trait Canvas {
    type Texture;

    fn load_texture(&mut self, path: &Path) -> Result<Self::Texture, AssetError>;

    /// Start a new frame
    fn clear(&mut self);

    /// Copy `src` of the texture (whole texture if `None`) into `dst` on
    /// screen (whole screen if `None`)
    fn copy_ex(
        &mut self,
        texture: &Self::Texture,
        src: Option<Rect>,
        dst: Option<Rect>,
        flip: Flip,
    ) -> Result<(), RenderError>;

    fn copy(
        &mut self,
        texture: &Self::Texture,
        src: Option<Rect>,
        dst: Option<Rect>,
    ) -> Result<(), RenderError> {
        self.copy_ex(texture, src, dst, Flip::None)
    }

    /// Show the composited frame
    fn present(&mut self) -> Result<(), RenderError>;
}

/// Window-level notifications the game does not act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Resized { width: u16, height: u16 },
    FocusGained,
    FocusLost,
}

/// Input events consumed by the scene
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Stop the game loop
    Quit,
    /// Flap (click, tap or key)
    PrimaryPress,
    /// The button behind a press went up
    PrimaryRelease,
    PointerMove { x: f32, y: f32 },
    Window(WindowEvent),
    Touch { x: f32, y: f32 },
    /// Anything else, named for the log
    Unknown(String),
}
