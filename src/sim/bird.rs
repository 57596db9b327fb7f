//! The player-controlled bird
//!
//! The bird only moves vertically; the world scrolls past it. Gravity is a
//! per-tick acceleration and a flap overrides the current velocity.

use glam::Vec2;

use super::collision::Rect;
use crate::error::RenderError;
use crate::platform::Canvas;
use crate::settings::BirdSettings;

#[derive(Debug, Clone)]
pub struct Bird {
    /// Top-left corner of the sprite box
    pub pos: Vec2,
    /// Vertical velocity in pixels per tick (positive = down)
    pub vel_y: f32,
    pub size: Vec2,
    /// Ticks since the last flap, drives the wing animation
    anim_ticks: u32,
    dead: bool,
    start: Vec2,
    gravity: f32,
    jump_impulse: f32,
    frame_ticks: u32,
}

impl Bird {
    pub fn new(settings: &BirdSettings) -> Self {
        let start = Vec2::new(settings.x, settings.start_y);
        Self {
            pos: start,
            vel_y: 0.0,
            size: Vec2::new(settings.width, settings.height),
            anim_ticks: 0,
            dead: false,
            start,
            gravity: settings.gravity,
            jump_impulse: settings.jump_impulse,
            frame_ticks: settings.frame_ticks.max(1),
        }
    }

    /// Integrate one tick of gravity
    pub fn update(&mut self) {
        self.anim_ticks = self.anim_ticks.wrapping_add(1);
        self.vel_y += self.gravity;
        self.pos.y += self.vel_y;
    }

    /// Flap: replace the vertical velocity with the jump impulse
    pub fn jump(&mut self) {
        self.vel_y = self.jump_impulse;
        self.anim_ticks = 0;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Mark the bird as crashed. Only the pipe field decides this.
    pub(crate) fn kill(&mut self) {
        self.dead = true;
    }

    /// Back to the starting position, at rest and alive
    pub fn restart(&mut self) {
        self.pos = self.start;
        self.vel_y = 0.0;
        self.anim_ticks = 0;
        self.dead = false;
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Animation frame to show out of `frame_count`
    pub fn frame_index(&self, frame_count: usize) -> usize {
        if frame_count == 0 {
            return 0;
        }
        (self.anim_ticks / self.frame_ticks) as usize % frame_count
    }

    pub fn paint<C: Canvas>(&self, canvas: &mut C, frames: &[C::Texture]) -> Result<(), RenderError> {
        let Some(frame) = frames.get(self.frame_index(frames.len())) else {
            return Ok(());
        };
        canvas.copy(frame, None, Some(self.bounding_box()))
    }
}
