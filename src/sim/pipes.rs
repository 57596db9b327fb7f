//! Scrolling pipe obstacles
//!
//! A fixed ring of pipe pairs. Pipes scroll left every tick; once a pipe has
//! fully left the screen it is moved behind the rearmost pipe with a new gap,
//! so the field never allocates after construction and the spacing between
//! neighbours never drifts.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::bird::Bird;
use super::collision::Rect;
use crate::error::RenderError;
use crate::platform::{Canvas, Flip};
use crate::settings::PipeSettings;

/// One top/bottom pipe pair with a single gap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipe {
    /// Left edge
    pub x: f32,
    /// Vertical center of the gap
    pub gap_y: f32,
    pub width: f32,
    pub gap_height: f32,
}

impl Pipe {
    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.gap_y - self.gap_height / 2.0
    }

    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_y + self.gap_height / 2.0
    }

    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Visible part of the upper pipe
    pub fn top_rect(&self) -> Rect {
        Rect::from_span(self.x, self.width, 0.0, self.gap_top())
    }

    /// Visible part of the lower pipe
    pub fn bottom_rect(&self, screen_height: f32) -> Rect {
        Rect::from_span(self.x, self.width, self.gap_bottom(), screen_height)
    }

    /// Top and bottom collision boxes. They reach one screen height past the
    /// edges so a bird cannot fly around a pipe off-screen.
    pub fn collision_boxes(&self, screen_height: f32) -> [Rect; 2] {
        [
            Rect::from_span(self.x, self.width, -screen_height, self.gap_top()),
            Rect::from_span(self.x, self.width, self.gap_bottom(), 2.0 * screen_height),
        ]
    }

    pub fn hits(&self, bbox: &Rect, screen_height: f32) -> bool {
        self.collision_boxes(screen_height)
            .iter()
            .any(|b| b.overlaps(bbox))
    }
}

/// The ring of pipes the bird has to get through
#[derive(Debug, Clone)]
pub struct Pipes {
    units: Vec<Pipe>,
    /// Index of the pipe the bird reaches next
    front: usize,
    /// A pipe whose trailing edge is at or left of this x has been passed
    pass_x: f32,
    rng: Pcg32,
    spacing: f32,
    scroll_speed: f32,
    start_x: f32,
    recycle_offset: f32,
    min_length: f32,
    gap_height: f32,
    screen: Vec2,
}

impl Pipes {
    pub fn new(settings: &PipeSettings, screen: Vec2, seed: u64) -> Self {
        let mut pipes = Self {
            units: Vec::with_capacity(settings.count),
            front: 0,
            pass_x: f32::NEG_INFINITY,
            rng: Pcg32::seed_from_u64(seed),
            spacing: settings.spacing,
            scroll_speed: settings.scroll_speed,
            start_x: settings.start_x,
            recycle_offset: settings.recycle_offset,
            min_length: settings.min_length,
            gap_height: settings.gap_height,
            screen,
        };

        let bounds = pipes.gap_bounds();
        for i in 0..settings.count {
            let gap_y = sample_gap(&mut pipes.rng, bounds);
            pipes.units.push(Pipe {
                x: pipes.start_x + i as f32 * pipes.spacing,
                gap_y,
                width: settings.width,
                gap_height: settings.gap_height,
            });
        }
        pipes
    }

    /// Count a pipe as passed once its trailing edge reaches `x`, usually
    /// the bird's left edge. Without one, `front` is the leftmost pipe.
    pub fn with_pass_line(mut self, x: f32) -> Self {
        self.pass_x = x;
        self
    }

    /// Allowed range for a gap center: the gap plus a minimum pipe stub must
    /// fit above and below it
    pub fn gap_bounds(&self) -> (f32, f32) {
        let margin = self.gap_height / 2.0 + self.min_length;
        (margin, self.screen.y - margin)
    }

    /// Scroll every pipe, recycle the ones that left the screen, then move
    /// `front` past the pipes the bird has cleared
    pub fn update(&mut self) {
        for unit in &mut self.units {
            unit.x -= self.scroll_speed;
        }

        let n = self.units.len();
        let bounds = self.gap_bounds();
        for i in 0..n {
            if self.units[i].trailing_edge() >= 0.0 {
                continue;
            }
            let rear = self.units[(i + n - 1) % n].x;
            let x = (rear + self.spacing).max(self.screen.x + self.recycle_offset);
            let gap_y = sample_gap(&mut self.rng, bounds);

            let unit = &mut self.units[i];
            unit.x = x;
            unit.gap_y = gap_y;
            if self.front == i {
                self.front = (i + 1) % n;
            }
            log::debug!("Recycled pipe {i} to x={x:.1}, gap at {gap_y:.1}");
        }

        for _ in 0..n {
            if self.units[self.front].trailing_edge() > self.pass_x {
                break;
            }
            self.front = (self.front + 1) % n;
        }
    }

    /// Check the bird against every pipe; a hit kills the bird
    pub fn touch(&self, bird: &mut Bird) -> bool {
        let bbox = bird.bounding_box();
        let hit = self.units.iter().any(|p| p.hits(&bbox, self.screen.y));
        if hit {
            bird.kill();
        }
        hit
    }

    /// Lay the pipes out again from the start with fresh gaps
    pub fn restart(&mut self) {
        let bounds = self.gap_bounds();
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.x = self.start_x + i as f32 * self.spacing;
            unit.gap_y = sample_gap(&mut self.rng, bounds);
        }
        self.front = 0;
    }

    pub fn paint<C: Canvas>(&self, canvas: &mut C, texture: &C::Texture) -> Result<(), RenderError> {
        for unit in &self.units {
            let top = unit.top_rect();
            if !top.is_empty() {
                canvas.copy_ex(texture, None, Some(top), Flip::Vertical)?;
            }
            let bottom = unit.bottom_rect(self.screen.y);
            if !bottom.is_empty() {
                canvas.copy(texture, None, Some(bottom))?;
            }
        }
        Ok(())
    }

    /// The next pipe the bird will reach
    pub fn front(&self) -> &Pipe {
        &self.units[self.front]
    }

    /// Pipes in the order the bird meets them
    pub fn iter(&self) -> impl Iterator<Item = &Pipe> {
        let n = self.units.len();
        (0..n).map(move |k| &self.units[(self.front + k) % n])
    }

    /// Pipes by slot index
    pub fn units(&self) -> &[Pipe] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [Pipe] {
        &mut self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Total horizontal length of the ring
    pub fn ring_length(&self) -> f32 {
        self.units.len() as f32 * self.spacing
    }
}

fn sample_gap(rng: &mut Pcg32, (lo, hi): (f32, f32)) -> f32 {
    if lo <= hi {
        rng.random_range(lo..=hi)
    } else {
        (lo + hi) / 2.0
    }
}
