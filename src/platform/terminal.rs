//! Terminal platform: true-colour half-block rendering and crossterm input
//!
//! Every terminal cell shows two vertically stacked pixels using '▀' with the
//! foreground as the upper pixel and the background as the lower one. The
//! scene draws in logical screen coordinates; the canvas scales them onto
//! whatever size the terminal currently has.

use std::io::{self, Stdout, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use glam::Vec2;
use image::RgbaImage;
use tokio::sync::mpsc;

use super::{Canvas, Flip, InputEvent, WindowEvent};
use crate::error::{AssetError, RenderError};
use crate::sim::Rect;

/// Pixels at or above this alpha are drawn, the rest are transparent
const ALPHA_THRESHOLD: u8 = 128;
const UPPER_HALF_BLOCK: char = '\u{2580}';
/// How often the input thread checks whether the game is still listening
const INPUT_POLL: Duration = Duration::from_millis(100);

type Rgb = [u8; 3];

/// A decoded RGBA image
#[derive(Debug, Clone)]
pub struct TerminalTexture {
    image: RgbaImage,
}

impl TerminalTexture {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32)
    }
}

/// RGB pixel grid with two pixel rows per terminal row
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Change the size and blank every pixel
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, [0; 3]);
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Nearest-neighbour copy of `src` (whole texture if `None`) into the
    /// pixel-space rectangle `dst`, clipped to the buffer.
    pub fn blit(
        &mut self,
        texture: &TerminalTexture,
        src: Option<Rect>,
        dst: Rect,
        flip: Flip,
    ) -> Result<(), RenderError> {
        let bounds = texture.bounds();
        let src = src.unwrap_or(bounds);
        if src.x < 0.0 || src.y < 0.0 || src.right() > bounds.w || src.bottom() > bounds.h {
            return Err(RenderError::new(format!(
                "source {src:?} outside {}x{} texture",
                bounds.w, bounds.h
            )));
        }
        if src.is_empty() || dst.is_empty() {
            return Ok(());
        }

        let x0 = dst.x.floor().max(0.0) as usize;
        let y0 = dst.y.floor().max(0.0) as usize;
        let x1 = (dst.right().ceil().max(0.0) as usize).min(self.width);
        let y1 = (dst.bottom().ceil().max(0.0) as usize).min(self.height);
        let max_sx = src.right().ceil() as u32 - 1;
        let max_sy = src.bottom().ceil() as u32 - 1;

        for py in y0..y1 {
            let cy = py as f32 + 0.5;
            if cy < dst.y || cy >= dst.bottom() {
                continue;
            }
            let v = match flip {
                Flip::None => (cy - dst.y) / dst.h,
                Flip::Vertical => (dst.bottom() - cy) / dst.h,
            };
            let sy = ((src.y + v * src.h) as u32).min(max_sy);

            for px in x0..x1 {
                let cx = px as f32 + 0.5;
                if cx < dst.x || cx >= dst.right() {
                    continue;
                }
                let u = (cx - dst.x) / dst.w;
                let sx = ((src.x + u * src.w) as u32).min(max_sx);

                let [r, g, b, a] = texture.image.get_pixel(sx, sy).0;
                if a >= ALPHA_THRESHOLD {
                    self.pixels[py * self.width + px] = [r, g, b];
                }
            }
        }
        Ok(())
    }

    /// Queue the buffer as half-block cells starting at the top-left corner
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.height / 2;
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.width {
                let top = self.pixels[row * 2 * self.width + col];
                let bottom = self.pixels[(row * 2 + 1) * self.width + col];
                if fg != Some(top) {
                    queue!(out, SetForegroundColor(rgb(top)))?;
                    fg = Some(top);
                }
                if bg != Some(bottom) {
                    queue!(out, SetBackgroundColor(rgb(bottom)))?;
                    bg = Some(bottom);
                }
                queue!(out, Print(UPPER_HALF_BLOCK))?;
            }
            if row + 1 < rows {
                queue!(out, ResetColor, Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, ResetColor)?;
        out.flush()
    }
}

fn rgb([r, g, b]: Rgb) -> Color {
    Color::Rgb { r, g, b }
}

/// Canvas drawing into a terminal
pub struct TerminalCanvas<W: Write = Stdout> {
    out: W,
    frame: Framebuffer,
    /// Size of the logical screen the scene draws in
    logical: Vec2,
    follow_terminal: bool,
}

impl TerminalCanvas<Stdout> {
    /// Canvas on stdout that tracks the terminal size on every clear
    pub fn stdout(logical: Vec2) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let mut canvas = Self::with_writer(io::stdout(), logical, cols, rows);
        canvas.follow_terminal = true;
        Ok(canvas)
    }
}

impl<W: Write> TerminalCanvas<W> {
    /// Canvas of a fixed size in cells writing to any sink
    pub fn with_writer(out: W, logical: Vec2, cols: u16, rows: u16) -> Self {
        Self {
            out,
            frame: Framebuffer::new(cols as usize, rows as usize * 2),
            logical,
            follow_terminal: false,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (w, h) = (cols as usize, rows as usize * 2);
        if w != self.frame.width() || h != self.frame.height() {
            log::debug!("Canvas resized to {cols}x{rows} cells");
            self.frame.resize(w, h);
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.frame
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Logical rectangle to pixel rectangle
    fn to_pixels(&self, rect: Rect) -> Rect {
        let sx = self.frame.width() as f32 / self.logical.x;
        let sy = self.frame.height() as f32 / self.logical.y;
        Rect::new(rect.x * sx, rect.y * sy, rect.w * sx, rect.h * sy)
    }
}

impl<W: Write> Canvas for TerminalCanvas<W> {
    type Texture = TerminalTexture;

    fn load_texture(&mut self, path: &Path) -> Result<TerminalTexture, AssetError> {
        let image = image::open(path).map_err(|e| AssetError::new(path, e.to_string()))?;
        let texture = TerminalTexture::from_image(image.to_rgba8());
        log::debug!(
            "Loaded {} ({}x{})",
            path.display(),
            texture.width(),
            texture.height()
        );
        Ok(texture)
    }

    fn clear(&mut self) {
        if self.follow_terminal {
            match terminal::size() {
                Ok((cols, rows)) => self.resize(cols, rows),
                Err(err) => log::warn!("Could not read terminal size: {err}"),
            }
        }
        self.frame.fill([0; 3]);
    }

    fn copy_ex(
        &mut self,
        texture: &TerminalTexture,
        src: Option<Rect>,
        dst: Option<Rect>,
        flip: Flip,
    ) -> Result<(), RenderError> {
        let dst = dst.unwrap_or(Rect::new(0.0, 0.0, self.logical.x, self.logical.y));
        let dst = self.to_pixels(dst);
        self.frame.blit(texture, src, dst, flip)
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frame
            .render(&mut self.out)
            .map_err(|e| RenderError::new(format!("terminal write failed: {e}")))
    }
}

/// Raw mode, alternate screen, mouse capture and a hidden cursor for as long
/// as the guard lives
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = Self { _private: () };
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Translate a terminal event; `None` for events that carry no input
/// (key releases)
pub fn map_event(event: Event) -> Option<InputEvent> {
    let input = match event {
        Event::Key(key) => return map_key(key),
        Event::Mouse(mouse) => map_mouse(mouse),
        Event::Resize(width, height) => InputEvent::Window(WindowEvent::Resized { width, height }),
        Event::FocusGained => InputEvent::Window(WindowEvent::FocusGained),
        Event::FocusLost => InputEvent::Window(WindowEvent::FocusLost),
        Event::Paste(_) => InputEvent::Unknown("paste".into()),
    };
    Some(input)
}

fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let input = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputEvent::Quit,
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => InputEvent::PrimaryPress,
        code => InputEvent::Unknown(format!("key {code:?}")),
    };
    Some(input)
}

// Pointer positions are in terminal cells
fn map_mouse(mouse: MouseEvent) -> InputEvent {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => InputEvent::PrimaryPress,
        MouseEventKind::Up(MouseButton::Left) => InputEvent::PrimaryRelease,
        MouseEventKind::Moved | MouseEventKind::Drag(_) => InputEvent::PointerMove {
            x: mouse.column as f32,
            y: mouse.row as f32,
        },
        kind => InputEvent::Unknown(format!("mouse {kind:?}")),
    }
}

/// Read terminal events on a dedicated thread and forward them to the game.
///
/// The thread stops after forwarding `Quit` or once the receiver is dropped.
/// A read failure is logged and turned into `Quit`.
pub fn spawn_event_pump(events: mpsc::Sender<InputEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("input".into())
        .spawn(move || pump(&events))
}

fn pump(events: &mpsc::Sender<InputEvent>) {
    while !events.is_closed() {
        let ready = match event::poll(INPUT_POLL) {
            Ok(ready) => ready,
            Err(err) => return fail(events, err),
        };
        if !ready {
            continue;
        }
        let event = match event::read() {
            Ok(event) => event,
            Err(err) => return fail(events, err),
        };
        let Some(input) = map_event(event) else {
            continue;
        };
        let quit = input == InputEvent::Quit;
        if events.blocking_send(input).is_err() || quit {
            break;
        }
    }
    log::debug!("Input thread finished");
}

fn fail(events: &mpsc::Sender<InputEvent>, err: io::Error) {
    log::error!("Reading terminal input failed: {err}");
    let _ = events.blocking_send(InputEvent::Quit);
}
