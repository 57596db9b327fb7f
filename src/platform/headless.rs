//! Headless platform that records every call instead of drawing or playing
//!
//! Handles are cheap to clone and share one log, so a test can keep a handle
//! while the scene owns another.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{Canvas, Flip};
use crate::audio::{Channel, Mixer};
use crate::error::{AssetError, AudioError, RenderError};
use crate::sim::Rect;

/// A texture that only remembers where it was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessTexture {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Load(PathBuf),
    Clear,
    Copy {
        texture: PathBuf,
        src: Option<Rect>,
        dst: Option<Rect>,
        flip: Flip,
    },
    Present,
}

#[derive(Debug, Default)]
struct CanvasLog {
    calls: Vec<DrawCall>,
    fail_load: HashSet<PathBuf>,
    fail_copy: HashSet<PathBuf>,
    fail_present: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessCanvas {
    log: Rc<RefCell<CanvasLog>>,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loading this path fail
    pub fn fail_load(&self, path: impl Into<PathBuf>) {
        self.log.borrow_mut().fail_load.insert(path.into());
    }

    /// Make every copy of the texture loaded from this path fail
    pub fn fail_copy(&self, path: impl Into<PathBuf>) {
        self.log.borrow_mut().fail_copy.insert(path.into());
    }

    pub fn fail_present(&self, fail: bool) {
        self.log.borrow_mut().fail_present = fail;
    }

    pub fn calls(&self) -> Vec<DrawCall> {
        self.log.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.log.borrow_mut().calls)
    }

    pub fn presents(&self) -> usize {
        self.log
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Present))
            .count()
    }

    /// Paths of copied textures, in draw order
    pub fn copied(&self) -> Vec<PathBuf> {
        self.log
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Copy { texture, .. } => Some(texture.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for HeadlessCanvas {
    type Texture = HeadlessTexture;

    fn load_texture(&mut self, path: &Path) -> Result<HeadlessTexture, AssetError> {
        let mut log = self.log.borrow_mut();
        if log.fail_load.contains(path) {
            return Err(AssetError::new(path, "load refused"));
        }
        log.calls.push(DrawCall::Load(path.to_path_buf()));
        Ok(HeadlessTexture {
            path: path.to_path_buf(),
        })
    }

    fn clear(&mut self) {
        self.log.borrow_mut().calls.push(DrawCall::Clear);
    }

    fn copy_ex(
        &mut self,
        texture: &HeadlessTexture,
        src: Option<Rect>,
        dst: Option<Rect>,
        flip: Flip,
    ) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_copy.contains(&texture.path) {
            return Err(RenderError::new(format!("copy of {} refused", texture.path.display())));
        }
        log.calls.push(DrawCall::Copy {
            texture: texture.path.clone(),
            src,
            dst,
            flip,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_present {
            return Err(RenderError::new("present refused"));
        }
        log.calls.push(DrawCall::Present);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixerCall {
    LoadSound(PathBuf),
    Play {
        sound: PathBuf,
        loops: u32,
        channel: Channel,
    },
    PlayMusic(PathBuf),
    PauseMusic,
    ResumeMusic,
}

#[derive(Debug, Default)]
struct MixerLog {
    calls: Vec<MixerCall>,
    fail_load: HashSet<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessMixer {
    log: Rc<RefCell<MixerLog>>,
}

impl HeadlessMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_load(&self, path: impl Into<PathBuf>) {
        self.log.borrow_mut().fail_load.insert(path.into());
    }

    pub fn calls(&self) -> Vec<MixerCall> {
        self.log.borrow().calls.clone()
    }

    pub fn count(&self, call: &MixerCall) -> usize {
        self.log.borrow().calls.iter().filter(|c| *c == call).count()
    }
}

impl Mixer for HeadlessMixer {
    type Sound = PathBuf;

    fn load_sound(&mut self, path: &Path) -> Result<PathBuf, AssetError> {
        let mut log = self.log.borrow_mut();
        if log.fail_load.contains(path) {
            return Err(AssetError::new(path, "load refused"));
        }
        log.calls.push(MixerCall::LoadSound(path.to_path_buf()));
        Ok(path.to_path_buf())
    }

    fn play(&mut self, sound: &PathBuf, loops: u32, channel: Channel) -> Result<(), AudioError> {
        self.log.borrow_mut().calls.push(MixerCall::Play {
            sound: sound.clone(),
            loops,
            channel,
        });
        Ok(())
    }

    fn play_music(&mut self, path: &Path) -> Result<(), AssetError> {
        self.log
            .borrow_mut()
            .calls
            .push(MixerCall::PlayMusic(path.to_path_buf()));
        Ok(())
    }

    fn pause_music(&mut self) {
        self.log.borrow_mut().calls.push(MixerCall::PauseMusic);
    }

    fn resume_music(&mut self) {
        self.log.borrow_mut().calls.push(MixerCall::ResumeMusic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let canvas = HeadlessCanvas::new();
        let mut handle = canvas.clone();
        let tex = handle.load_texture(Path::new("a.png")).unwrap();
        handle.clear();
        handle.copy(&tex, None, None).unwrap();
        handle.present().unwrap();
        assert_eq!(canvas.presents(), 1);
        assert_eq!(canvas.copied(), vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn test_configured_failures() {
        let mut canvas = HeadlessCanvas::new();
        canvas.fail_load("missing.png");
        assert!(canvas.load_texture(Path::new("missing.png")).is_err());

        let tex = canvas.load_texture(Path::new("b.png")).unwrap();
        canvas.fail_copy("b.png");
        assert!(canvas.copy(&tex, None, None).is_err());

        canvas.fail_present(true);
        assert!(canvas.present().is_err());
    }
}
