//! Sound effects and background music
//!
//! The scene plays one death sound and pauses/resumes the music around it.
//! [`SilentMixer`] keeps the game playable without an audio device; the
//! `audio` feature adds [`KiraMixer`] for real output.

use std::path::Path;
use std::time::Duration;

use crate::error::{AssetError, AudioError};

/// Mixer channel to play a sound on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Whichever channel is free
    #[default]
    FirstFree,
    Index(u8),
}

/// Audio playback used by the scene
pub trait Mixer {
    type Sound;

    fn load_sound(&mut self, path: &Path) -> Result<Self::Sound, AssetError>;

    /// Play a loaded sound once, then `loops` more times
    fn play(&mut self, sound: &Self::Sound, loops: u32, channel: Channel) -> Result<(), AudioError>;

    /// Start looping background music
    fn play_music(&mut self, path: &Path) -> Result<(), AssetError>;

    fn pause_music(&mut self);

    fn resume_music(&mut self);
}

/// Mixer that checks sound files exist but never makes a sound
#[derive(Debug, Default)]
pub struct SilentMixer {
    music_paused: bool,
}

impl SilentMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn music_paused(&self) -> bool {
        self.music_paused
    }
}

fn require_file(path: &Path) -> Result<(), AssetError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AssetError::new(path, "file not found"))
    }
}

impl Mixer for SilentMixer {
    type Sound = ();

    fn load_sound(&mut self, path: &Path) -> Result<(), AssetError> {
        require_file(path)
    }

    fn play(&mut self, _sound: &(), _loops: u32, _channel: Channel) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_music(&mut self, path: &Path) -> Result<(), AssetError> {
        require_file(path)?;
        self.music_paused = false;
        Ok(())
    }

    fn pause_music(&mut self) {
        self.music_paused = true;
    }

    fn resume_music(&mut self) {
        self.music_paused = false;
    }
}

/// How long a clip of length `clip` plays with `loops` repetitions
pub fn play_length(clip: Duration, loops: u32) -> Duration {
    clip.saturating_mul(loops.saturating_add(1))
}

#[cfg(feature = "audio")]
pub use kira_mixer::KiraMixer;

#[cfg(feature = "audio")]
mod kira_mixer {
    use std::path::Path;
    use std::time::Duration;

    use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
    use kira::{AudioManager, AudioManagerSettings, DefaultBackend, StartTime, Tween};

    use super::{Channel, Mixer, play_length};
    use crate::error::{AssetError, AudioError};

    /// Short fade so pausing the music does not click
    const MUSIC_FADE: Duration = Duration::from_millis(50);

    /// Mixer backed by kira's default output device
    pub struct KiraMixer {
        manager: AudioManager<DefaultBackend>,
        music: Option<StaticSoundHandle>,
    }

    impl KiraMixer {
        pub fn new() -> Result<Self, AudioError> {
            let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
                .map_err(|e| AudioError::new(format!("{e:?}")))?;
            Ok(Self {
                manager,
                music: None,
            })
        }

        fn fade() -> Tween {
            Tween {
                duration: MUSIC_FADE,
                ..Default::default()
            }
        }
    }

    impl Mixer for KiraMixer {
        type Sound = StaticSoundData;

        fn load_sound(&mut self, path: &Path) -> Result<StaticSoundData, AssetError> {
            StaticSoundData::from_file(path).map_err(|e| AssetError::new(path, format!("{e:?}")))
        }

        // kira has no fixed channels, every sound gets its own voice
        fn play(&mut self, sound: &StaticSoundData, loops: u32, _channel: Channel) -> Result<(), AudioError> {
            if loops == 0 {
                return self
                    .manager
                    .play(sound.clone())
                    .map(|_| ())
                    .map_err(|e| AudioError::new(format!("{e:?}")));
            }

            // kira loops forever, so stop it after the last repetition
            let mut handle = self
                .manager
                .play(sound.clone().loop_region(0.0..))
                .map_err(|e| AudioError::new(format!("{e:?}")))?;
            let length = play_length(sound.duration(), loops);
            log::debug!("Playing sound {} times, stopping after {length:?}", loops + 1);
            handle.stop(Tween {
                start_time: StartTime::Delayed(length),
                ..Default::default()
            });
            Ok(())
        }

        fn play_music(&mut self, path: &Path) -> Result<(), AssetError> {
            let data = StaticSoundData::from_file(path)
                .map_err(|e| AssetError::new(path, format!("{e:?}")))?
                .loop_region(0.0..);
            let handle = self
                .manager
                .play(data)
                .map_err(|e| AssetError::new(path, format!("{e:?}")))?;
            if let Some(mut old) = self.music.replace(handle) {
                old.stop(Self::fade());
            }
            Ok(())
        }

        fn pause_music(&mut self) {
            if let Some(music) = &mut self.music {
                music.pause(Self::fade());
            }
        }

        fn resume_music(&mut self) {
            if let Some(music) = &mut self.music {
                music.resume(Self::fade());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_length_counts_first_play() {
        let clip = Duration::from_millis(250);
        assert_eq!(play_length(clip, 0), clip);
        assert_eq!(play_length(clip, 3), Duration::from_secs(1));
        assert_eq!(play_length(clip, u32::MAX), clip.saturating_mul(u32::MAX));
    }

    #[test]
    fn test_silent_mixer_rejects_missing_sound() {
        let mut mixer = SilentMixer::new();
        let err = mixer
            .load_sound(Path::new("res/music/definitely-missing.wav"))
            .unwrap_err();
        assert_eq!(err.path, Path::new("res/music/definitely-missing.wav"));
    }

    #[test]
    fn test_silent_mixer_loads_existing_file() {
        let path = std::env::temp_dir().join(format!("flappy-sound-{}.wav", std::process::id()));
        std::fs::write(&path, b"RIFF").unwrap();
        let mut mixer = SilentMixer::new();
        assert!(mixer.load_sound(&path).is_ok());
        assert!(mixer.play(&(), 0, Channel::FirstFree).is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_silent_mixer_tracks_music_pause() {
        let mut mixer = SilentMixer::new();
        mixer.pause_music();
        assert!(mixer.music_paused());
        mixer.resume_music();
        assert!(!mixer.music_paused());
    }
}
