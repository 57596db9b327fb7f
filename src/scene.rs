//! The scene: game loop, death/restart state machine and frame compositing
//!
//! One loop task owns the scene and the canvas. It waits on whichever is
//! ready first, an input event or the next tick; ready events always win.
//! A death blocks the loop for the game-over pause, and input queued during
//! the pause is handled once play resumes.

use std::time::Duration;

use glam::Vec2;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::audio::{Channel, Mixer};
use crate::error::{Layer, SceneError};
use crate::platform::{Canvas, InputEvent};
use crate::settings::{AssetPaths, Settings};
use crate::sim::{Bird, Pipes};

/// Where the scene is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Running,
    /// Game-over screen is up and the loop is paused
    GameOver,
    Terminated,
}

pub struct Scene<C: Canvas, M: Mixer> {
    background: C::Texture,
    bird_frames: Vec<C::Texture>,
    pipe_texture: C::Texture,
    death_sound: M::Sound,
    mixer: M,
    bird: Bird,
    pipes: Pipes,
    state: SceneState,
    assets: AssetPaths,
    tick_period: Duration,
    game_over_pause: Duration,
}

impl<C: Canvas, M: Mixer> Scene<C, M> {
    /// Load every resource the scene needs; any missing one is fatal
    pub fn new(canvas: &mut C, mut mixer: M, settings: &Settings) -> Result<Self, SceneError> {
        let assets = settings.assets.clone();

        let background = canvas.load_texture(&assets.background)?;
        // Loaded again on every death; this only proves the image is usable
        canvas.load_texture(&assets.game_over)?;
        let bird_frames = assets
            .bird_frames
            .iter()
            .map(|path| canvas.load_texture(path))
            .collect::<Result<Vec<_>, _>>()?;
        let pipe_texture = canvas.load_texture(&assets.pipe)?;
        let death_sound = mixer.load_sound(&assets.death_sound)?;

        let screen = Vec2::new(settings.screen.width, settings.screen.height);
        let seed = settings.effective_seed();
        log::info!("Scene ready ({} pipes, seed {seed})", settings.pipes.count);

        Ok(Self {
            background,
            bird_frames,
            pipe_texture,
            death_sound,
            mixer,
            bird: Bird::new(&settings.bird),
            pipes: Pipes::new(&settings.pipes, screen, seed).with_pass_line(settings.bird.x),
            state: SceneState::Running,
            assets,
            tick_period: settings.timing.tick_period(),
            game_over_pause: settings.timing.game_over_pause(),
        })
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    pub fn pipes(&self) -> &Pipes {
        &self.pipes
    }

    /// Handle one input event; returns true when the loop should stop
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Quit => {
                self.state = SceneState::Terminated;
                return true;
            }
            InputEvent::PrimaryPress => self.bird.jump(),
            InputEvent::PrimaryRelease
            | InputEvent::PointerMove { .. }
            | InputEvent::Window(_)
            | InputEvent::Touch { .. } => {}
            InputEvent::Unknown(kind) => log::warn!("Unknown event {kind}"),
        }
        false
    }

    /// Advance the simulation one tick
    pub fn update(&mut self) {
        self.bird.update();
        self.pipes.update();
        self.pipes.touch(&mut self.bird);
    }

    pub fn restart(&mut self) {
        self.bird.restart();
        self.pipes.restart();
        self.state = SceneState::Running;
    }

    /// Composite background, bird and pipes; the first failing layer aborts
    /// the frame
    pub fn paint(&self, canvas: &mut C) -> Result<(), SceneError> {
        canvas.clear();

        canvas
            .copy(&self.background, None, None)
            .map_err(|e| SceneError::render(Layer::Background, e))?;
        self.bird
            .paint(canvas, &self.bird_frames)
            .map_err(|e| SceneError::render(Layer::Bird, e))?;
        self.pipes
            .paint(canvas, &self.pipe_texture)
            .map_err(|e| SceneError::render(Layer::Pipes, e))?;

        canvas
            .present()
            .map_err(|e| SceneError::render(Layer::Present, e))
    }

    /// Draw the game-over screen over the last frame
    pub fn paint_gameover(&self, canvas: &mut C) -> Result<(), SceneError> {
        let game_over = canvas.load_texture(&self.assets.game_over)?;
        canvas
            .copy(&game_over, None, None)
            .map_err(|e| SceneError::render(Layer::GameOver, e))?;
        canvas
            .present()
            .map_err(|e| SceneError::render(Layer::Present, e))
    }

    /// Game-over screen, death sound, pause, then a fresh round
    async fn game_over(&mut self, canvas: &mut C, errors: &mpsc::UnboundedSender<SceneError>) {
        self.state = SceneState::GameOver;
        log::info!("Bird crashed at y={:.1}", self.bird.pos.y);

        if let Err(err) = self.paint_gameover(canvas) {
            let _ = errors.send(err);
        }
        self.mixer.pause_music();
        if let Err(err) = self.mixer.play(&self.death_sound, 0, Channel::FirstFree) {
            log::warn!("{err}");
        }

        time::sleep(self.game_over_pause).await;

        self.mixer.resume_music();
        self.restart();
        log::info!("Restarted");
    }

    /// Spawn the game loop on the current `LocalSet`.
    ///
    /// The returned receiver yields per-frame errors and closes once the
    /// loop has stopped.
    pub fn run(self, events: mpsc::Receiver<InputEvent>, canvas: C) -> mpsc::UnboundedReceiver<SceneError>
    where
        C: 'static,
        C::Texture: 'static,
        M: 'static,
        M::Sound: 'static,
    {
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        tokio::task::spawn_local(self.run_loop(events, canvas, errors_tx));
        errors_rx
    }

    async fn run_loop(
        mut self,
        mut events: mpsc::Receiver<InputEvent>,
        mut canvas: C,
        errors: mpsc::UnboundedSender<SceneError>,
    ) {
        let mut ticker = time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let Some(event) = event else {
                        log::debug!("Event source closed");
                        break;
                    };
                    if self.handle_event(event) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.update();
                    if self.bird.is_dead() {
                        self.game_over(&mut canvas, &errors).await;
                    }
                    if let Err(err) = self.paint(&mut canvas) {
                        let _ = errors.send(err);
                    }
                }
            }
        }

        self.state = SceneState::Terminated;
        log::info!("Game loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::consts::*;
    use crate::error::{AssetError, RenderError};
    use crate::platform::headless::{DrawCall, HeadlessCanvas, HeadlessMixer, MixerCall};
    use crate::platform::{Flip, WindowEvent};

    type TestScene = Scene<HeadlessCanvas, HeadlessMixer>;

    fn settings() -> Settings {
        Settings {
            seed: Some(11),
            ..Settings::default()
        }
    }

    fn scene() -> (TestScene, HeadlessCanvas, HeadlessMixer) {
        let mut canvas = HeadlessCanvas::new();
        let mixer = HeadlessMixer::new();
        let scene = Scene::new(&mut canvas, mixer.clone(), &settings()).unwrap();
        canvas.take_calls();
        (scene, canvas, mixer)
    }

    #[test]
    fn test_new_loads_all_assets() {
        let mut canvas = HeadlessCanvas::new();
        let mixer = HeadlessMixer::new();
        let scene = Scene::new(&mut canvas, mixer.clone(), &settings()).unwrap();

        let loads: Vec<_> = canvas
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DrawCall::Load(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(loads.first(), Some(&PathBuf::from(BACKGROUND_IMAGE)));
        assert_eq!(loads.last(), Some(&PathBuf::from(PIPE_IMAGE)));
        assert_eq!(loads.len(), 3 + BIRD_FRAME_COUNT);
        assert!(loads.contains(&PathBuf::from(GAME_OVER_IMAGE)));
        assert_eq!(mixer.calls(), vec![MixerCall::LoadSound(DEATH_SOUND.into())]);
        assert_eq!(scene.state(), SceneState::Running);
    }

    #[test]
    fn test_missing_texture_fails_construction() {
        let mut canvas = HeadlessCanvas::new();
        canvas.fail_load(BACKGROUND_IMAGE);
        let result = Scene::new(&mut canvas, HeadlessMixer::new(), &settings());
        assert!(matches!(
            result,
            Err(SceneError::Asset(AssetError { ref path, .. })) if path == &PathBuf::from(BACKGROUND_IMAGE)
        ));
    }

    #[test]
    fn test_missing_game_over_image_fails_construction() {
        let mut canvas = HeadlessCanvas::new();
        canvas.fail_load(GAME_OVER_IMAGE);
        let result = Scene::new(&mut canvas, HeadlessMixer::new(), &settings());
        assert!(matches!(
            result,
            Err(SceneError::Asset(AssetError { ref path, .. })) if path == &PathBuf::from(GAME_OVER_IMAGE)
        ));
    }

    #[test]
    fn test_missing_sound_fails_construction() {
        let mut canvas = HeadlessCanvas::new();
        let mixer = HeadlessMixer::new();
        mixer.fail_load(DEATH_SOUND);
        assert!(Scene::new(&mut canvas, mixer, &settings()).is_err());
    }

    #[test]
    fn test_quit_event_terminates() {
        let (mut scene, _, _) = scene();
        assert!(scene.handle_event(InputEvent::Quit));
        assert_eq!(scene.state(), SceneState::Terminated);
    }

    #[test]
    fn test_press_makes_bird_jump() {
        let (mut scene, _, _) = scene();
        assert!(!scene.handle_event(InputEvent::PrimaryPress));
        assert_eq!(scene.bird().vel_y, JUMP_IMPULSE);
    }

    #[test]
    fn test_ignored_events_change_nothing() {
        let (mut scene, _, _) = scene();
        let events = [
            InputEvent::PrimaryRelease,
            InputEvent::PointerMove { x: 3.0, y: 4.0 },
            InputEvent::Window(WindowEvent::Resized {
                width: 80,
                height: 24,
            }),
            InputEvent::Window(WindowEvent::FocusLost),
            InputEvent::Touch { x: 1.0, y: 1.0 },
            InputEvent::Unknown("paste".into()),
        ];
        for event in events {
            assert!(!scene.handle_event(event));
        }
        assert_eq!(scene.bird().vel_y, 0.0);
        assert_eq!(scene.state(), SceneState::Running);
    }

    #[test]
    fn test_update_moves_bird_and_pipes() {
        let (mut scene, _, _) = scene();
        let front = scene.pipes().front().x;
        scene.update();
        assert_eq!(scene.bird().vel_y, GRAVITY);
        assert_eq!(scene.pipes().front().x, front - SCROLL_SPEED);
        assert!(!scene.bird().is_dead());
    }

    #[test]
    fn test_update_detects_collision() {
        let (mut scene, _, _) = scene();
        let bird_x = scene.bird().pos.x;
        let unit = &mut scene.pipes.units_mut()[0];
        unit.x = bird_x + SCROLL_SPEED;
        unit.gap_y = 500.0;

        scene.update();
        assert!(scene.bird().is_dead());

        scene.restart();
        assert!(!scene.bird().is_dead());
        assert_eq!(scene.bird().pos, Vec2::new(BIRD_X, BIRD_START_Y));
        assert_eq!(scene.pipes().front().x, SCREEN_WIDTH);
    }

    #[test]
    fn test_paint_composites_in_order() {
        let (scene, mut canvas, _) = scene();
        scene.paint(&mut canvas).unwrap();

        let calls = canvas.calls();
        assert_eq!(calls.first(), Some(&DrawCall::Clear));
        assert_eq!(calls.last(), Some(&DrawCall::Present));

        let copied = canvas.copied();
        assert_eq!(copied[0], PathBuf::from(BACKGROUND_IMAGE));
        assert_eq!(copied[1], PathBuf::from("res/img/bird_frame_1.png"));
        assert_eq!(copied.len(), 2 + 2 * PIPE_COUNT);
        assert!(copied[2..].iter().all(|p| p == &PathBuf::from(PIPE_IMAGE)));

        // Top pipes are drawn flipped
        let flips: Vec<Flip> = calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Copy { texture, flip, .. } if texture == &PathBuf::from(PIPE_IMAGE) => Some(*flip),
                _ => None,
            })
            .collect();
        assert_eq!(flips[0], Flip::Vertical);
        assert_eq!(flips[1], Flip::None);
    }

    #[test]
    fn test_paint_stops_at_first_failure() {
        let (scene, mut canvas, _) = scene();
        canvas.fail_copy("res/img/bird_frame_1.png");

        let err = scene.paint(&mut canvas).unwrap_err();
        assert_eq!(
            err,
            SceneError::render(
                Layer::Bird,
                RenderError::new("copy of res/img/bird_frame_1.png refused")
            )
        );
        // Background made it, pipes and present did not
        assert_eq!(canvas.copied(), vec![PathBuf::from(BACKGROUND_IMAGE)]);
        assert_eq!(canvas.presents(), 0);
    }

    #[test]
    fn test_paint_reports_present_failure() {
        let (scene, mut canvas, _) = scene();
        canvas.fail_present(true);
        assert!(matches!(
            scene.paint(&mut canvas),
            Err(SceneError::Render {
                layer: Layer::Present,
                ..
            })
        ));
    }

    #[test]
    fn test_paint_gameover_loads_its_own_texture() {
        let (scene, mut canvas, _) = scene();
        scene.paint_gameover(&mut canvas).unwrap();
        assert_eq!(
            canvas.calls(),
            vec![
                DrawCall::Load(GAME_OVER_IMAGE.into()),
                DrawCall::Copy {
                    texture: GAME_OVER_IMAGE.into(),
                    src: None,
                    dst: None,
                    flip: Flip::None,
                },
                DrawCall::Present,
            ]
        );
    }

    #[test]
    fn test_paint_gameover_missing_image() {
        let (scene, mut canvas, _) = scene();
        canvas.fail_load(GAME_OVER_IMAGE);
        assert!(matches!(
            scene.paint_gameover(&mut canvas),
            Err(SceneError::Asset(_))
        ));
    }
}
