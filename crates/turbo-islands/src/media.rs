//! Media player island.
//!
//! Hydrates five seconds after mount while a countdown runs. Playback
//! advances once per second and stops (rewinding to the start) at the end
//! of the track.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;
use turbo_hydrate::Environment;

use crate::error::Result;
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

/// Track length in seconds.
pub const DURATION_SECS: u32 = 180;
/// Countdown before the player hydrates.
pub const COUNTDOWN_SECS: u32 = 5;

const TICK: Duration = Duration::from_secs(1);
const SEEK_SECS: u32 = 10;
const VOLUME_STEP: u32 = 25;

#[derive(Debug, Serialize)]
struct MediaState {
    countdown: u32,
    playing: bool,
    current_secs: u32,
    duration_secs: u32,
    volume: u32,
    buffer: u32,
    quality: &'static str,
    fps: u32,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            countdown: COUNTDOWN_SECS,
            playing: false,
            current_secs: 0,
            duration_secs: DURATION_SECS,
            volume: 75,
            buffer: 0,
            quality: "HD",
            fps: 60,
        }
    }
}

impl MediaState {
    fn progress(&self) -> f64 {
        self.current_secs as f64 / self.duration_secs as f64 * 100.0
    }
}

#[derive(Serialize)]
struct MediaView<'a> {
    #[serde(flatten)]
    state: &'a MediaState,
    position: String,
    length: String,
    progress: f64,
}

/// Format seconds as `m:ss`.
pub fn format_time(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Next volume step: 75 -> 100 -> 25 -> 50 -> 75.
pub fn next_volume(volume: u32) -> u32 {
    match (volume + VOLUME_STEP) % (100 + VOLUME_STEP) {
        0 => VOLUME_STEP,
        v => v,
    }
}

/// Simulated media player.
pub struct MediaPanel {
    core: IslandCore,
    state: Rc<RefCell<MediaState>>,
    playback: RefCell<Option<AbortHandle>>,
}

impl MediaPanel {
    pub fn new(env: &Environment) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Media, env),
            state: Rc::new(RefCell::new(MediaState::default())),
            playback: RefCell::new(None),
        }
    }

    pub fn countdown(&self) -> u32 {
        self.state.borrow().countdown
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn position(&self) -> u32 {
        self.state.borrow().current_secs
    }

    pub fn volume(&self) -> u32 {
        self.state.borrow().volume
    }

    fn play(&self) {
        self.state.borrow_mut().playing = true;
        let state = Rc::clone(&self.state);
        let handle = self.core.tasks().spawn(async move {
            loop {
                tokio::time::sleep(TICK).await;
                let mut state = state.borrow_mut();
                state.current_secs += 1;
                if state.current_secs >= state.duration_secs {
                    state.playing = false;
                    state.current_secs = 0;
                    tracing::debug!("Playback finished");
                    break;
                }
            }
        });
        *self.playback.borrow_mut() = Some(handle);
        tracing::debug!("Playing");
    }

    fn pause(&self) {
        if let Some(handle) = self.playback.borrow_mut().take() {
            handle.abort();
        }
        self.state.borrow_mut().playing = false;
        tracing::debug!("Paused");
    }

    fn seek(&self, forward: bool) {
        let mut state = self.state.borrow_mut();
        state.current_secs = if forward {
            (state.current_secs + SEEK_SECS).min(state.duration_secs)
        } else {
            state.current_secs.saturating_sub(SEEK_SECS)
        };
    }
}

impl Panel for MediaPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["play", "pause", "toggle", "rewind", "forward", "volume"]
    }

    fn on_mount(&self) {
        if !self.core.is_interactive() {
            return;
        }
        let state = Rc::clone(&self.state);
        let hydration = Rc::clone(self.core.hydration());
        self.core.tasks().spawn(async move {
            for _ in 0..COUNTDOWN_SECS {
                tokio::time::sleep(TICK).await;
                let mut state = state.borrow_mut();
                state.countdown = state.countdown.saturating_sub(1);
            }
            state.borrow_mut().buffer = 100;
            hydration.mark_active();
        });
    }

    fn on_unmount(&self) {
        self.pause();
        self.core.teardown();
    }

    fn apply(&self, name: &str, _arg: Option<&str>) -> Result<ActionOutcome> {
        let playing = self.is_playing();
        match name {
            "play" if playing => return Ok(ActionOutcome::ignored("already playing")),
            "pause" if !playing => return Ok(ActionOutcome::ignored("not playing")),
            "play" => self.play(),
            "pause" => self.pause(),
            "toggle" if playing => self.pause(),
            "toggle" => self.play(),
            "rewind" => self.seek(false),
            "forward" => self.seek(true),
            _ => {
                let mut state = self.state.borrow_mut();
                state.volume = next_volume(state.volume);
                tracing::debug!(volume = state.volume, "Volume changed");
            }
        }
        Ok(ActionOutcome::Applied)
    }

    fn state(&self) -> Result<serde_json::Value> {
        let state = self.state.borrow();
        Ok(serde_json::to_value(MediaView {
            position: format_time(state.current_secs),
            length: format_time(state.duration_secs),
            progress: state.progress(),
            state: &state,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    async fn hydrated() -> MediaPanel {
        let panel = MediaPanel::new(&Environment::interactive());
        panel.on_mount();
        tokio::time::sleep(Duration::from_millis(5001)).await;
        panel
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(180), "3:00");
    }

    #[test]
    fn test_volume_cycle() {
        assert_eq!(next_volume(75), 100);
        assert_eq!(next_volume(100), 25);
        assert_eq!(next_volume(25), 50);
        assert_eq!(next_volume(50), 75);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_then_hydrate() {
        LocalSet::new()
            .run_until(async {
                let panel = MediaPanel::new(&Environment::interactive());
                panel.on_mount();
                assert!(panel.perform("play").unwrap().is_ignored());

                tokio::time::sleep(Duration::from_millis(2500)).await;
                assert_eq!(panel.countdown(), 3);
                assert!(!panel.core().hydration().is_active());

                tokio::time::sleep(Duration::from_millis(2600)).await;
                assert_eq!(panel.countdown(), 0);
                assert!(panel.core().hydration().is_active());
                assert_eq!(panel.state().unwrap()["buffer"], 100);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_ticks_and_pauses() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated().await;
                panel.perform("play").unwrap();
                tokio::time::sleep(Duration::from_millis(3500)).await;
                assert_eq!(panel.position(), 3);

                panel.perform("pause").unwrap();
                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(panel.position(), 3);
                assert!(!panel.is_playing());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_is_clamped() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated().await;
                panel.perform("rewind").unwrap();
                assert_eq!(panel.position(), 0);

                for _ in 0..20 {
                    panel.perform("forward").unwrap();
                }
                assert_eq!(panel.position(), DURATION_SECS);
                assert_eq!(panel.state().unwrap()["position"], "3:00");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_rewinds_at_end() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated().await;
                for _ in 0..17 {
                    panel.perform("forward").unwrap();
                }
                panel.perform("play").unwrap();
                tokio::time::sleep(Duration::from_millis(10_500)).await;

                assert!(!panel.is_playing());
                assert_eq!(panel.position(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_playback() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated().await;
                panel.perform("play").unwrap();
                tokio::time::sleep(Duration::from_millis(1500)).await;

                panel.on_unmount();
                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(panel.position(), 1);
                assert!(!panel.is_playing());
            })
            .await;
    }
}
