//! Light island: shipped in the main bundle, interactive on mount.

use std::cell::RefCell;
use std::time::Duration;

use serde::Serialize;
use turbo_hydrate::Environment;

use crate::error::Result;
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

#[derive(Debug, Default, Serialize)]
struct LightState {
    counter: u64,
    messages: Vec<String>,
}

/// Counter plus timestamped message log.
pub struct LightPanel {
    core: IslandCore,
    state: RefCell<LightState>,
}

impl LightPanel {
    pub fn new(env: &Environment) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Light, env),
            state: RefCell::new(LightState::default()),
        }
    }

    pub fn counter(&self) -> u64 {
        self.state.borrow().counter
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.borrow().messages.clone()
    }
}

impl Panel for LightPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["increment", "message"]
    }

    fn on_mount(&self) {
        self.core.activate_after(Duration::ZERO);
    }

    fn apply(&self, name: &str, _arg: Option<&str>) -> Result<ActionOutcome> {
        let mut state = self.state.borrow_mut();
        match name {
            "increment" => {
                state.counter += 1;
                tracing::debug!(counter = state.counter, "Counter incremented");
            }
            _ => {
                let timestamp = chrono::Local::now().format("%H:%M:%S");
                let message = format!("Message {} at {}", state.messages.len() + 1, timestamp);
                tracing::debug!(message = %message, "Added message");
                state.messages.push(message);
            }
        }
        Ok(ActionOutcome::Applied)
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&*self.state.borrow())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrated() -> LightPanel {
        let panel = LightPanel::new(&Environment::interactive());
        panel.on_mount();
        panel
    }

    #[test]
    fn test_increment_requires_hydration() {
        let panel = LightPanel::new(&Environment::interactive());
        assert!(panel.perform("increment").unwrap().is_ignored());
        assert_eq!(panel.counter(), 0);

        panel.on_mount();
        assert_eq!(panel.perform("increment").unwrap(), ActionOutcome::Applied);
        assert_eq!(panel.counter(), 1);
    }

    #[test]
    fn test_messages_are_numbered() {
        let panel = hydrated();
        panel.perform("message").unwrap();
        panel.perform("message").unwrap();

        let messages = panel.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Message 1 at "));
        assert!(messages[1].starts_with("Message 2 at "));
    }

    #[test]
    fn test_state_snapshot() {
        let panel = hydrated();
        panel.perform("increment").unwrap();
        let state = panel.state().unwrap();
        assert_eq!(state["counter"], 1);
    }
}
