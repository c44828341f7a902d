//! Three-step form wizard island.

use std::cell::RefCell;
use std::time::Duration;

use serde::Serialize;
use turbo_hydrate::Environment;

use crate::error::{IslandError, Result};
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

/// Number of wizard steps.
pub const STEPS: u8 = 3;

const HYDRATION_DELAY: Duration = Duration::from_millis(50);

/// Form fields collected by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormData {
    pub name: String,
    pub email: String,
    pub preference: String,
    pub newsletter: bool,
}

#[derive(Debug, Serialize)]
struct WizardState {
    step: u8,
    interactions: u32,
    validations: u32,
    submissions: u32,
    form: FormData,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: 1,
            interactions: 0,
            validations: 0,
            submissions: 0,
            form: FormData::default(),
        }
    }
}

pub struct WizardPanel {
    core: IslandCore,
    state: RefCell<WizardState>,
}

impl WizardPanel {
    pub fn new(env: &Environment) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Wizard, env),
            state: RefCell::new(WizardState::default()),
        }
    }

    pub fn step(&self) -> u8 {
        self.state.borrow().step
    }

    pub fn interactions(&self) -> u32 {
        self.state.borrow().interactions
    }

    pub fn validations(&self) -> u32 {
        self.state.borrow().validations
    }

    pub fn form(&self) -> FormData {
        self.state.borrow().form.clone()
    }

    fn set_field(&self, arg: Option<&str>) -> Result<()> {
        let (field, value) = arg
            .and_then(|a| a.split_once('='))
            .ok_or_else(|| IslandError::invalid_argument("set", "expected set:<field>=<value>"))?;
        let mut state = self.state.borrow_mut();
        let form = &mut state.form;
        match field.trim() {
            "name" => form.name = value.to_string(),
            "email" => form.email = value.to_string(),
            "preference" => form.preference = value.to_string(),
            "newsletter" => {
                form.newsletter = value.trim().parse().map_err(|_| {
                    IslandError::invalid_argument("set", format!("newsletter expects true or false, got '{}'", value))
                })?
            }
            other => {
                return Err(IslandError::invalid_argument(
                    "set",
                    format!("unknown field '{}'", other),
                ))
            }
        }
        Ok(())
    }
}

impl Panel for WizardPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["next", "back", "submit", "set"]
    }

    fn on_mount(&self) {
        self.core.activate_after(HYDRATION_DELAY);
    }

    fn apply(&self, name: &str, arg: Option<&str>) -> Result<ActionOutcome> {
        if name == "set" {
            self.set_field(arg)?;
            return Ok(ActionOutcome::Applied);
        }

        let mut state = self.state.borrow_mut();
        match name {
            "next" => {
                if state.step >= STEPS {
                    return Ok(ActionOutcome::ignored("already on the last step"));
                }
                state.step += 1;
                state.interactions += 1;
                state.validations += 1;
                tracing::debug!(step = state.step, "Moving to next step");
            }
            "back" => {
                if state.step <= 1 {
                    return Ok(ActionOutcome::ignored("already on the first step"));
                }
                state.step -= 1;
                state.interactions += 1;
                tracing::debug!(step = state.step, "Moving back");
            }
            _ => {
                state.interactions += 1;
                state.submissions += 1;
                tracing::info!(form = ?state.form, "Form submitted");
                return Ok(ActionOutcome::Output(serde_json::to_string_pretty(&state.form)?));
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
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_hydrates_after_short_delay() {
        LocalSet::new()
            .run_until(async {
                let panel = WizardPanel::new(&Environment::interactive());
                panel.on_mount();
                assert!(panel.perform("next").unwrap().is_ignored());

                tokio::time::sleep(Duration::from_millis(51)).await;
                assert_eq!(panel.perform("next").unwrap(), ActionOutcome::Applied);
                assert_eq!(panel.step(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_are_bounded() {
        LocalSet::new()
            .run_until(async {
                let panel = WizardPanel::new(&Environment::interactive());
                panel.on_mount();
                tokio::time::sleep(Duration::from_millis(51)).await;

                assert!(panel.perform("back").unwrap().is_ignored());
                panel.perform("next").unwrap();
                panel.perform("next").unwrap();
                assert!(panel.perform("next").unwrap().is_ignored());
                assert_eq!(panel.step(), STEPS);

                panel.perform("back").unwrap();
                assert_eq!(panel.step(), 2);
                assert_eq!(panel.interactions(), 3);
                assert_eq!(panel.validations(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_and_submit() {
        LocalSet::new()
            .run_until(async {
                let panel = WizardPanel::new(&Environment::interactive());
                panel.on_mount();
                tokio::time::sleep(Duration::from_millis(51)).await;

                panel.perform("set:name=Ada Lovelace").unwrap();
                panel.perform("set:email=ada@example.com").unwrap();
                panel.perform("set:newsletter=true").unwrap();
                assert!(matches!(
                    panel.perform("set:newsletter=maybe"),
                    Err(IslandError::InvalidArgument { .. })
                ));
                assert!(matches!(
                    panel.perform("set:age=36"),
                    Err(IslandError::InvalidArgument { .. })
                ));

                let ActionOutcome::Output(document) = panel.perform("submit").unwrap() else {
                    panic!("submit should produce a document");
                };
                let form: serde_json::Value = serde_json::from_str(&document).unwrap();
                assert_eq!(form["name"], "Ada Lovelace");
                assert_eq!(form["newsletter"], true);
                assert_eq!(panel.interactions(), 1);
            })
            .await;
    }
}
