//! Dynamic island: simulates loading features and a large library on demand.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use turbo_hydrate::Environment;

use crate::error::{IslandError, Result};
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

const FEATURE_LOAD_MS: Range<u64> = 500..1500;
const LIBRARY_LOAD_MS: Range<u64> = 1000..3000;

/// A feature that finished loading.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedFeature {
    pub name: String,
    pub description: String,
    pub load_ms: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
enum Loading {
    Feature(String),
    Library,
}

#[derive(Debug, Default, Serialize)]
struct DynamicState {
    loading: Option<Loading>,
    features: Vec<LoadedFeature>,
    library: Option<String>,
}

/// One load at a time; further requests are refused while in flight.
pub struct DynamicPanel {
    core: IslandCore,
    state: Rc<RefCell<DynamicState>>,
}

impl DynamicPanel {
    pub fn new(env: &Environment) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Dynamic, env),
            state: Rc::new(RefCell::new(DynamicState::default())),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading.is_some()
    }

    pub fn features(&self) -> Vec<LoadedFeature> {
        self.state.borrow().features.clone()
    }

    pub fn library(&self) -> Option<String> {
        self.state.borrow().library.clone()
    }

    fn load(&self, loading: Loading) -> ActionOutcome {
        if self.is_loading() {
            return ActionOutcome::ignored("load in progress");
        }
        let range = match loading {
            Loading::Feature(_) => FEATURE_LOAD_MS,
            Loading::Library => LIBRARY_LOAD_MS,
        };
        let delay = Duration::from_millis(rand::thread_rng().gen_range(range));
        self.state.borrow_mut().loading = Some(loading.clone());

        let state = Rc::clone(&self.state);
        let started = Instant::now();
        self.core.tasks().spawn(async move {
            tokio::time::sleep(delay).await;
            let load_ms = started.elapsed().as_millis() as u64;
            let mut state = state.borrow_mut();
            match loading {
                Loading::Feature(name) => {
                    tracing::info!(feature = %name, load_ms, "Loaded feature");
                    state.features.push(LoadedFeature {
                        description: format!("Dynamic feature {} with advanced capabilities", name),
                        name: format!("Feature {}", name),
                        load_ms,
                        timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
                    });
                }
                Loading::Library => {
                    tracing::info!(load_ms, "Heavy library loaded");
                    state.library = Some(format!(
                        "Heavy Library v2.1.0 loaded in {}ms. Size: ~250KB. Features: Advanced Analytics, Machine Learning, Data Visualization, Real-time Processing",
                        load_ms
                    ));
                }
            }
            state.loading = None;
        });
        ActionOutcome::Started
    }
}

impl Panel for DynamicPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["feature", "library"]
    }

    fn on_mount(&self) {
        self.core.activate_after(Duration::ZERO);
    }

    fn apply(&self, name: &str, arg: Option<&str>) -> Result<ActionOutcome> {
        if name == "library" {
            return Ok(self.load(Loading::Library));
        }
        match arg.map(str::trim) {
            Some(feature) if !feature.is_empty() => {
                Ok(self.load(Loading::Feature(feature.to_string())))
            }
            _ => Err(IslandError::invalid_argument(name, "expected feature:<name>")),
        }
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&*self.state.borrow())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn hydrated() -> DynamicPanel {
        let panel = DynamicPanel::new(&Environment::interactive());
        panel.on_mount();
        panel
    }

    #[tokio::test(start_paused = true)]
    async fn test_feature_loads_within_range() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated();
                assert_eq!(panel.perform("feature:A").unwrap(), ActionOutcome::Started);

                tokio::time::sleep(Duration::from_millis(499)).await;
                assert!(panel.features().is_empty());

                tokio::time::sleep(Duration::from_millis(1002)).await;
                let features = panel.features();
                assert_eq!(features.len(), 1);
                assert_eq!(features[0].name, "Feature A");
                assert!((500..1500).contains(&features[0].load_ms));
                assert!(!panel.is_loading());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refuses_while_loading() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated();
                panel.perform("library").unwrap();
                assert!(panel.perform("feature:B").unwrap().is_ignored());

                tokio::time::sleep(Duration::from_millis(3001)).await;
                assert!(panel.library().unwrap().starts_with("Heavy Library v2.1.0"));
                assert!(panel.features().is_empty());
            })
            .await;
    }

    #[test]
    fn test_feature_requires_name() {
        let panel = hydrated();
        assert!(matches!(
            panel.perform("feature"),
            Err(IslandError::InvalidArgument { .. })
        ));
    }
}
