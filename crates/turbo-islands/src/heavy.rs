//! Heavy island: loaded on demand, runs simulated expensive work.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use turbo_hydrate::Environment;

use crate::error::Result;
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

/// Rows produced by `dataset`.
pub const DATASET_ROWS: usize = 1000;
/// Values produced by `calculate`.
pub const CALCULATION_SIZE: usize = 10_000;

const DATASET_DELAY: Duration = Duration::from_millis(600);
const CALCULATION_DELAY: Duration = Duration::from_millis(800);
const PREVIEW_LEN: usize = 10;

/// One generated row.
#[derive(Debug, Clone, Serialize)]
pub struct DataRow {
    pub id: usize,
    pub value: f64,
    pub timestamp: i64,
    pub metadata: String,
    pub computation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeavyOperation {
    Dataset,
    Calculate,
}

#[derive(Debug, Default)]
struct HeavyState {
    operation: Option<HeavyOperation>,
    dataset: Vec<DataRow>,
    results: Vec<f64>,
    processing_ms: u64,
}

#[derive(Serialize)]
struct HeavyView<'a> {
    operation: Option<HeavyOperation>,
    dataset_rows: usize,
    result_count: usize,
    result_preview: &'a [f64],
    processing_ms: u64,
}

/// Value `i` of the calculation, rounded to three decimals.
pub fn calculation_value(i: usize) -> f64 {
    let x = i as f64;
    let raw = x.powi(2) * (x / 100.0).sin() + (x * PI / 180.0).cos();
    (raw * 1000.0).round() / 1000.0
}

fn generate_dataset() -> Vec<DataRow> {
    let mut rng = rand::thread_rng();
    let now = chrono::Utc::now().timestamp_millis();
    (0..DATASET_ROWS)
        .map(|id| DataRow {
            id,
            value: rng.gen_range(0.0..1000.0),
            timestamp: now,
            metadata: format!("Heavy data item {}", id),
            computation: id as f64 * PI * rng.gen::<f64>(),
        })
        .collect()
}

/// Dataset generation and numeric computation behind a busy flag.
pub struct HeavyPanel {
    core: IslandCore,
    state: Rc<RefCell<HeavyState>>,
}

impl HeavyPanel {
    pub fn new(env: &Environment) -> Self {
        Self {
            core: IslandCore::new(IslandKind::Heavy, env),
            state: Rc::new(RefCell::new(HeavyState::default())),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().operation.is_some()
    }

    pub fn dataset_len(&self) -> usize {
        self.state.borrow().dataset.len()
    }

    pub fn results(&self) -> Vec<f64> {
        self.state.borrow().results.clone()
    }

    fn start(&self, operation: HeavyOperation) -> ActionOutcome {
        if let Some(current) = self.state.borrow().operation {
            tracing::debug!(?current, ?operation, "Heavy island busy");
            return ActionOutcome::ignored("busy");
        }
        self.state.borrow_mut().operation = Some(operation);

        let state = Rc::clone(&self.state);
        let started = Instant::now();
        self.core.tasks().spawn(async move {
            match operation {
                HeavyOperation::Dataset => {
                    tokio::time::sleep(DATASET_DELAY).await;
                    let rows = generate_dataset();
                    state.borrow_mut().dataset = rows;
                }
                HeavyOperation::Calculate => {
                    tokio::time::sleep(CALCULATION_DELAY).await;
                    let results = (0..CALCULATION_SIZE).map(calculation_value).collect();
                    state.borrow_mut().results = results;
                }
            }
            let mut state = state.borrow_mut();
            state.processing_ms = started.elapsed().as_millis() as u64;
            state.operation = None;
            tracing::info!(?operation, processing_ms = state.processing_ms, "Heavy operation complete");
        });
        ActionOutcome::Started
    }
}

impl Panel for HeavyPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["dataset", "calculate"]
    }

    fn on_mount(&self) {
        self.core.activate_after(Duration::ZERO);
    }

    fn apply(&self, name: &str, _arg: Option<&str>) -> Result<ActionOutcome> {
        let operation = if name == "dataset" {
            HeavyOperation::Dataset
        } else {
            HeavyOperation::Calculate
        };
        Ok(self.start(operation))
    }

    fn state(&self) -> Result<serde_json::Value> {
        let state = self.state.borrow();
        let preview = &state.results[..state.results.len().min(PREVIEW_LEN)];
        Ok(serde_json::to_value(HeavyView {
            operation: state.operation,
            dataset_rows: state.dataset.len(),
            result_count: state.results.len(),
            result_preview: preview,
            processing_ms: state.processing_ms,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn hydrated() -> HeavyPanel {
        let panel = HeavyPanel::new(&Environment::interactive());
        panel.on_mount();
        panel
    }

    #[test]
    fn test_calculation_values() {
        assert_eq!(calculation_value(0), 1.0);
        let expected = (100f64.powi(2) * 1f64.sin() + (100.0 * PI / 180.0).cos()) * 1000.0;
        assert_eq!(calculation_value(100), expected.round() / 1000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dataset_lands_after_delay() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated();
                assert_eq!(panel.perform("dataset").unwrap(), ActionOutcome::Started);
                assert!(panel.is_busy());

                tokio::time::sleep(Duration::from_millis(599)).await;
                assert_eq!(panel.dataset_len(), 0);

                tokio::time::sleep(Duration::from_millis(2)).await;
                assert_eq!(panel.dataset_len(), DATASET_ROWS);
                assert!(!panel.is_busy());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_refuses_second_operation() {
        LocalSet::new()
            .run_until(async {
                let panel = hydrated();
                panel.perform("calculate").unwrap();
                assert_eq!(
                    panel.perform("dataset").unwrap(),
                    ActionOutcome::ignored("busy")
                );

                tokio::time::sleep(Duration::from_millis(801)).await;
                let results = panel.results();
                assert_eq!(results.len(), CALCULATION_SIZE);
                assert_eq!(results[0], 1.0);
                assert_eq!(panel.state().unwrap()["processing_ms"], 800);
                assert_eq!(panel.dataset_len(), 0);
            })
            .await;
    }
}
