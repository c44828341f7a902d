//! Data dashboard island.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;
use turbo_hydrate::Environment;

use crate::error::Result;
use crate::island::{ActionOutcome, IslandCore, IslandKind, Panel};

/// Number of points on the chart.
pub const POINTS: usize = 8;

const HYDRATION_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub id: usize,
    pub label: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

fn random_value() -> f64 {
    rand::thread_rng().gen_range(20.0..100.0)
}

#[derive(Debug, Serialize)]
struct DashboardState {
    status: &'static str,
    points: Vec<DataPoint>,
    processing_speed: u64,
    memory_mb: u64,
}

pub struct DashboardPanel {
    core: IslandCore,
    state: Rc<RefCell<DashboardState>>,
}

impl DashboardPanel {
    /// Points are generated up front so the pre-rendered chart has data.
    pub fn new(env: &Environment) -> Self {
        let now = Utc::now();
        let points = (0..POINTS)
            .map(|id| DataPoint {
                id,
                label: format!("D{}", id + 1),
                value: random_value(),
                timestamp: now,
            })
            .collect();
        Self {
            core: IslandCore::new(IslandKind::Dashboard, env),
            state: Rc::new(RefCell::new(DashboardState {
                status: "Server-side rendered",
                points,
                processing_speed: 0,
                memory_mb: 0,
            })),
        }
    }

    pub fn points(&self) -> Vec<DataPoint> {
        self.state.borrow().points.clone()
    }

    pub fn status(&self) -> &'static str {
        self.state.borrow().status
    }
}

impl Panel for DashboardPanel {
    fn core(&self) -> &IslandCore {
        &self.core
    }

    fn actions(&self) -> &'static [&'static str] {
        &["regenerate", "sort", "export"]
    }

    fn on_mount(&self) {
        if !self.core.is_interactive() {
            return;
        }
        let state = Rc::clone(&self.state);
        let hydration = Rc::clone(self.core.hydration());
        self.core.tasks().spawn(async move {
            tokio::time::sleep(HYDRATION_DELAY).await;
            {
                let mut rng = rand::thread_rng();
                let mut state = state.borrow_mut();
                state.status = "Fully hydrated and interactive";
                state.processing_speed = rng.gen_range(50..150);
                state.memory_mb = rng.gen_range(5..15);
            }
            hydration.mark_active();
        });
    }

    fn apply(&self, name: &str, _arg: Option<&str>) -> Result<ActionOutcome> {
        let mut state = self.state.borrow_mut();
        match name {
            "regenerate" => {
                let started = Instant::now();
                let now = Utc::now();
                for point in state.points.iter_mut() {
                    point.value = random_value();
                    point.timestamp = now;
                }
                state.processing_speed = started.elapsed().as_millis() as u64;
                tracing::debug!("Generated new data");
            }
            "sort" => {
                state
                    .points
                    .sort_by(|a, b| b.value.total_cmp(&a.value));
                tracing::debug!("Data sorted");
            }
            _ => {
                return Ok(ActionOutcome::Output(serde_json::to_string_pretty(
                    &state.points,
                )?));
            }
        }
        Ok(ActionOutcome::Applied)
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&*self.state.borrow())?)
    }
}
