//! The storefront page: regions, mount points and controllers for every
//! configured island, plus the chunk status report.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use turbo_hydrate::{
    ControllerState, DeferredController, Environment, Gesture, MountPoint, Region,
};

use crate::config::{IslandConfig, StorefrontConfig};
use crate::error::{IslandError, Result};
use crate::island::{ActionOutcome, Island};

/// Yields granted to local tasks by [`Storefront::flush`].
const FLUSH_YIELDS: usize = 16;

/// Whether an island's code is on the page yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkState {
    Loaded,
    Loading,
    NotLoaded,
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Loading => write!(f, "loading"),
            Self::NotLoaded => write!(f, "not-loaded"),
        }
    }
}

/// One row of the chunk report.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkStatus {
    pub island: String,
    pub title: &'static str,
    pub trigger: String,
    pub chunk: ChunkState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    pub hydration: &'static str,
}

/// A configured island and its page plumbing.
pub struct IslandSlot {
    config: IslandConfig,
    region: Region,
    mount: MountPoint<Island>,
    controller: Option<DeferredController>,
}

impl IslandSlot {
    pub fn config(&self) -> &IslandConfig {
        &self.config
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn mount(&self) -> &MountPoint<Island> {
        &self.mount
    }

    pub fn controller(&self) -> Option<&DeferredController> {
        self.controller.as_ref()
    }

    pub fn unit(&self) -> Option<Rc<Island>> {
        self.mount.unit()
    }

    fn chunk_state(&self) -> ChunkState {
        if !self.mount.is_empty() {
            return ChunkState::Loaded;
        }
        match self.controller.as_ref().map(DeferredController::state) {
            Some(ControllerState::Fired) => ChunkState::Loading,
            _ => ChunkState::NotLoaded,
        }
    }

    fn status(&self) -> ChunkStatus {
        let trigger = match &self.controller {
            Some(controller) => controller.trigger().to_string(),
            None => "eager".to_string(),
        };
        let hydration = match self.unit() {
            Some(unit) => unit.hydration().status_label(),
            None => "Not loaded",
        };
        ChunkStatus {
            island: self.config.name.clone(),
            title: self.config.kind.title(),
            trigger,
            chunk: self.chunk_state(),
            controller: self.controller.as_ref().map(|c| c.state().to_string()),
            hydration,
        }
    }
}

/// A storefront page built from a [`StorefrontConfig`].
pub struct Storefront {
    name: String,
    env: Environment,
    slots: Vec<IslandSlot>,
}

impl Storefront {
    /// Build the page.
    ///
    /// Eager islands are attached immediately. Deferred islands get a
    /// controller; in an interactive context this must run inside a
    /// `tokio::task::LocalSet`.
    pub fn build(config: &StorefrontConfig, env: &Environment) -> Result<Self> {
        config.validate()?;

        let mut slots = Vec::with_capacity(config.islands.len());
        for island in &config.islands {
            let region = Region::new(island.name.as_str());
            let mount = MountPoint::new(island.name.as_str());

            let controller = match island.trigger {
                Some(spec) => {
                    let kind = island.kind;
                    let unit_env = env.clone();
                    Some(DeferredController::configure(
                        env,
                        spec,
                        move || async move { Ok(kind.build(&unit_env)) },
                        &mount,
                        &region,
                    )?)
                }
                None => {
                    mount.attach(island.kind.build(env))?;
                    None
                }
            };

            slots.push(IslandSlot {
                config: island.clone(),
                region,
                mount,
                controller,
            });
        }

        tracing::info!(
            page = %config.storefront.name,
            context = %env.context(),
            islands = slots.len(),
            "Storefront built"
        );

        Ok(Self {
            name: config.storefront.name.clone(),
            env: env.clone(),
            slots,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn slots(&self) -> &[IslandSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Result<&IslandSlot> {
        self.slots
            .iter()
            .find(|s| s.config.name == name)
            .ok_or_else(|| IslandError::UnknownIsland(name.to_string()))
    }

    /// Dispatch a gesture on an island's region.
    pub fn gesture(&self, name: &str, gesture: Gesture) -> Result<usize> {
        Ok(self.slot(name)?.region.dispatch(gesture))
    }

    pub fn click(&self, name: &str) -> Result<usize> {
        self.gesture(name, Gesture::Click)
    }

    pub fn hover(&self, name: &str) -> Result<usize> {
        self.gesture(name, Gesture::Hover)
    }

    /// Scroll an island into or out of view.
    pub fn set_visible(&self, name: &str, visible: bool) -> Result<()> {
        self.slot(name)?.region.set_intersecting(visible);
        Ok(())
    }

    /// Tear down an island's mount point.
    pub fn destroy(&self, name: &str) -> Result<()> {
        self.slot(name)?.mount.destroy();
        Ok(())
    }

    pub fn unit(&self, name: &str) -> Result<Rc<Island>> {
        self.slot(name)?
            .unit()
            .ok_or_else(|| IslandError::NotMounted(name.to_string()))
    }

    /// Perform an action on a mounted island.
    pub fn act(&self, name: &str, action: &str) -> Result<ActionOutcome> {
        let unit = self.unit(name)?;
        let outcome = unit.perform(action)?;
        tracing::debug!(island = name, action, ?outcome, "Island action");
        Ok(outcome)
    }

    /// Let pending local tasks (controllers, island work) make progress.
    pub async fn flush(&self) {
        for _ in 0..FLUSH_YIELDS {
            tokio::task::yield_now().await;
        }
    }

    /// Wait for every controller that has fired to finish materializing.
    pub async fn settle(&mut self) {
        self.flush().await;
        for slot in &mut self.slots {
            if let Some(controller) = slot.controller.as_mut() {
                if controller.state() == ControllerState::Fired {
                    if let Err(err) = controller.activated().await {
                        tracing::warn!(island = %slot.config.name, error = %err, "Island did not activate");
                    }
                }
            }
        }
    }

    /// Per-island chunk and hydration status.
    pub fn chunk_report(&self) -> Vec<ChunkStatus> {
        self.slots.iter().map(IslandSlot::status).collect()
    }

    /// Number of islands whose chunk is loaded.
    pub fn loaded_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.chunk_state() == ChunkState::Loaded)
            .count()
    }

    /// Snapshot of every mounted island.
    pub fn snapshot(&self) -> Result<serde_json::Value> {
        let mut islands = serde_json::Map::new();
        for slot in &self.slots {
            if let Some(unit) = slot.unit() {
                islands.insert(slot.config.name.clone(), unit.snapshot()?);
            }
        }
        Ok(serde_json::json!({
            "page": self.name,
            "context": self.env.context(),
            "islands": islands,
        }))
    }
}

impl fmt::Debug for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storefront")
            .field("name", &self.name)
            .field("context", &self.env.context())
            .field("islands", &self.slots.len())
            .finish()
    }
}
