//! Island kinds, the shared island core and the mountable `Island` unit.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::{AbortHandle, JoinHandle};
use turbo_hydrate::{Environment, HydrationTracker, Mountable};

use crate::cart::{CartPanel, MemoryCart};
use crate::dashboard::DashboardPanel;
use crate::dynamic::DynamicPanel;
use crate::error::{IslandError, Result};
use crate::heavy::HeavyPanel;
use crate::light::LightPanel;
use crate::media::MediaPanel;
use crate::wizard::WizardPanel;

/// Reason reported when an action arrives before hydration.
pub const PENDING_HYDRATION: &str = "pending hydration";

/// The kinds of island the storefront can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IslandKind {
    Light,
    Heavy,
    Dynamic,
    Cart,
    Media,
    Wizard,
    Dashboard,
}

impl IslandKind {
    /// All kinds, in page order.
    pub const ALL: [IslandKind; 7] = [
        Self::Light,
        Self::Heavy,
        Self::Dynamic,
        Self::Cart,
        Self::Media,
        Self::Wizard,
        Self::Dashboard,
    ];

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Heavy => "heavy",
            Self::Dynamic => "dynamic",
            Self::Cart => "cart",
            Self::Media => "media",
            Self::Wizard => "wizard",
            Self::Dashboard => "dashboard",
        }
    }

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Light => "Light Component",
            Self::Heavy => "Heavy Component",
            Self::Dynamic => "Dynamic Component",
            Self::Cart => "Custom Cart",
            Self::Media => "Media Player",
            Self::Wizard => "Form Wizard",
            Self::Dashboard => "Data Dashboard",
        }
    }

    /// Build a fresh unit of this kind.
    pub fn build(&self, env: &Environment) -> Island {
        match self {
            Self::Light => Island::Light(LightPanel::new(env)),
            Self::Heavy => Island::Heavy(HeavyPanel::new(env)),
            Self::Dynamic => Island::Dynamic(DynamicPanel::new(env)),
            Self::Cart => Island::Cart(CartPanel::new(env, Rc::new(MemoryCart::new()))),
            Self::Media => Island::Media(MediaPanel::new(env)),
            Self::Wizard => Island::Wizard(WizardPanel::new(env)),
            Self::Dashboard => Island::Dashboard(DashboardPanel::new(env)),
        }
    }
}

impl fmt::Display for IslandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IslandKind {
    type Err = IslandError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IslandError::UnknownKind(s.to_string()))
    }
}

/// Result of performing an action on an island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action took effect immediately.
    Applied,
    /// Background work started; its result lands later.
    Started,
    /// The action produced a document.
    Output(String),
    /// The action was refused without effect.
    Ignored(String),
}

impl ActionOutcome {
    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored(reason.into())
    }

    /// Whether the action was refused.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

/// Split `name:arg` into its parts.
pub(crate) fn split_action(action: &str) -> (&str, Option<&str>) {
    match action.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (action, None),
    }
}

/// Background tasks owned by an island. Aborted on teardown or drop.
#[derive(Default)]
pub struct TaskSet {
    handles: RefCell<Vec<JoinHandle<()>>>,
}

impl TaskSet {
    /// Spawn a task on the current `LocalSet`.
    pub fn spawn<F>(&self, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + 'static,
    {
        let handle = tokio::task::spawn_local(future);
        let abort = handle.abort_handle();
        let mut handles = self.handles.borrow_mut();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        abort
    }

    /// Number of tasks still running.
    pub fn running(&self) -> usize {
        self.handles
            .borrow()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Abort every task.
    pub fn abort_all(&self) {
        for handle in self.handles.borrow_mut().drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Serializable status header shared by every island.
#[derive(Debug, Clone, Serialize)]
pub struct IslandStatus {
    pub island: IslandKind,
    pub hydrated: bool,
    pub status: &'static str,
    pub loaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydration_ms: Option<u64>,
}

/// State every island carries: kind, hydration tracker, load time, tasks.
pub struct IslandCore {
    kind: IslandKind,
    hydration: Rc<HydrationTracker>,
    loaded_at: String,
    tasks: TaskSet,
}

impl IslandCore {
    /// Create the core for a freshly loaded island.
    pub fn new(kind: IslandKind, env: &Environment) -> Self {
        let loaded_at = chrono::Local::now().format("%H:%M:%S").to_string();
        tracing::debug!(island = %kind, context = %env.context(), loaded_at = %loaded_at, "Island loaded");
        Self {
            kind,
            hydration: Rc::new(HydrationTracker::new(kind.as_str(), env)),
            loaded_at,
            tasks: TaskSet::default(),
        }
    }

    pub fn kind(&self) -> IslandKind {
        self.kind
    }

    pub fn hydration(&self) -> &Rc<HydrationTracker> {
        &self.hydration
    }

    pub fn loaded_at(&self) -> &str {
        &self.loaded_at
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Whether background work may be spawned.
    pub fn is_interactive(&self) -> bool {
        self.hydration.context().is_interactive()
    }

    /// Mark the island active now, or after `delay` on a background task.
    ///
    /// Outside an interactive context nothing is scheduled.
    pub fn activate_after(&self, delay: Duration) {
        if !self.is_interactive() {
            return;
        }
        if delay.is_zero() {
            self.hydration.mark_active();
            return;
        }
        let hydration = Rc::clone(&self.hydration);
        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            hydration.mark_active();
        });
    }

    /// Abort background work.
    pub fn teardown(&self) {
        tracing::debug!(island = %self.kind, "Island destroyed");
        self.tasks.abort_all();
    }

    pub fn status(&self) -> IslandStatus {
        IslandStatus {
            island: self.kind,
            hydrated: self.hydration.is_active(),
            status: self.hydration.status_label(),
            loaded_at: self.loaded_at.clone(),
            hydration_ms: self
                .hydration
                .hydration_time()
                .map(|d| d.as_millis() as u64),
        }
    }
}

/// Behaviour shared by every island panel.
pub trait Panel {
    /// The shared core.
    fn core(&self) -> &IslandCore;

    /// Action names this panel understands.
    fn actions(&self) -> &'static [&'static str];

    /// Post-mount lifecycle.
    fn on_mount(&self);

    /// Teardown lifecycle.
    fn on_unmount(&self) {
        self.core().teardown();
    }

    /// Apply an already gated action.
    fn apply(&self, name: &str, arg: Option<&str>) -> Result<ActionOutcome>;

    /// Panel-specific state.
    fn state(&self) -> Result<serde_json::Value>;

    /// Perform an action. Refused without effect while pending.
    fn perform(&self, action: &str) -> Result<ActionOutcome> {
        let (name, arg) = split_action(action);
        let core = self.core();
        if !self.actions().contains(&name) {
            return Err(IslandError::unknown_action(core.kind().as_str(), action));
        }
        if !core.hydration().allow(name) {
            return Ok(ActionOutcome::ignored(PENDING_HYDRATION));
        }
        self.apply(name, arg)
    }

    /// Status header plus panel state.
    fn snapshot(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "status": self.core().status(),
            "state": self.state()?,
        }))
    }
}

/// A materialized island, ready to attach to a mount point.
pub enum Island {
    Light(LightPanel),
    Heavy(HeavyPanel),
    Dynamic(DynamicPanel),
    Cart(CartPanel),
    Media(MediaPanel),
    Wizard(WizardPanel),
    Dashboard(DashboardPanel),
}

impl Island {
    /// The panel behind this island.
    pub fn panel(&self) -> &dyn Panel {
        match self {
            Self::Light(p) => p,
            Self::Heavy(p) => p,
            Self::Dynamic(p) => p,
            Self::Cart(p) => p,
            Self::Media(p) => p,
            Self::Wizard(p) => p,
            Self::Dashboard(p) => p,
        }
    }

    pub fn kind(&self) -> IslandKind {
        self.panel().core().kind()
    }

    pub fn hydration(&self) -> &HydrationTracker {
        self.panel().core().hydration()
    }

    pub fn perform(&self, action: &str) -> Result<ActionOutcome> {
        self.panel().perform(action)
    }

    pub fn snapshot(&self) -> Result<serde_json::Value> {
        self.panel().snapshot()
    }
}

impl Mountable for Island {
    fn mounted(self: Rc<Self>) {
        self.panel().on_mount();
    }

    fn unmounted(&self) {
        self.panel().on_unmount();
    }
}

impl fmt::Debug for Island {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Island")
            .field("kind", &self.kind())
            .field("state", &self.hydration().state())
            .finish()
    }
}
