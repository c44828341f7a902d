//! Per-unit hydration state.
//!
//! Every unit starts [`HydrationState::Pending`] and flips to
//! [`HydrationState::Active`] once its post-mount lifecycle has run in an
//! interactive context. The transition is monotonic. Interactive operations
//! consult [`HydrationTracker::is_active`] (or run through
//! [`HydrationTracker::gate`]) and refuse without effect while pending.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::context::{Environment, ExecutionContext};
use crate::events::ActivationEvent;

/// Hydration state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HydrationState {
    /// Rendered but not interactive.
    Pending,
    /// Fully interactive.
    Active,
}

impl fmt::Display for HydrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Hydration state machine embedded in each unit.
pub struct HydrationTracker {
    unit: String,
    env: Environment,
    state: Cell<HydrationState>,
    created_at: Instant,
    hydration_time: Cell<Option<Duration>>,
}

impl HydrationTracker {
    /// Create a tracker for a unit. Always starts pending.
    pub fn new(unit: impl Into<String>, env: &Environment) -> Self {
        let tracker = Self {
            unit: unit.into(),
            env: env.clone(),
            state: Cell::new(HydrationState::Pending),
            created_at: Instant::now(),
            hydration_time: Cell::new(None),
        };
        tracker.mark_pending();
        tracker
    }

    /// Record the pending state. Has no effect once active.
    pub fn mark_pending(&self) {
        if self.is_active() {
            return;
        }
        self.state.set(HydrationState::Pending);
        tracing::debug!(unit = %self.unit, context = %self.env.context(), "Unit pending hydration");
        self.env.emit(ActivationEvent::HydrationPending {
            unit: self.unit.clone(),
        });
    }

    /// Mark the unit interactive.
    ///
    /// Call from the unit's post-mount lifecycle. Returns `true` only on the
    /// transition; repeated calls, and calls in a pre-render context, leave
    /// the state unchanged.
    pub fn mark_active(&self) -> bool {
        if self.is_active() {
            return false;
        }
        if !self.env.is_interactive() {
            tracing::debug!(unit = %self.unit, "Not hydrating outside an interactive context");
            return false;
        }

        let elapsed = self.created_at.elapsed();
        self.state.set(HydrationState::Active);
        self.hydration_time.set(Some(elapsed));
        let elapsed_ms = elapsed.as_millis() as u64;
        tracing::info!(unit = %self.unit, elapsed_ms, "Unit hydrated and interactive");
        self.env.emit(ActivationEvent::HydrationActive {
            unit: self.unit.clone(),
            elapsed_ms,
        });
        true
    }

    /// Whether the unit is interactive.
    pub fn is_active(&self) -> bool {
        self.state.get() == HydrationState::Active
    }

    /// Current state.
    pub fn state(&self) -> HydrationState {
        self.state.get()
    }

    /// Run an interactive operation if the unit is active.
    ///
    /// While pending the operation is not run and `None` is returned.
    pub fn gate<T>(&self, operation: &str, f: impl FnOnce() -> T) -> Option<T> {
        if self.is_active() {
            return Some(f());
        }
        tracing::debug!(unit = %self.unit, operation, "Ignoring interaction before hydration");
        self.env.emit(ActivationEvent::InteractionIgnored {
            unit: self.unit.clone(),
            operation: operation.to_string(),
        });
        None
    }

    /// Refuse an operation while pending. Returns whether it may proceed.
    pub fn allow(&self, operation: &str) -> bool {
        self.gate(operation, || ()).is_some()
    }

    /// Unit name.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The context the unit was materialized in.
    pub fn context(&self) -> ExecutionContext {
        self.env.context()
    }

    /// The environment the unit was materialized in.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Time from construction to activation.
    pub fn hydration_time(&self) -> Option<Duration> {
        self.hydration_time.get()
    }

    /// Human-readable status.
    pub fn status_label(&self) -> &'static str {
        match self.state() {
            HydrationState::Active => "Hydrated & Interactive",
            HydrationState::Pending => "SSR Only",
        }
    }
}

impl fmt::Debug for HydrationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationTracker")
            .field("unit", &self.unit)
            .field("state", &self.state.get())
            .field("context", &self.env.context())
            .finish()
    }
}
