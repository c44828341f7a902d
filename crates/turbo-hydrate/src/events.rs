//! Structured activation events and the observer hook.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::trigger::TriggerKind;

/// A structured event emitted on controller and tracker transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivationEvent {
    /// Configure ran in a pre-render context; nothing is observed.
    Skipped {
        mount: String,
        trigger: TriggerKind,
    },
    /// Observation has started.
    Armed {
        mount: String,
        trigger: TriggerKind,
    },
    /// The trigger fired and the observation was released.
    Fired {
        mount: String,
        trigger: TriggerKind,
        elapsed_ms: u64,
    },
    /// The produced unit was attached.
    Materialized { mount: String, elapsed_ms: u64 },
    /// The factory failed; the mount point stays empty.
    MaterializeFailed { mount: String, error: String },
    /// The mount point was torn down before the unit was attached.
    TornDown { mount: String },
    /// A unit was constructed and is waiting for hydration.
    HydrationPending { unit: String },
    /// A unit became interactive.
    HydrationActive { unit: String, elapsed_ms: u64 },
    /// An interactive operation was refused while the unit was pending.
    InteractionIgnored { unit: String, operation: String },
}

impl ActivationEvent {
    /// Short name of the event, matching its serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Armed { .. } => "armed",
            Self::Fired { .. } => "fired",
            Self::Materialized { .. } => "materialized",
            Self::MaterializeFailed { .. } => "materialize_failed",
            Self::TornDown { .. } => "torn_down",
            Self::HydrationPending { .. } => "hydration_pending",
            Self::HydrationActive { .. } => "hydration_active",
            Self::InteractionIgnored { .. } => "interaction_ignored",
        }
    }

    /// The mount point or unit the event refers to.
    pub fn subject(&self) -> &str {
        match self {
            Self::Skipped { mount, .. }
            | Self::Armed { mount, .. }
            | Self::Fired { mount, .. }
            | Self::Materialized { mount, .. }
            | Self::MaterializeFailed { mount, .. }
            | Self::TornDown { mount } => mount,
            Self::HydrationPending { unit }
            | Self::HydrationActive { unit, .. }
            | Self::InteractionIgnored { unit, .. } => unit,
        }
    }
}

/// Observer hook for activation events.
///
/// Hosts subscribe by passing an observer into the [`Environment`].
///
/// [`Environment`]: crate::Environment
pub trait ActivationObserver {
    /// Called for every emitted event.
    fn on_event(&self, event: &ActivationEvent);
}

/// Observer that records every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ActivationEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<ActivationEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    /// Events that refer to the given mount point or unit.
    pub fn for_subject(&self, subject: &str) -> Vec<ActivationEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.subject() == subject)
            .cloned()
            .collect()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl ActivationObserver for EventLog {
    fn on_event(&self, event: &ActivationEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.on_event(&ActivationEvent::HydrationPending {
            unit: "light".into(),
        });
        log.on_event(&ActivationEvent::HydrationActive {
            unit: "light".into(),
            elapsed_ms: 0,
        });

        let names: Vec<_> = log.events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["hydration_pending", "hydration_active"]);
        assert_eq!(log.count("hydration_active"), 1);
    }

    #[test]
    fn test_event_log_clones_share_storage() {
        let log = EventLog::new();
        let handle = log.clone();
        handle.on_event(&ActivationEvent::TornDown {
            mount: "cart".into(),
        });
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_for_subject_filters_by_mount_and_unit() {
        let log = EventLog::new();
        log.on_event(&ActivationEvent::Armed {
            mount: "heavy".into(),
            trigger: TriggerKind::Interaction,
        });
        log.on_event(&ActivationEvent::HydrationPending {
            unit: "media".into(),
        });
        assert_eq!(log.for_subject("heavy").len(), 1);
        assert_eq!(log.for_subject("media").len(), 1);
        assert!(log.for_subject("cart").is_empty());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = ActivationEvent::Fired {
            mount: "heavy".into(),
            trigger: TriggerKind::Timer,
            elapsed_ms: 3000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "fired");
        assert_eq!(json["trigger"], "timer");
        assert_eq!(json["elapsed_ms"], 3000);
    }
}
