//! Gesture and visibility sources for the region around a mount point.
//!
//! A [`Region`] is the host's event surface: the host pushes gestures and
//! intersection changes in, controllers subscribe. Each live subscription is
//! one listener or observer; dropping it releases the observation.

use std::rc::Rc;

use tokio::sync::{broadcast, watch};

/// Queued primary gestures per listener. Only the first one matters.
const GESTURE_CAPACITY: usize = 16;

/// A user gesture dispatched on a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Primary activation gesture (pointer press / click).
    Click,
    /// Pointer passing over the region.
    Hover,
}

impl Gesture {
    /// Whether this gesture activates interaction triggers.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Click)
    }
}

struct RegionInner {
    name: String,
    gestures: broadcast::Sender<Gesture>,
    visibility: watch::Sender<bool>,
}

/// The region containing a mount point.
///
/// Cloning shares the same underlying event sources.
#[derive(Clone)]
pub struct Region {
    inner: Rc<RegionInner>,
}

impl Region {
    /// Create a region that starts outside the viewport.
    pub fn new(name: impl Into<String>) -> Self {
        let (gestures, _) = broadcast::channel(GESTURE_CAPACITY);
        let (visibility, _) = watch::channel(false);
        Self {
            inner: Rc::new(RegionInner {
                name: name.into(),
                gestures,
                visibility,
            }),
        }
    }

    /// Region name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Dispatch a gesture. Returns the number of listeners notified.
    ///
    /// Listeners wait for a primary gesture, so other gestures are dropped
    /// here and cannot crowd a press out of the queue.
    pub fn dispatch(&self, gesture: Gesture) -> usize {
        if !gesture.is_primary() {
            tracing::trace!(region = %self.inner.name, ?gesture, "Ignoring secondary gesture");
            return 0;
        }
        self.inner.gestures.send(gesture).unwrap_or(0)
    }

    /// Dispatch a primary click.
    pub fn click(&self) -> usize {
        self.dispatch(Gesture::Click)
    }

    /// Update whether the region intersects the viewport.
    pub fn set_intersecting(&self, intersecting: bool) {
        self.inner.visibility.send_replace(intersecting);
    }

    /// Whether the region currently intersects the viewport.
    pub fn is_intersecting(&self) -> bool {
        *self.inner.visibility.borrow()
    }

    /// Number of live gesture listeners.
    pub fn gesture_listeners(&self) -> usize {
        self.inner.gestures.receiver_count()
    }

    /// Number of live intersection observers.
    pub fn visibility_observers(&self) -> usize {
        self.inner.visibility.receiver_count()
    }

    /// Whether any observation is still attached to this region.
    pub fn is_observed(&self) -> bool {
        self.gesture_listeners() > 0 || self.visibility_observers() > 0
    }

    pub(crate) fn listen(&self) -> broadcast::Receiver<Gesture> {
        self.inner.gestures.subscribe()
    }

    pub(crate) fn observe(&self) -> watch::Receiver<bool> {
        self.inner.visibility.subscribe()
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.inner.name)
            .field("intersecting", &self.is_intersecting())
            .field("gesture_listeners", &self.gesture_listeners())
            .field("visibility_observers", &self.visibility_observers())
            .finish()
    }
}
