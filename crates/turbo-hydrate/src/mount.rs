//! Mount points: placeholder slots in the UI tree.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tokio::sync::watch;

use crate::error::{ConfigError, MountError};

/// A unit that can be attached to a mount point.
pub trait Mountable: 'static {
    /// Post-mount lifecycle point. Runs once, right after attachment.
    fn mounted(self: Rc<Self>) {}

    /// Teardown hook. Runs when the owning mount point is destroyed.
    fn unmounted(&self) {}
}

/// Ownership of a mount point by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    Free,
    Claimed,
    Spent,
}

struct MountInner<U> {
    name: String,
    slot: RefCell<Option<Rc<U>>>,
    claim: Cell<Claim>,
    destroyed: watch::Sender<bool>,
}

/// The placeholder location where a unit is attached once materialized.
///
/// Cloning shares the same slot.
pub struct MountPoint<U> {
    inner: Rc<MountInner<U>>,
}

impl<U> Clone for MountPoint<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<U> MountPoint<U> {
    /// Create an empty mount point.
    pub fn new(name: impl Into<String>) -> Self {
        let (destroyed, _) = watch::channel(false);
        Self {
            inner: Rc::new(MountInner {
                name: name.into(),
                slot: RefCell::new(None),
                claim: Cell::new(Claim::Free),
                destroyed,
            }),
        }
    }

    /// Mount point name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether no unit is attached.
    pub fn is_empty(&self) -> bool {
        self.inner.slot.borrow().is_none()
    }

    /// The attached unit, if any.
    pub fn unit(&self) -> Option<Rc<U>> {
        self.inner.slot.borrow().clone()
    }

    /// Whether the mount point has been torn down.
    pub fn is_destroyed(&self) -> bool {
        *self.inner.destroyed.borrow()
    }

    /// Whether a controller currently owns this mount point.
    pub fn is_claimed(&self) -> bool {
        self.inner.claim.get() != Claim::Free
    }

    /// Fails if the mount point is destroyed or already holds a unit.
    pub(crate) fn check_free(&self) -> Result<(), ConfigError> {
        if self.is_destroyed() {
            return Err(ConfigError::MountDestroyed(self.name().to_string()));
        }
        if !self.is_empty() {
            return Err(ConfigError::MountOccupied(self.name().to_string()));
        }
        Ok(())
    }

    pub(crate) fn claim(&self) -> Result<(), ConfigError> {
        self.check_free()?;
        if self.inner.claim.get() != Claim::Free {
            return Err(ConfigError::MountClaimed(self.name().to_string()));
        }
        self.inner.claim.set(Claim::Claimed);
        Ok(())
    }

    pub(crate) fn spend(&self) {
        self.inner.claim.set(Claim::Spent);
    }

    pub(crate) fn release(&self) {
        if self.inner.claim.get() == Claim::Claimed {
            self.inner.claim.set(Claim::Free);
        }
    }

    pub(crate) fn teardown_signal(&self) -> watch::Receiver<bool> {
        self.inner.destroyed.subscribe()
    }
}

impl<U: Mountable> MountPoint<U> {
    /// Attach a unit and run its post-mount lifecycle.
    pub fn attach(&self, unit: U) -> Result<Rc<U>, MountError> {
        if self.is_destroyed() {
            return Err(MountError::Destroyed(self.name().to_string()));
        }
        let unit = {
            let mut slot = self.inner.slot.borrow_mut();
            if slot.is_some() {
                return Err(MountError::Occupied(self.name().to_string()));
            }
            let unit = Rc::new(unit);
            *slot = Some(Rc::clone(&unit));
            unit
        };
        Rc::clone(&unit).mounted();
        Ok(unit)
    }

    /// Tear down the mount point.
    ///
    /// Detaches any unit and signals pending controllers to release their
    /// observation. Idempotent.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.inner.destroyed.send_replace(true);
        let unit = self.inner.slot.borrow_mut().take();
        if let Some(unit) = unit {
            unit.unmounted();
        }
    }
}

impl<U> fmt::Debug for MountPoint<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("name", &self.inner.name)
            .field("occupied", &!self.is_empty())
            .field("claim", &self.inner.claim.get())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
