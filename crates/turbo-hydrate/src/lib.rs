//! Deferred island activation for TurboCommerce.
//!
//! This crate provides the two pieces every lazily hydrated island needs:
//! - `DeferredController` - materializes a unit once its trigger fires
//!   (interaction, viewport or timer), exactly once
//! - `HydrationTracker` - per-unit `pending -> active` state that gates
//!   interactive operations
//!
//! Supporting types:
//! - `TriggerSpec` / `Trigger` - serialized and validated trigger config
//! - `Region` - host-fed gesture and visibility sources
//! - `MountPoint` - placeholder slot a unit is attached to
//! - `Environment` - injected execution context plus observer hook
//! - `ActivationEvent` / `ActivationObserver` - structured transition events
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_hydrate::*;
//!
//! let env = Environment::interactive();
//! let region = Region::new("reviews");
//! let mount = MountPoint::new("reviews");
//! let unit_env = env.clone();
//!
//! let mut controller = DeferredController::configure(
//!     &env,
//!     TriggerSpec::viewport(),
//!     move || async move { Ok(Reviews::new(&unit_env)) },
//!     &mount,
//!     &region,
//! )?;
//!
//! region.set_intersecting(true);
//! controller.settled().await;
//! ```

mod context;
mod controller;
mod error;
mod events;
mod mount;
mod region;
mod tracker;
mod trigger;

pub use context::*;
pub use controller::*;
pub use error::*;
pub use events::*;
pub use mount::*;
pub use region::*;
pub use tracker::*;
pub use trigger::*;
