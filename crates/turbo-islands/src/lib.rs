//! TurboCommerce storefront islands.
//!
//! Seven demo islands, each embedding a `HydrationTracker` and refusing
//! interaction until hydrated, plus the storefront page that wires them to
//! deferred controllers from a `StorefrontConfig`.
//!
//! | Island      | Default trigger | Hydrates            |
//! |-------------|-----------------|---------------------|
//! | `light`     | eager           | on mount            |
//! | `heavy`     | interaction     | on mount            |
//! | `dynamic`   | viewport        | on mount            |
//! | `cart`      | timer (3 s)     | on mount            |
//! | `media`     | viewport        | 5 s after mount     |
//! | `wizard`    | interaction     | 50 ms after mount   |
//! | `dashboard` | timer (2 s)     | 100 ms after mount  |

pub mod cart;
pub mod config;
pub mod dashboard;
pub mod dynamic;
pub mod error;
pub mod heavy;
pub mod island;
pub mod light;
pub mod media;
pub mod page;
pub mod view;
pub mod wizard;

pub use config::{IslandConfig, StorefrontConfig};
pub use error::{IslandError, Result};
pub use island::{ActionOutcome, Island, IslandKind, Panel};
pub use page::{ChunkState, ChunkStatus, Storefront};
