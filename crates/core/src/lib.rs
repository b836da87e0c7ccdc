//! Score-ledger engine for elimination card games. Keep this crate free of IO
//! and platform concerns; storage comes in through [`SnapshotStore`].

pub mod aggregate;
pub mod config;
pub mod events;
pub mod persist;
pub mod player;
pub mod rng;
pub mod rotation;
pub mod round;
pub mod state;
pub mod store;

pub use aggregate::*;
pub use config::*;
pub use events::*;
pub use persist::*;
pub use player::*;
pub use rng::*;
pub use rotation::*;
pub use round::*;
pub use state::*;
pub use store::*;
