//! File-backed persistence and settings loading for the score engine.

pub mod load;
pub mod store;

pub use load::*;
pub use store::*;
