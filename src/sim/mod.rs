//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed per-tick steps only (no wall-clock time)
//! - Seeded RNG only
//! - Stable iteration order (by pipe slot index)
//! - No platform dependencies beyond the `Canvas` trait used for painting

pub mod bird;
pub mod collision;
pub mod pipes;

pub use bird::Bird;
pub use collision::Rect;
pub use pipes::{Pipe, Pipes};
