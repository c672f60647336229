//! # Riposte Common
//!
//! Common types shared by the Riposte combat crates.
//!
//! This crate provides:
//! - ID types (ActorId, TaskHandle, TelegraphId)
//! - 2D geometry for hitboxes and bodies
//! - The combat error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
}

pub use glam::Vec2;
pub use prelude::*;
