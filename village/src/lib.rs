//! # Village
//!
//! The economy a builder works for: buildings to upgrade, credits to spend
//! and missions to finish. Wraps a [`sim_scheduler::Scheduler`] and does the
//! resource accounting the engine leaves to its callers.
//!
//! ## Philosophy
//!
//! - **Check, then enqueue**: Credits are verified before any task reaches
//!   the engine and charged only after it is accepted.
//! - **React, don't reach in**: Levels, rewards and damage change only in
//!   response to what the engine reports as completed or failed.
//! - **Penalties are settled once**: An ignored disruption costs credits a
//!   single time, never below zero.

pub mod building;
pub mod error;
pub mod mission;
pub mod village;

pub use building::{Building, BuildingKind};
pub use error::VillageError;
pub use mission::Mission;
pub use village::{Village, VillageConfig};
