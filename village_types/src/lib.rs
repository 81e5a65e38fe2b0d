//! # Village Types
//!
//! Fundamental types shared by the scheduler, the reporter and the village.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Sequential identifier for schedulable tasks
//! - [`BuildingId`]: Opaque target reference for upgrade and repair work
//! - [`SessionId`]: Identifier for one simulation session
//! - [`TaskKind`]: Upgrade, Repair or Defense
//! - [`Priority`]: Numeric priority, lower value first

pub mod ids;
pub mod kind;

pub use ids::{BuildingId, SessionId, TaskId};
pub use kind::{Priority, TaskKind};
