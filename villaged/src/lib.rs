//! # Village Host
//!
//! Drives a village session from a script and prints what the builder did.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The engine and the village never print
//! - **Output is snapshot rendering**: One line per tick, one report at the end
//! - **Input is an explicit script**: No timers, no randomness
//! - **Rejections are not failures**: Refused requests are logged and the
//!   session continues

pub mod logger;
pub mod runtime;
pub mod script;

pub use runtime::{render_tick, HostConfig, HostError, HostRuntime, DEFAULT_SCRIPT};
pub use script::{ScriptCommand, ScriptError, SessionScript};
