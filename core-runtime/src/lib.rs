//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playback core:
//! - Logging and tracing setup
//! - Configuration and capability validation
//! - Event bus
//!
//! ## Overview
//!
//! Other crates depend on this one for their logging conventions, their view
//! of the host bridges and the broadcast channel UI bindings subscribe to.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
