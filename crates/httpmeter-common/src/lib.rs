//! # httpmeter-common
//!
//! Shared foundation for the httpmeter workspace: domain primitive types
//! (process identifiers, counter and rate snapshots), the unified error
//! type, runtime configuration, and wire-level constants.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
