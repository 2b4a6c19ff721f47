//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`lookup`] - Reverse geocode one coordinate
//! - [`track`] - Location session on the simulated platform

pub mod common;
pub mod config;
pub mod lookup;
pub mod track;
