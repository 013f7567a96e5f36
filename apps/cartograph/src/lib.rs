//! # cartograph
//!
//! Maintenance CLI for cartograph navigation maps: configuration loading
//! and the command implementations behind the `cartograph` binary.

pub mod cli;
pub mod config;
