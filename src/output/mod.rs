//! Output module for backlog and run reporting
//!
//! This module handles:
//! - Loading per-status counts and the latest run from storage
//! - Rendering them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, BacklogStatistics};
