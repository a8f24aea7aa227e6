//! # SpaceSweep
//!
//! Find what is eating your disk and reclaim it safely.
//!
//! SpaceSweep walks a directory tree once, matches entries against a catalog
//! of known artifacts (dependency folders, build caches, user caches, trash,
//! logs), groups the matches by what they are rather than where they live and
//! ranks the groups by size:
//!
//! - **One walk, one catalog**: every pattern is checked in a single traversal
//! - **Logical grouping**: forty `node_modules` folders are one line, not forty
//! - **Confirm per category**: nothing is deleted without a yes
//! - **Honest accounting**: space freed is measured before and after, never guessed
//! - **Dry run**: the exact same report, with nothing touched

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod logging;
pub mod progress;
pub mod scanner;
