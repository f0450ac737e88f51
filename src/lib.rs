//! Mech loadout engine: library entry point.
//!
//! Exposes attribute, catalog, loadout, command, stats, diagnostics, report,
//! store and config for use by the CLI and tests.

pub mod attribute;
pub mod catalog;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod loadout;
pub mod report;
pub mod stats;
pub mod store;
pub mod util;
