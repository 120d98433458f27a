//! CLI commands for the survivability engine.

pub mod simulate;
pub mod watch;

pub use simulate::{run_simulate, SimulateArgs};
pub use watch::{run_watch, WatchArgs};
