//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod version;

pub use commands::{ClusterArgs, FluxArgs, print_settings, run_all, run_capi, run_flux};
pub use logging::init_logging;
pub use version::display_version;
