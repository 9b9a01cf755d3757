//! # CLI Argument Definitions
//!
//! Subcommands of `cargo xtask`, parsed with `clap`.

use clap::{Parser, Subcommand};

const DEFAULT_TARGET: &str = "release";

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "cargo xtask")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Build orchestration for the Modbus RTU slave workspace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: AppCommands,
}

#[derive(Debug, Subcommand)]
pub enum AppCommands {
    /// Build a project and its subprojects ('debug' in the target selects debug settings)
    Build {
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
    },
    /// Build the library and run its test suite
    Test {
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
    },
    /// Run the protocol engine benches
    Bench {},
    /// Remove build output of a project
    Clean {
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
    },
    /// Print the project resolved from a target name
    Show {
        #[arg(default_value = DEFAULT_TARGET)]
        target: String,
    },
    /// Inspect workspace crates
    Libs {
        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum LibraryAction {
    /// List workspace crates with their descriptions
    List {},
}
