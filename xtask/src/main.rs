#![warn(rust_2018_idioms, unused_lifetimes)]
#![allow(clippy::print_stderr, clippy::print_stdout)]

pub mod handlers;
pub mod models;
pub mod services;

use crate::handlers::{bench, build, libs, show, testing};
use crate::models::args::{AppCommands, Cli, LibraryAction};

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        AppCommands::Build { target } => build::run_build(&target)?,
        AppCommands::Test { target } => testing::run_tests(&target)?,
        AppCommands::Bench {} => bench::run_bench()?,
        AppCommands::Clean { target } => build::run_clean(&target)?,
        AppCommands::Show { target } => show::show_project(&target),
        AppCommands::Libs { action } => match action {
            LibraryAction::List {} => libs::list_libs()?,
        },
    }

    Ok(())
}
