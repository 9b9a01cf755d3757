use crate::models::project::{Rule, get_project};
use crate::services::runner::process;

/// Builds the project resolved from `target` together with its subprojects.
///
/// # Errors
/// Returns an error if any Cargo build fails.
pub fn run_build(target: &str) -> anyhow::Result<()> {
    let project = get_project(target);
    println!("🏗️ Building '{}' ({})...", project.name, project.config.mode.as_str());

    process(&project, Rule::Build)?;

    println!("✅ Built {}", project.artifact.display());
    Ok(())
}

/// Removes the build output of the project resolved from `target`.
///
/// # Errors
/// Returns an error if `cargo clean` fails.
pub fn run_clean(target: &str) -> anyhow::Result<()> {
    let project = get_project(target);
    println!("🧹 Cleaning '{}' ({})...", project.name, project.config.mode.as_str());

    process(&project, Rule::Clean)
}
