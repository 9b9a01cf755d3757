use crate::models::project::{Project, Rule};
use crate::services::utils::get_project_root;
use anyhow::{Context, Result, bail};
use std::process::Command;

/// Runs `rule` for every subproject that defines it, then for `project`.
///
/// # Errors
/// Returns an error if Cargo cannot be started or exits unsuccessfully.
pub fn process(project: &Project, rule: Rule) -> Result<()> {
    for sub in &project.subprojects {
        if sub.has_rule(rule) {
            process(sub, rule)?;
        }
    }

    if !project.has_rule(rule) {
        bail!("Project '{}' has no '{rule}' rule", project.name);
    }

    run_rule(project, rule)
}

fn run_rule(project: &Project, rule: Rule) -> Result<()> {
    let args = rule.args(project);
    println!("🔧 [{}] {} {}", project.name, project.config.driver, args.join(" "));

    let mut command = Command::new(&project.config.driver);
    command.args(&args).current_dir(get_project_root()?);
    if let Some(flags) = project.config.rustflags() {
        command.env("RUSTFLAGS", flags);
    }

    let status = command
        .status()
        .with_context(|| format!("Failed to execute {}", project.config.driver))?;

    if !status.success() {
        bail!(
            "cargo {rule} failed for project {} (exit code {})",
            project.name,
            status.code().unwrap_or(-1)
        );
    }

    Ok(())
}
