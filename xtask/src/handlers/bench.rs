use crate::models::project::LIBRARY_PACKAGE;
use crate::services::utils::get_project_root;
use anyhow::{Context, bail};

/// Runs the protocol engine benches with `cargo bench`.
///
/// # Errors
/// Returns an error if the bench build or run fails.
pub fn run_bench() -> anyhow::Result<()> {
    println!("🏁 Running benches...");

    let status = std::process::Command::new("cargo")
        .args(["bench", "-p", LIBRARY_PACKAGE])
        .current_dir(get_project_root()?)
        .status()
        .context("Failed to execute cargo bench")?;

    if !status.success() {
        bail!("Bench exited with non-zero status: {}", status.code().unwrap_or(-1));
    }

    Ok(())
}
