use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the root directory of the workspace.
///
/// # Errors
/// Returns an error if the manifest directory does not have a parent.
pub fn get_project_root() -> Result<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .context("Could not find project root from xtask manifest")
}

#[derive(Debug, Deserialize)]
pub struct CrateInfo {
    #[serde(skip)]
    pub path: PathBuf,
    pub package: PackageInfo,
}

#[derive(Debug, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub description: Option<String>,
}

/// Discovers crates in a workspace subdirectory (`apps`, `crates`, `infra`).
///
/// # Errors
/// Returns an error if the directory cannot be read or a `Cargo.toml` cannot
/// be read or parsed.
pub fn get_workspace_crates(sub_dir: &str) -> Result<Vec<CrateInfo>> {
    let target_dir = get_project_root()?.join(sub_dir);
    let mut crates = Vec::new();

    if !target_dir.exists() {
        return Ok(crates);
    }

    for entry in fs::read_dir(&target_dir)? {
        let path = entry?.path();
        let cargo_path = path.join("Cargo.toml");

        if path.is_dir() && cargo_path.exists() {
            let content = fs::read_to_string(&cargo_path)
                .with_context(|| format!("Failed to read {}", cargo_path.display()))?;
            let mut info: CrateInfo = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", cargo_path.display()))?;
            info.path = path;
            crates.push(info);
        }
    }

    crates.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    Ok(crates)
}

/// Prints a table of crates with their folder, name, and description.
pub fn render_crate_table(title: &str, crates: &[CrateInfo]) {
    println!("\n{title}:\n");
    println!("{:<18} {:<20} {:<45}", "Folder", "Crate Name", "Description");
    println!("{:-<83}", "");

    for info in crates {
        let folder = info.path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        let desc = info.package.description.as_deref().unwrap_or("No description provided");

        println!("{:<18} {:<20} {:<45}", folder, info.package.name, desc);
    }
    println!();
}
