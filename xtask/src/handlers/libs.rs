use crate::services::utils::{get_workspace_crates, render_crate_table};
use anyhow::Result;

const SECTIONS: [(&str, &str); 3] =
    [("crates", "Protocol"), ("infra", "Infrastructure"), ("apps", "Applications")];

/// Lists the workspace crates grouped by directory.
///
/// # Errors
/// Returns an error if a directory cannot be read or crate metadata cannot be parsed.
pub fn list_libs() -> Result<()> {
    let mut found = false;

    for (dir, title) in SECTIONS {
        let crates = get_workspace_crates(dir)?;
        if crates.is_empty() {
            continue;
        }
        found = true;
        render_crate_table(title, &crates);
    }

    if !found {
        println!("ℹ️ No crates found in the workspace.");
    }

    Ok(())
}
