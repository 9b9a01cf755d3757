use crate::models::project::{BuildMode, Rule, get_project};
use crate::services::runner::process;

/// Resolves the test project for `target`.
#[must_use]
pub fn test_target(target: &str) -> String {
    format!("test-{}", BuildMode::from_target(target).as_str())
}

/// Builds the library, then runs its test suite in the mode selected by `target`.
///
/// # Errors
/// Returns an error if the library build or the test run fails.
pub fn run_tests(target: &str) -> anyhow::Result<()> {
    let project = get_project(&test_target(target));
    println!("🧪 Running tests ({})...", project.config.mode.as_str());

    for sub in &project.subprojects {
        process(sub, Rule::Build)?;
    }
    process(&project, Rule::Test)?;

    println!("✅ Tests passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keeps_mode() {
        assert_eq!(test_target("debug"), "test-debug");
        assert_eq!(test_target("release"), "test-release");
        assert_eq!(test_target("anything"), "test-release");
    }
}
