//! # Build Projects
//!
//! A project is a Cargo package built in one mode, plus the projects it
//! depends on and the rules that can be run against it. Projects are
//! resolved from a free-form target name by [`get_project`].

use std::fmt;
use std::path::{Path, PathBuf};

/// Library package built by the `main` project.
pub const LIBRARY_PACKAGE: &str = "modbus-rtu-slave";
/// Rust artifact produced for [`LIBRARY_PACKAGE`].
pub const LIBRARY_ARTIFACT: &str = "libmodbus_rtu_slave.rlib";
/// Workspace directories searched for crates.
pub const INCLUDE_ROOTS: [&str; 2] = ["crates", "infra"];

const DRIVER: &str = "cargo";
const MAIN_PROJECT: &str = "main";
const TEST_PROJECT: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// `debug` anywhere in the target name selects debug settings.
    #[must_use]
    pub fn from_target(name: &str) -> Self {
        if name.contains("debug") { Self::Debug } else { Self::Release }
    }

    /// Cargo profile passed with `--profile`.
    #[must_use]
    pub const fn profile(self) -> &'static str {
        match self {
            Self::Debug => "dev",
            Self::Release => "release",
        }
    }

    /// Directory under `target/` holding the profile's artifacts.
    #[must_use]
    pub const fn profile_dir(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.profile_dir()
    }
}

/// Compiler settings shared by every rule of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub driver: String,
    pub mode: BuildMode,
    pub opt_level: u8,
    pub debug_info: bool,
    pub include_roots: Vec<String>,
    pub packages: Vec<String>,
    pub features: Vec<String>,
    pub rustflags: Vec<String>,
}

impl BuildConfig {
    #[must_use]
    pub fn new(mode: BuildMode, packages: &[&str]) -> Self {
        let (opt_level, debug_info) = match mode {
            BuildMode::Debug => (0, true),
            BuildMode::Release => (3, false),
        };

        Self {
            driver: DRIVER.to_owned(),
            mode,
            opt_level,
            debug_info,
            include_roots: INCLUDE_ROOTS.iter().map(|&root| root.to_owned()).collect(),
            packages: packages.iter().map(|&package| package.to_owned()).collect(),
            features: Vec::new(),
            rustflags: Vec::new(),
        }
    }

    /// Arguments selecting profile, packages and features for a Cargo subcommand.
    ///
    /// Optimisation and debug info are pinned with `--config` so the
    /// project settings win over local profile overrides.
    #[must_use]
    pub fn cargo_args(&self, subcommand: &str) -> Vec<String> {
        let profile = self.mode.profile();
        let mut args = vec![
            subcommand.to_owned(),
            "--profile".to_owned(),
            profile.to_owned(),
            "--config".to_owned(),
            format!("profile.{profile}.opt-level={}", self.opt_level),
            "--config".to_owned(),
            format!("profile.{profile}.debug={}", self.debug_info),
        ];
        for package in &self.packages {
            args.push("-p".to_owned());
            args.push(package.clone());
        }
        if !self.features.is_empty() {
            args.push("--features".to_owned());
            args.push(self.features.join(","));
        }
        args
    }

    /// Extra `RUSTFLAGS`, `None` when nothing was added.
    #[must_use]
    pub fn rustflags(&self) -> Option<String> {
        (!self.rustflags.is_empty()).then(|| self.rustflags.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Build,
    Test,
    Clean,
}

impl Rule {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Clean => "clean",
        }
    }

    /// Cargo arguments running this rule for `project`.
    #[must_use]
    pub fn args(self, project: &Project) -> Vec<String> {
        match self {
            Self::Build if project.is_test() => {
                let mut args = project.config.cargo_args("test");
                args.push("--no-run".to_owned());
                args
            },
            Self::Build => project.config.cargo_args("build"),
            Self::Test => {
                let mut args = project.config.cargo_args("test");
                args.extend(["--tests".to_owned(), "--".to_owned(), "-q".to_owned()]);
                args
            },
            Self::Clean => {
                let mut args = vec!["clean".to_owned(), "--profile".to_owned()];
                args.push(project.config.mode.profile().to_owned());
                args
            },
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A buildable unit: the library (`main`) or its test suite (`test`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub package: String,
    pub artifact: PathBuf,
    pub config: BuildConfig,
    pub subprojects: Vec<Self>,
    pub rules: Vec<Rule>,
}

impl Project {
    #[must_use]
    pub fn new(name: &str, artifact: &str, config: BuildConfig) -> Self {
        let artifact = Path::new("target").join(config.mode.profile_dir()).join(artifact);
        Self {
            name: name.to_owned(),
            package: config.packages.first().cloned().unwrap_or_default(),
            artifact,
            config,
            subprojects: Vec::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_test(&self) -> bool {
        self.name == TEST_PROJECT
    }

    #[must_use]
    pub fn has_rule(&self, rule: Rule) -> bool {
        self.rules.contains(&rule)
    }

    /// Prints the project tree.
    pub fn render(&self, depth: usize) {
        let indent = "  ".repeat(depth);
        let rules = self.rules.iter().map(|rule| rule.name()).collect::<Vec<_>>().join(", ");

        println!("{indent}📦 {} ({}, {})", self.name, self.package, self.config.mode.as_str());
        println!("{indent}   artifact: {}", self.artifact.display());
        println!(
            "{indent}   opt-level: {}, debug info: {}",
            self.config.opt_level, self.config.debug_info
        );
        println!("{indent}   include: {}", self.config.include_roots.join(", "));
        println!("{indent}   rules: {rules}");

        for sub in &self.subprojects {
            sub.render(depth + 1);
        }
    }
}

/// Resolves a project from a target name.
///
/// * `test` in the name resolves the test project, which carries the main
///   project built in the same mode as its only subproject.
/// * `debug` in the name selects debug settings, anything else release.
#[must_use]
pub fn get_project(name: &str) -> Project {
    if name.contains("test") {
        return get_test_project(name);
    }

    let config = BuildConfig::new(BuildMode::from_target(name), &[LIBRARY_PACKAGE]);
    let mut project = Project::new(MAIN_PROJECT, LIBRARY_ARTIFACT, config);
    add_default_rules(&mut project);
    project
}

fn get_test_project(name: &str) -> Project {
    let mode = BuildMode::from_target(name);

    let mut config = BuildConfig::new(mode, &[LIBRARY_PACKAGE]);
    config.features.push("full".to_owned());

    let mut project = Project::new(TEST_PROJECT, "deps", config);
    project.subprojects.push(get_project(mode.as_str()));
    add_default_rules(&mut project);
    project
}

/// Attaches `build` and `clean` to every project, and `test` to test projects.
pub fn add_default_rules(project: &mut Project) {
    project.rules.push(Rule::Build);
    if project.is_test() {
        project.rules.push(Rule::Test);
    }
    project.rules.push(Rule::Clean);
}
