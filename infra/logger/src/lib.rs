//! # Logger
//!
//! Process-wide `tracing` setup for the device: a console layer, an optional
//! rolling file layer written through a non-blocking worker, and a level or
//! directive based filter that `RUST_LOG` can override.
//!
//! The builder can be driven directly or from a deserialized [`LogSettings`]
//! section with [`Logger::from_settings`].
//!
//! ## Example
//!
//! ```rust
//! # use mbrs_logger::{LevelFilter, LogFormat, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("mbrs-device")
//!     .format(LogFormat::Compact)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;
mod settings;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::settings::{LogFormat, LogRotation, LogSettings};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use crate::settings::DEFAULT_MAX_FILES;
use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    format: LogFormat,
    level: LevelFilter,
    directives: Option<String>,
    directory: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            format: LogFormat::Compact,
            level: LevelFilter::INFO,
            directives: None,
            directory: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Configures and installs the global tracing subscriber.
///
/// A name is required before [`LoggerBuilder::init`] becomes available; file
/// rotation settings only exist once a directory was given with
/// [`LoggerBuilder::directory`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Sets the logger name, also the prefix of rolled files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { config: self.config, name: WithName(name.into()), file: PhantomData }
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds filter directives such as `modbus_rtu_slave=trace`.
    ///
    /// `RUST_LOG` still takes precedence when it is set and the builder has no
    /// directives. Malformed directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.config.directives = Some(directives.into());
        self
    }

    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Enables rolling file output into `directory`.
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.directory = Some(directory.into());
        LoggerBuilder { config, name: self.name, file: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive until shutdown; dropping it flushes
    /// and stops the file writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero
    ///   `max_files`, bad directives or when no output is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory
    ///   cannot be prepared.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let LoggerBuilder { config, name: WithName(name), .. } = self;
        validate(&config, &name)?;

        let filter = env_filter(&config)?;
        let mut layers = Vec::new();

        if config.console {
            layers.push(match config.format {
                LogFormat::Compact => layer().compact().with_ansi(true).boxed(),
                LogFormat::Pretty => layer().pretty().boxed(),
                LogFormat::Json => layer().json().boxed(),
            });
        }

        let guard = match config.directory {
            Some(directory) => {
                fs::create_dir_all(&directory)
                    .context(format!("Failed to create {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(config.rotation)
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(config.max_files)
                    .build(&directory)?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = layer().with_writer(writer).with_ansi(false);

                layers.push(match config.format {
                    LogFormat::Json => file_layer.json().boxed(),
                    LogFormat::Compact | LogFormat::Pretty => file_layer.compact().boxed(),
                });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::invalid("No output enabled, enable console or a directory"));
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        tracing::debug!(logger = %name, "Logging initialized");
        Ok(Logger { guard })
    }
}

impl LoggerBuilder<WithName, WithFile> {
    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub fn rotation(mut self, rotation: impl Into<Rotation>) -> Self {
        self.config.rotation = rotation.into();
        self
    }
}

/// Handle to the installed logging system.
///
/// Holds the file writer guard, if any. Drop it only when shutting down.
#[must_use = "Dropping this handle stops the background log writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`].
    #[must_use = "The builder must be configured before it can initialize the logger"]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName, file: PhantomData }
    }

    /// Installs the global subscriber described by `settings`.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`]; an unknown level name is reported as
    /// [`LoggerError::InvalidConfiguration`].
    pub fn from_settings(name: &str, settings: &LogSettings) -> Result<Self, LoggerError> {
        let mut builder = Self::builder()
            .name(name)
            .level(settings.level_filter()?)
            .console(settings.console)
            .format(settings.format);

        if let Some(directives) = &settings.filter {
            builder = builder.directives(directives.clone());
        }

        match &settings.directory {
            Some(directory) => builder
                .directory(directory)
                .rotation(settings.rotation)
                .max_files(settings.max_files)
                .init(),
            None => builder.init(),
        }
    }

    /// True when a rolling file writer is attached.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing file output");
        }
    }
}

fn validate(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::invalid("Logger name cannot be empty"));
    }
    if config.directory.is_some() && config.max_files == 0 {
        return Err(LoggerError::invalid("max_files must be greater than zero"));
    }
    Ok(())
}

fn env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match &config.directives {
        Some(directives) => builder.parse(directives).map_err(|e| {
            LoggerError::invalid(format!("Invalid filter directives '{directives}': {e}"))
        }),
        None => Ok(builder.from_env_lossy()),
    }
}
