// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logger configuration: correlation id supply, destinations selection, and
//! rotation bounds.

use std::env;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::level::LogLevel;

/// Supplies the correlation id attached to every record.
///
/// Invoked on each log call; the result is never cached.
pub type CorrelationIdProvider = dyn Fn() -> String + Send + Sync;

/// The application mode, read from the `APP_ENV` environment variable.
///
/// Development mode defaults the level to DEBUG and attaches stack traces to
/// error responses; any other mode defaults to WARNING without them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppMode {
    Development,
    Production,
}

impl AppMode {
    /// Read the mode from `APP_ENV`. `dev` and `development` select
    /// development mode; everything else, including an unset variable, is
    /// production.
    pub fn from_env() -> AppMode {
        match env::var("APP_ENV") {
            Ok(value) if value.eq_ignore_ascii_case("dev") => AppMode::Development,
            Ok(value) if value.eq_ignore_ascii_case("development") => AppMode::Development,
            _ => AppMode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == AppMode::Development
    }
}

/// The name and version of the embedding application, stamped on every record.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AppInfo {
    name: String,
    version: String,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for AppInfo {
    /// Derive the name from the current executable; the version is unknown
    /// until set. Prefer [`app_info!`](crate::app_info) in applications.
    fn default() -> Self {
        let name = env::current_exe()
            .ok()
            .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            name,
            version: "0.0.0".to_string(),
        }
    }
}

/// Expands to an [`AppInfo`] carrying the embedding crate's package name and
/// version.
///
/// ```
/// let mut config = mtlog::LoggerConfig::new(|| "cid".to_string());
/// config.set_app_info(mtlog::app_info!());
/// ```
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
}

/// Configuration consumed by the output pipeline and the loggers.
///
/// The correlation id provider is required; the constructor signature enforces
/// it. Everything else has defaults derived from the application mode.
#[derive(Clone)]
pub struct LoggerConfig {
    correlation_id_provider: Arc<CorrelationIdProvider>,
    log_to_file: bool,
    log_dir: PathBuf,
    rotate_files_kept: usize,
    rotate_threshold_mb: u64,
    rotate_max_total_size_mb: u64,
    log_level: LogLevel,
    human_readable_console: bool,
    add_stack_trace_in_dev: bool,
    log_source: bool,
    app: AppInfo,
}

impl LoggerConfig {
    pub fn new(correlation_id_provider: impl Fn() -> String + Send + Sync + 'static) -> Self {
        let mode = AppMode::from_env();
        Self {
            correlation_id_provider: Arc::new(correlation_id_provider),
            log_to_file: false,
            log_dir: PathBuf::from("./log"),
            rotate_files_kept: 30,
            rotate_threshold_mb: 100,
            rotate_max_total_size_mb: 1000,
            log_level: if mode.is_development() {
                LogLevel::Debug
            } else {
                LogLevel::Warning
            },
            human_readable_console: false,
            add_stack_trace_in_dev: mode.is_development(),
            log_source: true,
            app: AppInfo::default(),
        }
    }

    /// The current correlation id. Always re-read from the provider.
    pub fn correlation_id(&self) -> String {
        (self.correlation_id_provider)()
    }

    /// Logging to a file in addition to the console?
    pub fn log_to_file(&self) -> bool {
        self.log_to_file
    }

    /// The directory where the log files are written.
    pub fn log_directory(&self) -> &Path {
        &self.log_dir
    }

    /// The number of log files retained by rotation.
    pub fn rotate_files_kept(&self) -> usize {
        self.rotate_files_kept
    }

    /// The size, in megabytes, past which the active log file is rotated.
    pub fn rotate_threshold_mb(&self) -> u64 {
        self.rotate_threshold_mb
    }

    /// The maximum total size, in megabytes, of the rotated log files.
    pub fn rotate_max_total_size_mb(&self) -> u64 {
        self.rotate_max_total_size_mb
    }

    /// The initial shared logging level.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Human-readable console output instead of JSON lines?
    pub fn human_readable_console(&self) -> bool {
        self.human_readable_console
    }

    /// Attach stack traces to error responses in development?
    ///
    /// Consumed by embedding applications; the pipeline only carries it.
    pub fn add_stack_trace_in_dev(&self) -> bool {
        self.add_stack_trace_in_dev
    }

    /// Annotate records with the caller's source file and line?
    pub fn log_source(&self) -> bool {
        self.log_source
    }

    /// The embedding application's identity.
    pub fn app(&self) -> &AppInfo {
        &self.app
    }

    /// Enable logging to a file in addition to the console. Slower; most
    /// deployments ship console output to a collector and need no files.
    pub fn set_log_to_file(&mut self, log_to_file: bool) {
        self.log_to_file = log_to_file;
    }

    pub fn set_log_directory(&mut self, log_dir: impl Into<PathBuf>) {
        self.log_dir = log_dir.into();
    }

    pub fn set_rotate_files_kept(&mut self, files: usize) {
        self.rotate_files_kept = files;
    }

    pub fn set_rotate_threshold_mb(&mut self, megabytes: u64) {
        self.rotate_threshold_mb = megabytes;
    }

    pub fn set_rotate_max_total_size_mb(&mut self, megabytes: u64) {
        self.rotate_max_total_size_mb = megabytes;
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    pub fn set_human_readable_console(&mut self, human_readable: bool) {
        self.human_readable_console = human_readable;
    }

    pub fn set_add_stack_trace_in_dev(&mut self, add: bool) {
        self.add_stack_trace_in_dev = add;
    }

    pub fn set_log_source(&mut self, log_source: bool) {
        self.log_source = log_source;
    }

    pub fn set_app_info(&mut self, app: AppInfo) {
        self.app = app;
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("log_to_file", &self.log_to_file)
            .field("log_dir", &self.log_dir)
            .field("rotate_files_kept", &self.rotate_files_kept)
            .field("rotate_threshold_mb", &self.rotate_threshold_mb)
            .field("rotate_max_total_size_mb", &self.rotate_max_total_size_mb)
            .field("log_level", &self.log_level)
            .field("human_readable_console", &self.human_readable_console)
            .field("add_stack_trace_in_dev", &self.add_stack_trace_in_dev)
            .field("log_source", &self.log_source)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::new(|| "cid".to_string());
        assert!(!config.log_to_file());
        assert_eq!(config.log_directory(), Path::new("./log"));
        assert_eq!(config.rotate_files_kept(), 30);
        assert_eq!(config.rotate_threshold_mb(), 100);
        assert_eq!(config.rotate_max_total_size_mb(), 1000);
        assert!(!config.human_readable_console());
        assert!(config.log_source());
    }

    #[test]
    fn test_correlation_id_is_read_per_call() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::atomic::Ordering;

        let counter = Arc::new(AtomicUsize::new(0));
        let shared = counter.clone();
        let config = LoggerConfig::new(move || {
            let n = shared.fetch_add(1, Ordering::SeqCst);
            format!("cid-{n}")
        });

        assert_eq!(config.correlation_id(), "cid-0");
        assert_eq!(config.correlation_id(), "cid-1");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_app_info_setter() {
        let mut config = LoggerConfig::new(|| "cid".to_string());
        config.set_app_info(AppInfo::new("my-app", "1.2.3"));
        assert_eq!(config.app().name(), "my-app");
        assert_eq!(config.app().version(), "1.2.3");
    }
}
