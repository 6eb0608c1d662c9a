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

//! The output pipeline: level-gated destinations, the shared engine level,
//! and the process-wide logging context.

use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use crate::append::Append;
use crate::append::Stdout;
use crate::append::file::FileBuilder;
use crate::config::LoggerConfig;
use crate::error::Error;
use crate::layout::JsonLayout;
use crate::layout::TextLayout;
use crate::level::LogLevel;
use crate::logger::LoggerHandle;
use crate::non_blocking::WorkerGuard;
use crate::record::Envelope;
use crate::record::LogRecord;
use crate::record::field;
use crate::trap::StderrTrap;
use crate::trap::Trap;

/// A writable sink gated by its own minimum level.
///
/// A record at level `L` is handed to the sink iff `L >= M`, `M` being the
/// destination's minimum level. The minimum is mutable: a global level change
/// rewrites it on every destination.
#[derive(Debug)]
pub struct Destination {
    min_level: AtomicU8,
    append: Box<dyn Append>,
}

impl Destination {
    pub fn new(min_level: LogLevel, append: impl Into<Box<dyn Append>>) -> Self {
        Self {
            min_level: AtomicU8::new(min_level.number()),
            append: append.into(),
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level.number() >= self.min_level.load(Ordering::Relaxed)
    }

    fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.number(), Ordering::Relaxed);
    }
}

/// One process, one logging backbone: the destinations, the shared engine
/// level, the active configuration, and the registry of every logger created
/// against this context.
///
/// The process-wide context is installed with [`init`]; tests and embedders
/// can run isolated pipelines through [`LoggingContext::with_destinations`]
/// and [`Logger::with_context`](crate::Logger::with_context) instead.
#[derive(Debug)]
pub struct LoggingContext {
    name: String,
    config: LoggerConfig,
    level: AtomicU8,
    destinations: Vec<Destination>,
    registry: Mutex<Vec<Arc<LoggerHandle>>>,
    trap: Box<dyn Trap>,
    _file_guard: Option<WorkerGuard>,
}

impl LoggingContext {
    /// Build the standard destinations out of `config`: the console (JSON
    /// lines, or human-readable text when configured) and, when file logging
    /// is enabled, a rolling file under the configured directory.
    pub fn new(config: LoggerConfig, name: impl Into<String>) -> Result<Arc<Self>, Error> {
        let level = config.log_level();

        let console: Box<dyn Append> = if config.human_readable_console() {
            Box::new(Stdout::new(TextLayout::default()))
        } else {
            Box::new(Stdout::new(JsonLayout::default()))
        };
        let mut destinations = vec![Destination::new(level, console)];

        let mut file_guard = None;
        if config.log_to_file() {
            let mut builder = FileBuilder::new(config.log_directory());
            if let Some(threshold) = NonZeroUsize::new(mb_to_bytes(config.rotate_threshold_mb()) as usize)
            {
                builder = builder.rollover_size(threshold);
            }
            if let Some(files) = NonZeroUsize::new(config.rotate_files_kept()) {
                builder = builder.max_log_files(files);
            }
            if let Some(total) = NonZeroU64::new(mb_to_bytes(config.rotate_max_total_size_mb())) {
                builder = builder.max_total_size(total);
            }
            let (file, guard) = builder.build()?;
            destinations.push(Destination::new(level, file));
            file_guard = Some(guard);
        }

        Ok(Self::assemble(config, name, destinations, file_guard))
    }

    /// Assemble a context over caller-provided destinations.
    pub fn with_destinations(
        config: LoggerConfig,
        name: impl Into<String>,
        destinations: Vec<Destination>,
    ) -> Arc<Self> {
        Self::assemble(config, name, destinations, None)
    }

    fn assemble(
        config: LoggerConfig,
        name: impl Into<String>,
        destinations: Vec<Destination>,
        file_guard: Option<WorkerGuard>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            level: AtomicU8::new(config.log_level().number()),
            config,
            destinations,
            registry: Mutex::new(Vec::new()),
            trap: Box::new(StderrTrap::default()),
            _file_guard: file_guard,
        })
    }

    /// The name of the pipeline's root context.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// The shared engine level.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_number(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Error)
    }

    /// Change the shared level: the engine's own, every destination's minimum,
    /// and every registered logger's effective level.
    ///
    /// A logger level set independently is overwritten here; the pipeline
    /// always re-syncs loggers to the shared level on a change.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.number(), Ordering::Relaxed);
        for destination in &self.destinations {
            destination.set_min_level(level);
        }
        let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        for handle in registry.iter() {
            handle.update(self);
        }
    }

    pub(crate) fn register(&self, handle: Arc<LoggerHandle>) {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.push(handle);
    }

    /// Hand a record to every destination whose minimum level it clears.
    /// Destination failures go to the trap; they never reach the caller.
    pub(crate) fn emit(&self, name: &str, level: LogLevel, record: &LogRecord) {
        let envelope = Envelope {
            name,
            level,
            fields: record,
        };
        for destination in &self.destinations {
            if destination.enabled(level) {
                if let Err(err) = destination.append.append(&envelope) {
                    self.trap.trap(&err);
                }
            }
        }
    }

    /// Report a problem through the engine's own error channel: a minimal
    /// record emitted at ERROR under the context's root name. Best-effort; a
    /// failure here must never cascade.
    pub(crate) fn emit_diagnostic(&self, text: &str) {
        let mut record = LogRecord::new();
        record.insert(field::MSG, text);
        self.emit(&self.name, LogLevel::Error, &record);
    }

    /// Flush every destination.
    pub fn flush(&self) {
        for destination in &self.destinations {
            if let Err(err) = destination.append.flush() {
                self.trap.trap(&err);
            }
        }
    }
}

fn mb_to_bytes(megabytes: u64) -> u64 {
    megabytes.saturating_mul(1024 * 1024)
}

static CONTEXT: RwLock<Option<Arc<LoggingContext>>> = RwLock::new(None);

/// Install the process-wide logging context. Must be called before any logger
/// is created or driven.
///
/// A second call without `force` is a no-op: the later configuration is
/// ignored. With `force`, the context is fully replaced; loggers created
/// against the previous context keep dispatching to the previous engine until
/// they are re-created.
pub fn init(config: LoggerConfig, name: &str, force: bool) -> Result<(), Error> {
    let mut slot = CONTEXT.write().unwrap_or_else(|e| e.into_inner());
    if slot.is_some() && !force {
        return Ok(());
    }
    *slot = Some(LoggingContext::new(config, name)?);
    Ok(())
}

/// Whether [`init`] has installed a context.
pub fn is_inited() -> bool {
    current().is_some()
}

/// Change the global log level of the application. Useful to change the
/// verbosity of something that is already started.
///
/// # Errors
///
/// Fails when the pipeline has not been initialized.
pub fn set_global_level(level: LogLevel) -> Result<(), Error> {
    let context = current().ok_or_else(uninitialized_error)?;
    context.set_level(level);
    Ok(())
}

pub(crate) fn current() -> Option<Arc<LoggingContext>> {
    CONTEXT
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

pub(crate) fn uninitialized_error() -> Error {
    Error::new("the logging pipeline is not initialized; call mtlog::init() first")
}
