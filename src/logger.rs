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

//! The public logging objects.

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use crate::enhance::enhance;
use crate::error::Error;
use crate::level::LogLevel;
use crate::pipeline;
use crate::pipeline::LoggingContext;
use crate::record::Message;
use crate::record::Normalized;
use crate::record::normalize;

/// The capability every logger exposes.
///
/// The optional `txt` lands on the record's `msg` field: appended to an
/// existing message with a `" - "` separator, or standing alone when the
/// message has none. These calls never fail on malformed message content;
/// only wiring mistakes (an uninitialized pipeline, a lazy supplier producing
/// nothing) are reported loudly.
pub trait Log: Send + Sync {
    /// Log a message at the given level.
    #[track_caller]
    fn log(&self, level: LogLevel, message: Message, txt: Option<&str>);

    /// Log a DEBUG level message.
    #[track_caller]
    fn debug(&self, message: Message, txt: Option<&str>);

    /// Log an INFO level message.
    #[track_caller]
    fn info(&self, message: Message, txt: Option<&str>);

    /// Log a WARNING level message.
    #[track_caller]
    fn warning(&self, message: Message, txt: Option<&str>);

    /// Log an ERROR level message.
    #[track_caller]
    fn error(&self, message: Message, txt: Option<&str>);
}

/// A logger's registry entry: its name and its effective level, re-synced by
/// the pipeline on every global level change.
#[derive(Debug)]
pub(crate) struct LoggerHandle {
    name: String,
    level: AtomicU8,
}

impl LoggerHandle {
    pub(crate) fn update(&self, context: &LoggingContext) {
        self.level
            .store(context.level().number(), Ordering::Relaxed);
    }
}

/// A named logger bound to the context that existed when it was created.
///
/// Creating a logger registers it into the context's registry for the rest of
/// the process lifetime. After a forced re-initialization of the process-wide
/// pipeline, an existing logger keeps dispatching to the context it was
/// created against; re-create it to pick up the new one.
#[derive(Clone, Debug)]
pub struct Logger {
    handle: Arc<LoggerHandle>,
    context: Arc<LoggingContext>,
}

impl Logger {
    /// Creates a logger against the process-wide pipeline.
    ///
    /// The name should relate to the file the logger is created in; on a
    /// production environment it may be the only hint left to locate the
    /// source of a log.
    ///
    /// # Errors
    ///
    /// Fails when [`init`](crate::init) has not installed a pipeline yet.
    pub fn new(name: impl Into<String>) -> Result<Logger, Error> {
        let context = pipeline::current().ok_or_else(pipeline::uninitialized_error)?;
        Ok(Self::with_context(&context, name))
    }

    /// Bind a logger to an explicit context rather than the process-wide one.
    pub fn with_context(context: &Arc<LoggingContext>, name: impl Into<String>) -> Logger {
        let handle = Arc::new(LoggerHandle {
            name: name.into(),
            level: AtomicU8::new(context.level().number()),
        });
        context.register(handle.clone());
        Logger {
            handle,
            context: context.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    /// Re-read the shared engine level.
    ///
    /// Called by the pipeline on every global level change. It could be used
    /// to re-sync a single logger, but not to detach one from the shared
    /// level: the next global change overwrites any independent setting.
    pub fn update(&self) {
        self.handle.update(&self.context);
    }

    /// Log at a level carried as runtime data, such as a label read from
    /// configuration or taken off the wire.
    ///
    /// An unrecognized label is reported through the engine's own error
    /// channel and the record is still delivered at ERROR; a message is never
    /// dropped for carrying a bad level.
    #[track_caller]
    pub fn log_labeled(&self, label: &str, message: Message, txt: Option<&str>) {
        match label.parse::<LogLevel>() {
            Ok(level) => self.dispatch(Location::caller(), level, message, txt),
            Err(_) => {
                self.context
                    .emit_diagnostic(&format!("UNMANAGED LEVEL \"{label}\""));
                self.dispatch(Location::caller(), LogLevel::Error, message, txt);
            }
        }
    }

    /// Flush every destination of the bound context.
    pub fn flush(&self) {
        self.context.flush();
    }

    fn dispatch(
        &self,
        caller: &'static Location<'static>,
        level: LogLevel,
        message: Message,
        txt: Option<&str>,
    ) {
        let Normalized { mut record, warnings } = normalize(message, txt);
        for warning in &warnings {
            self.context.emit_diagnostic(warning);
        }

        if level.number() < self.handle.level.load(Ordering::Relaxed) {
            return;
        }

        enhance(&mut record, self.context.config(), caller);
        self.context.emit(&self.handle.name, level, &record);
    }
}

impl Log for Logger {
    #[track_caller]
    fn log(&self, level: LogLevel, message: Message, txt: Option<&str>) {
        self.dispatch(Location::caller(), level, message, txt);
    }

    #[track_caller]
    fn debug(&self, message: Message, txt: Option<&str>) {
        self.dispatch(Location::caller(), LogLevel::Debug, message, txt);
    }

    #[track_caller]
    fn info(&self, message: Message, txt: Option<&str>) {
        self.dispatch(Location::caller(), LogLevel::Info, message, txt);
    }

    #[track_caller]
    fn warning(&self, message: Message, txt: Option<&str>) {
        self.dispatch(Location::caller(), LogLevel::Warning, message, txt);
    }

    #[track_caller]
    fn error(&self, message: Message, txt: Option<&str>) {
        self.dispatch(Location::caller(), LogLevel::Error, message, txt);
    }
}

/// Shorthand that returns a new logger bound to the process-wide pipeline.
///
/// # Panics
///
/// Panics when [`init`](crate::init) has not been called: using a logger
/// before the pipeline exists is a wiring mistake and is reported at the
/// misuse site.
pub fn create_logger(name: &str) -> Logger {
    Logger::new(name).expect("mtlog::init() must be called before create_logger()")
}
