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

//! A logger wrapper that defers creating the real logger until first use.

use std::fmt;
use std::sync::OnceLock;

use crate::level::LogLevel;
use crate::logger::Log;
use crate::logger::Logger;
use crate::record::Message;

type LoggerSupplier = dyn Fn(&str) -> Option<Logger> + Send + Sync;

/// A [`Log`] implementation that acquires its real [`Logger`] lazily.
///
/// The supplier is invoked on the first logging call, letting a `LazyLogger`
/// be constructed before the pipeline is initialized. The supplier itself is
/// required by construction; a supplier that produces no logger makes the
/// first logging call fail, loudly, as the wiring mistake it is.
pub struct LazyLogger {
    name: String,
    supplier: Box<LoggerSupplier>,
    real: OnceLock<Logger>,
}

impl LazyLogger {
    pub fn new(
        name: impl Into<String>,
        supplier: impl Fn(&str) -> Option<Logger> + Send + Sync + 'static,
    ) -> LazyLogger {
        LazyLogger {
            name: name.into(),
            supplier: Box::new(supplier),
            real: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Panics
    ///
    /// Panics when the supplier produces no logger.
    fn real_logger(&self) -> &Logger {
        self.real.get_or_init(|| {
            (self.supplier)(&self.name).expect("the logger supplier must create a valid logger")
        })
    }
}

impl Log for LazyLogger {
    #[track_caller]
    fn log(&self, level: LogLevel, message: Message, txt: Option<&str>) {
        self.real_logger().log(level, message, txt);
    }

    #[track_caller]
    fn debug(&self, message: Message, txt: Option<&str>) {
        self.real_logger().debug(message, txt);
    }

    #[track_caller]
    fn info(&self, message: Message, txt: Option<&str>) {
        self.real_logger().info(message, txt);
    }

    #[track_caller]
    fn warning(&self, message: Message, txt: Option<&str>) {
        self.real_logger().warning(message, txt);
    }

    #[track_caller]
    fn error(&self, message: Message, txt: Option<&str>) {
        self.real_logger().error(message, txt);
    }
}

impl fmt::Debug for LazyLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLogger")
            .field("name", &self.name)
            .field("realized", &self.real.get().is_some())
            .finish_non_exhaustive()
    }
}
