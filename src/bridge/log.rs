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

//! Route records from the `log` crate macros into the pipeline, so that
//! `log::info!` and friends produce the same wire format as a [`Logger`].

use crate::error::Error;
use crate::level::LogLevel;
use crate::logger::Log;
use crate::logger::Logger;
use crate::record::Message;

/// Install `logger` as the `log` crate's global logger.
///
/// This should be called early in the execution of a Rust program; records
/// logged through the macros before installation are ignored.
///
/// # Errors
///
/// Fails if a global `log` logger has already been installed.
pub fn install(logger: Logger, max_level: log::LevelFilter) -> Result<(), Error> {
    log::set_boxed_logger(Box::new(LogBridge { logger }))
        .map_err(|err| Error::new("failed to install the log crate bridge").with_source(err))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug)]
struct LogBridge {
    logger: Logger,
}

impl log::Log for LogBridge {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        // Level gating happens in the pipeline's destinations.
        true
    }

    fn log(&self, record: &log::Record) {
        let message = Message::Text(record.args().to_string());
        self.logger
            .log(LogLevel::from(record.level()), message, None);
    }

    fn flush(&self) {
        self.logger.flush();
    }
}
