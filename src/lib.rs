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

//! Mtlog is a structured-logging layer for Rust applications. It normalizes
//! heterogeneous messages (text, structured values, errors, sequences,
//! request-shaped values, dates) into a single ordered record, stamps
//! cross-cutting metadata on it (correlation id, app identity, log-type tag,
//! call site), and dispatches it to one or more level-gated destinations:
//! the console, as JSON lines or human-readable text, and optionally a
//! rolling file.
//!
//! # Overview
//!
//! Initialize the process-wide pipeline once, then create named loggers:
//!
//! ```
//! use mtlog::{LogLevel, Log, LoggerConfig};
//!
//! let mut config = LoggerConfig::new(|| "my-correlation-id".to_string());
//! config.set_log_level(LogLevel::Info);
//!
//! mtlog::init(config, "default", false).unwrap();
//!
//! let log = mtlog::create_logger("my-module");
//! log.info("service started".into(), None);
//! log.error("something broke".into(), Some("while reading the config"));
//! ```
//!
//! The global level can be changed at any time after initialization and
//! propagates to every destination and every logger created so far:
//!
//! ```no_run
//! use mtlog::LogLevel;
//!
//! mtlog::set_global_level(LogLevel::Warning).unwrap();
//! ```

pub mod append;
pub mod bridge;
pub mod callsite;
pub mod config;
pub mod layout;
pub mod non_blocking;
pub mod record;
pub mod trap;

mod enhance;
mod error;
mod lazy;
mod level;
mod logger;
mod pipeline;

pub use append::Append;
pub use config::AppInfo;
pub use config::AppMode;
pub use config::LoggerConfig;
pub use error::Error;
pub use layout::Layout;
pub use lazy::LazyLogger;
pub use level::LogLevel;
pub use level::ParseLevelError;
pub use logger::Log;
pub use logger::Logger;
pub use logger::create_logger;
pub use pipeline::Destination;
pub use pipeline::LoggingContext;
pub use pipeline::init;
pub use pipeline::is_inited;
pub use pipeline::set_global_level;
pub use record::LogRecord;
pub use record::Message;
pub use trap::Trap;
