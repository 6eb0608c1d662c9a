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

use std::fmt::Write;

use colored::Color;
use colored::ColoredString;
use colored::Colorize;
use jiff::Zoned;
use serde_json::Value;

use crate::error::Error;
use crate::layout::Layout;
use crate::layout::TIMESTAMP_FORMAT;
use crate::level::LogLevel;
use crate::record::Envelope;
use crate::record::field;

/// A layout that formats emitted records as human-readable text for the
/// console.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172105+08:00   ERROR default: src/main.rs:51 Hello error! cid=a1b2
/// 2024-08-11T22:44:57.172219+08:00 WARNING default: src/main.rs:52 Hello warn! cid=a1b2
/// 2024-08-11T22:44:57.172276+08:00    INFO default: src/main.rs:53 Hello info! cid=a1b2
/// ```
///
/// Log levels are colored; the colors can be customized through the `colors`
/// field with a [`LevelColor`] instance.
#[derive(Default, Debug, Clone)]
pub struct TextLayout {
    pub colors: LevelColor,
}

/// Customize the color of each log level.
#[derive(Debug, Clone)]
pub struct LevelColor {
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub debug: Color,
    pub trace: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Green,
            debug: Color::Blue,
            trace: Color::Magenta,
        }
    }
}

impl TextLayout {
    fn color_of(&self, level: LogLevel) -> Color {
        match level {
            LogLevel::Error => self.colors.error,
            LogLevel::Warning => self.colors.warning,
            LogLevel::Info => self.colors.info,
            LogLevel::Debug => self.colors.debug,
            LogLevel::Trace => self.colors.trace,
        }
    }
}

impl Layout for TextLayout {
    fn format(&self, envelope: &Envelope) -> Result<Vec<u8>, Error> {
        let time = Zoned::now().strftime(TIMESTAMP_FORMAT);
        let level =
            ColoredString::from(envelope.level.to_string()).color(self.color_of(envelope.level));
        let name = envelope.name;
        let fields = envelope.fields;

        let msg = fields
            .get(field::MSG)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let (src_file, src_line) = match fields.get(field::SRC) {
            Some(Value::Object(src)) => (
                src.get("file").and_then(Value::as_str).unwrap_or_default(),
                src.get("line").and_then(Value::as_u64).unwrap_or_default(),
            ),
            _ => ("", 0),
        };

        let mut text = String::new();
        write!(&mut text, "{time} {level:>7} {name}: {src_file}:{src_line} {msg}")
            .map_err(|err| Error::new("failed to format log record").with_source(err))?;

        for (name, value) in fields.fields() {
            if matches!(name.as_str(), field::MSG | field::SRC) {
                continue;
            }
            write!(&mut text, " {name}={value}")
                .map_err(|err| Error::new("failed to format log record").with_source(err))?;
        }

        Ok(text.into_bytes())
    }
}
