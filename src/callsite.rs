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

//! Call-site resolution: the source file and line of the code that issued a
//! log call.
//!
//! The primary source is the `#[track_caller]` location propagated through the
//! logging methods, which carries the caller's file and line as data. When the
//! captured location still points into the facade's own files (a call routed
//! through a wrapper that does not forward caller tracking), resolution falls
//! back to a textual backtrace walk: discard the capture frame, skip every
//! frame raised by the facade, and parse the first remaining frame's location.
//! Symbol matching on trace text can mis-skip frames in inlined or heavily
//! wrapped call chains; that imprecision is inherent to the fallback.

use std::backtrace::Backtrace;
use std::panic::Location;

use serde::Serialize;

/// A resolved call site.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// Resolve the call site from the tracked caller location, falling back to a
/// backtrace walk when the location belongs to the facade itself. `None` when
/// nothing qualifies; the record is then delivered without annotation.
pub(crate) fn resolve(caller: &'static Location<'static>) -> Option<SourceLocation> {
    if !is_facade_file(caller.file()) {
        return Some(SourceLocation {
            file: caller.file().to_string(),
            line: caller.line(),
        });
    }
    resolve_from_backtrace()
}

/// Files making up the logging facade. Frames raised there are never the
/// caller. A caller file that happens to share one of these suffixes is
/// skipped too; path matching cannot tell them apart.
fn is_facade_file(file: &str) -> bool {
    ["src/logger.rs", "src/lazy.rs", "src/bridge/log.rs"]
        .iter()
        .any(|facade| file.ends_with(facade))
}

fn is_facade_frame(symbol: &str) -> bool {
    symbol.contains("Logger::")
        || symbol.contains("mtlog::")
        || symbol.contains("log::__private_api")
}

/// Capture a backtrace here and resolve the first frame past the facade.
pub(crate) fn resolve_from_backtrace() -> Option<SourceLocation> {
    let trace = Backtrace::force_capture().to_string();
    resolve_from_trace_text(&trace)
}

fn resolve_from_trace_text(trace: &str) -> Option<SourceLocation> {
    let mut frames = parse_frames(trace);
    if frames.is_empty() {
        return None;
    }
    // The first frame is the capture point itself.
    frames.remove(0);

    frames
        .into_iter()
        .find(|frame| !is_facade_frame(&frame.symbol))
        .and_then(|frame| frame.location)
}

struct Frame {
    symbol: String,
    location: Option<SourceLocation>,
}

/// Split trace text into frames. The standard format is a numbered symbol
/// line, optionally followed by an indented `at <file>:<line>:<col>` line.
fn parse_frames(trace: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in trace.lines() {
        let trimmed = line.trim_start();
        if let Some(symbol) = split_frame_header(trimmed) {
            frames.push(Frame {
                symbol: symbol.to_string(),
                location: None,
            });
        } else if trimmed.starts_with("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.location.is_none() {
                    frame.location = parse_frame_location(trimmed);
                }
            }
        }
    }

    frames
}

/// `"12: core::fmt::write"` -> `Some("core::fmt::write")`.
fn split_frame_header(line: &str) -> Option<&str> {
    let (index, symbol) = line.split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(symbol.trim())
}

/// Parse a frame location out of `at <fn> (<file>:<line>:<col>)` or
/// `at <file>:<line>:<col>` text; a trailing column is optional.
fn parse_frame_location(text: &str) -> Option<SourceLocation> {
    let text = text.trim();
    let rest = text.strip_prefix("at ").unwrap_or(text);

    let inner = match (rest.rfind('('), rest.rfind(')')) {
        (Some(open), Some(close)) if open < close => &rest[open + 1..close],
        _ => rest,
    };

    let segments: Vec<&str> = inner.split(':').collect();
    if segments.len() < 2 {
        return None;
    }

    // Consume numeric segments from the right: a column if present, then the
    // line. Whatever remains, joined back together, is the file path.
    let mut end = segments.len();
    let last: u32 = segments[end - 1].trim().parse().ok()?;
    end -= 1;

    let (line, file_end) = match segments[..end].last().and_then(|s| s.trim().parse::<u32>().ok()) {
        Some(line) if end >= 2 => (line, end - 1),
        _ => (last, end),
    };

    if file_end == 0 {
        return None;
    }
    let file = segments[..file_end].join(":");
    if file.is_empty() {
        return None;
    }

    Some(SourceLocation { file, line })
}
