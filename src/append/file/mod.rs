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

//! An appender writing records to a rolling file through a dedicated writer
//! thread.
//!
//! The active file keeps a fixed name; predecessors are numbered, `1` being
//! the newest. Retention is bounded by a file count and by the total size of
//! the rotated set. Rotation faults are reported through the configured
//! [`Trap`] and never interrupt logging.

mod rolling;

pub use self::rolling::RollingFileWriter;
pub use self::rolling::RollingFileWriterBuilder;

use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::append::Append;
use crate::error::Error;
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::non_blocking::NonBlocking;
use crate::non_blocking::WorkerGuard;
use crate::record::Envelope;
use crate::trap::Trap;

/// The fixed name of the active log file.
pub const LOG_FILENAME: &str = "application";

/// The suffix of every log file.
pub const LOG_FILENAME_SUFFIX: &str = "log";

/// A builder to configure and create a [`File`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    builder: RollingFileWriterBuilder,
    layout: Box<dyn Layout>,
}

impl FileBuilder {
    /// Create a new file appender builder writing `application.log` under
    /// `basedir`.
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            builder: RollingFileWriterBuilder::new(basedir, LOG_FILENAME)
                .filename_suffix(LOG_FILENAME_SUFFIX),
            layout: Box::new(JsonLayout::default()),
        }
    }

    /// Set the layout for the logs.
    ///
    /// Default to [`JsonLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the trap for handling errors during rotation and retention.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.builder = self.builder.trap(trap);
        self
    }

    /// Roll the active file over once it exceeds the given size.
    pub fn rollover_size(mut self, n: NonZeroUsize) -> Self {
        self.builder = self.builder.max_file_size(n);
        self
    }

    /// Set the maximum number of log files to keep, the active one included.
    pub fn max_log_files(mut self, n: NonZeroUsize) -> Self {
        self.builder = self.builder.max_log_files(n);
        self
    }

    /// Bound the total size of the rotated predecessors.
    pub fn max_total_size(mut self, n: NonZeroU64) -> Self {
        self.builder = self.builder.max_total_size(n);
        self
    }

    /// Build the [`File`] appender and the guard that flushes its writer
    /// thread on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be created or the active
    /// file cannot be opened.
    pub fn build(self) -> Result<(File, WorkerGuard), Error> {
        let FileBuilder { builder, layout } = self;
        let writer = builder.build()?;
        let (non_blocking, guard) = NonBlocking::new(writer, "mtlog-file-writer", None);
        Ok((
            File {
                writer: non_blocking,
                layout,
            },
            guard,
        ))
    }
}

/// An appender that writes emitted records to a rolling file.
#[derive(Debug)]
pub struct File {
    writer: NonBlocking,
    layout: Box<dyn Layout>,
}

impl Append for File {
    fn append(&self, envelope: &Envelope) -> Result<(), Error> {
        let mut bytes = self.layout.format(envelope)?;
        bytes.push(b'\n');
        self.writer.send(bytes)
    }

    // No explicit flush: the writer thread flushes after draining its queue,
    // and the WorkerGuard drains on drop.
}
