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

use std::io::Write;

use crate::append::Append;
use crate::error::Error;
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::record::Envelope;

/// An appender that prints emitted records to stdout, one per line.
#[derive(Debug)]
pub struct Stdout {
    layout: Box<dyn Layout>,
}

impl Default for Stdout {
    fn default() -> Self {
        Self::new(JsonLayout::default())
    }
}

impl Stdout {
    /// Creates a new `Stdout` appender with the given layout.
    pub fn new(layout: impl Into<Box<dyn Layout>>) -> Self {
        Self {
            layout: layout.into(),
        }
    }
}

impl Append for Stdout {
    fn append(&self, envelope: &Envelope) -> Result<(), Error> {
        let mut bytes = self.layout.format(envelope)?;
        bytes.push(b'\n');
        std::io::stdout()
            .write_all(&bytes)
            .map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)
    }
}

/// An appender that prints emitted records to stderr, one per line.
#[derive(Debug)]
pub struct Stderr {
    layout: Box<dyn Layout>,
}

impl Default for Stderr {
    fn default() -> Self {
        Self::new(JsonLayout::default())
    }
}

impl Stderr {
    /// Creates a new `Stderr` appender with the given layout.
    pub fn new(layout: impl Into<Box<dyn Layout>>) -> Self {
        Self {
            layout: layout.into(),
        }
    }
}

impl Append for Stderr {
    fn append(&self, envelope: &Envelope) -> Result<(), Error> {
        let mut bytes = self.layout.format(envelope)?;
        bytes.push(b'\n');
        std::io::stderr()
            .write_all(&bytes)
            .map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr().flush().map_err(Error::from_io_error)
    }
}
