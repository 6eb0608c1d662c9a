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

use std::sync::Arc;
use std::sync::Mutex;

use crate::append::Append;
use crate::error::Error;
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::record::Envelope;

/// An appender that captures serialized records into a shared buffer, so a
/// test harness can assert on the exact output of a pipeline.
///
/// # Examples
///
/// ```
/// use mtlog::append::Testing;
///
/// let appender = Testing::default();
/// let buffer = appender.buffer();
/// ```
#[derive(Debug)]
pub struct Testing {
    layout: Box<dyn Layout>,
    buffer: TestingBuffer,
}

impl Default for Testing {
    fn default() -> Self {
        Self::new(JsonLayout::default())
    }
}

impl Testing {
    /// Creates a new `Testing` appender with the given layout.
    pub fn new(layout: impl Into<Box<dyn Layout>>) -> Self {
        Self {
            layout: layout.into(),
            buffer: TestingBuffer::default(),
        }
    }

    /// A handle onto the captured output.
    pub fn buffer(&self) -> TestingBuffer {
        self.buffer.clone()
    }
}

impl Append for Testing {
    fn append(&self, envelope: &Envelope) -> Result<(), Error> {
        let mut bytes = self.layout.format(envelope)?;
        bytes.push(b'\n');
        let mut buffer = self.buffer.lock();
        buffer.extend_from_slice(&bytes);
        Ok(())
    }
}

/// The shared buffer behind a [`Testing`] appender.
#[derive(Clone, Debug, Default)]
pub struct TestingBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl TestingBuffer {
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Everything captured so far, as text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// The captured output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
