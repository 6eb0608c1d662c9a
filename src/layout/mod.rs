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

//! Layouts for serializing emitted records.

use std::fmt;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::TextLayout;

use crate::error::Error;
use crate::record::Envelope;

/// ISO-8601 timestamps, as written on the wire.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f%:z";

/// A layout serializes one emitted record into bytes, excluding the trailing
/// line separator.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    fn format(&self, envelope: &Envelope) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
