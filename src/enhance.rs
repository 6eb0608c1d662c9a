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

//! Cross-cutting record metadata: log type tag, correlation id, application
//! identity, and the call site of the originating log statement.

use std::panic::Location;

use crate::callsite;
use crate::config::LoggerConfig;
use crate::record::LogRecord;
use crate::record::field;

/// Stamp the cross-cutting fields onto a normalized record. Idempotent on the
/// fields it owns.
pub(crate) fn enhance(
    record: &mut LogRecord,
    config: &LoggerConfig,
    caller: &'static Location<'static>,
) {
    if !record.contains(field::LOG_TYPE) {
        record.insert(field::LOG_TYPE, crate::record::LOG_TYPE_TAG);
        record.insert(field::LOG_TYPE_VERSION, crate::record::LOG_TYPE_VERSION);
    }

    let cid = config.correlation_id();
    if !cid.is_empty() {
        record.insert(field::CID, cid);
    }

    // Always stamped from the embedding application, over any caller-supplied
    // values.
    record.insert(field::APP, config.app().name());
    record.insert(field::VERSION, config.app().version());

    if !config.log_source() {
        return;
    }

    if let Some(src) = callsite::resolve(caller) {
        record.insert(
            field::SRC,
            serde_json::to_value(&src).unwrap_or(serde_json::Value::Null),
        );
    }
}
