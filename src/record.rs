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

//! Log records and message normalization.
//!
//! Caller-supplied messages come in many shapes. They are resolved once, at
//! the API boundary, into the closed [`Message`] union, then normalized into a
//! single ordered [`LogRecord`] ready for metadata enhancement.

use jiff::Zoned;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::level::LogLevel;

/// Field names shared with downstream log consumers.
pub mod field {
    /// The message text. Always a string once enhancement completes.
    pub const MSG: &str = "msg";
    /// Holds the content of a sequence logged as a message.
    pub const ARRAY_MSG: &str = "_arrayMsg";
    /// An error's name; also the logger name in the emitted envelope.
    pub const NAME: &str = "name";
    /// An error's captured backtrace text.
    pub const STACK: &str = "stack";
    /// The call site: `{file, line}`.
    pub const SRC: &str = "src";
    /// The type of log entry.
    pub const LOG_TYPE: &str = "logType";
    /// The version of the log type.
    pub const LOG_TYPE_VERSION: &str = "logTypeVersion";
    /// The name of the embedding application.
    pub const APP: &str = "app";
    /// The version of the embedding application.
    pub const VERSION: &str = "version";
    /// The correlation id.
    pub const CID: &str = "cid";
    /// A request's socket object.
    pub const SOCKET: &str = "socket";
    /// The peer address on a request's socket object.
    pub const REMOTE_ADDRESS: &str = "remoteAddress";
}

/// The log type tag stamped on every record.
pub const LOG_TYPE_TAG: &str = "mtl";

/// The version of the record shape. Bump only on a breaking change to the
/// properties added to the log.
pub const LOG_TYPE_VERSION: &str = "2";

/// Placeholder written when a request's peer address cannot be read.
pub const REMOTE_ADDRESS_UNAVAILABLE: &str = "[not available]";

const MSG_SEPARATOR: &str = " - ";

/// Human-readable rendering for date values logged as messages, deliberately
/// not ISO-8601.
const DATE_VALUE_FORMAT: &str = "%a %b %d %Y %H:%M:%S %z";

/// An ordered set of fields making up one structured log entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The fields in insertion order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// An envelope handed to the output destinations: the record plus the engine
/// metadata surrounding it.
#[derive(Debug)]
pub struct Envelope<'a> {
    /// The logger name.
    pub name: &'a str,
    /// The verbosity level of the record.
    pub level: LogLevel,
    /// The record fields.
    pub fields: &'a LogRecord,
}

/// An error-shaped message: name, text, captured backtrace, and any custom
/// fields the caller attached.
#[derive(Debug)]
pub struct ErrorShape {
    name: String,
    message: String,
    stack: String,
    extra: Map<String, Value>,
}

impl ErrorShape {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
            extra: Map::new(),
        }
    }

    /// Capture an error value: its type name, its rendered message, and a
    /// backtrace taken here.
    pub fn capture<E: std::error::Error>(err: &E) -> Self {
        let name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error");
        Self::new(
            name,
            err.to_string(),
            std::backtrace::Backtrace::force_capture().to_string(),
        )
    }

    /// Attach a custom field. A field named like one of the error's own
    /// (`name`, `msg`, `stack`) replaces it in the normalized record.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// A request-shaped message whose peer address may be unreadable.
///
/// The address probe runs at the boundary; normalization writes either the
/// probed address or [`REMOTE_ADDRESS_UNAVAILABLE`] onto the socket object,
/// never propagating the probe failure.
#[derive(Debug)]
pub struct RequestShape {
    fields: Map<String, Value>,
    remote_address: Result<String, Error>,
}

impl RequestShape {
    pub fn new(fields: Map<String, Value>, remote_address: Result<String, Error>) -> Self {
        Self {
            fields,
            remote_address,
        }
    }
}

/// A caller-supplied message, resolved into a closed set of shapes.
#[derive(Debug)]
pub enum Message {
    /// No message at all.
    Empty,
    /// Plain text, or any scalar rendered as text.
    Text(String),
    /// A timestamp logged as the message itself.
    DateValue(Zoned),
    /// A sequence of values. Not a valid message shape; it is wrapped under
    /// [`field::ARRAY_MSG`] and a warning is emitted.
    Sequence(Vec<Value>),
    /// A structured set of fields.
    Structured(Map<String, Value>),
    /// An error with name, text and backtrace.
    ErrorLike(ErrorShape),
    /// An HTTP-request-shaped value.
    Request(RequestShape),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<Zoned> for Message {
    fn from(date: Zoned) -> Self {
        Message::DateValue(date)
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Message::Structured(fields)
    }
}

impl From<Vec<Value>> for Message {
    fn from(values: Vec<Value>) -> Self {
        Message::Sequence(values)
    }
}

impl From<ErrorShape> for Message {
    fn from(shape: ErrorShape) -> Self {
        Message::ErrorLike(shape)
    }
}

impl From<RequestShape> for Message {
    fn from(shape: RequestShape) -> Self {
        Message::Request(shape)
    }
}

impl From<Value> for Message {
    /// Classify a JSON value into its message shape.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Message::Empty,
            Value::String(text) => Message::Text(text),
            Value::Array(values) => Message::Sequence(values),
            Value::Object(fields) => Message::Structured(fields),
            scalar => Message::Text(scalar.to_string()),
        }
    }
}

/// The outcome of normalizing a message: the record itself plus any warnings
/// to report through the engine's own error channel, in order, before the
/// record is emitted.
#[derive(Debug)]
pub(crate) struct Normalized {
    pub record: LogRecord,
    pub warnings: Vec<String>,
}

/// Normalize a message and optional extra text into a [`LogRecord`].
pub(crate) fn normalize(message: Message, txt: Option<&str>) -> Normalized {
    let mut warnings = Vec::new();

    let record = match message {
        Message::Empty => {
            let mut record = LogRecord::new();
            append_txt_to_fields(&mut record, txt);
            record
        }
        Message::Sequence(values) => {
            let values = Value::Array(values);
            warnings.push(format!(
                "The message object to log can't be an array. An object will be used instead and \
                 the content of the array will be moved to an \"{}\" property on it: {values}",
                field::ARRAY_MSG,
            ));
            let mut record = LogRecord::new();
            record.insert(field::ARRAY_MSG, values);
            append_txt_to_fields(&mut record, txt);
            record
        }
        Message::ErrorLike(err) => {
            // Build a plain record out of the error so its name, text and
            // backtrace all survive serialization, then overlay the custom
            // fields the caller attached to it.
            let mut record = LogRecord::new();
            record.insert(field::NAME, err.name);
            record.insert(field::MSG, err.message);
            record.insert(field::STACK, err.stack);
            for (name, value) in err.extra {
                record.insert(name, value);
            }
            append_txt_to_fields(&mut record, txt);
            record
        }
        Message::Request(req) => {
            let mut record = LogRecord::from_fields(req.fields);
            let address = match req.remote_address {
                Ok(address) => address,
                Err(_) => REMOTE_ADDRESS_UNAVAILABLE.to_string(),
            };
            match record.fields.get_mut(field::SOCKET) {
                Some(Value::Object(socket)) => {
                    socket.insert(field::REMOTE_ADDRESS.to_string(), address.into());
                }
                _ => {
                    let mut socket = Map::new();
                    socket.insert(field::REMOTE_ADDRESS.to_string(), address.into());
                    record.insert(field::SOCKET, Value::Object(socket));
                }
            }
            append_txt_to_fields(&mut record, txt);
            record
        }
        Message::Structured(fields) => {
            let mut record = LogRecord::from_fields(fields);
            append_txt_to_fields(&mut record, txt);
            record
        }
        Message::Text(text) => scalar_record(&text, txt),
        Message::DateValue(date) => {
            let rendered = date.strftime(DATE_VALUE_FORMAT).to_string();
            scalar_record(&rendered, txt)
        }
    };

    Normalized { record, warnings }
}

/// Scalars render as `"<value>"` or `"<value> - <txt>"`.
fn scalar_record(rendered: &str, txt: Option<&str>) -> LogRecord {
    let msg = match txt {
        Some(txt) => format!("{rendered}{MSG_SEPARATOR}{txt}"),
        None => rendered.to_string(),
    };
    let mut record = LogRecord::new();
    record.insert(field::MSG, msg);
    record
}

/// For structured shapes, the extra text lands on `msg`: appended to an
/// existing message with a separator, or standing alone when there is none.
fn append_txt_to_fields(record: &mut LogRecord, txt: Option<&str>) {
    let Some(txt) = txt else {
        return;
    };

    let msg = match record.get(field::MSG) {
        Some(Value::String(existing)) if !existing.is_empty() => {
            format!("{existing}{MSG_SEPARATOR}{txt}")
        }
        Some(value) if !value.is_null() && value.as_str().is_none() => {
            format!("{value}{MSG_SEPARATOR}{txt}")
        }
        _ => txt.to_string(),
    };
    record.insert(field::MSG, msg);
}
