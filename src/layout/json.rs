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

use jiff::Zoned;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::layout::Layout;
use crate::layout::TIMESTAMP_FORMAT;
use crate::record::Envelope;

/// A JSON layout: one object per record, the machine-readable wire format.
///
/// Output format:
///
/// ```json
/// {"name":"default","level":30,"time":"2024-08-11T22:44:57.172246+08:00","msg":"Hello info!","logType":"mtl","logTypeVersion":"2","cid":"a1b2","app":"my-app","version":"1.2.3"}
/// {"name":"default","level":50,"time":"2024-08-11T22:44:57.172301+08:00","msg":"Hello error!","logType":"mtl","logTypeVersion":"2","cid":"a1b2","app":"my-app","version":"1.2.3"}
/// ```
///
/// Record fields follow the envelope fields in insertion order and override
/// them on a name collision.
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct JsonLayout {}

impl Layout for JsonLayout {
    fn format(&self, envelope: &Envelope) -> Result<Vec<u8>, Error> {
        let mut line = Map::new();
        line.insert("name".to_string(), envelope.name.into());
        line.insert("level".to_string(), envelope.level.number().into());
        line.insert(
            "time".to_string(),
            format!("{}", Zoned::now().strftime(TIMESTAMP_FORMAT)).into(),
        );
        for (name, value) in envelope.fields.fields() {
            line.insert(name.clone(), value.clone());
        }

        serde_json::to_vec(&Value::Object(line))
            .map_err(|err| Error::new("failed to serialize log record").with_source(err))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::level::LogLevel;
    use crate::record::LogRecord;

    #[test]
    fn test_wire_shape() {
        let mut record = LogRecord::new();
        record.insert("msg", "allo");
        record.insert("cid", "test-cid");

        let envelope = Envelope {
            name: "test",
            level: LogLevel::Info,
            fields: &record,
        };
        let bytes = JsonLayout::default().format(&envelope).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed["name"], json!("test"));
        assert_eq!(parsed["level"], json!(30));
        assert_eq!(parsed["msg"], json!("allo"));
        assert_eq!(parsed["cid"], json!("test-cid"));
        let time = parsed["time"].as_str().unwrap();
        assert!(time.contains('T'));
    }

    #[test]
    fn test_record_fields_override_the_envelope() {
        let mut record = LogRecord::new();
        record.insert("name", "SomeError");

        let envelope = Envelope {
            name: "test",
            level: LogLevel::Error,
            fields: &record,
        };
        let bytes = JsonLayout::default().format(&envelope).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["name"], json!("SomeError"));
    }
}
