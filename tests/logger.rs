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

use mtlog::append::Testing;
use mtlog::append::TestingBuffer;
use mtlog::layout::JsonLayout;
use mtlog::record::ErrorShape;
use mtlog::AppInfo;
use mtlog::Destination;
use mtlog::LazyLogger;
use mtlog::Log;
use mtlog::LogLevel;
use mtlog::Logger;
use mtlog::LoggerConfig;
use mtlog::LoggingContext;
use mtlog::Message;
use serde_json::json;
use serde_json::Value;

const TESTING_CID: &str = "test-cid";

fn testing_context(level: LogLevel) -> (Arc<LoggingContext>, TestingBuffer) {
    let mut config = LoggerConfig::new(|| TESTING_CID.to_string());
    config.set_log_level(level);
    config.set_log_source(true);
    config.set_human_readable_console(false);
    config.set_app_info(AppInfo::new("mtlog-tests", "1.2.3"));

    let appender = Testing::new(JsonLayout::default());
    let buffer = appender.buffer();
    let context = LoggingContext::with_destinations(
        config,
        "default",
        vec![Destination::new(level, appender)],
    );
    (context, buffer)
}

fn parse_single_line(buffer: &TestingBuffer) -> Value {
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1, "expected exactly one record: {lines:?}");
    serde_json::from_str(&lines[0]).unwrap()
}

fn assert_enhanced(record: &Value) {
    assert_eq!(record["logType"], json!("mtl"));
    assert_eq!(record["logTypeVersion"], json!("2"));
    assert_eq!(record["cid"], json!(TESTING_CID));
    assert_eq!(record["app"], json!("mtlog-tests"));
    assert_eq!(record["version"], json!("1.2.3"));

    let file = record["src"]["file"].as_str().unwrap();
    assert!(file.ends_with("tests/logger.rs"), "unexpected src: {file}");
    assert!(record["src"]["line"].as_u64().unwrap() > 0);
}

#[test]
fn test_string_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error("allo".into(), None);

    let record = parse_single_line(&buffer);
    assert_eq!(record["name"], json!("test"));
    assert_eq!(record["msg"], json!("allo"));
    assert_eq!(record["level"], json!(50));
    assert_enhanced(&record);
}

#[test]
fn test_string_message_and_extra_text_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error("allo".into(), Some("salut"));

    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("allo - salut"));
    assert_enhanced(&record);
}

#[test]
fn test_custom_object_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(
        json!({
            "key1": {"key3": "val3", "key4": "val4"},
            "key2": "val2",
            "msg": "blabla",
        })
        .into(),
        None,
    );

    let record = parse_single_line(&buffer);
    assert_eq!(record["key2"], json!("val2"));
    assert_eq!(record["msg"], json!("blabla"));
    assert_eq!(record["key1"], json!({"key3": "val3", "key4": "val4"}));
    assert_enhanced(&record);
}

#[test]
fn test_custom_object_message_and_extra_text_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(
        json!({"key2": "val2", "msg": "blabla"}).into(),
        Some("my text message"),
    );

    let record = parse_single_line(&buffer);
    assert_eq!(record["key2"], json!("val2"));
    assert_eq!(record["msg"], json!("blabla - my text message"));
    assert_enhanced(&record);
}

#[test]
fn test_error_object_and_extra_text_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    let err = "nope".parse::<i32>().unwrap_err();
    logger.error(
        Message::ErrorLike(ErrorShape::capture(&err)),
        Some("my text message"),
    );

    let record = parse_single_line(&buffer);
    let msg = record["msg"].as_str().unwrap();
    assert!(msg.ends_with(" - my text message"));
    assert!(!record["stack"].as_str().unwrap().is_empty());
    assert!(!record["name"].as_str().unwrap().is_empty());
    assert_enhanced(&record);
}

#[test]
fn test_empty_message_and_extra_text_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(Message::Empty, Some("my text message"));

    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("my text message"));
    assert_enhanced(&record);
}

#[test]
fn test_array_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(
        json!(["toto", {"key1": "val1", "key2": "val2"}]).into(),
        None,
    );

    // One diagnostic about the invalid array shape, then the record itself.
    let lines = buffer.lines();
    assert_eq!(lines.len(), 2, "expected diagnostic + record: {lines:?}");

    let diagnostic: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(diagnostic["level"], json!(50));
    assert!(
        diagnostic["msg"]
            .as_str()
            .unwrap()
            .contains("can't be an array")
    );

    let record: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(
        record["_arrayMsg"],
        json!(["toto", {"key1": "val1", "key2": "val2"}])
    );
    assert_enhanced(&record);
}

#[test]
fn test_array_message_and_extra_text_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(json!(["toto"]).into(), Some("my text message"));

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2);
    let record: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(record["_arrayMsg"], json!(["toto"]));
    assert_eq!(record["msg"], json!("my text message"));
}

#[test]
fn test_date_message() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    let date: jiff::Zoned = "2024-08-10T17:12:52+00:00[UTC]".parse().unwrap();
    logger.error(date.clone().into(), None);

    let record = parse_single_line(&buffer);
    let expected = date.strftime("%a %b %d %Y %H:%M:%S %z").to_string();
    assert_eq!(record["msg"], json!(expected));
}

#[test]
fn test_log_level_debug_is_filtered() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.debug("allo".into(), None);
    assert!(buffer.is_empty());
}

#[test]
fn test_log_level_numbers() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.info("allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(30));
    buffer.clear();

    logger.warning("allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(40));
    buffer.clear();

    logger.error("allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(50));
}

#[test]
fn test_log_with_explicit_level() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.log(LogLevel::Info, "allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(30));
}

#[test]
fn test_log_with_unmanaged_level_label() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.log_labeled("nope", "allo".into(), None);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2, "expected diagnostic + record: {lines:?}");

    let diagnostic: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(diagnostic["msg"], json!("UNMANAGED LEVEL \"nope\""));
    assert_eq!(diagnostic["name"], json!("default"));

    let record: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(record["level"], json!(50));
    assert_eq!(record["msg"], json!("allo"));
}

#[test]
fn test_log_with_valid_level_label() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.log_labeled("warning", "allo".into(), None);

    let record = parse_single_line(&buffer);
    assert_eq!(record["level"], json!(40));
}

#[test]
fn test_newline_after_each_log() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error("111".into(), None);
    logger.error(json!({"key1": "val1", "key2": "val2"}).into(), None);

    let contents = buffer.contents();
    let pos = contents.find('\n').unwrap();
    assert_eq!(&contents[pos + 1..pos + 2], "{");
    assert!(contents.ends_with('\n'));
}

#[test]
fn test_source_annotation_can_be_turned_off() {
    let mut config = LoggerConfig::new(|| TESTING_CID.to_string());
    config.set_log_level(LogLevel::Info);
    config.set_log_source(false);

    let appender = Testing::new(JsonLayout::default());
    let buffer = appender.buffer();
    let context = LoggingContext::with_destinations(
        config,
        "default",
        vec![Destination::new(LogLevel::Info, appender)],
    );
    let logger = Logger::with_context(&context, "test");

    logger.error("allo".into(), None);

    let record = parse_single_line(&buffer);
    assert!(record.get("src").is_none());
}

#[test]
fn test_preset_log_type_is_kept() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    logger.error(json!({"msg": "allo", "logType": "custom"}).into(), None);

    let record = parse_single_line(&buffer);
    assert_eq!(record["logType"], json!("custom"));
    assert!(record.get("logTypeVersion").is_none());
}

#[test]
fn test_multiple_destinations_with_distinct_levels() {
    let mut config = LoggerConfig::new(|| TESTING_CID.to_string());
    config.set_log_level(LogLevel::Info);

    let info_appender = Testing::new(JsonLayout::default());
    let info_buffer = info_appender.buffer();
    let error_appender = Testing::new(JsonLayout::default());
    let error_buffer = error_appender.buffer();

    let context = LoggingContext::with_destinations(
        config,
        "default",
        vec![
            Destination::new(LogLevel::Info, info_appender),
            Destination::new(LogLevel::Error, error_appender),
        ],
    );
    let logger = Logger::with_context(&context, "test");

    logger.warning("allo".into(), None);
    assert!(!info_buffer.is_empty());
    assert!(error_buffer.is_empty());

    logger.error("allo".into(), None);
    assert!(!error_buffer.is_empty());
}

#[test]
fn test_global_level_change_propagates_to_all_loggers() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");
    let child = Logger::with_context(&context, "testing child logger");

    context.set_level(LogLevel::Warning);

    logger.debug("filtered".into(), None);
    child.debug("filtered".into(), None);
    logger.info("filtered".into(), None);
    child.info("filtered".into(), None);
    assert!(buffer.is_empty(), "expected zero emitted bytes");

    logger.warning("this is the warning message".into(), None);
    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("this is the warning message"));
    buffer.clear();

    child.warning("this is the child logger warning message".into(), None);
    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("this is the child logger warning message"));
}

#[test]
fn test_level_change_applies_to_newly_created_loggers() {
    let (context, buffer) = testing_context(LogLevel::Info);

    context.set_level(LogLevel::Warning);
    let logger = Logger::with_context(&context, "testing logger");

    logger.info("filtered".into(), None);
    assert!(buffer.is_empty());

    logger.warning("this is the warning message".into(), None);
    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("this is the warning message"));
}

#[test]
fn test_lowering_the_level_restores_delivery_for_existing_loggers() {
    let (context, buffer) = testing_context(LogLevel::Info);
    let logger = Logger::with_context(&context, "test");

    context.set_level(LogLevel::Warning);
    logger.debug("filtered".into(), None);
    assert!(buffer.is_empty());

    context.set_level(LogLevel::Debug);
    // Re-reading the shared level by hand is a no-op right after a global
    // change; the pipeline already re-synced this logger.
    logger.update();
    logger.debug("this is the debug message".into(), None);
    let record = parse_single_line(&buffer);
    assert_eq!(record["msg"], json!("this is the debug message"));
}

#[test]
fn test_lazy_logger_defers_creation() {
    let (context, buffer) = testing_context(LogLevel::Info);

    let supplier_context = context.clone();
    let lazy = LazyLogger::new("titi", move |name| {
        Some(Logger::with_context(&supplier_context, name))
    });

    lazy.debug("allo".into(), None);
    assert!(buffer.is_empty());

    lazy.info("allo".into(), None);
    let record = parse_single_line(&buffer);
    assert_eq!(record["name"], json!("titi"));
    assert_eq!(record["msg"], json!("allo"));
    assert_eq!(record["level"], json!(30));
    assert_enhanced(&record);
}

#[test]
fn test_lazy_logger_all_levels() {
    let (context, buffer) = testing_context(LogLevel::Info);

    let supplier_context = context.clone();
    let lazy = LazyLogger::new("titi", move |name| {
        Some(Logger::with_context(&supplier_context, name))
    });

    lazy.warning("allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(40));
    buffer.clear();

    lazy.error("allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(50));
    buffer.clear();

    lazy.log(LogLevel::Info, "allo".into(), None);
    assert_eq!(parse_single_line(&buffer)["level"], json!(30));
}

#[test]
#[should_panic(expected = "must create a valid logger")]
fn test_lazy_logger_with_a_failing_supplier_fails_on_first_use() {
    let lazy = LazyLogger::new("titi", |_| None);
    lazy.info("allo".into(), None);
}

#[test]
fn test_lazy_logger_invokes_the_supplier_once() {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    let (context, _buffer) = testing_context(LogLevel::Info);
    let calls = Arc::new(AtomicUsize::new(0));

    let supplier_context = context.clone();
    let supplier_calls = calls.clone();
    let lazy = LazyLogger::new("titi", move |name| {
        supplier_calls.fetch_add(1, Ordering::SeqCst);
        Some(Logger::with_context(&supplier_context, name))
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    lazy.info("one".into(), None);
    lazy.info("two".into(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
