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

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use mtlog::Log;
use mtlog::LogLevel;
use mtlog::Logger;
use mtlog::LoggerConfig;
use mtlog::LoggingContext;
use tempfile::TempDir;

const TESTING_CID: &str = "test-cid";

fn file_config(dir: &Path, log_to_file: bool) -> LoggerConfig {
    let mut config = LoggerConfig::new(|| TESTING_CID.to_string());
    config.set_log_level(LogLevel::Debug);
    config.set_log_source(true);
    config.set_human_readable_console(false);
    config.set_log_directory(dir);
    config.set_log_to_file(log_to_file);
    config
}

/// File writes happen on a dedicated thread. Wait for on-disk evidence with a
/// bounded poll; reaching the ceiling is not an error by itself, the caller's
/// assertion decides.
fn wait_for_file(path: &Path) {
    let ceiling = Duration::from_secs(5);
    let interval = Duration::from_millis(100);
    let start = Instant::now();
    while !path.exists() && start.elapsed() < ceiling {
        thread::sleep(interval);
    }
}

#[test]
fn test_no_log_file_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = file_config(temp_dir.path(), false);

    let context = LoggingContext::new(config, "default").unwrap();
    let logger = Logger::with_context(&context, "test");

    logger.error("allo".into(), None);
    logger.flush();
    thread::sleep(Duration::from_millis(300));

    assert!(!temp_dir.path().join("application.log").exists());
}

#[test]
fn test_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = file_config(temp_dir.path(), true);

    let context = LoggingContext::new(config, "default").unwrap();
    let logger = Logger::with_context(&context, "test");

    logger.error("allo".into(), None);
    logger.flush();

    let logfile = temp_dir.path().join("application.log");
    wait_for_file(&logfile);
    // The file appears as soon as the pipeline is built; wait for the record
    // to be drained by the writer thread.
    let ceiling = Instant::now() + Duration::from_secs(5);
    let mut content = String::new();
    while Instant::now() < ceiling {
        content = fs::read_to_string(&logfile).unwrap_or_default();
        if content.contains("\"msg\":\"allo\"") {
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    assert!(content.contains("\"msg\":\"allo\""), "content: {content}");
    assert!(content.contains("\"cid\":\"test-cid\""));
    assert!(content.contains("\"logType\":\"mtl\""));
}

#[test]
fn test_log_directory_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested").join("logs");
    let config = file_config(&nested, true);

    let _context = LoggingContext::new(config, "default").unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_records_survive_dropping_the_context() {
    let temp_dir = TempDir::new().unwrap();
    let config = file_config(temp_dir.path(), true);

    let context = LoggingContext::new(config, "default").unwrap();
    let logger = Logger::with_context(&context, "test");
    logger.error("before shutdown".into(), None);

    // Dropping the context drops the worker guard, which drains the queue.
    drop(logger);
    drop(context);

    let logfile = temp_dir.path().join("application.log");
    wait_for_file(&logfile);
    let content = fs::read_to_string(&logfile).unwrap();
    assert!(content.contains("before shutdown"), "content: {content}");
}
