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

//! A non-blocking writer: serialized records are handed to a dedicated thread
//! over a channel, so the logging call never waits on file I/O. The worker
//! flushes the underlying writer after draining its queue.

mod worker;

use std::io::Write;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossbeam_channel::SendTimeoutError;
use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;

use crate::error::Error;
use worker::Worker;

#[derive(Debug)]
enum Message {
    Record(Vec<u8>),
    Shutdown,
}

/// A handle sending serialized records to the writer thread.
#[derive(Clone, Debug)]
pub struct NonBlocking {
    sender: Sender<Message>,
}

impl NonBlocking {
    /// Spawn a writer thread over `writer` and return the sending handle plus
    /// the guard that flushes on drop.
    ///
    /// `buffered_lines_limit` bounds the queue; `None` means unbounded.
    pub fn new<T: Write + Send + 'static>(
        writer: T,
        thread_name: impl Into<String>,
        buffered_lines_limit: Option<usize>,
    ) -> (NonBlocking, WorkerGuard) {
        let (sender, receiver) = match buffered_lines_limit {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };
        let (shutdown_sender, shutdown_receiver) = bounded(0);

        let worker = Worker::new(writer, receiver, shutdown_receiver);
        let guard = WorkerGuard::new(
            worker.make_thread(thread_name.into()),
            sender.clone(),
            shutdown_sender,
        );

        (NonBlocking { sender }, guard)
    }

    /// Enqueue one serialized record.
    pub fn send(&self, record: Vec<u8>) -> Result<(), Error> {
        self.sender
            .send(Message::Record(record))
            .map_err(|err| Error::new("failed to enqueue log record").with_source(err))
    }
}

/// A guard that drains and flushes the writer thread when dropped.
///
/// Writing through [`NonBlocking`] does not reach the underlying output
/// immediately; the worker thread writes at some later point. If the program
/// terminates abruptly, buffered records may be lost. Keep the guard alive in
/// `main` (the pipeline holds it for the standard file destination) so that an
/// unwinding or a normal exit flushes everything that was queued.
#[derive(Debug)]
pub struct WorkerGuard {
    _handle: Option<JoinHandle<()>>,
    sender: Sender<Message>,
    shutdown: Sender<()>,
}

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

impl WorkerGuard {
    fn new(handle: JoinHandle<()>, sender: Sender<Message>, shutdown: Sender<()>) -> Self {
        Self {
            _handle: Some(handle),
            sender,
            shutdown,
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        match self.sender.send_timeout(Message::Shutdown, SHUTDOWN_TIMEOUT) {
            Ok(()) => {
                // Wait for the worker to drain its queue: it receives on the
                // zero-capacity shutdown channel only once done. Bounded by a
                // timeout so dropping the guard can never hang.
                let _ = self.shutdown.send_timeout((), SHUTDOWN_TIMEOUT);
            }
            Err(SendTimeoutError::Disconnected(_)) => {}
            Err(SendTimeoutError::Timeout(err)) => {
                eprintln!("failed to send shutdown signal to the log writer thread: {err:?}");
            }
        }
    }
}
