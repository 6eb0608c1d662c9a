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

use std::io;
use std::io::Write;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvError;
use crossbeam_channel::TryRecvError;

use super::Message;

pub(crate) struct Worker<T: Write + Send + 'static> {
    writer: T,
    receiver: Receiver<Message>,
    shutdown: Receiver<()>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WorkerState {
    Empty,
    Disconnected,
    Continue,
    Shutdown,
}

impl<T: Write + Send + 'static> Worker<T> {
    pub(crate) fn new(writer: T, receiver: Receiver<Message>, shutdown: Receiver<()>) -> Worker<T> {
        Self {
            writer,
            receiver,
            shutdown,
        }
    }

    fn handle(&mut self, message: Message) -> io::Result<WorkerState> {
        match message {
            Message::Record(record) => {
                self.writer.write_all(&record)?;
                Ok(WorkerState::Continue)
            }
            Message::Shutdown => Ok(WorkerState::Shutdown),
        }
    }

    /// Block for one message, then drain whatever else is queued, then flush.
    fn work(&mut self) -> io::Result<WorkerState> {
        let mut state = match self.receiver.recv() {
            Ok(message) => self.handle(message)?,
            Err(RecvError) => WorkerState::Disconnected,
        };

        while state == WorkerState::Continue {
            state = match self.receiver.try_recv() {
                Ok(message) => self.handle(message)?,
                Err(TryRecvError::Empty) => WorkerState::Empty,
                Err(TryRecvError::Disconnected) => WorkerState::Disconnected,
            };
        }

        self.writer.flush()?;
        Ok(state)
    }

    pub(crate) fn make_thread(mut self, name: String) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name(name)
            .spawn(move || {
                loop {
                    match self.work() {
                        Ok(WorkerState::Continue) | Ok(WorkerState::Empty) => {}
                        Ok(WorkerState::Shutdown) | Ok(WorkerState::Disconnected) => {
                            let _ = self.shutdown.recv();
                            break;
                        }
                        Err(err) => {
                            eprintln!("failed to write log record: {err}");
                        }
                    }
                }
                if let Err(err) = self.writer.flush() {
                    eprintln!("failed to flush log writer: {err}");
                }
            })
            .expect("failed to spawn the log writer thread")
    }
}
