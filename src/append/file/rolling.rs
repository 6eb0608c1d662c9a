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
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::trap::StderrTrap;
use crate::trap::Trap;

/// A writer for size-rolled files: the active file keeps a fixed name and is
/// archived to `<filename>.1.<suffix>` when it exceeds the size threshold,
/// shifting older archives up by one.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: File,
}

impl Drop for RollingFileWriter {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            let err = Error::new("failed to flush the file writer on drop").with_source(err);
            self.state.trap.trap(&err);
        }
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.should_rollover_on_size() {
            self.state.current_filesize = 0;
            self.state.refresh_writer(&mut self.writer);
        }

        self.writer
            .write(buf)
            .inspect(|&n| self.state.current_filesize += n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A builder for configuring [`RollingFileWriter`].
#[derive(Debug)]
pub struct RollingFileWriterBuilder {
    // required
    basedir: PathBuf,
    filename: String,

    // has default
    filename_suffix: Option<String>,
    max_size: Option<NonZeroUsize>,
    max_files: Option<NonZeroUsize>,
    max_total_size: Option<NonZeroU64>,
    trap: Box<dyn Trap>,
}

impl RollingFileWriterBuilder {
    /// Creates a new [`RollingFileWriterBuilder`].
    #[must_use]
    pub fn new(basedir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            basedir: basedir.into(),
            filename: filename.into(),
            filename_suffix: None,
            max_size: None,
            max_files: None,
            max_total_size: None,
            trap: Box::new(StderrTrap::default()),
        }
    }

    /// Set the trap for the rolling file writer.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the filename suffix.
    #[must_use]
    pub fn filename_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.filename_suffix = if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        };
        self
    }

    /// Set the maximum size of the active file in bytes.
    #[must_use]
    pub fn max_file_size(mut self, n: NonZeroUsize) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Set the maximum number of log files to keep, the active one included.
    #[must_use]
    pub fn max_log_files(mut self, n: NonZeroUsize) -> Self {
        self.max_files = Some(n);
        self
    }

    /// Bound the total size in bytes of the rotated predecessors.
    #[must_use]
    pub fn max_total_size(mut self, n: NonZeroU64) -> Self {
        self.max_total_size = Some(n);
        self
    }

    /// Builds the [`RollingFileWriter`].
    pub fn build(self) -> Result<RollingFileWriter, Error> {
        let Self {
            basedir,
            filename,
            filename_suffix,
            max_size,
            max_files,
            max_total_size,
            trap,
        } = self;

        if filename.is_empty() {
            return Err(Error::new("filename must not be empty"));
        }

        let (state, writer) = State::new(
            basedir,
            filename,
            filename_suffix,
            max_size,
            max_files,
            max_total_size,
            trap,
        )?;
        Ok(RollingFileWriter { state, writer })
    }
}

#[derive(Debug)]
struct ArchivedFile {
    filepath: PathBuf,
    size: u64,
    // 1 is the newest archive; larger is older
    count: usize,
}

#[derive(Debug)]
struct State {
    log_dir: PathBuf,
    log_filename: String,
    log_filename_suffix: Option<String>,
    current_filesize: usize,
    max_size: Option<NonZeroUsize>,
    max_files: Option<NonZeroUsize>,
    max_total_size: Option<NonZeroU64>,
    trap: Box<dyn Trap>,
}

impl State {
    fn new(
        dir: impl AsRef<Path>,
        log_filename: String,
        log_filename_suffix: Option<String>,
        max_size: Option<NonZeroUsize>,
        max_files: Option<NonZeroUsize>,
        max_total_size: Option<NonZeroU64>,
        trap: Box<dyn Trap>,
    ) -> Result<(Self, File), Error> {
        let log_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)
            .map_err(|err| Error::new("failed to create log directory").with_source(err))?;

        let mut state = State {
            log_dir,
            log_filename,
            log_filename_suffix,
            current_filesize: 0,
            max_size,
            max_files,
            max_total_size,
            trap,
        };

        let filepath = state.current_filepath();
        let writer = match fs::metadata(&filepath) {
            Ok(metadata) => {
                // Continue with the existing active file.
                state.current_filesize = metadata.len() as usize;
                OpenOptions::new()
                    .append(true)
                    .open(&filepath)
                    .map_err(|err| {
                        Error::new("failed to open the current log file").with_source(err)
                    })?
            }
            Err(_) => state.create_log_writer()?,
        };

        Ok((state, writer))
    }

    fn current_filepath(&self) -> PathBuf {
        let filename = &self.log_filename;
        match self.log_filename_suffix.as_ref() {
            None => self.log_dir.join(filename),
            Some(suffix) => self.log_dir.join(format!("{filename}.{suffix}")),
        }
    }

    fn archived_filepath(&self, count: usize) -> PathBuf {
        let filename = &self.log_filename;
        let filename = match self.log_filename_suffix.as_ref() {
            None => format!("{filename}.{count}"),
            Some(suffix) => format!("{filename}.{count}.{suffix}"),
        };
        self.log_dir.join(filename)
    }

    fn create_log_writer(&self) -> Result<File, Error> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.current_filepath())
            .map_err(|err| Error::new("failed to create the log file").with_source(err))
    }

    fn list_archived(&self) -> Result<Vec<ArchivedFile>, Error> {
        let read_dir = fs::read_dir(&self.log_dir).map_err(|err| {
            Error::new(format!("failed to read log dir: {}", self.log_dir.display()))
                .with_source(err)
        })?;

        let mut files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                // This writer only creates files; leave directories and
                // symlinks alone.
                if !metadata.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                let mut filename = filename.to_str()?;

                filename = filename.strip_prefix(&self.log_filename)?;
                if let Some(suffix) = &self.log_filename_suffix {
                    filename = filename.strip_suffix(suffix)?;
                    filename = filename.strip_suffix('.')?;
                }
                // The remaining ".N" marker tells an archive apart from the
                // active file.
                filename = filename.strip_prefix('.')?;
                let count = usize::from_str(filename).ok()?;

                Some(ArchivedFile {
                    filepath: entry.path(),
                    size: metadata.len(),
                    count,
                })
            })
            .collect::<Vec<_>>();

        files.sort_by_key(|file| file.count);
        Ok(files)
    }

    /// Delete archives past the file-count and total-size bounds, oldest
    /// (highest count) first.
    fn enforce_retention(&self) -> Result<(), Error> {
        let mut files = self.list_archived()?;

        if let Some(max_files) = self.max_files {
            // The active file occupies one slot of the budget.
            let budget = max_files.get().saturating_sub(1);
            while files.len() > budget {
                let Some(oldest) = files.pop() else {
                    break;
                };
                remove_archive(&oldest)?;
            }
        }

        if let Some(max_total) = self.max_total_size {
            let mut total: u64 = files.iter().map(|file| file.size).sum();
            while total > max_total.get() {
                let Some(oldest) = files.pop() else {
                    break;
                };
                remove_archive(&oldest)?;
                total -= oldest.size;
            }
        }

        Ok(())
    }

    fn rotate_log_writer(&self) -> Result<File, Error> {
        // Shift the numbered archives up by one, highest first.
        let mut renames = vec![];
        for count in 1.. {
            let filepath = self.archived_filepath(count);
            if fs::exists(&filepath).is_ok_and(|exists| exists) {
                renames.push((filepath, self.archived_filepath(count + 1)));
            } else {
                break;
            }
        }
        for (old, new) in renames.iter().rev() {
            fs::rename(old, new).map_err(|err| {
                Error::new(format!("failed to shift archive: {}", old.display())).with_source(err)
            })?;
        }

        let current = self.current_filepath();
        fs::rename(&current, self.archived_filepath(1)).map_err(|err| {
            Error::new(format!("failed to archive log: {}", current.display())).with_source(err)
        })?;

        if let Err(err) = self.enforce_retention() {
            let err = Error::new("failed to enforce log retention").with_source(err);
            self.trap.trap(&err);
        }

        self.create_log_writer()
    }

    fn refresh_writer(&self, file: &mut File) {
        match self.rotate_log_writer() {
            Ok(new_file) => {
                if let Err(err) = file.flush() {
                    let err = Error::new("failed to flush the previous writer").with_source(err);
                    self.trap.trap(&err);
                }
                *file = new_file;
            }
            Err(err) => {
                let err = Error::new("failed to rotate the log writer").with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    fn should_rollover_on_size(&self) -> bool {
        self.max_size
            .is_some_and(|n| self.current_filesize >= n.get())
    }
}

fn remove_archive(file: &ArchivedFile) -> Result<(), Error> {
    fs::remove_file(&file.filepath).map_err(|err| {
        Error::new(format!(
            "failed to remove old log: {}",
            file.filepath.display()
        ))
        .with_source(err)
    })
}
