// The registry of files read by r and written by w and s///w
//
// Files are opened once, when the script is compiled, and shared by
// all commands that name them.
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::error_handling::{ScriptLocation, runtime_error, semantic_error};
use crate::sed::fast_io::{Output, OutputSink};

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use uucore::display::Quotable;
use uucore::error::UResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Handle of a registered file
pub struct FileId(usize);

/// A file read by the r command
pub struct NamedReader {
    path: PathBuf,
    file: Option<File>, // None if the file could not be opened
    location: ScriptLocation,
}

impl NamedReader {
    /// Return the complete file contents, or None if the file
    /// could not be opened.
    pub fn read_all(&mut self) -> UResult<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        let mut content = Vec::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_end(&mut content))
            .or_else(|e| {
                runtime_error(
                    &self.location,
                    format!("reading file {}: {e}", self.path.quote()),
                )
            })?;
        Ok(Some(content))
    }
}

/// Writer that tracks its file name for better error messages
pub struct NamedWriter {
    path: PathBuf,
    sink: Output,
    location: ScriptLocation,
}

impl NamedWriter {
    fn new(path: PathBuf, location: ScriptLocation) -> UResult<Self> {
        let sink: Output = if path.as_os_str() == "/dev/stderr" {
            OutputSink::new(Box::new(io::stderr()))
        } else {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .or_else(|e| {
                    runtime_error(
                        &location,
                        format!("couldn't open file {}: {e}", path.quote()),
                    )
                })?;
            OutputSink::new(Box::new(BufWriter::new(file)))
        };

        Ok(Self {
            path,
            sink,
            location,
        })
    }

    /// Write a record, returning descriptive errors.
    pub fn write_record(&mut self, content: &[u8], chomped: bool, delimiter: u8) -> UResult<()> {
        self.sink
            .write_record(content, chomped, delimiter)
            .or_else(|e| self.write_error(e))
    }

    /// Flush the writer, returning a descriptive error.
    pub fn flush(&mut self) -> UResult<()> {
        self.sink.flush().or_else(|e| self.write_error(e))
    }

    fn write_error(&self, e: io::Error) -> UResult<()> {
        runtime_error(
            &self.location,
            format!("couldn't write to file {}: {e}", self.path.quote()),
        )
    }
}

/// A registered file
pub enum Target {
    Reader(NamedReader),
    Writer(NamedWriter),
    Stdout, // w /dev/stdout shares the main output
}

#[derive(Default)]
/// All files named in the script
pub struct FileTargets {
    targets: Vec<(PathBuf, Target)>,
}

impl std::fmt::Debug for FileTargets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.targets.iter().map(|(path, _)| path))
            .finish()
    }
}

impl FileTargets {
    fn find(&self, path: &Path) -> Option<(usize, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .find(|(_, (p, _))| p == path)
            .map(|(i, (_, target))| (i, target))
    }

    /// Register a file read by r.
    pub fn add_reader(&mut self, path: &Path, location: &ScriptLocation) -> UResult<FileId> {
        match self.find(path) {
            Some((i, Target::Reader(_))) => return Ok(FileId(i)),
            Some(_) => return conflict(path, location),
            None => {}
        }

        // Per POSIX, if the file can't be read treat it as empty.
        let file = File::open(path).ok();
        self.push(
            path,
            Target::Reader(NamedReader {
                path: path.to_path_buf(),
                file,
                location: location.clone(),
            }),
        )
    }

    /// Register a file written by w or s///w, truncating it.
    pub fn add_writer(&mut self, path: &Path, location: &ScriptLocation) -> UResult<FileId> {
        match self.find(path) {
            Some((i, Target::Writer(_) | Target::Stdout)) => return Ok(FileId(i)),
            Some(_) => return conflict(path, location),
            None => {}
        }

        let target = if path.as_os_str() == "/dev/stdout" {
            Target::Stdout
        } else {
            Target::Writer(NamedWriter::new(path.to_path_buf(), location.clone())?)
        };
        self.push(path, target)
    }

    fn push(&mut self, path: &Path, target: Target) -> UResult<FileId> {
        self.targets.push((path.to_path_buf(), target));
        Ok(FileId(self.targets.len() - 1))
    }

    pub fn get_mut(&mut self, id: FileId) -> &mut Target {
        &mut self.targets[id.0].1
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.targets[id.0].0
    }

    /// Flush buffered content of all writers.
    pub fn flush_all(&mut self) -> UResult<()> {
        for (_, target) in self.targets.iter_mut() {
            if let Target::Writer(writer) = target {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn conflict(path: &Path, location: &ScriptLocation) -> UResult<FileId> {
    semantic_error(
        location,
        format!("couldn't both read and write file {}", path.quote()),
    )
}
