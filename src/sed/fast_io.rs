// Record-based I/O
//
// Input records are obtained from mmapped memory when possible,
// falling back to buffered reading for pipes and terminals.
// Output goes through a sink that remembers whether the last
// record written lacked its terminator.
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

#[cfg(unix)]
use memchr::memchr;
#[cfg(unix)]
use memmap2::Mmap;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Read, Write};
use std::path::Path;

/// Cursor for iteration over an mmapped file.
#[cfg(unix)]
pub struct MmapRecordCursor {
    data: Mmap, // Mapped file contents
    pos: usize, // Position within the data
}

#[cfg(unix)]
impl MmapRecordCursor {
    /// Copy the next record into buf, returning whether it was
    /// terminated by the delimiter, or None at the end of the data.
    fn get_record(&mut self, buf: &mut Vec<u8>, delimiter: u8) -> Option<bool> {
        if self.pos >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.pos..];
        let (content, chomped) = match memchr(delimiter, rest) {
            Some(end) => (&rest[..end], true),
            None => (rest, false),
        };
        buf.clear();
        buf.extend_from_slice(content);
        self.pos += content.len() + usize::from(chomped);
        Some(chomped)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Buffered record reader from any BufRead input.
pub struct ReadRecordCursor {
    reader: Box<dyn BufRead>,
}

impl ReadRecordCursor {
    fn new<R: Read + 'static>(r: R) -> Self {
        Self {
            reader: Box::new(BufReader::new(r)),
        }
    }

    fn get_record(&mut self, buf: &mut Vec<u8>, delimiter: u8) -> io::Result<Option<bool>> {
        buf.clear();
        if self.reader.read_until(delimiter, buf)? == 0 {
            return Ok(None);
        }
        let chomped = buf.last() == Some(&delimiter);
        if chomped {
            buf.pop();
        }
        Ok(Some(chomped))
    }

    fn is_eof(&mut self) -> io::Result<bool> {
        // FIXME(rust-lang#86423): Replace with BufRead::has_data_left()
        // when/if method becomes stable.
        Ok(self.reader.fill_buf()?.is_empty())
    }
}

/// Unified reader that uses mmap when possible, falls back to buffered reading.
pub enum RecordReader {
    #[cfg(unix)]
    MmapInput(MmapRecordCursor),
    ReadInput(ReadRecordCursor),
}

impl RecordReader {
    /// Open the specified file for record input.
    // Use "-" to read from the standard input.
    pub fn open(path: &Path) -> io::Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(Self::from_reader(io::stdin()));
        }

        let file = File::open(path)?;
        if file.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "Is a directory",
            ));
        }

        #[cfg(unix)]
        {
            // SAFETY: the mapping is only read; concurrent modification
            // of the file by another process is outside our control, as
            // it is for any reader.
            match unsafe { Mmap::map(&file) } {
                Ok(data) => Ok(RecordReader::MmapInput(MmapRecordCursor { data, pos: 0 })),
                // Fallback to ReadInput
                Err(_) => Ok(Self::from_reader(file)),
            }
        }

        #[cfg(not(unix))]
        {
            Ok(Self::from_reader(file))
        }
    }

    /// Read records from the specified stream.
    pub fn from_reader<R: Read + 'static>(r: R) -> Self {
        RecordReader::ReadInput(ReadRecordCursor::new(r))
    }

    /// Copy the next record, without its delimiter, into buf.
    /// Return whether the record was delimited, or None at end of input.
    pub fn get_record(&mut self, buf: &mut Vec<u8>, delimiter: u8) -> io::Result<Option<bool>> {
        match self {
            #[cfg(unix)]
            RecordReader::MmapInput(cursor) => Ok(cursor.get_record(buf, delimiter)),
            RecordReader::ReadInput(cursor) => cursor.get_record(buf, delimiter),
        }
    }

    /// Return true if no more records are available.
    pub fn is_eof(&mut self) -> io::Result<bool> {
        match self {
            #[cfg(unix)]
            RecordReader::MmapInput(cursor) => Ok(cursor.is_eof()),
            RecordReader::ReadInput(cursor) => cursor.is_eof(),
        }
    }
}

/// Output destination that supplies a record terminator missing from
/// the previous output before writing anything else.
pub struct OutputSink<W: Write> {
    out: W,
    missing_newline: bool,
}

/// The sink used for standard output and files
pub type Output = OutputSink<Box<dyn Write>>;

impl<W: Write> OutputSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            missing_newline: false,
        }
    }

    fn supply_newline(&mut self) -> io::Result<()> {
        if self.missing_newline {
            self.missing_newline = false;
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write a record, terminated by delimiter if it was read that way.
    pub fn write_record(&mut self, content: &[u8], chomped: bool, delimiter: u8) -> io::Result<()> {
        self.supply_newline()?;
        self.out.write_all(content)?;
        if chomped {
            self.out.write_all(&[delimiter])
        } else {
            self.missing_newline = true;
            Ok(())
        }
    }

    /// Write text that carries its own termination.
    pub fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.supply_newline()?;
        self.out.write_all(data)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl Output {
    /// Create the standard output sink. Output is flushed after each
    /// cycle when `unbuffered` is set or stdout is a terminal; the
    /// returned flag says whether this is needed.
    pub fn stdout(unbuffered: bool) -> (Self, bool) {
        let stdout = io::stdout();
        let interactive = unbuffered || stdout.is_terminal();
        let sink = Self::new(Box::new(BufWriter::new(stdout)));
        (sink, interactive)
    }
}
