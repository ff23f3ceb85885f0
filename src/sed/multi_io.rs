// Record input from the sequence of input files
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::error_handling::EXIT_BAD_INPUT;
use crate::sed::fast_io::RecordReader;

use std::path::PathBuf;

use uucore::display::Quotable;
use uucore::error::{UResult, USimpleError, strip_errno};
use uucore::show;

/// The records of all input files, read in order.
/// Files that can't be read are reported and skipped.
pub struct Input {
    files: Vec<PathBuf>,
    next_file: usize,             // Index of the next file to open
    reader: Option<RecordReader>, // Reader of the current file
    file_name: String,            // Name of the current file
    delimiter: u8,
    separate: bool,         // True if files are processed separately (-s)
    line_number: usize,     // Number of the last record read
    reset_pending: bool,    // Restart line numbering on the next record
}

impl Input {
    pub fn new(files: Vec<PathBuf>, delimiter: u8, separate: bool) -> Self {
        Self {
            files,
            next_file: 0,
            reader: None,
            file_name: String::new(),
            delimiter,
            separate,
            line_number: 0,
            reset_pending: false,
        }
    }

    /// Open the next readable file, returning false if none remains.
    fn open_next(&mut self) -> bool {
        self.reader = None;
        while let Some(path) = self.files.get(self.next_file) {
            self.next_file += 1;
            match RecordReader::open(path) {
                Ok(reader) => {
                    self.reader = Some(reader);
                    self.file_name = if path.as_os_str() == "-" {
                        "-".to_string()
                    } else {
                        path.to_string_lossy().into_owned()
                    };
                    self.reset_pending = self.separate;
                    return true;
                }
                Err(e) => {
                    show!(USimpleError::new(
                        EXIT_BAD_INPUT,
                        format!("can't read {}: {}", path.quote(), strip_errno(&e)),
                    ));
                }
            }
        }
        false
    }

    /// Read the next record, without its delimiter, into buf.
    /// Return whether it was delimited, or None once all input is consumed.
    pub fn next_record(&mut self, buf: &mut Vec<u8>) -> UResult<Option<bool>> {
        loop {
            if let Some(reader) = self.reader.as_mut() {
                match reader.get_record(buf, self.delimiter) {
                    Ok(Some(chomped)) => {
                        if self.reset_pending {
                            self.reset_pending = false;
                            self.line_number = 0;
                        }
                        self.line_number += 1;
                        return Ok(Some(chomped));
                    }
                    Ok(None) => (),
                    Err(e) => {
                        show!(USimpleError::new(
                            EXIT_BAD_INPUT,
                            format!(
                                "read error on {}: {}",
                                self.file_name.quote(),
                                strip_errno(&e)
                            ),
                        ));
                    }
                }
            }

            if !self.open_next() {
                return Ok(None);
            }
        }
    }

    /// Return true if the last record read is the last one: of its
    /// file when processing files separately, otherwise of all input.
    pub fn is_last_record(&mut self) -> bool {
        self.at_end(self.separate)
    }

    /// Return true if no further records can be read from any file.
    pub fn is_exhausted(&mut self) -> bool {
        self.at_end(false)
    }

    fn at_end(&mut self, per_file: bool) -> bool {
        loop {
            if let Some(reader) = self.reader.as_mut() {
                // A read error here surfaces on the next read.
                if !reader.is_eof().unwrap_or(false) {
                    return false;
                }
                if per_file {
                    return true;
                }
            }

            if !self.open_next() {
                return true;
            }
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn records(input: &mut Input) -> Vec<(String, usize, bool)> {
        let mut result = Vec::new();
        let mut buf = Vec::new();
        while input.next_record(&mut buf).unwrap().is_some() {
            let last = input.is_last_record();
            result.push((
                String::from_utf8(buf.clone()).unwrap(),
                input.line_number(),
                last,
            ));
        }
        result
    }

    fn fixture(files: &[(&str, &str)]) -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempdir().unwrap();
        let paths = files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    #[test]
    fn test_concatenated_files() {
        let (_dir, paths) = fixture(&[("a", "1\n2\n"), ("b", "3\n")]);
        let mut input = Input::new(paths, b'\n', false);
        assert_eq!(
            records(&mut input),
            vec![
                ("1".to_string(), 1, false),
                ("2".to_string(), 2, false),
                ("3".to_string(), 3, true),
            ]
        );
    }

    #[test]
    fn test_separate_files() {
        let (_dir, paths) = fixture(&[("a", "1\n2\n"), ("b", "3\n")]);
        let mut input = Input::new(paths, b'\n', true);
        assert_eq!(
            records(&mut input),
            vec![
                ("1".to_string(), 1, false),
                ("2".to_string(), 2, true),
                ("3".to_string(), 1, true),
            ]
        );
    }

    #[test]
    fn test_last_with_trailing_empty_file() {
        let (_dir, paths) = fixture(&[("a", "1\n"), ("b", "")]);
        let mut input = Input::new(paths, b'\n', false);
        assert_eq!(records(&mut input), vec![("1".to_string(), 1, true)]);
    }

    #[test]
    fn test_unreadable_file_skipped() {
        let (dir, mut paths) = fixture(&[("a", "1\n"), ("c", "3\n")]);
        paths.insert(1, dir.path().join("missing"));
        let mut input = Input::new(paths, b'\n', false);
        assert_eq!(
            records(&mut input),
            vec![("1".to_string(), 1, false), ("3".to_string(), 2, true)]
        );
    }

    #[test]
    fn test_exhausted_across_separate_files() {
        let (_dir, paths) = fixture(&[("a", "1\n"), ("b", "2\n")]);
        let mut input = Input::new(paths, b'\n', true);
        let mut buf = Vec::new();
        input.next_record(&mut buf).unwrap();
        assert!(input.is_last_record());
        assert!(!input.is_exhausted());
        input.next_record(&mut buf).unwrap();
        assert_eq!(buf, b"2");
        assert_eq!(input.line_number(), 1);
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_file_name() {
        let (_dir, paths) = fixture(&[("named", "x\n")]);
        let expected = paths[0].to_string_lossy().into_owned();
        let mut input = Input::new(paths, b'\n', false);
        let mut buf = Vec::new();
        input.next_record(&mut buf).unwrap();
        assert_eq!(input.file_name(), expected);
    }
}
