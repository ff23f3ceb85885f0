// The pattern, hold, and append buffers
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use memchr::memchr;
use std::mem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A pattern or hold space
pub struct Space {
    pub content: Vec<u8>,
    pub chomped: bool, // True if the record ended with a delimiter
}

impl Space {
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            chomped: true,
        }
    }

    /// Replace the contents with those of another space.
    pub fn copy_from(&mut self, other: &Space) {
        self.content.clear();
        self.content.extend_from_slice(&other.content);
        self.chomped = other.chomped;
    }

    /// Append the delimiter and the contents of another space.
    pub fn append_from(&mut self, other: &Space, delimiter: u8) {
        self.content.push(delimiter);
        self.content.extend_from_slice(&other.content);
    }

    /// Append the delimiter and a newly read record.
    pub fn append_record(&mut self, record: &[u8], chomped: bool, delimiter: u8) {
        self.content.push(delimiter);
        self.content.extend_from_slice(record);
        self.chomped = chomped;
    }

    /// Return the part up to the first delimiter, or everything.
    pub fn first_segment(&self, delimiter: u8) -> &[u8] {
        match memchr(delimiter, &self.content) {
            Some(end) => &self.content[..end],
            None => &self.content,
        }
    }

    /// Delete up to and including the first delimiter.
    /// Return false, leaving the space intact, if there is none.
    pub fn delete_first_segment(&mut self, delimiter: u8) -> bool {
        match memchr(delimiter, &self.content) {
            Some(end) => {
                self.content.drain(..=end);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
/// The buffers operated on by the execution engine
pub struct Buffers {
    pub pattern: Space,
    pub hold: Space,
    pub append: Vec<Vec<u8>>, // Output queued by a and r
}

impl Buffers {
    pub fn new() -> Self {
        Self {
            pattern: Space::new(),
            hold: Space::new(),
            append: Vec::new(),
        }
    }

    /// g: copy hold space to pattern space.
    pub fn hold_to_pattern(&mut self) {
        let chomped = self.pattern.chomped;
        self.pattern.copy_from(&self.hold);
        self.pattern.chomped = chomped;
    }

    /// G: append delimiter and hold space to pattern space.
    pub fn append_hold(&mut self, delimiter: u8) {
        self.pattern.append_from(&self.hold, delimiter);
    }

    /// h: copy pattern space to hold space.
    pub fn pattern_to_hold(&mut self) {
        self.hold.copy_from(&self.pattern);
        self.hold.chomped = true;
    }

    /// H: append delimiter and pattern space to hold space.
    pub fn append_pattern(&mut self, delimiter: u8) {
        self.hold.append_from(&self.pattern, delimiter);
    }

    /// x: exchange pattern and hold space.
    pub fn exchange(&mut self) {
        mem::swap(&mut self.pattern, &mut self.hold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(pattern: &[u8], hold: &[u8]) -> Buffers {
        let mut b = Buffers::new();
        b.pattern.content = pattern.to_vec();
        b.hold.content = hold.to_vec();
        b
    }

    #[test]
    fn test_copy() {
        let mut b = buffers(b"pat", b"hold");
        b.hold_to_pattern();
        assert_eq!(b.pattern.content, b"hold");

        let mut b = buffers(b"pat", b"hold");
        b.pattern_to_hold();
        assert_eq!(b.hold.content, b"pat");
        assert_eq!(b.pattern.content, b"pat");
    }

    #[test]
    fn test_append() {
        let mut b = buffers(b"pat", b"hold");
        b.append_hold(b'\n');
        assert_eq!(b.pattern.content, b"pat\nhold");

        let mut b = buffers(b"pat", b"");
        b.append_pattern(b'\n');
        assert_eq!(b.hold.content, b"\npat");
    }

    #[test]
    fn test_exchange() {
        let mut b = buffers(b"pat", b"hold");
        b.exchange();
        assert_eq!(b.pattern.content, b"hold");
        assert_eq!(b.hold.content, b"pat");
    }

    #[test]
    fn test_g_keeps_missing_newline() {
        let mut b = buffers(b"last", b"held");
        b.pattern.chomped = false;
        b.hold_to_pattern();
        assert!(!b.pattern.chomped);
    }

    #[test]
    fn test_segments() {
        let mut s = Space::new();
        s.content = b"one\ntwo\nthree".to_vec();
        assert_eq!(s.first_segment(b'\n'), b"one");
        assert!(s.delete_first_segment(b'\n'));
        assert_eq!(s.content, b"two\nthree");
        assert!(s.delete_first_segment(b'\n'));
        assert!(!s.delete_first_segment(b'\n'));
        assert_eq!(s.content, b"three");
        assert_eq!(s.first_segment(b'\n'), b"three");
    }

    #[test]
    fn test_append_record() {
        let mut s = Space::new();
        s.content = b"a".to_vec();
        s.append_record(b"b", false, b'\n');
        assert_eq!(s.content, b"a\nb");
        assert!(!s.chomped);
    }
}
