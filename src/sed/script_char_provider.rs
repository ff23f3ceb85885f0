// Walk over the characters of a single script line
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

/// Cursor over one (newline-stripped) script line.
#[derive(Debug, Default)]
pub struct ScriptCharProvider {
    chars: Vec<char>,
    pos: usize,
}

impl ScriptCharProvider {
    pub fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    /// Move one character forward, stopping at the end of the line.
    pub fn advance(&mut self) {
        if !self.eol() {
            self.pos += 1;
        }
    }

    /// Move `n` characters back, stopping at the start of the line.
    pub fn retreat(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Return the character under the cursor.
    /// Callers check `eol()` first; reading past the end panics.
    pub fn current(&self) -> char {
        self.chars[self.pos]
    }

    /// Return the character following the current one, if any.
    pub fn peek(&self) -> Option<char> {
        self.lookahead(1)
    }

    /// Return the character `n` positions after the current one, if any.
    pub fn lookahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    pub fn eol(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip blanks (spaces and tabs; the line holds no newlines).
    pub fn eat_spaces(&mut self) {
        while !self.eol() && self.current().is_whitespace() {
            self.pos += 1;
        }
    }

    /// Consume and return everything up to the end of the line.
    pub fn take_rest(&mut self) -> String {
        let rest: String = self.chars[self.pos..].iter().collect();
        self.pos = self.chars.len();
        rest
    }

    /// Zero-based cursor position.
    pub fn get_pos(&self) -> usize {
        self.pos
    }
}
