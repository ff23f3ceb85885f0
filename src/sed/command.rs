// Definitions for the compiled code data structures
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::error_handling::ScriptLocation;
use crate::sed::fast_regex::{Captures, Regex};
use crate::sed::named_writer::{FileId, FileTargets};

use std::collections::HashMap;
use std::str;

/// Default wrapping width of the `l` command
pub const DEFAULT_LINE_LENGTH: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Compilation and processing options provided mostly through the
/// command-line interface
pub struct ProcessingOptions {
    pub debug: bool,
    pub regex_extended: bool,
    pub length: usize,
    pub quiet: bool,
    pub posix: bool,
    pub separate: bool,
    pub sandbox: bool,
    pub unbuffered: bool,
    pub null_data: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            debug: false,
            regex_extended: false,
            length: DEFAULT_LINE_LENGTH,
            quiet: false,
            posix: false,
            separate: false,
            sandbox: false,
            unbuffered: false,
            null_data: false,
        }
    }
}

impl ProcessingOptions {
    /// The byte that terminates input and output records.
    pub fn delimiter(&self) -> u8 {
        if self.null_data { b'\0' } else { b'\n' }
    }
}

#[derive(Debug, Clone)]
/// Types of address specifications that precede commands
pub enum Address {
    Line(usize),    // Specific line
    Last,           // Last line: $
    Re(Regex),      // Line that matches the regex
    RelLine(usize), // addr1,+N: N lines after the range start
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single part of an RE replacement
pub enum ReplacementPart {
    Literal(Vec<u8>), // Normal text
    WholeMatch,       // & or \0
    Group(usize),     // \1 to \9
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// All specified replacements for an RE
pub struct ReplacementTemplate {
    pub parts: Vec<ReplacementPart>,
    pub max_group_number: usize, // Highest used group number (e.g. 8 for \8)
}

impl ReplacementTemplate {
    /// Construct from the parts
    pub fn new(parts: Vec<ReplacementPart>) -> Self {
        let max_group_number = parts
            .iter()
            .filter_map(|part| match part {
                ReplacementPart::Group(n) => Some(*n),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            parts,
            max_group_number,
        }
    }

    /// Append to out the replacement for the match described by caps
    /// within haystack. Groups that did not participate expand to nothing.
    pub fn apply_captures(&self, haystack: &[u8], caps: &Captures, out: &mut Vec<u8>) {
        for part in &self.parts {
            let group = match part {
                ReplacementPart::Literal(s) => {
                    out.extend_from_slice(s);
                    continue;
                }
                ReplacementPart::WholeMatch => caps.get(0),
                ReplacementPart::Group(n) => caps.get(*n),
            };
            if let Some(m) = group {
                out.extend_from_slice(&haystack[m.start()..m.end()]);
            }
        }
    }
}

#[derive(Debug, Clone)]
/// Substitute command
pub struct Substitution {
    pub regex: Regex,                     // Regular expression
    pub replacement: ReplacementTemplate, // Specified broken-down replacement
    pub global: bool,                     // True if 'g' flag
    pub occurrence: usize,                // Which occurrence to substitute (1-based)
    pub print: bool,                      // True if 'p' flag
    pub ignore_case: bool,                // True if 'I' flag
    pub write_file: Option<FileId>,       // Target of the 'w' flag
}

#[derive(Debug, Clone)]
/// Transliteration command (y)
pub struct Transliteration {
    table: [u8; 256],
    // Complete mapping, needed only when non-ASCII characters take part.
    chars: HashMap<char, char>,
}

impl Default for Transliteration {
    /// Create the identity mapping.
    fn default() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            table,
            chars: HashMap::new(),
        }
    }
}

impl Transliteration {
    /// Create through character mappings from `source` to `target`,
    /// which must have the same number of characters.
    pub fn from_strings(source: &str, target: &str) -> Self {
        let mut result = Self::default();
        let multibyte = !(source.is_ascii() && target.is_ascii());

        for (from, to) in source.chars().zip(target.chars()) {
            if from.is_ascii() && to.is_ascii() {
                result.table[from as usize] = to as u8;
            }
            if multibyte {
                result.chars.insert(from, to);
            }
        }
        result
    }

    /// Look up a character transliteration.
    pub fn lookup(&self, ch: char) -> char {
        if let Some(to) = self.chars.get(&ch) {
            *to
        } else if ch.is_ascii() {
            self.table[ch as usize] as char
        } else {
            ch
        }
    }

    /// Iterate over the mappings of individual characters, which are
    /// kept only when non-ASCII characters take part.
    pub fn char_mappings(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.chars.iter().map(|(from, to)| (*from, *to))
    }

    /// Transliterate content in place.
    pub fn apply(&self, content: &mut Vec<u8>) {
        if !self.chars.is_empty()
            && let Ok(text) = str::from_utf8(content)
        {
            let mapped: String = text.chars().map(|c| self.lookup(c)).collect();
            *content = mapped.into_bytes();
            return;
        }

        for b in content.iter_mut() {
            *b = self.table[*b as usize];
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Position of a command: its sequence and its index within it
pub struct Cursor {
    pub sequence: usize,
    pub index: usize,
}

impl Cursor {
    /// Position of the first command of the specified sequence
    pub fn start_of(sequence: usize) -> Self {
        Self { sequence, index: 0 }
    }

    /// Position of the command following this one
    pub fn next(self) -> Self {
        Self {
            sequence: self.sequence,
            index: self.index + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a b or t command transfers control
pub enum BranchTarget {
    Unresolved(String), // Label name before backpatching
    Resolved(Cursor),   // The label's position
    EndOfScript,        // No label: end the cycle
}

#[derive(Debug, Clone)]
/// Command-specific data
pub enum CommandData {
    None,
    Block(usize),                          // Child sequence of '{'
    Branch(BranchTarget),                  // Target of 'b', 't'
    Label(String),                         // Label name of ':'
    Number(usize),                         // Number for 'l', 'q', 'Q'
    ReadFile(FileId),                      // File for 'r'
    Substitution(Box<Substitution>),       // Substitute command 's'
    Text(Vec<u8>),                         // Text for 'a', 'c', 'i'
    Transliteration(Box<Transliteration>), // Transliteration command 'y'
    WriteFile(FileId),                     // File for 'w'
}

#[derive(Debug, Clone)]
/// An internally compiled command.
pub struct Command {
    pub code: char,                 // Command code
    pub addr1: Option<Address>,     // Start address
    pub addr2: Option<Address>,     // End address
    pub non_select: bool,           // True if '!'
    pub range_active: bool,         // True inside an address range
    pub range_end: Option<usize>,   // Last line of an active addr1,+N range
    pub data: CommandData,          // Command-specific data
    pub location: ScriptLocation,   // Command's definition location
}

impl Default for Command {
    fn default() -> Self {
        Command {
            code: '_',
            addr1: None,
            addr2: None,
            non_select: false,
            range_active: false,
            range_end: None,
            data: CommandData::None,
            location: ScriptLocation::default(),
        }
    }
}

impl Command {
    /// Construct a command defined at the specified location.
    pub fn at_location(location: ScriptLocation) -> Self {
        Command {
            location,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
/// An ordered list of commands; nested blocks record the '{' command
/// that owns them so control can return after their end.
pub struct Sequence {
    pub commands: Vec<Command>,
    pub parent: Option<Cursor>,
}

#[derive(Debug)]
/// The compiled script: sequence 0 is the top level, the others are
/// the bodies of '{' blocks.
pub struct Program {
    pub sequences: Vec<Sequence>,
    pub files: FileTargets,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            sequences: vec![Sequence::default()],
            files: FileTargets::default(),
        }
    }
}

impl Program {
    /// Add an empty block body owned by the '{' at parent.
    pub fn add_sequence(&mut self, parent: Cursor) -> usize {
        self.sequences.push(Sequence {
            commands: Vec::new(),
            parent: Some(parent),
        });
        self.sequences.len() - 1
    }

    pub fn command(&self, at: Cursor) -> Option<&Command> {
        self.sequences.get(at.sequence)?.commands.get(at.index)
    }

    pub fn command_mut(&mut self, at: Cursor) -> Option<&mut Command> {
        self.sequences
            .get_mut(at.sequence)?
            .commands
            .get_mut(at.index)
    }

    /// Total number of commands, including those in blocks.
    pub fn len(&self) -> usize {
        self.sequences.iter().map(|s| s.commands.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Return the captures for the RE applied to the specified input
    fn caps_for(re: &str, input: &[u8]) -> Captures {
        Regex::new(re)
            .unwrap()
            .captures_at(input, 0)
            .unwrap()
            .expect("captures")
    }

    fn expand(template: &ReplacementTemplate, re: &str, input: &[u8]) -> Vec<u8> {
        let caps = caps_for(re, input);
        let mut out = Vec::new();
        template.apply_captures(input, &caps, &mut out);
        out
    }

    #[test]
    // s/foo//
    fn test_empty_template() {
        let template = ReplacementTemplate::default();
        assert_eq!(expand(&template, "foo", b"foo"), b"");
    }

    #[test]
    // s/foo[0-9]*/got: &/
    fn test_whole_match() {
        let template = ReplacementTemplate::new(vec![
            ReplacementPart::Literal(b"got: ".to_vec()),
            ReplacementPart::WholeMatch,
        ]);
        assert_eq!(expand(&template, "foo[0-9]*", b"xfoo42"), b"got: foo42");
    }

    #[test]
    // s/\([a-z]*\):\([0-9]*\)/\2=\1/
    fn test_groups() {
        let template = ReplacementTemplate::new(vec![
            ReplacementPart::Group(2),
            ReplacementPart::Literal(b"=".to_vec()),
            ReplacementPart::Group(1),
        ]);
        assert_eq!(template.max_group_number, 2);
        assert_eq!(
            expand(&template, "([a-z]*):([0-9]*)", b"key:123"),
            b"123=key"
        );
    }

    #[test]
    // s/a\(x\)\{0,1\}b/[\1]/
    fn test_unmatched_group_is_empty() {
        let template = ReplacementTemplate::new(vec![
            ReplacementPart::Literal(b"[".to_vec()),
            ReplacementPart::Group(1),
            ReplacementPart::Literal(b"]".to_vec()),
        ]);
        assert_eq!(expand(&template, "a(x)?b", b"ab"), b"[]");
    }

    #[test]
    fn test_max_group_number_without_groups() {
        let template = ReplacementTemplate::new(vec![
            ReplacementPart::Literal(b"no".to_vec()),
            ReplacementPart::WholeMatch,
        ]);
        assert_eq!(template.max_group_number, 0);
    }

    // Transliteration
    #[test]
    fn test_identity() {
        let t = Transliteration::default();
        let mut content = b"hello \xff world".to_vec();
        t.apply(&mut content);
        assert_eq!(content, b"hello \xff world");
    }

    #[test]
    fn test_ascii_table() {
        let t = Transliteration::from_strings("abc", "xyz");
        assert!(t.chars.is_empty());
        let mut content = b"aabbcc-d".to_vec();
        t.apply(&mut content);
        assert_eq!(content, b"xxyyzz-d");
    }

    #[test]
    fn test_applying_twice_is_per_byte() {
        let t = Transliteration::from_strings("ab", "ba");
        let mut content = b"abc".to_vec();
        t.apply(&mut content);
        assert_eq!(content, b"bac");
        t.apply(&mut content);
        assert_eq!(content, b"abc");
    }

    #[test]
    fn test_multibyte() {
        let t = Transliteration::from_strings("aé🦀", "Ae c");
        assert_eq!(t.lookup('é'), 'e');
        assert_eq!(t.lookup('🦀'), 'c');
        assert_eq!(t.lookup('z'), 'z');

        let mut content = "café 🦀a".as_bytes().to_vec();
        t.apply(&mut content);
        assert_eq!(content, "cAfe cA".as_bytes());
    }

    #[test]
    fn test_multibyte_invalid_utf8_falls_back_to_ascii() {
        let t = Transliteration::from_strings("aé", "bE");
        let mut content = b"a\xff".to_vec();
        t.apply(&mut content);
        assert_eq!(content, b"b\xff");
    }

    #[test]
    fn test_last_mapping_wins() {
        let t = Transliteration::from_strings("aa", "12");
        assert_eq!(t.lookup('a'), '2');
    }

    // Program
    #[test]
    fn test_program_sequences() {
        let mut program = Program::default();
        assert!(program.is_empty());

        program.sequences[0].commands.push(Command {
            code: '{',
            ..Default::default()
        });
        let child = program.add_sequence(Cursor::start_of(0));
        assert_eq!(child, 1);
        program.sequences[child].commands.push(Command {
            code: 'p',
            ..Default::default()
        });

        assert_eq!(program.len(), 2);
        assert_eq!(program.command(Cursor::start_of(1)).unwrap().code, 'p');
        assert!(program.command(Cursor::start_of(1).next()).is_none());
        assert_eq!(program.sequences[1].parent, Some(Cursor::start_of(0)));
    }

    #[test]
    fn test_delimiter() {
        let mut options = ProcessingOptions::default();
        assert_eq!(options.delimiter(), b'\n');
        options.null_data = true;
        assert_eq!(options.delimiter(), b'\0');
    }
}
