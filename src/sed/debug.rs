// Annotated program listing and execution trace for --debug
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::command::{
    Address, BranchTarget, Command, CommandData, Program, ReplacementPart, Substitution,
    Transliteration,
};
use crate::sed::named_writer::FileTargets;

use std::fmt::Write;

/// Return the canonical form of an address.
fn address_text(addr: &Address) -> String {
    match addr {
        Address::Line(n) => n.to_string(),
        Address::Last => "$".to_string(),
        Address::Re(re) => format!("/{}/", re.label()),
        Address::RelLine(n) => format!("+{n}"),
    }
}

/// Render bytes of command arguments, escaping the delimiter,
/// backslashes and newlines.
fn escaped(bytes: &[u8], special: &[u8]) -> String {
    let mut result = String::new();
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '\n' => result.push_str("\\n"),
                '\\' => result.push_str("\\\\"),
                c if c.is_ascii() && special.contains(&(c as u8)) => {
                    result.push('\\');
                    result.push(c);
                }
                c => result.push(c),
            }
        }
        for b in chunk.invalid() {
            let _ = write!(result, "\\x{b:02x}");
        }
    }
    result
}

fn replacement_text(subst: &Substitution) -> String {
    let mut result = String::new();
    for part in &subst.replacement.parts {
        match part {
            ReplacementPart::Literal(bytes) => result.push_str(&escaped(bytes, b"/&")),
            ReplacementPart::WholeMatch => result.push('&'),
            ReplacementPart::Group(n) => {
                let _ = write!(result, "\\{n}");
            }
        }
    }
    result
}

fn subst_text(subst: &Substitution, files: &FileTargets) -> String {
    let mut result = format!(
        "s/{}/{}/",
        subst.regex.label(),
        replacement_text(subst)
    );
    if subst.global {
        result.push('g');
    } else if subst.occurrence > 1 {
        let _ = write!(result, "{}", subst.occurrence);
    }
    if subst.print {
        result.push('p');
    }
    if subst.ignore_case {
        result.push('I');
    }
    if let Some(id) = subst.write_file {
        let _ = write!(result, "w {}", files.path(id).display());
    }
    result
}

/// Render the mapping of a y command, listing changed bytes in order
/// followed by changed non-ASCII characters.
fn trans_text(trans: &Transliteration) -> String {
    let mut source = String::new();
    let mut target = String::new();
    for c in (0..=0x7f_u8).map(char::from) {
        let to = trans.lookup(c);
        if to != c {
            source.push(c);
            target.push(to);
        }
    }
    let mut wide: Vec<(char, char)> = trans
        .char_mappings()
        .filter(|(from, _)| !from.is_ascii())
        .collect();
    wide.sort_unstable();
    for (from, to) in wide {
        source.push(from);
        target.push(to);
    }
    format!(
        "y/{}/{}/",
        escaped(source.as_bytes(), b"/"),
        escaped(target.as_bytes(), b"/")
    )
}

/// Return the canonical form of a command.
pub fn command_text(program: &Program, cmd: &Command) -> String {
    let mut result = String::new();
    if let Some(addr1) = &cmd.addr1 {
        result.push_str(&address_text(addr1));
    }
    if let Some(addr2) = &cmd.addr2 {
        result.push(',');
        result.push_str(&address_text(addr2));
    }
    if cmd.non_select {
        result.push('!');
    }

    match &cmd.data {
        CommandData::Substitution(subst) => result.push_str(&subst_text(subst, &program.files)),
        CommandData::Transliteration(trans) => result.push_str(&trans_text(trans)),
        data => {
            result.push(cmd.code);
            match data {
                CommandData::Text(text) => {
                    result.push_str("\\\n");
                    let text = text.strip_suffix(b"\n").unwrap_or(text);
                    result.push_str(&String::from_utf8_lossy(text));
                }
                CommandData::Branch(BranchTarget::Resolved(at)) => {
                    if let Some(CommandData::Label(name)) = program.command(*at).map(|c| &c.data)
                    {
                        let _ = write!(result, " {name}");
                    }
                }
                CommandData::Branch(BranchTarget::Unresolved(name)) => {
                    let _ = write!(result, " {name}");
                }
                CommandData::Label(name) => result.push_str(name),
                CommandData::Number(n) if cmd.code == 'l' || *n != 0 => {
                    let _ = write!(result, " {n}");
                }
                CommandData::ReadFile(id) | CommandData::WriteFile(id) => {
                    let _ = write!(result, " {}", program.files.path(*id).display());
                }
                _ => (),
            }
        }
    }
    result
}

/// Return the listing of the program, one command per line, with
/// block contents indented.
pub fn program_listing(program: &Program) -> String {
    let mut result = String::from("SED PROGRAM:\n");
    list_sequence(program, 0, 1, &mut result);
    result
}

fn list_sequence(program: &Program, sequence: usize, depth: usize, out: &mut String) {
    for cmd in &program.sequences[sequence].commands {
        // The closing brace lines up with its opening one.
        let indent = if cmd.code == '}' { depth - 1 } else { depth };
        for line in command_text(program, cmd).lines() {
            let _ = writeln!(out, "{:width$}{line}", "", width = indent * 2);
        }
        if let CommandData::Block(body) = cmd.data {
            list_sequence(program, body, depth + 1, out);
        }
    }
}

/// Return the trace line identifying the record about to be processed.
pub fn input_text(file_name: &str, line_number: usize) -> String {
    let name = if file_name == "-" { "STDIN" } else { file_name };
    format!("INPUT:   '{name}' line {line_number}\n")
}

/// Return the trace line showing the pattern space.
pub fn pattern_text(pattern: &[u8]) -> String {
    format!("PATTERN: {}\n", escaped(pattern, b""))
}

/// Return the trace line of an executed command.
pub fn trace_command(program: &Program, cmd: &Command) -> String {
    format!("COMMAND: {}\n", command_text(program, cmd))
}

pub const END_OF_CYCLE: &str = "END-OF-CYCLE:\n";
