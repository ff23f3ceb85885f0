// Process the input records with the compiled program
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::command::{
    Address, BranchTarget, Command, CommandData, Cursor, ProcessingOptions, Program,
};
use crate::sed::debug;
use crate::sed::error_handling::{fatal_error, runtime_error};
use crate::sed::fast_io::Output;
use crate::sed::multi_io::Input;
use crate::sed::named_writer::{FileId, Target};
use crate::sed::space::Buffers;
use crate::sed::substitution::substitute;

use std::io;
use std::path::PathBuf;

use uucore::error::{UResult, set_exit_code, strip_errno};

/// How a cycle through the program ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Continue,                   // End of script: print the pattern space
    Delete,                     // d, c: no autoprint
    Restart,                    // D: rerun on what remains without reading
    Quit { autoprint: bool },   // q, Q: stop processing
}

/// Interpreter state that persists across cycles
struct Context {
    input: Input,
    output: Output,
    buffers: Buffers,
    record: Vec<u8>,   // Scratch buffer for N
    substituted: bool, // A substitution was made since the last t or read
    delimiter: u8,
    quiet: bool,
    posix: bool,
    debug: bool,
}

fn output_error(e: io::Error) -> UResult<()> {
    fatal_error(format!(
        "couldn't write to standard output: {}",
        strip_errno(&e)
    ))
}

impl Context {
    fn write_bytes(&mut self, data: &[u8]) -> UResult<()> {
        self.output.write_bytes(data).or_else(output_error)
    }

    fn write_pattern(&mut self) -> UResult<()> {
        let pattern = &self.buffers.pattern;
        self.output
            .write_record(&pattern.content, pattern.chomped, self.delimiter)
            .or_else(output_error)
    }

    /// Output the text queued by a and r.
    fn flush_append(&mut self) -> UResult<()> {
        for text in self.buffers.append.drain(..) {
            self.output.write_bytes(&text).or_else(output_error)?;
        }
        Ok(())
    }

    /// Output the queued text and read the next record for n and N.
    /// Return false if all input has been consumed.
    fn read_next(&mut self, append: bool) -> UResult<bool> {
        if self.input.is_exhausted() {
            return Ok(false);
        }
        self.flush_append()?;

        let chomped = if append {
            match self.input.next_record(&mut self.record)? {
                Some(chomped) => {
                    self.buffers
                        .pattern
                        .append_record(&self.record, chomped, self.delimiter);
                    chomped
                }
                None => return Ok(false),
            }
        } else {
            match self.input.next_record(&mut self.buffers.pattern.content)? {
                Some(chomped) => chomped,
                None => return Ok(false),
            }
        };
        self.buffers.pattern.chomped = chomped;
        self.substituted = false;
        Ok(true)
    }
}

/// Return true if the address matches the current record.
fn match_address(addr: &Address, ctx: &mut Context) -> UResult<bool> {
    match addr {
        Address::Line(n) => Ok(ctx.input.line_number() == *n),
        Address::Last => Ok(ctx.input.is_last_record()),
        Address::Re(re) => re.is_match(&ctx.buffers.pattern.content),
        // Only valid as the end of a range.
        Address::RelLine(_) => Ok(false),
    }
}

/// Return true if the command applies to the current record,
/// updating the command's range state.
fn applies(cmd: &mut Command, ctx: &mut Context) -> UResult<bool> {
    let selected = match (&cmd.addr1, &cmd.addr2) {
        (None, _) => true,
        (Some(addr1), None) => match_address(addr1, ctx)?,
        (Some(addr1), Some(addr2)) => {
            let line = ctx.input.line_number();
            if cmd.range_active {
                let ended = match addr2 {
                    Address::Line(n) => line >= *n,
                    Address::RelLine(_) => cmd.range_end.is_some_and(|end| line >= end),
                    _ => match_address(addr2, ctx)?,
                };
                if ended {
                    cmd.range_active = false;
                    cmd.range_end = None;
                }
                true
            } else if match_address(addr1, ctx)? {
                // A regex end is only checked on the following records.
                cmd.range_active = match addr2 {
                    Address::Line(n) => *n > line,
                    Address::RelLine(n) => {
                        cmd.range_end = Some(line + n);
                        *n > 0
                    }
                    Address::Last => !ctx.input.is_last_record(),
                    Address::Re(_) => true,
                };
                true
            } else {
                false
            }
        }
    };
    Ok(selected != cmd.non_select)
}

/// Append the unambiguous form of content, as output by l, to out.
/// Lines are wrapped to fit within width, unless it is 0 or 1.
fn list_escaped(content: &[u8], width: usize, out: &mut Vec<u8>) {
    let mut column = 0;
    for &b in content {
        let escaped = match b {
            b'\\' => b"\\\\".to_vec(),
            0x07 => b"\\a".to_vec(),
            0x08 => b"\\b".to_vec(),
            0x0c => b"\\f".to_vec(),
            b'\n' => b"\\n".to_vec(),
            b'\r' => b"\\r".to_vec(),
            b'\t' => b"\\t".to_vec(),
            0x0b => b"\\v".to_vec(),
            b' '..=b'~' => vec![b],
            _ => format!("\\{b:02x}").into_bytes(),
        };
        if width > 1 && column + escaped.len() > width - 1 {
            out.extend_from_slice(b"\\\n");
            column = 0;
        }
        column += escaped.len();
        out.extend_from_slice(&escaped);
    }
    out.extend_from_slice(b"$\n");
}

/// Write the pattern space to the file registered as id.
fn write_to_file(program: &mut Program, id: FileId, ctx: &mut Context) -> UResult<()> {
    let pattern = &ctx.buffers.pattern;
    match program.files.get_mut(id) {
        Target::Writer(writer) => writer.write_record(&pattern.content, pattern.chomped, ctx.delimiter),
        Target::Stdout => ctx.write_pattern(),
        Target::Reader(_) => fatal_error("internal error: writing to a file opened for reading"),
    }
}

/// Run the program once over the pattern space.
fn execute(program: &mut Program, ctx: &mut Context) -> UResult<CycleEnd> {
    let mut cursor = Cursor::start_of(0);

    loop {
        let sequence = &program.sequences[cursor.sequence];
        if cursor.index >= sequence.commands.len() {
            // Blocks end with '}', so this is the end of the script.
            match sequence.parent {
                Some(parent) => {
                    cursor = parent.next();
                    continue;
                }
                None => return Ok(CycleEnd::Continue),
            }
        }

        let cmd = &mut program.sequences[cursor.sequence].commands[cursor.index];
        if !applies(cmd, ctx)? {
            cursor = cursor.next();
            continue;
        }

        let cmd = &program.sequences[cursor.sequence].commands[cursor.index];
        if ctx.debug {
            let trace = debug::trace_command(program, cmd);
            ctx.write_bytes(trace.as_bytes())?;
        }

        let mut next = cursor.next();
        match (cmd.code, &cmd.data) {
            ('{', CommandData::Block(body)) => next = Cursor::start_of(*body),
            ('}', _) => match program.sequences[cursor.sequence].parent {
                Some(parent) => next = parent.next(),
                None => return fatal_error("internal error: `}' outside a block"),
            },
            (':', _) => (),
            ('=', _) => {
                let text = format!("{}\n", ctx.input.line_number());
                ctx.write_bytes(text.as_bytes())?;
            }
            ('a', CommandData::Text(text)) => ctx.buffers.append.push(text.clone()),
            ('b', CommandData::Branch(target)) => match target {
                BranchTarget::Resolved(at) => next = *at,
                BranchTarget::EndOfScript => return Ok(CycleEnd::Continue),
                BranchTarget::Unresolved(name) => {
                    return runtime_error(&cmd.location, format!("unresolved label `{name}'"));
                }
            },
            ('c', CommandData::Text(text)) => {
                // Inside a range the text is output only at its end.
                if !cmd.range_active {
                    ctx.write_bytes(text)?;
                }
                return Ok(CycleEnd::Delete);
            }
            ('d', _) => return Ok(CycleEnd::Delete),
            ('D', _) => {
                let pattern = &mut ctx.buffers.pattern;
                // An empty remainder ends the cycle like d.
                return Ok(
                    if pattern.delete_first_segment(ctx.delimiter) && !pattern.content.is_empty() {
                        CycleEnd::Restart
                    } else {
                        CycleEnd::Delete
                    },
                );
            }
            ('g', _) => ctx.buffers.hold_to_pattern(),
            ('G', _) => ctx.buffers.append_hold(ctx.delimiter),
            ('h', _) => ctx.buffers.pattern_to_hold(),
            ('H', _) => ctx.buffers.append_pattern(ctx.delimiter),
            ('i', CommandData::Text(text)) => ctx.write_bytes(text)?,
            ('l', CommandData::Number(width)) => {
                let mut listing = Vec::new();
                list_escaped(&ctx.buffers.pattern.content, *width, &mut listing);
                ctx.write_bytes(&listing)?;
            }
            ('n', _) => {
                if ctx.input.is_exhausted() {
                    return Ok(CycleEnd::Continue);
                }
                if !ctx.quiet {
                    ctx.write_pattern()?;
                }
                if !ctx.read_next(false)? {
                    return Ok(CycleEnd::Delete);
                }
            }
            ('N', _) => {
                if !ctx.read_next(true)? {
                    // GNU prints the pattern space; POSIX discards it.
                    return Ok(if ctx.posix {
                        CycleEnd::Delete
                    } else {
                        CycleEnd::Continue
                    });
                }
            }
            ('p', _) => ctx.write_pattern()?,
            ('P', _) => {
                let pattern = &ctx.buffers.pattern;
                let segment = pattern.first_segment(ctx.delimiter);
                let chomped = segment.len() < pattern.content.len() || pattern.chomped;
                ctx.output
                    .write_record(segment, chomped, ctx.delimiter)
                    .or_else(output_error)?;
            }
            ('q', CommandData::Number(code)) | ('Q', CommandData::Number(code)) => {
                if *code != 0 {
                    let code = i32::try_from(*code).or_else(|_| {
                        runtime_error(&cmd.location, format!("exit code {code} out of range"))
                    })?;
                    set_exit_code(code);
                }
                return Ok(CycleEnd::Quit {
                    autoprint: cmd.code == 'q',
                });
            }
            ('r', CommandData::ReadFile(id)) => {
                let id = *id;
                match program.files.get_mut(id) {
                    Target::Reader(reader) => {
                        if let Some(content) = reader.read_all()? {
                            ctx.buffers.append.push(content);
                        }
                    }
                    _ => return fatal_error("internal error: reading from an output file"),
                }
            }
            ('s', CommandData::Substitution(subst)) => {
                if substitute(subst, &mut ctx.buffers.pattern)? > 0 {
                    ctx.substituted = true;
                    let (print, write_file) = (subst.print, subst.write_file);
                    if print {
                        ctx.write_pattern()?;
                    }
                    if let Some(id) = write_file {
                        write_to_file(program, id, ctx)?;
                    }
                }
            }
            ('t', CommandData::Branch(target)) => {
                if ctx.substituted {
                    ctx.substituted = false;
                    match target {
                        BranchTarget::Resolved(at) => next = *at,
                        BranchTarget::EndOfScript => return Ok(CycleEnd::Continue),
                        BranchTarget::Unresolved(name) => {
                            return runtime_error(
                                &cmd.location,
                                format!("unresolved label `{name}'"),
                            );
                        }
                    }
                }
            }
            ('w', CommandData::WriteFile(id)) => {
                let id = *id;
                write_to_file(program, id, ctx)?;
            }
            ('x', _) => ctx.buffers.exchange(),
            ('y', CommandData::Transliteration(trans)) => {
                trans.apply(&mut ctx.buffers.pattern.content);
            }
            (code, _) => {
                return runtime_error(
                    &cmd.location,
                    format!("internal error: unexpected command `{code}'"),
                );
            }
        }
        cursor = next;
    }
}

/// Process the records of input through the program, sending the
/// results to output.
pub fn process(
    program: &mut Program,
    input: Input,
    output: Output,
    flush_each_cycle: bool,
    options: &ProcessingOptions,
) -> UResult<()> {
    let mut ctx = Context {
        input,
        output,
        buffers: Buffers::new(),
        record: Vec::new(),
        substituted: false,
        delimiter: options.delimiter(),
        quiet: options.quiet,
        posix: options.posix,
        debug: options.debug,
    };

    if ctx.debug {
        ctx.write_bytes(debug::program_listing(program).as_bytes())?;
    }

    let mut restart = false;
    loop {
        if !restart {
            match ctx.input.next_record(&mut ctx.buffers.pattern.content)? {
                Some(chomped) => ctx.buffers.pattern.chomped = chomped,
                None => break,
            }
            ctx.substituted = false;
        }

        if ctx.debug {
            let trace = debug::input_text(ctx.input.file_name(), ctx.input.line_number())
                + &debug::pattern_text(&ctx.buffers.pattern.content);
            ctx.write_bytes(trace.as_bytes())?;
        }

        let end = execute(program, &mut ctx)?;
        if ctx.debug {
            ctx.write_bytes(debug::END_OF_CYCLE.as_bytes())?;
        }

        let autoprint = match end {
            CycleEnd::Continue => true,
            CycleEnd::Quit { autoprint } => autoprint,
            CycleEnd::Delete | CycleEnd::Restart => false,
        };
        if autoprint && !ctx.quiet {
            ctx.write_pattern()?;
        }
        ctx.flush_append()?;
        if flush_each_cycle {
            ctx.output.flush().or_else(output_error)?;
        }

        restart = end == CycleEnd::Restart;
        if let CycleEnd::Quit { .. } = end {
            break;
        }
    }

    ctx.output.flush().or_else(output_error)?;
    program.files.flush_all()
}

/// Process all input files, writing to the standard output.
pub fn process_all_files(
    program: &mut Program,
    files: Vec<PathBuf>,
    options: &ProcessingOptions,
) -> UResult<()> {
    let (output, interactive) = Output::stdout(options.unbuffered);
    let input = Input::new(files, options.delimiter(), options.separate);
    process(program, input, output, interactive, options)
}
