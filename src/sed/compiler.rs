// Compile the scripts into the internal representation of commands
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
    ReplacementPart, ReplacementTemplate, Substitution, Transliteration,
};
use crate::sed::delimited_parser::{parse_char_escape, parse_regex, parse_transliteration};
use crate::sed::error_handling::{ScriptLocation, compilation_error, semantic_error};
use crate::sed::fast_regex::Regex;
use crate::sed::label_resolver::LabelResolver;
use crate::sed::regex_translator::translate;
use crate::sed::script_char_provider::ScriptCharProvider;
use crate::sed::script_line_provider::{ScriptLineProvider, ScriptValue};

use std::mem;
use std::path::PathBuf;

use uucore::error::UResult;

const UNTERMINATED_ADDRESS: &str = "unterminated address regex";
const UNTERMINATED_S: &str = "unterminated `s' command";

// Handling required after processing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandHandling {
    GetNext,  // Get next command and process that: !
    Return,   // Return from the sequence parser: }
    Continue, // Continue sequence parsing: all other commands
}

/// The type of functions that compile individual commands
type CommandHandler = fn(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling>;

// Command specification
#[derive(Debug, Clone, Copy)]
struct CommandSpec {
    n_addr: usize,           // Number of supported addresses
    handler: CommandHandler, // Argument-specific command compilation handler
}

/// Data accumulated while compiling
struct CompileState<'a> {
    program: Program,
    options: &'a mut ProcessingOptions,
    labels: LabelResolver,
    last_regex: Option<Regex>,         // Reused by an empty regex
    current: Cursor,                   // Where the compiled command will go
    open_blocks: Vec<ScriptLocation>,  // Locations of unclosed '{'
    lines_read: usize,                 // Script lines read so far
}

/// Compile the scripts into an executable program.
/// Options may be updated by the script (`#n`).
pub fn compile(scripts: Vec<ScriptValue>, options: &mut ProcessingOptions) -> UResult<Program> {
    let mut lines = ScriptLineProvider::new(scripts);
    let mut line = ScriptCharProvider::new("");
    let mut state = CompileState {
        program: Program::default(),
        options,
        labels: LabelResolver::default(),
        last_regex: None,
        current: Cursor::start_of(0),
        open_blocks: Vec::new(),
        lines_read: 0,
    };

    compile_sequence(&mut lines, &mut line, &mut state, 0)?;

    if let Some(location) = state.open_blocks.first() {
        return semantic_error(location, "unmatched `{'");
    }

    let CompileState {
        mut program,
        labels,
        ..
    } = state;
    labels.resolve(&mut program)?;

    // Comment-out the following to show the compiled script.
    #[cfg(any())]
    dbg!(&program);

    Ok(program)
}

/// Compile commands into the specified sequence until its closing
/// `}` or the end of the script.
fn compile_sequence(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    state: &mut CompileState,
    sequence: usize,
) -> UResult<()> {
    loop {
        line.eat_spaces();

        if line.eol() {
            match lines.next_line()? {
                None => return Ok(()),
                Some(line_string) => {
                    // According to POSIX: "If the first two characters in
                    // the script are "#n", the default output shall be
                    // suppressed". GNU requires them to form the line.
                    if state.lines_read == 0 && lines.is_file_source() && line_string == "#n" {
                        state.options.quiet = true;
                    }
                    state.lines_read += 1;
                    *line = ScriptCharProvider::new(&line_string);
                }
            }
            continue;
        }

        match line.current() {
            ';' => {
                line.advance();
                continue;
            }
            '#' => {
                line.take_rest();
                continue;
            }
            _ => (),
        }

        let mut cmd = Command::at_location(ScriptLocation::at_position(lines, line));
        let n_addr = compile_address_range(lines, line, &mut cmd, state)?;
        line.eat_spaces();

        state.current = Cursor {
            sequence,
            index: state.program.sequences[sequence].commands.len(),
        };

        // Compile the command according to its specification.
        let mut cmd_spec = get_verified_cmd_spec(lines, line, n_addr)?;
        cmd.code = line.current();
        let mut handling = (cmd_spec.handler)(lines, line, &mut cmd, state)?;
        if handling == CommandHandling::GetNext {
            cmd_spec = get_verified_cmd_spec(lines, line, n_addr)?;
            cmd.code = line.current();
            handling = (cmd_spec.handler)(lines, line, &mut cmd, state)?;
        }

        state.program.sequences[sequence].commands.push(cmd);
        if handling == CommandHandling::Return {
            return Ok(());
        }
    }
}

/// Return true if c is a valid character for starting an address
fn is_address_char(c: char) -> bool {
    matches!(c, '0'..='9' | '/' | '\\' | '$')
}

/// Compile a command's optional address range into cmd.
/// Return the number of addresses encountered.
fn compile_address_range(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<usize> {
    if line.eol() || !is_address_char(line.current()) {
        return Ok(0);
    }

    let addr1 = compile_address(lines, line, state)?;
    if matches!(addr1, Address::Line(0)) {
        return compilation_error(lines, line, "invalid usage of line address 0");
    }
    cmd.addr1 = Some(addr1);

    line.eat_spaces();
    if line.eol() || line.current() != ',' {
        return Ok(1);
    }

    line.advance();
    line.eat_spaces();
    if line.eol() {
        return compilation_error(lines, line, "unexpected `,'");
    }
    cmd.addr2 = Some(match line.current() {
        '+' => {
            line.advance();
            match parse_number(lines, line)? {
                Some(n) => Address::RelLine(n),
                None => return compilation_error(lines, line, "expected number after `+'"),
            }
        }
        c if is_address_char(c) => compile_address(lines, line, state)?,
        _ => return compilation_error(lines, line, "unexpected `,'"),
    });

    Ok(2)
}

/// Compile and return a single address specification.
fn compile_address(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    state: &mut CompileState,
) -> UResult<Address> {
    match line.current() {
        '\\' | '/' => {
            if line.current() == '\\' {
                // The next character is an arbitrary delimiter
                line.advance();
            }
            let pattern = parse_regex(lines, line, UNTERMINATED_ADDRESS)?;
            line.advance(); // Skip over delimiter

            let mut icase = false;
            while !line.eol() && line.current() == 'I' {
                icase = true;
                line.advance();
            }

            Ok(Address::Re(compile_regex(lines, line, &pattern, icase, state)?))
        }
        '$' => {
            line.advance();
            Ok(Address::Last)
        }
        _ => match parse_number(lines, line)? {
            Some(n) => Ok(Address::Line(n)),
            None => compilation_error(lines, line, "expected address"),
        },
    }
}

/// Parse and return the decimal number at the current line position,
/// or None if there is none.
/// Advance the line to first non-digit or EOL.
fn parse_number(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<Option<usize>> {
    let mut num_str = String::new();

    while !line.eol() && line.current().is_ascii_digit() {
        num_str.push(line.current());
        line.advance();
    }

    if num_str.is_empty() {
        return Ok(None);
    }

    match num_str.parse::<usize>() {
        Ok(n) => Ok(Some(n)),
        Err(_) => compilation_error(lines, line, format!("invalid number '{num_str}'")),
    }
}

/// Compile the provided POSIX regular expression.
/// An empty pattern stands for the last regular expression compiled.
fn compile_regex(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    pattern: &str,
    icase: bool,
    state: &mut CompileState,
) -> UResult<Regex> {
    if pattern.is_empty() {
        if icase {
            return compilation_error(
                lines,
                line,
                "cannot specify modifiers on empty regexp",
            );
        }
        return match &state.last_regex {
            Some(re) => Ok(re.clone()),
            None => compilation_error(lines, line, "no previous regular expression"),
        };
    }

    let translated = match translate(pattern, state.options.regex_extended, icase) {
        Ok(t) => t,
        Err(msg) => return compilation_error(lines, line, msg),
    };

    let compiled = match Regex::new(&translated) {
        Ok(re) => re.labeled(pattern),
        Err(e) => return compilation_error(lines, line, format!("invalid regex '{pattern}': {e}")),
    };

    state.last_regex = Some(compiled.clone());
    Ok(compiled)
}

/// Append the UTF-8 encoding of c to buf.
fn push_char(buf: &mut Vec<u8>, c: char) {
    let mut encoded = [0; 4];
    buf.extend_from_slice(c.encode_utf8(&mut encoded).as_bytes());
}

/// Append a character obtained from an escape sequence to buf.
/// Values up to 0xff denote a single byte.
fn push_escaped(buf: &mut Vec<u8>, c: char) {
    match u8::try_from(c) {
        Ok(b) => buf.push(b),
        Err(_) => push_char(buf, c),
    }
}

/// Compile a regular expression replacement string.
/// At entry the line is on the delimiter that opens it; on return
/// it is past the closing one.
fn compile_replacement(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
) -> UResult<ReplacementTemplate> {
    let mut parts = Vec::new();
    let mut literal = Vec::new();

    let delimiter = line.current();
    line.advance();

    loop {
        if line.eol() {
            return compilation_error(lines, line, UNTERMINATED_S);
        }

        match line.current() {
            '\\' => {
                line.advance();

                // Escaped newline
                if line.eol() {
                    match lines.next_line()? {
                        Some(next_line_string) => {
                            literal.push(b'\n');
                            *line = ScriptCharProvider::new(&next_line_string);
                            continue;
                        }
                        None => return compilation_error(lines, line, UNTERMINATED_S),
                    }
                }

                match line.current() {
                    // Literal delimiter
                    v if v == delimiter => {
                        push_char(&mut literal, v);
                        line.advance();
                    }

                    // \0 - \9
                    c @ '0'..='9' => {
                        if !literal.is_empty() {
                            parts.push(ReplacementPart::Literal(mem::take(&mut literal)));
                        }
                        match c.to_digit(10) {
                            Some(0) | None => parts.push(ReplacementPart::WholeMatch),
                            Some(n) => parts.push(ReplacementPart::Group(n as usize)),
                        }
                        line.advance();
                    }

                    // Character escapes; anything else is literal
                    c => match parse_char_escape(line) {
                        Some(decoded) => push_escaped(&mut literal, decoded),
                        None => {
                            push_char(&mut literal, c);
                            line.advance();
                        }
                    },
                }
            }

            c if c == delimiter => {
                line.advance(); // skip closing delimiter
                if !literal.is_empty() {
                    parts.push(ReplacementPart::Literal(literal));
                }
                return Ok(ReplacementTemplate::new(parts));
            }

            '&' => {
                if !literal.is_empty() {
                    parts.push(ReplacementPart::Literal(mem::take(&mut literal)));
                }
                parts.push(ReplacementPart::WholeMatch);
                line.advance();
            }

            c => {
                push_char(&mut literal, c);
                line.advance();
            }
        }
    }
}

/// Flags that follow the s command's replacement
#[derive(Debug, Default)]
struct SubstFlags {
    global: bool,
    occurrence: Option<usize>,
    print: bool,
    ignore_case: bool,
    write_path: Option<(PathBuf, ScriptLocation)>,
}

/// Parse the substitution command's optional flags.
/// Of `g` and a number, the last one given is in effect.
fn compile_subst_flags(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    sandbox: bool,
) -> UResult<SubstFlags> {
    let mut flags = SubstFlags::default();
    let mut seen_g = false;

    while !line.eol() {
        match line.current() {
            'g' => {
                if seen_g {
                    return compilation_error(lines, line, "multiple `g' options to `s' command");
                }
                seen_g = true;
                flags.global = true;
                line.advance();
            }

            'p' => {
                if flags.print {
                    return compilation_error(lines, line, "multiple `p' options to `s' command");
                }
                flags.print = true;
                line.advance();
            }

            'i' | 'I' => {
                flags.ignore_case = true;
                line.advance();
            }

            '0'..='9' => {
                if flags.occurrence.is_some() {
                    return compilation_error(
                        lines,
                        line,
                        "multiple number options to `s' command",
                    );
                }
                match parse_number(lines, line)? {
                    Some(0) | None => {
                        return compilation_error(
                            lines,
                            line,
                            "number option to `s' command may not be zero",
                        );
                    }
                    Some(n) => flags.occurrence = Some(n),
                }
                flags.global = false;
            }

            'w' => {
                if sandbox {
                    return compilation_error(
                        lines,
                        line,
                        "e/r/w commands disabled in sandbox mode",
                    );
                }
                let location = ScriptLocation::at_position(lines, line);
                let path = read_file_path(lines, line)?;
                flags.write_path = Some((path, location));
                break; // 'w' is the last flag allowed
            }

            _ => break,
        }
    }

    // A number following g disables it; g following a number wins.
    if seen_g && flags.global {
        flags.occurrence = None;
    }
    Ok(flags)
}

/// Parse the end of a command, failing with an error on extra characters.
/// A following `}` or `#` is left for the sequence parser.
fn parse_command_ending(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<()> {
    line.eat_spaces();
    if line.eol() {
        return Ok(());
    }

    match line.current() {
        ';' => {
            line.advance();
            Ok(())
        }
        '}' | '#' => Ok(()),
        _ => compilation_error(lines, line, "extra characters after command"),
    }
}

/// Read the line's remaining characters as a file path and return it.
fn read_file_path(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<PathBuf> {
    line.advance(); // Skip the command/w character
    line.eat_spaces(); // Skip any leading whitespace

    let path = line.take_rest();
    if path.is_empty() {
        compilation_error(lines, line, "missing filename in r/R/w/W commands")
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Compile the text of a, i, c.
/// With `continued` the text starts on the next script line.
/// A backslash at the end of a line continues the text on the next one;
/// other backslashes are removed, honoring character escapes.
fn read_text(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    mut continued: bool,
) -> UResult<Vec<u8>> {
    let mut text = Vec::new();

    loop {
        if continued {
            match lines.next_line()? {
                Some(line_string) => *line = ScriptCharProvider::new(&line_string),
                None if text.is_empty() => {
                    return compilation_error(lines, line, "expected \\ after `a', `c' or `i'");
                }
                None => return Ok(text),
            }
            continued = false;
        }

        while !line.eol() {
            let c = line.current();
            line.advance();
            if c != '\\' {
                push_char(&mut text, c);
                continue;
            }

            if line.eol() {
                continued = true;
                break;
            }
            match parse_char_escape(line) {
                Some(decoded) => push_escaped(&mut text, decoded),
                None => {
                    push_char(&mut text, line.current());
                    line.advance();
                }
            }
        }

        text.push(b'\n');
        if !continued {
            return Ok(text);
        }
    }
}

/// Compile commands that take text as an argument.
// Handles a, c, i
// According to POSIX, these commands expect \ followed by text on the
// next line. As a GNU extension the text can also follow on the same
// line, with or without the initial \.
fn compile_text_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character.
    line.eat_spaces(); // Skip any leading whitespace.

    if line.eol() {
        return compilation_error(lines, line, "expected \\ after `a', `c' or `i'");
    }

    let continued = if line.current() == '\\' {
        line.advance();
        if state.options.posix {
            line.eat_spaces();
            if !line.eol() {
                return compilation_error(
                    lines,
                    line,
                    format!("extra characters after \\ at the end of `{}' command", cmd.code),
                );
            }
        }
        line.eol()
    } else if state.options.posix {
        return compilation_error(lines, line, "expected \\ after `a', `c' or `i'");
    } else {
        false
    };

    cmd.data = CommandData::Text(read_text(lines, line, continued)?);
    Ok(CommandHandling::Continue)
}

// Handles s
fn compile_subst_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // move past 's'

    let pattern = parse_regex(lines, line, UNTERMINATED_S)?;
    let replacement = compile_replacement(lines, line)?;
    let flags = compile_subst_flags(lines, line, state.options.sandbox)?;

    // Compile regex with now known ignore_case flag.
    let regex = compile_regex(lines, line, &pattern, flags.ignore_case, state)?;

    // Catch invalid group references at compile time.
    if replacement.max_group_number + 1 > regex.captures_len() {
        return compilation_error(
            lines,
            line,
            format!(
                "invalid reference \\{} on `s' command's RHS",
                replacement.max_group_number
            ),
        );
    }

    let write_file = match flags.write_path {
        Some((path, location)) => Some(state.program.files.add_writer(&path, &location)?),
        None => None,
    };

    cmd.data = CommandData::Substitution(Box::new(Substitution {
        regex,
        replacement,
        global: flags.global,
        occurrence: flags.occurrence.unwrap_or(1),
        print: flags.print,
        ignore_case: flags.ignore_case,
        write_file,
    }));

    if write_file.is_none() {
        parse_command_ending(lines, line)?;
    }
    Ok(CommandHandling::Continue)
}

// Handles y
fn compile_trans_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // move past 'y'

    let source = parse_transliteration(lines, line)?;
    let target = parse_transliteration(lines, line)?;
    if source.chars().count() != target.chars().count() {
        return compilation_error(
            lines,
            line,
            "strings for `y' command are different lengths",
        );
    }

    let transliteration = Box::new(Transliteration::from_strings(&source, &target));
    cmd.data = CommandData::Transliteration(transliteration);

    line.advance(); // move past last delimiter
    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Continue)
}

// Handles {
fn compile_block_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // move past '{'
    state.open_blocks.push(cmd.location.clone());

    let body = state.program.add_sequence(state.current);
    cmd.data = CommandData::Block(body);
    compile_sequence(lines, line, state, body)?;
    Ok(CommandHandling::Continue)
}

// Handles }
fn compile_end_group_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    _cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    if state.open_blocks.pop().is_none() {
        return compilation_error(lines, line, "unexpected `}'");
    }
    line.advance();
    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Return)
}

// Handles !
fn compile_negation_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    _state: &mut CompileState,
) -> UResult<CommandHandling> {
    if cmd.non_select {
        return compilation_error(lines, line, "multiple `!'s");
    }
    line.advance();
    line.eat_spaces();
    cmd.non_select = true;
    Ok(CommandHandling::GetNext)
}

/// Compile a command that doesn't take any arguments
// Handles d D g G h H n N p P x =
fn compile_empty_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    _cmd: &mut Command,
    _state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character
    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Continue)
}

// Handles r
fn compile_read_file_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    if state.options.sandbox {
        return compilation_error(lines, line, "e/r/w commands disabled in sandbox mode");
    }
    let path = read_file_path(lines, line)?;
    cmd.data = CommandData::ReadFile(state.program.files.add_reader(&path, &cmd.location)?);
    Ok(CommandHandling::Continue)
}

// Handles w
fn compile_write_file_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    if state.options.sandbox {
        return compilation_error(lines, line, "e/r/w commands disabled in sandbox mode");
    }
    let path = read_file_path(lines, line)?;
    cmd.data = CommandData::WriteFile(state.program.files.add_writer(&path, &cmd.location)?);
    Ok(CommandHandling::Continue)
}

/// Return the label at the line position.
/// Labels end at whitespace, `;` or `}`.
fn read_label(line: &mut ScriptCharProvider) -> String {
    let mut label = String::new();
    while !line.eol() && !matches!(line.current(), ';' | '}') && !line.current().is_whitespace() {
        label.push(line.current());
        line.advance();
    }
    label
}

// Handles :
fn compile_label_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character
    line.eat_spaces(); // Skip any leading whitespace

    let label = read_label(line);
    if label.is_empty() {
        return compilation_error(lines, line, "\":\" lacks a label");
    }

    state.labels.add_label(&label, state.current, &cmd.location)?;
    cmd.data = CommandData::Label(label);
    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Continue)
}

// Handles b, t
fn compile_branch_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character
    line.eat_spaces(); // Skip any leading whitespace

    let label = read_label(line);
    state.labels.add_jump(&label, state.current, &cmd.location);
    cmd.data = CommandData::Branch(BranchTarget::Unresolved(label));
    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Continue)
}

/// Compile commands that take a number as an argument.
// Handles l q Q
fn compile_number_command(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    cmd: &mut Command,
    state: &mut CompileState,
) -> UResult<CommandHandling> {
    line.advance(); // Skip the command character
    line.eat_spaces(); // Skip any leading whitespace

    let default = if cmd.code == 'l' {
        state.options.length
    } else {
        0
    };
    let n = parse_number(lines, line)?.unwrap_or(default);
    if cmd.code != 'l' && i32::try_from(n).is_err() {
        return compilation_error(lines, line, format!("exit code {n} out of range"));
    }
    cmd.data = CommandData::Number(n);

    parse_command_ending(lines, line)?;
    Ok(CommandHandling::Continue)
}

// Return the specification for the command letter at the current line position
// checking for diverse errors.
fn get_verified_cmd_spec(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    n_addr: usize,
) -> UResult<CommandSpec> {
    if line.eol() {
        return compilation_error(lines, line, "missing command");
    }

    let ch = line.current();
    let cmd_spec = get_cmd_spec(lines, line, ch)?;

    if n_addr > cmd_spec.n_addr {
        let msg = match (ch, cmd_spec.n_addr) {
            ('#', _) => "comments don't accept any addresses".to_string(),
            (_, 0) => format!("{ch} doesn't want any addresses"),
            _ => "command only uses one address".to_string(),
        };
        return compilation_error(lines, line, msg);
    }

    Ok(cmd_spec)
}

// Look up a command addresses and handler by its command code.
fn get_cmd_spec(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    cmd_code: char,
) -> UResult<CommandSpec> {
    match cmd_code {
        '!' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_negation_command,
        }),
        '=' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_empty_command,
        }),
        ':' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_label_command,
        }),
        // Only reached with an address
        '#' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_empty_command,
        }),
        '{' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_block_command,
        }),
        '}' => Ok(CommandSpec {
            n_addr: 0,
            handler: compile_end_group_command,
        }),
        'a' | 'i' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_text_command,
        }),
        'b' | 't' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_branch_command,
        }),
        'c' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_text_command,
        }),
        'd' | 'D' | 'g' | 'G' | 'h' | 'H' | 'n' | 'N' | 'p' | 'P' | 'x' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_empty_command,
        }),
        'l' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_number_command,
        }),
        // Q is a GNU extension
        'q' | 'Q' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_number_command,
        }),
        'r' => Ok(CommandSpec {
            n_addr: 1,
            handler: compile_read_file_command,
        }),
        's' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_subst_command,
        }),
        'w' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_write_file_command,
        }),
        'y' => Ok(CommandSpec {
            n_addr: 2,
            handler: compile_trans_command,
        }),
        _ => compilation_error(lines, line, format!("unknown command: `{cmd_code}'")),
    }
}
