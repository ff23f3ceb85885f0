// Parse delimited character sequences
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::error_handling::compilation_error;
use crate::sed::script_char_provider::ScriptCharProvider;
use crate::sed::script_line_provider::ScriptLineProvider;

use uucore::error::UResult;

/// Return true if c is a valid octal digit
fn is_ascii_octal_digit(c: char) -> bool {
    matches!(c, '0'..='7')
}

fn is_ascii_decimal_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_ascii_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Parse a numeric character escape and return the corresponding char.
/// Advance line to the first character not part of the escape.
/// At most `ndigits` digits of the given radix are consumed.
/// Return `None` if no digit follows or the value is not a character.
fn parse_numeric_escape(
    line: &mut ScriptCharProvider,
    is_allowed_char: fn(char) -> bool,
    ndigits: usize,
    radix: u32,
) -> Option<char> {
    let mut digits = String::new();

    while digits.len() < ndigits && !line.eol() && is_allowed_char(line.current()) {
        digits.push(line.current());
        line.advance();
    }

    if digits.is_empty() {
        return None;
    }

    let decoded = u32::from_str_radix(&digits, radix)
        .ok()
        .and_then(char::from_u32);
    if decoded.is_none() {
        line.retreat(digits.len());
    }
    decoded
}

/// Map x to the control character ^X: uppercase it and flip bit 6.
fn create_control_char(x: char) -> Option<char> {
    if !x.is_ascii() {
        return None;
    }
    let c = x.to_ascii_uppercase();
    char::from_u32(((c as u8) ^ 0x40) as u32)
}

/// Parse a character escape valid in all contexts (regex, replacement,
/// transliteration, text) and return the corresponding char.
/// At entry line.current() is the character after the `\`.
/// Advance line to the first character not part of the escape.
/// Return `None`, without advancing, if this is not such an escape.
pub fn parse_char_escape(line: &mut ScriptCharProvider) -> Option<char> {
    if line.eol() {
        return None;
    }

    let simple = match line.current() {
        'a' => Some('\x07'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        _ => None,
    };
    if simple.is_some() {
        line.advance();
        return simple;
    }

    let (is_allowed, ndigits, radix): (fn(char) -> bool, usize, u32) = match line.current() {
        'c' => {
            // \cX
            line.advance();
            if !line.eol()
                && let Some(decoded) = create_control_char(line.current())
            {
                line.advance();
                return Some(decoded);
            }
            line.retreat(1);
            return None;
        }
        'd' => (is_ascii_decimal_digit, 3, 10),
        'o' => (is_ascii_octal_digit, 3, 8),
        'x' => (is_ascii_hex_digit, 2, 16),
        _ => return None,
    };

    line.advance(); // past d, o, x
    match parse_numeric_escape(line, is_allowed, ndigits, radix) {
        Some(decoded) => Some(decoded),
        None => {
            line.retreat(1);
            None
        }
    }
}

/// Scan and return the opening delimiter of a delimited string.
/// Advance the line past the opening delimiter.
fn scan_delimiter(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    what: &str,
) -> UResult<char> {
    if line.eol() {
        return compilation_error(lines, line, what);
    }

    let delimiter = line.current();
    if delimiter == '\\' {
        return compilation_error(lines, line, "\\ cannot be used as a string delimiter");
    }
    line.advance();
    Ok(delimiter)
}

/// Copy a bracket expression verbatim into result.
/// A `]` right after `[` or `[^` is a member, and `[:name:]`, `[.c.]`,
/// `[=c=]` are copied whole, so neither can end the expression or the
/// enclosing delimited string.
fn scan_bracket(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    result: &mut String,
    what: &str,
) -> UResult<()> {
    result.push('[');
    line.advance();

    if !line.eol() && line.current() == '^' {
        result.push('^');
        line.advance();
    }
    if !line.eol() && line.current() == ']' {
        result.push(']');
        line.advance();
    }

    while !line.eol() {
        let c = line.current();
        result.push(c);
        line.advance();

        match c {
            ']' => return Ok(()),
            '[' if !line.eol() && matches!(line.current(), ':' | '.' | '=') => {
                let marker = line.current();
                result.push(marker);
                line.advance();
                loop {
                    if line.eol() {
                        return compilation_error(lines, line, what);
                    }
                    let inner = line.current();
                    result.push(inner);
                    line.advance();
                    if inner == marker && !line.eol() && line.current() == ']' {
                        result.push(']');
                        line.advance();
                        break;
                    }
                }
            }
            _ => (),
        }
    }

    compilation_error(lines, line, what)
}

/// Parse the regular expression delimited by the current line
/// character and return its POSIX text.
/// An escaped delimiter is returned as a literal, and a backslash at
/// the end of a script line continues the expression on the next line
/// with an embedded newline.
/// On return the line is on the closing delimiter.
pub fn parse_regex(
    lines: &mut ScriptLineProvider,
    line: &mut ScriptCharProvider,
    what: &str,
) -> UResult<String> {
    let delimiter = scan_delimiter(lines, line, what)?;
    let mut result = String::new();

    loop {
        if line.eol() {
            return compilation_error(lines, line, what);
        }

        match line.current() {
            c if c == delimiter => return Ok(result),
            '[' => scan_bracket(lines, line, &mut result, what)?,
            '\\' => {
                line.advance();
                if line.eol() {
                    match lines.next_line()? {
                        Some(next) => {
                            *line = ScriptCharProvider::new(&next);
                            result.push('\n');
                            continue;
                        }
                        None => return compilation_error(lines, line, what),
                    }
                }

                let c = line.current();
                if c == delimiter {
                    // A bracket keeps the delimiter literal in both BRE and ERE.
                    match c {
                        '^' => result.push_str("\\^"),
                        ']' => result.push_str("[]]"),
                        _ => {
                            result.push('[');
                            result.push(c);
                            result.push(']');
                        }
                    }
                } else if c == 'n' {
                    result.push('\n');
                } else {
                    result.push('\\');
                    result.push(c);
                }
                line.advance();
            }
            c => {
                result.push(c);
                line.advance();
            }
        }
    }
}

/// Parse the transliteration string delimited by the current line
/// character and return it with all escapes decoded.
/// On return the line is on the closing delimiter.
pub fn parse_transliteration(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
) -> UResult<String> {
    const UNTERMINATED: &str = "unterminated `y' command";

    let delimiter = scan_delimiter(lines, line, UNTERMINATED)?;
    let mut result = String::new();

    while !line.eol() {
        match line.current() {
            c if c == delimiter => return Ok(result),
            '\\' => {
                line.advance();
                if line.eol() {
                    break;
                }
                let c = line.current();
                if c == delimiter || c == '\\' {
                    result.push(c);
                    line.advance();
                } else if let Some(decoded) = parse_char_escape(line) {
                    result.push(decoded);
                } else {
                    result.push('\\');
                    result.push(c);
                    line.advance();
                }
            }
            c => {
                result.push(c);
                line.advance();
            }
        }
    }

    compilation_error(lines, line, UNTERMINATED)
}
