// Translate POSIX basic and extended regular expressions to Rust syntax
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::delimited_parser::parse_char_escape;
use crate::sed::script_char_provider::ScriptCharProvider;

/// Characters that must be escaped to be literal inside a Rust class.
const CLASS_SPECIAL: &[char] = &['\\', ']', '[', '^', '-', '&', '~'];

/// Append c to out so that it matches literally outside a class.
fn push_literal(out: &mut String, c: char) {
    let mut buf = [0; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Append c to out so that it matches literally inside a class.
fn push_class_literal(out: &mut String, c: char) {
    if CLASS_SPECIAL.contains(&c) {
        out.push('\\');
    }
    out.push(c);
}

/// Return true if a BRE `$` at the current position ends the
/// expression or one of its alternatives or groups.
fn bre_dollar_is_anchor(chars: &ScriptCharProvider) -> bool {
    match chars.lookahead(1) {
        None => true,
        Some('\\') => matches!(chars.lookahead(2), Some(')') | Some('|')),
        Some(_) => false,
    }
}

/// Translate a `{m,n}` interval. On entry chars is on the `{`;
/// a BRE interval ends with `\}`, an ERE one with `}`.
fn translate_interval(
    chars: &mut ScriptCharProvider,
    out: &mut String,
    extended: bool,
) -> Result<(), String> {
    chars.advance();
    let mut body = String::new();
    loop {
        if chars.eol() {
            return Err("unmatched \\{".to_string());
        }
        match chars.current() {
            '\\' if !extended && chars.peek() == Some('}') => {
                chars.advance();
                chars.advance();
                break;
            }
            '}' if extended => {
                chars.advance();
                break;
            }
            c @ ('0'..='9' | ',') => {
                body.push(c);
                chars.advance();
            }
            _ => return Err("invalid content of \\{\\}".to_string()),
        }
    }

    let (min, max) = match body.split_once(',') {
        Some((min, max)) => (min, Some(max)),
        None => (body.as_str(), None),
    };
    if max.is_some_and(|m| m.contains(',')) || (min.is_empty() && max.is_none()) {
        return Err("invalid content of \\{\\}".to_string());
    }
    let min = if min.is_empty() { "0" } else { min };

    out.push('{');
    out.push_str(min);
    if let Some(max) = max {
        out.push(',');
        out.push_str(max);
    }
    out.push('}');
    Ok(())
}

/// Translate a bracket expression. On entry chars is on the `[`.
fn translate_bracket(chars: &mut ScriptCharProvider, out: &mut String) -> Result<(), String> {
    const UNMATCHED: &str = "unterminated [, [^, [:, [., or [=";

    chars.advance();
    out.push('[');
    if !chars.eol() && chars.current() == '^' {
        out.push('^');
        chars.advance();
    }
    if !chars.eol() && chars.current() == ']' {
        out.push_str("\\]");
        chars.advance();
    }

    loop {
        if chars.eol() {
            return Err(UNMATCHED.to_string());
        }
        match chars.current() {
            ']' => {
                out.push(']');
                chars.advance();
                return Ok(());
            }
            '[' if matches!(chars.peek(), Some(':' | '.' | '=')) => {
                chars.advance();
                let marker = chars.current();
                chars.advance();
                let mut name = String::new();
                while !(chars.eol() || chars.current() == marker && chars.peek() == Some(']')) {
                    name.push(chars.current());
                    chars.advance();
                }
                if chars.eol() {
                    return Err(UNMATCHED.to_string());
                }
                chars.advance();
                chars.advance();

                if marker == ':' {
                    out.push_str("[:");
                    out.push_str(&name);
                    out.push_str(":]");
                } else {
                    // Collating symbols and equivalence classes of
                    // single characters stand for the character itself.
                    let mut it = name.chars();
                    match (it.next(), it.next()) {
                        (Some(c), None) => push_class_literal(out, c),
                        _ => return Err("invalid collation character".to_string()),
                    }
                }
            }
            '\\' => {
                chars.advance();
                if let Some(decoded) = parse_char_escape(chars) {
                    push_class_literal(out, decoded);
                } else {
                    push_class_literal(out, '\\');
                    if !chars.eol() && chars.current() == '\\' {
                        chars.advance();
                    }
                }
            }
            c => {
                if matches!(c, '[' | '&' | '~' | '\\') {
                    out.push('\\');
                }
                out.push(c);
                chars.advance();
            }
        }
    }
}

/// Translate the POSIX regular expression `posix` into an equivalent
/// pattern for the regex and fancy_regex crates.
/// `^` and `$` anchor at the pattern space boundaries, `.` matches
/// newlines, and back-references become `(?:\N)` groups.
pub fn translate(posix: &str, extended: bool, icase: bool) -> Result<String, String> {
    let mut chars = ScriptCharProvider::new(posix);
    let mut out = String::from("(?s)");
    if icase {
        out.push_str("(?i)");
    }

    let mut groups = 0;
    // True where `*` is literal and a BRE `^` is an anchor.
    let mut at_start = true;

    while !chars.eol() {
        let c = chars.current();
        let mut next_at_start = false;

        match c {
            '\\' => {
                chars.advance();
                if chars.eol() {
                    return Err("trailing backslash (\\)".to_string());
                }
                let e = chars.current();
                match e {
                    '(' if !extended => {
                        groups += 1;
                        out.push('(');
                        next_at_start = true;
                    }
                    ')' if !extended => out.push(')'),
                    '|' if !extended => {
                        out.push('|');
                        next_at_start = true;
                    }
                    '{' if !extended => {
                        if at_start {
                            return Err("invalid preceding regular expression".to_string());
                        }
                        translate_interval(&mut chars, &mut out, false)?;
                        at_start = false;
                        continue;
                    }
                    '+' | '?' if !extended => {
                        if at_start {
                            push_literal(&mut out, e);
                        } else {
                            out.push(e);
                        }
                    }
                    '1'..='9' => {
                        let n = e as usize - '0' as usize;
                        if n > groups {
                            return Err("invalid reference to subexpression".to_string());
                        }
                        out.push_str("(?:\\");
                        out.push(e);
                        out.push(')');
                    }
                    '<' => out.push_str("\\b{start}"),
                    '>' => out.push_str("\\b{end}"),
                    'b' => out.push_str("\\b"),
                    'B' | 'w' | 'W' | 's' | 'S' => {
                        out.push('\\');
                        out.push(e);
                    }
                    '`' => out.push_str("\\A"),
                    '\'' => out.push_str("\\z"),
                    _ => {
                        if let Some(decoded) = parse_char_escape(&mut chars) {
                            push_literal(&mut out, decoded);
                        } else {
                            push_literal(&mut out, e);
                            chars.advance();
                        }
                        at_start = false;
                        continue;
                    }
                }
                chars.advance();
            }
            '[' => {
                translate_bracket(&mut chars, &mut out)?;
                at_start = false;
                continue;
            }
            '*' if at_start => {
                out.push_str("\\*");
                chars.advance();
            }
            '^' => {
                if extended || at_start {
                    out.push('^');
                    next_at_start = true;
                } else {
                    out.push_str("\\^");
                }
                chars.advance();
            }
            '$' => {
                if extended || bre_dollar_is_anchor(&chars) {
                    out.push('$');
                } else {
                    out.push_str("\\$");
                }
                chars.advance();
            }
            '(' if extended => {
                groups += 1;
                out.push('(');
                next_at_start = true;
                chars.advance();
            }
            '|' if extended => {
                out.push('|');
                next_at_start = true;
                chars.advance();
            }
            ')' if extended => {
                out.push(')');
                chars.advance();
            }
            '+' | '?' if extended => {
                if at_start {
                    push_literal(&mut out, c);
                } else {
                    out.push(c);
                }
                chars.advance();
            }
            '{' if extended && !at_start && matches!(chars.peek(), Some('0'..='9' | ',')) => {
                translate_interval(&mut chars, &mut out, true)?;
                at_start = false;
                continue;
            }
            '.' | '*' => {
                out.push(c);
                chars.advance();
            }
            _ => {
                // Includes the BRE literals + ? { } | ( )
                push_literal(&mut out, c);
                chars.advance();
            }
        }

        at_start = next_at_start;
    }

    Ok(out)
}
