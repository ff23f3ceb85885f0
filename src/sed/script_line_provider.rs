// Provide the script contents line by line
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use uucore::display::Quotable;
use uucore::error::{UResult, USimpleError, strip_errno};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A script source given on the command line
pub enum ScriptValue {
    StringVal(String), // -e text or the positional script
    PathVal(PathBuf),  // -f file; "-" is the standard input
}

/// Concatenation of all script sources, delivered one line at a time
/// with the trailing newline removed.
pub struct ScriptLineProvider {
    sources: Vec<ScriptValue>,
    state: State,
    // Position of the last line read from an exhausted source
    last_name: String,
    last_line_number: usize,
}

enum State {
    NotStarted,
    Active {
        index: usize,
        reader: Box<dyn BufRead>,
        input_name: String,
        line_number: usize,
        from_file: bool,
    },
    Done,
}

/// Shorten inline scripts so that they fit in a diagnostic.
fn truncate_with_ellipsis(input: &str) -> String {
    const MAX_LEN: usize = 20;
    if input.chars().count() <= MAX_LEN {
        input.to_string()
    } else {
        input.chars().take(MAX_LEN).collect::<String>() + "..."
    }
}

impl ScriptLineProvider {
    pub fn new(sources: Vec<ScriptValue>) -> Self {
        Self {
            sources,
            state: State::NotStarted,
            last_name: "-e expression".to_string(),
            last_line_number: 0,
        }
    }

    /// Line number within the current source (1-based; 0 before the first line).
    pub fn get_line_number(&self) -> usize {
        match &self.state {
            State::Active { line_number, .. } => *line_number,
            _ => self.last_line_number,
        }
    }

    /// Name of the current source as shown in diagnostics.
    pub fn get_input_name(&self) -> &str {
        match &self.state {
            State::Active { input_name, .. } => input_name,
            _ => &self.last_name,
        }
    }

    /// True if the current line comes from a script file rather than
    /// from an inline expression.
    pub fn is_file_source(&self) -> bool {
        matches!(
            self.state,
            State::Active {
                from_file: true,
                ..
            }
        )
    }

    /// Return the next script line without its terminating newline,
    /// or `None` once every source has been consumed.
    pub fn next_line(&mut self) -> UResult<Option<String>> {
        let mut buf = Vec::new();

        loop {
            let next_index = match &mut self.state {
                State::NotStarted => 0,
                State::Active {
                    index,
                    reader,
                    line_number,
                    input_name,
                    ..
                } => {
                    buf.clear();
                    let nread = reader.read_until(b'\n', &mut buf).map_err(|e| {
                        USimpleError::new(
                            1,
                            format!("couldn't read {}: {}", input_name.quote(), strip_errno(&e)),
                        )
                    })?;
                    if nread == 0 {
                        *index + 1
                    } else {
                        *line_number += 1;
                        if buf.last() == Some(&b'\n') {
                            buf.pop();
                        }
                        return Ok(Some(String::from_utf8_lossy(&buf).into_owned()));
                    }
                }
                State::Done => return Ok(None),
            };

            self.advance_source(next_index)?;
        }
    }

    fn advance_source(&mut self, next_index: usize) -> UResult<()> {
        if let State::Active {
            input_name,
            line_number,
            ..
        } = &self.state
            && *line_number > 0
        {
            self.last_name.clone_from(input_name);
            self.last_line_number = *line_number;
        }

        let Some(source) = self.sources.get(next_index) else {
            self.state = State::Done;
            return Ok(());
        };

        self.state = match source {
            ScriptValue::StringVal(s) => State::Active {
                index: next_index,
                reader: Box::new(io::Cursor::new(s.clone().into_bytes())),
                input_name: truncate_with_ellipsis(s),
                line_number: 0,
                from_file: false,
            },
            ScriptValue::PathVal(p) if p.as_os_str() == "-" => State::Active {
                index: next_index,
                reader: Box::new(BufReader::new(io::stdin())),
                input_name: "-".to_string(),
                line_number: 0,
                from_file: true,
            },
            ScriptValue::PathVal(p) => {
                let file = File::open(p).map_err(|e| {
                    USimpleError::new(
                        1,
                        format!("couldn't open file {}: {}", p.quote(), strip_errno(&e)),
                    )
                })?;
                State::Active {
                    index: next_index,
                    reader: Box::new(BufReader::new(file)),
                    input_name: p.to_string_lossy().into_owned(),
                    line_number: 0,
                    from_file: true,
                }
            }
        };

        Ok(())
    }
}

#[cfg(test)]
impl ScriptLineProvider {
    /// Construct a provider that reports the given position, for
    /// testing diagnostics.
    pub fn with_active_state(input_name: &str, line_number: usize) -> Self {
        Self {
            sources: vec![],
            last_name: String::new(),
            last_line_number: 0,
            state: State::Active {
                index: 0,
                reader: Box::new(io::Cursor::new(Vec::new())),
                input_name: input_name.to_string(),
                line_number,
                from_file: false,
            },
        }
    }
}
