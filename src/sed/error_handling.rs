// Error reporting tied to script locations
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::script_char_provider::ScriptCharProvider;
use crate::sed::script_line_provider::ScriptLineProvider;

use std::fmt;
use uucore::error::{UResult, USimpleError};

/// Exit code for malformed scripts
pub const EXIT_BAD_SCRIPT: i32 = 1;
/// Exit code for input files that could not be read
pub const EXIT_BAD_INPUT: i32 = 2;
/// Exit code for usage errors and fatal I/O failures
pub const EXIT_PANIC: i32 = 4;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Where in the script a command was defined
pub struct ScriptLocation {
    pub input_name: String,
    pub line_number: usize,
    pub column_number: usize,
}

impl ScriptLocation {
    /// Capture the current position of the script providers.
    pub fn at_position(lines: &ScriptLineProvider, line: &ScriptCharProvider) -> Self {
        Self {
            input_name: lines.get_input_name().to_string(),
            line_number: lines.get_line_number(),
            column_number: line.get_pos() + 1,
        }
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.input_name, self.line_number, self.column_number
        )
    }
}

fn location_error<T>(location: &ScriptLocation, msg: impl ToString, code: i32) -> UResult<T> {
    Err(USimpleError::new(
        code,
        format!("{location}: error: {}", msg.to_string()),
    ))
}

/// Fail with msg as a compile error at the provider location.
pub fn compilation_error<T>(
    lines: &ScriptLineProvider,
    line: &ScriptCharProvider,
    msg: impl ToString,
) -> UResult<T> {
    location_error(
        &ScriptLocation::at_position(lines, line),
        msg,
        EXIT_BAD_SCRIPT,
    )
}

/// Fail with msg as a compile error detected after parsing,
/// such as an undefined label.
pub fn semantic_error<T>(location: &ScriptLocation, msg: impl ToString) -> UResult<T> {
    location_error(location, msg, EXIT_BAD_SCRIPT)
}

/// Fail with msg as a fatal error while executing the command
/// defined at location.
pub fn runtime_error<T>(location: &ScriptLocation, msg: impl ToString) -> UResult<T> {
    location_error(location, msg, EXIT_PANIC)
}

/// Fail with msg as a fatal error not tied to any command.
pub fn fatal_error<T>(msg: impl ToString) -> UResult<T> {
    Err(USimpleError::new(EXIT_PANIC, msg.to_string()))
}
