// Resolution of branch targets to label positions
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::command::{BranchTarget, CommandData, Cursor, Program};
use crate::sed::error_handling::{ScriptLocation, semantic_error};

use std::collections::HashMap;
use uucore::error::UResult;

#[derive(Debug, Default)]
/// Labels and jumps collected during compilation
pub struct LabelResolver {
    labels: HashMap<String, Cursor>,
    jumps: Vec<(String, Cursor, ScriptLocation)>,
}

impl LabelResolver {
    /// Record the definition of a label at the specified position.
    pub fn add_label(
        &mut self,
        name: &str,
        at: Cursor,
        location: &ScriptLocation,
    ) -> UResult<()> {
        if self.labels.insert(name.to_string(), at).is_some() {
            return semantic_error(location, format!("duplicate label `{name}'"));
        }
        Ok(())
    }

    /// Record a b or t command that jumps to the named label.
    pub fn add_jump(&mut self, name: &str, at: Cursor, location: &ScriptLocation) {
        self.jumps.push((name.to_string(), at, location.clone()));
    }

    /// Patch all jumps with the position of their label.
    pub fn resolve(self, program: &mut Program) -> UResult<()> {
        for (name, at, location) in self.jumps {
            let target = if name.is_empty() {
                BranchTarget::EndOfScript
            } else if let Some(label) = self.labels.get(&name) {
                BranchTarget::Resolved(*label)
            } else {
                return semantic_error(&location, format!("can't find label for jump to `{name}'"));
            };

            if let Some(cmd) = program.command_mut(at) {
                cmd.data = CommandData::Branch(target);
            }
        }
        Ok(())
    }
}
