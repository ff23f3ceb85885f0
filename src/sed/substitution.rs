// Regex-driven search and replace on the pattern space
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::sed::command::Substitution;
use crate::sed::space::Space;

use uucore::error::UResult;

/// Return the position following the character that starts at pos.
fn next_char_boundary(haystack: &[u8], pos: usize) -> usize {
    let width = match haystack.get(pos) {
        Some(&b) if b >= 0xf0 => 4,
        Some(&b) if b >= 0xe0 => 3,
        Some(&b) if b >= 0xc0 => 2,
        _ => 1,
    };
    (pos + width).min(haystack.len())
}

/// Apply the substitution to the space, returning the number of
/// replacements made. The space is modified only if this is not zero.
pub fn substitute(subst: &Substitution, space: &mut Space) -> UResult<usize> {
    let haystack = &space.content;
    let mut out = Vec::new();

    let mut pos = 0; // Where the next search starts
    let mut copied = 0; // Bytes of haystack already in out
    let mut prev_end = None; // End of the previous match
    let mut count = 0; // Matches found
    let mut replaced = 0;

    while let Some(caps) = subst.regex.captures_at(haystack, pos)? {
        let m = caps.whole();

        // An empty match adjacent to the previous match doesn't count.
        let adjacent = m.is_empty() && prev_end == Some(m.start());
        if !adjacent {
            count += 1;
            if count >= subst.occurrence {
                out.extend_from_slice(&haystack[copied..m.start()]);
                subst.replacement.apply_captures(haystack, &caps, &mut out);
                copied = m.end();
                replaced += 1;
                if !subst.global {
                    break;
                }
            }
            prev_end = Some(m.end());
        }

        if m.is_empty() {
            // Force progress past the empty match.
            if m.end() >= haystack.len() {
                break;
            }
            pos = next_char_boundary(haystack, m.end());
        } else {
            pos = m.end();
        }
    }

    if replaced > 0 {
        out.extend_from_slice(&haystack[copied..]);
        space.content = out;
    }
    Ok(replaced)
}
