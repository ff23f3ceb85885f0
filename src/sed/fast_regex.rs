// A unified interface to byte and fancy Regex
//
// This allows using byte Regex when possible, resorting to the
// slower fancy_regex crate when back-references are needed.
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the rsed package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex as RustRegex;
use regex::bytes::Regex as ByteRegex;
use std::fmt;
use std::str;
use uucore::error::UResult;

use crate::sed::error_handling::fatal_error;

/// Translated patterns that need the fancy_regex engine: those with
/// back-references, which the translator emits as `(?:\N)`.
// Literal text never produces this sequence, because the translator
// escapes literal parentheses and question marks.
static NEEDS_FANCY_RE: Lazy<RustRegex> = Lazy::new(|| {
    RustRegex::new(r"\(\?:\\[1-9]\)").unwrap()
});

#[derive(Clone)]
enum Engine {
    Byte(ByteRegex),
    Fancy(FancyRegex),
}

#[derive(Clone)]
/// A compiled regular expression together with the text it was
/// written as in the script
pub struct Regex {
    engine: Engine,
    label: String,
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.label).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Byte span of a match or capture group
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Group spans of a single successful match; group 0 is the whole match.
pub struct Captures {
    groups: Vec<Option<Match>>,
}

impl Captures {
    pub fn get(&self, i: usize) -> Option<Match> {
        self.groups.get(i).copied().flatten()
    }

    /// The span of the whole match.
    pub fn whole(&self) -> Match {
        self.get(0).unwrap_or(Match { start: 0, end: 0 })
    }
}

/// Convert the haystack into the &str fancy_regex requires.
fn as_text(haystack: &[u8]) -> UResult<&str> {
    str::from_utf8(haystack).or_else(|_| {
        fatal_error("input is not valid UTF-8, which back-reference matching requires")
    })
}

impl Regex {
    /// Compile a translated pattern, selecting the engine it needs.
    pub fn new(pattern: &str) -> Result<Self, String> {
        let engine = if NEEDS_FANCY_RE.is_match(pattern) {
            Engine::Fancy(FancyRegex::new(pattern).map_err(|e| e.to_string())?)
        } else {
            Engine::Byte(ByteRegex::new(pattern).map_err(|e| e.to_string())?)
        };
        Ok(Self {
            engine,
            label: pattern.to_string(),
        })
    }

    /// Set the text shown when the expression is displayed.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of capture groups, including the implicit group 0.
    pub fn captures_len(&self) -> usize {
        match &self.engine {
            Engine::Byte(re) => re.captures_len(),
            Engine::Fancy(re) => re.captures_len(),
        }
    }

    /// Return true if the expression matches anywhere in haystack.
    pub fn is_match(&self, haystack: &[u8]) -> UResult<bool> {
        match &self.engine {
            Engine::Byte(re) => Ok(re.is_match(haystack)),
            Engine::Fancy(re) => re
                .is_match(as_text(haystack)?)
                .or_else(|e| fatal_error(format!("regex matching failed: {e}"))),
        }
    }

    /// Return the captures of the leftmost match starting at or after
    /// `start`. Anchors still refer to the whole haystack.
    pub fn captures_at(&self, haystack: &[u8], start: usize) -> UResult<Option<Captures>> {
        match &self.engine {
            Engine::Byte(re) => Ok(re.captures_at(haystack, start).map(|caps| Captures {
                groups: caps
                    .iter()
                    .map(|m| {
                        m.map(|m| Match {
                            start: m.start(),
                            end: m.end(),
                        })
                    })
                    .collect(),
            })),
            Engine::Fancy(re) => {
                let caps = re
                    .captures_from_pos(as_text(haystack)?, start)
                    .or_else(|e| fatal_error(format!("regex matching failed: {e}")))?;
                Ok(caps.map(|caps| Captures {
                    groups: caps
                        .iter()
                        .map(|m| {
                            m.map(|m| Match {
                                start: m.start(),
                                end: m.end(),
                            })
                        })
                        .collect(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(caps: &Captures) -> Vec<Option<(usize, usize)>> {
        (0..caps.groups.len())
            .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
            .collect()
    }

    #[test]
    fn test_engine_selection() {
        let re = Regex::new("(?s)a(b)").unwrap();
        assert!(matches!(re.engine, Engine::Byte(_)));

        let re = Regex::new(r"(?s)(a)(?:\1)").unwrap();
        assert!(matches!(re.engine, Engine::Fancy(_)));

        let re = Regex::new(r"(?s)\(\?:\\1\)").unwrap();
        assert!(matches!(re.engine, Engine::Byte(_)));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Regex::new("(").is_err());
    }

    #[test]
    fn test_byte_captures() {
        let re = Regex::new("(?s)b(x)?(c)").unwrap();
        let caps = re.captures_at(b"abcbc", 0).unwrap().unwrap();
        assert_eq!(spans(&caps), vec![Some((1, 3)), None, Some((2, 3))]);
        assert_eq!(re.captures_len(), 3);

        let caps = re.captures_at(b"abcbc", 2).unwrap().unwrap();
        assert_eq!(caps.whole(), Match { start: 3, end: 5 });
    }

    #[test]
    fn test_anchor_respects_start() {
        let re = Regex::new("(?s)^a").unwrap();
        assert!(re.captures_at(b"aa", 1).unwrap().is_none());

        let re = Regex::new(r"(?s)^(a)(?:\1)").unwrap();
        assert!(re.captures_at(b"aaaa", 2).unwrap().is_none());
    }

    #[test]
    fn test_fancy_captures() {
        let re = Regex::new(r"(?s)(a+)-(?:\1)").unwrap();
        let caps = re.captures_at(b"xaa-aa", 0).unwrap().unwrap();
        assert_eq!(spans(&caps), vec![Some((1, 6)), Some((1, 3))]);
        assert!(re.is_match(b"a-a").unwrap());
        assert!(!re.is_match(b"a-b").unwrap());
    }

    #[test]
    fn test_fancy_rejects_invalid_utf8() {
        let re = Regex::new(r"(?s)(a)(?:\1)").unwrap();
        let err = re.is_match(b"aa\xff").unwrap_err();
        assert_eq!(err.code(), 4);
    }

    #[test]
    fn test_bytes_with_invalid_utf8() {
        let re = Regex::new("(?s)b").unwrap();
        assert!(re.is_match(b"\xffb").unwrap());
    }

    #[test]
    fn test_label() {
        let re = Regex::new("(?s)x").unwrap().labeled("x");
        assert_eq!(re.label(), "x");
        assert_eq!(format!("{re:?}"), "Regex(\"x\")");
    }
}
