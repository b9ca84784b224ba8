// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The macro preprocessor.
//!
//! A definition opens with `mcro <name>` and closes with a line whose
//! sole token is `mcroend`; the body between them is captured verbatim.
//! A line whose sole token is a defined macro name is replaced by the
//! body. Definitions do not nest. The preprocessor also builds the
//! line map that later translates expanded line numbers back to source
//! line numbers.

use thiserror::Error;

use tenbit_types::opcode::{MACRO_END, MACRO_START};

use crate::{is_name_valid, lines_map::LineMap};

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,

    /// Body lines, verbatim, excluding the `mcro`/`mcroend` lines.
    pub body: Vec<String>,

    /// Source line of the `mcro` keyword; the body starts on the next
    /// line.
    pub defined_at: u32,
}

#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, macro_def: Macro) {
        self.macros.push(macro_def);
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.iter()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PreprocError {
    #[error("macro declaration error: macro name is missing after \"{MACRO_START}\".")]
    MissingName,

    #[error("macro declaration error: unexpected token found after the macro name.")]
    TokenAfterName,

    #[error("macro declaration error: \"{0}\" is not a valid macro name.")]
    InvalidName(String),

    #[error("macro declaration error: \"{0}\" is a reserved word.")]
    ReservedName(String),

    #[error("macro declaration error: macro \"{0}\" is already defined.")]
    DuplicateName(String),

    #[error("macro declaration error: macro \"{0}\" has no content.")]
    EmptyBody(String),

    #[error("macro declaration error: \"{MACRO_END}\" is missing for macro \"{0}\".")]
    MissingEnd(String),

    #[error("\"{MACRO_END}\" found without a matching \"{MACRO_START}\".")]
    EndWithoutStart,

    #[error("unexpected token found after \"{MACRO_END}\".")]
    TokenAfterEnd,

    #[error("unexpected token found after the invocation of macro \"{0}\".")]
    TokenAfterCall(String),
}

/// Result of running the preprocessor over one source text. When
/// `errors` is non-empty the expanded text must not be used (and no
/// expanded file is written).
#[derive(Debug)]
pub struct Expansion {
    pub text: String,
    pub line_map: LineMap,
    pub macros: MacroTable,
    pub errors: Vec<(u32, PreprocError)>,
}

pub fn expand(source: &str) -> Expansion {
    let lines: Vec<&str> = source.lines().collect();

    let mut text = String::new();
    let mut line_map = LineMap::new();
    let mut macros = MacroTable::new();
    let mut errors: Vec<(u32, PreprocError)> = vec![];
    let mut expanded_line: u32 = 0;

    let mut index = 0;
    while index < lines.len() {
        let source_line = (index + 1) as u32;
        let line = lines[index];
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some(MACRO_START) => {
                let name = match tokens.next() {
                    Some(name) => name,
                    None => {
                        errors.push((source_line, PreprocError::MissingName));
                        passthrough(&mut text, &mut line_map, &mut expanded_line, line, source_line);
                        index += 1;
                        continue;
                    }
                };
                if tokens.next().is_some() {
                    errors.push((source_line, PreprocError::TokenAfterName));
                    passthrough(&mut text, &mut line_map, &mut expanded_line, line, source_line);
                    index += 1;
                    continue;
                }

                if !is_name_valid(name) {
                    errors.push((source_line, PreprocError::InvalidName(name.to_string())));
                } else if tenbit_types::opcode::is_reserved_word(name) {
                    errors.push((source_line, PreprocError::ReservedName(name.to_string())));
                } else if macros.contains(name) {
                    errors.push((source_line, PreprocError::DuplicateName(name.to_string())));
                }

                // capture the body up to the closing keyword
                let mut body: Vec<String> = vec![];
                let mut cursor = index + 1;
                let mut closed = false;
                while cursor < lines.len() {
                    let body_line = lines[cursor];
                    let mut body_tokens = body_line.split_whitespace();
                    if body_tokens.next() == Some(MACRO_END) {
                        if body_tokens.next().is_some() {
                            errors.push(((cursor + 1) as u32, PreprocError::TokenAfterEnd));
                        }
                        closed = true;
                        break;
                    }
                    body.push(body_line.to_string());
                    cursor += 1;
                }

                if !closed {
                    errors.push((source_line, PreprocError::MissingEnd(name.to_string())));
                    return Expansion { text, line_map, macros, errors };
                }
                if body.is_empty() {
                    errors.push((source_line, PreprocError::EmptyBody(name.to_string())));
                    return Expansion { text, line_map, macros, errors };
                }

                macros.add(Macro {
                    name: name.to_string(),
                    body,
                    defined_at: source_line,
                });

                // continue after the closing keyword line
                index = cursor + 1;
            }

            Some(MACRO_END) => {
                errors.push((source_line, PreprocError::EndWithoutStart));
                passthrough(&mut text, &mut line_map, &mut expanded_line, line, source_line);
                index += 1;
            }

            Some(first) if macros.contains(first) => {
                if tokens.next().is_some() {
                    errors.push((source_line, PreprocError::TokenAfterCall(first.to_string())));
                    passthrough(&mut text, &mut line_map, &mut expanded_line, line, source_line);
                    index += 1;
                    continue;
                }

                // errors inside a body point at the line where the body
                // was written, not at the invocation site
                if let Some(macro_def) = macros.get(first) {
                    for (offset, body_line) in macro_def.body.iter().enumerate() {
                        text.push_str(body_line);
                        text.push('\n');
                        expanded_line += 1;
                        line_map.record(expanded_line, macro_def.defined_at + 1 + offset as u32);
                    }
                }
                index += 1;
            }

            _ => {
                passthrough(&mut text, &mut line_map, &mut expanded_line, line, source_line);
                index += 1;
            }
        }
    }

    Expansion { text, line_map, macros, errors }
}

fn passthrough(
    text: &mut String,
    line_map: &mut LineMap,
    expanded_line: &mut u32,
    line: &str,
    source_line: u32,
) {
    text.push_str(line);
    text.push('\n');
    *expanded_line += 1;
    line_map.record(*expanded_line, source_line);
}
