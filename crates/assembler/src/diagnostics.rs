// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Per-source diagnostic sink and the source errors raised by the
//! passes themselves (everything the line parsers do not already
//! report).

use std::fmt::Display;

use thiserror::Error;

use tenbit_types::{MAX_LINE_LEN, MEMORY_CAPACITY, WORD_BITS};

#[derive(Debug, Error, PartialEq)]
pub enum PassError {
    #[error("line exceeds the maximum allowed length of {MAX_LINE_LEN} characters.")]
    LineTooLong,

    #[error("a label definition must be followed by an instruction or a directive.")]
    EmptyLabeledLine,

    #[error("invalid label name \"{0}\".")]
    InvalidLabelName(String),

    #[error("label name \"{0}\" is already in use.")]
    LabelNameInUse(String),

    #[error("unknown directive name \"{0}\".")]
    UnknownDirective(String),

    #[error("unknown opcode name \"{0}\".")]
    UnknownOpcode(String),

    #[error("extern directive error: label name \"{0}\" is already in use.")]
    ExternNameInUse(String),

    #[error("the value {0} does not fit a signed {WORD_BITS}-bit data word.")]
    DataValueOutOfRange(i64),

    #[error("out of memory: the program reached the maximum of {MEMORY_CAPACITY} words.")]
    OutOfMemory,

    #[error("entry directive error: label \"{0}\" is not defined.")]
    EntryUndefined(String),

    #[error("entry directive error: the external label \"{0}\" cannot be an entry.")]
    EntryIsExternal(String),

    #[error("attempted to use the undeclared label \"{0}\".")]
    UndefinedLabel(String),
}

/// Collects the rendered diagnostics of one source file and mirrors
/// them to stderr as they are recorded. Line-keyed reports expect the
/// original source line; translation from expanded lines happens at
/// the call sites, which own the line map.
#[derive(Debug)]
pub struct Diagnostics {
    source_name: String,
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            messages: vec![],
        }
    }

    pub fn report_line(&mut self, source_line: u32, error: impl Display) {
        let message = format!("{}::{}: ERROR: {}", self.source_name, source_line, error);
        eprintln!("{}", message);
        self.messages.push(message);
    }

    pub fn report_file(&mut self, error: impl Display) {
        let message = format!("{}: ERROR: {}", self.source_name, error);
        eprintln!("{}", message);
        self.messages.push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rendering() {
        let mut diagnostics = Diagnostics::new("prog.as");
        diagnostics.report_line(7, PassError::UnknownOpcode("muv".to_string()));
        diagnostics.report_file(PassError::OutOfMemory);

        assert_eq!(
            diagnostics.messages()[0],
            "prog.as::7: ERROR: unknown opcode name \"muv\"."
        );
        assert!(diagnostics.messages()[1].starts_with("prog.as: ERROR: out of memory"));
        assert!(diagnostics.has_errors());
    }
}
