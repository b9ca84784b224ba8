// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The first pass over the expanded text: classifies every line,
//! collects label definitions, encodes instructions into the code
//! image and directive payloads into the data image, and records a
//! fix-up request for every operand word that waits for a label.
//!
//! A line that fails keeps the pass going; the error flag decides
//! later whether any output is written.

use tenbit_parser::directive::{parse_data, parse_extern_label, parse_matrix, parse_string};
use tenbit_parser::instruction::parse_instruction;
use tenbit_parser::line::{peel_label, split_first_token};
use tenbit_parser::{is_comment_or_empty, is_name_valid};
use tenbit_types::opcode::{
    opcode_by_mnemonic, Opcode, DATA_DIRECTIVE, ENTRY_DIRECTIVE, EXTERN_DIRECTIVE,
    MATRIX_DIRECTIVE, STRING_DIRECTIVE,
};
use tenbit_types::{DATA_MAX, DATA_MIN, MAX_LINE_LEN, WORD_MASK};

use crate::context::AssemblyContext;
use crate::diagnostics::PassError;
use crate::encoder::{encode_instruction, EncodeError};
use crate::labels::{can_define_name, Definition, Segment};

pub fn run(context: &mut AssemblyContext, expanded: &str) -> bool {
    let mut ok = true;
    for (index, raw_line) in expanded.lines().enumerate() {
        let line_no = (index + 1) as u32;
        if !process_line(context, raw_line, line_no) {
            ok = false;
        }
    }
    ok
}

fn process_line(context: &mut AssemblyContext, raw_line: &str, line_no: u32) -> bool {
    if raw_line.len() > MAX_LINE_LEN {
        context.report(line_no, PassError::LineTooLong);
        return false;
    }
    if is_comment_or_empty(raw_line) {
        return true;
    }

    let (label_token, rest) = peel_label(raw_line);

    // a bad label name is reported but the statement is still parsed,
    // so one line can surface both problems
    let mut ok = true;
    let label = match label_token {
        None => None,
        Some(name) if !is_name_valid(name) => {
            context.report(line_no, PassError::InvalidLabelName(name.to_string()));
            ok = false;
            None
        }
        Some(name) if !can_define_name(name, &context.labels, &context.macros) => {
            context.report(line_no, PassError::LabelNameInUse(name.to_string()));
            ok = false;
            None
        }
        Some(name) => Some(name.to_string()),
    };

    if is_comment_or_empty(rest) {
        context.report(line_no, PassError::EmptyLabeledLine);
        return false;
    }
    let Some((head, tail)) = split_first_token(rest) else {
        context.report(line_no, PassError::EmptyLabeledLine);
        return false;
    };

    if let Some(opcode) = opcode_by_mnemonic(head) {
        let ic_before = context.ic;
        if handle_instruction(context, opcode, tail, line_no) {
            if let Some(name) = label {
                context.labels.add(name, ic_before, Segment::Code, Definition::Normal);
            }
        } else {
            ok = false;
        }
    } else if head == DATA_DIRECTIVE || head == STRING_DIRECTIVE || head == MATRIX_DIRECTIVE {
        let dc_before = context.dc;
        if handle_data_directive(context, head, tail, line_no) {
            if let Some(name) = label {
                context.labels.add(name, dc_before, Segment::Data, Definition::Normal);
            }
        } else {
            ok = false;
        }
    } else if head == ENTRY_DIRECTIVE {
        // resolved in the second pass
    } else if head == EXTERN_DIRECTIVE {
        // a label attached to an extern line names nothing; only the
        // extern name itself is recorded
        if !handle_extern(context, tail, line_no) {
            ok = false;
        }
    } else if head.starts_with('.') {
        context.report(line_no, PassError::UnknownDirective(head.to_string()));
        ok = false;
    } else {
        context.report(line_no, PassError::UnknownOpcode(head.to_string()));
        ok = false;
    }

    ok
}

fn handle_instruction(
    context: &mut AssemblyContext,
    opcode: &'static Opcode,
    field: &str,
    line_no: u32,
) -> bool {
    let node = match parse_instruction(opcode, field) {
        Ok(node) => node,
        Err(error) => {
            context.report(line_no, error);
            return false;
        }
    };

    let encoded = match encode_instruction(&node, context.ic, line_no) {
        Ok(encoded) => encoded,
        Err(error @ EncodeError::ImmediateOutOfRange(_)) => {
            context.report(line_no, error);
            return false;
        }
        Err(EncodeError::Field(overflow)) => {
            context.diagnostics.report_file(overflow);
            return false;
        }
    };

    for word in &encoded.words {
        if !context.emit_code(*word, line_no) {
            return false;
        }
    }
    context.fixups.extend(encoded.fixups);
    true
}

fn handle_data_directive(
    context: &mut AssemblyContext,
    directive: &str,
    field: &str,
    line_no: u32,
) -> bool {
    let parsed = match directive {
        DATA_DIRECTIVE => parse_data(field),
        STRING_DIRECTIVE => parse_string(field),
        _ => parse_matrix(field),
    };
    let values = match parsed {
        Ok(values) => values,
        Err(error) => {
            context.report(line_no, error);
            return false;
        }
    };

    // reject the whole line before anything lands in the image
    for value in &values {
        if *value < DATA_MIN || *value > DATA_MAX {
            context.report(line_no, PassError::DataValueOutOfRange(*value));
            return false;
        }
    }

    for value in values {
        let word = (value as u16) & WORD_MASK;
        if !context.emit_data(word, line_no) {
            return false;
        }
    }
    true
}

fn handle_extern(context: &mut AssemblyContext, field: &str, line_no: u32) -> bool {
    let name = match parse_extern_label(field) {
        Ok(name) => name,
        Err(error) => {
            context.report(line_no, error);
            return false;
        }
    };
    if !can_define_name(&name, &context.labels, &context.macros) {
        context.report(line_no, PassError::ExternNameInUse(name));
        return false;
    }
    context.labels.add(name, 0, Segment::Unresolved, Definition::External);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_pass(source: &str) -> (AssemblyContext, bool) {
        let mut context = AssemblyContext::new("test.as");
        let ok = run(&mut context, source);
        (context, ok)
    }

    #[test]
    fn test_trivial_halt() {
        let (context, ok) = first_pass("stop\n");
        assert!(ok);
        assert_eq!(context.ic, 1);
        assert_eq!(context.dc, 0);
        assert_eq!(context.code.cells(), &[(0, 0b1111_00_00_00)]);
    }

    #[test]
    fn test_labels_get_pre_relocation_addresses() {
        let source = "LOOP: mov r1, r2\nDAT: .data 5, -3\nstop\n";
        let (context, ok) = first_pass(source);
        assert!(ok);
        assert_eq!(context.ic, 3);
        assert_eq!(context.dc, 2);

        let loop_label = context.labels.get("LOOP").unwrap();
        assert_eq!((loop_label.address, loop_label.segment), (0, Segment::Code));
        let dat_label = context.labels.get("DAT").unwrap();
        assert_eq!((dat_label.address, dat_label.segment), (0, Segment::Data));

        // -3 stored as a two's complement 10-bit word
        assert_eq!(context.data.cells(), &[(0, 5), (1, 1021)]);
    }

    #[test]
    fn test_extern_line() {
        let (context, ok) = first_pass(".extern X\n");
        assert!(ok);
        let x = context.labels.get("X").unwrap();
        assert_eq!(x.address, 0);
        assert_eq!(x.segment, Segment::Unresolved);
        assert_eq!(x.definition, Definition::External);
    }

    #[test]
    fn test_label_on_extern_line_is_ignored() {
        let (context, ok) = first_pass("E: .extern X\nstop\n");
        assert!(ok);
        assert!(context.labels.contains("X"));
        assert!(!context.labels.contains("E"));
    }

    #[test]
    fn test_duplicate_label_is_reported_and_skipped() {
        let source = "A: stop\nA: stop\n";
        let (context, ok) = first_pass(source);
        assert!(!ok);
        assert_eq!(context.labels.iter().count(), 1);
        assert!(context.diagnostics.messages()[0].contains("already in use"));
        // the second instruction was still encoded
        assert_eq!(context.ic, 2);
    }

    #[test]
    fn test_empty_labeled_line() {
        let (context, ok) = first_pass("L:\n");
        assert!(!ok);
        assert!(context.diagnostics.messages()[0].contains("must be followed"));
    }

    #[test]
    fn test_unknown_names() {
        let (context, ok) = first_pass(".word 5\nmuv r1, r2\n");
        assert!(!ok);
        assert!(context.diagnostics.messages()[0].contains("unknown directive"));
        assert!(context.diagnostics.messages()[1].contains("unknown opcode"));
    }

    #[test]
    fn test_errors_do_not_stop_the_pass() {
        let source = "mov r1\nstop\n";
        let (context, ok) = first_pass(source);
        assert!(!ok);
        // the line after the broken one was still processed
        assert_eq!(context.ic, 1);
    }

    #[test]
    fn test_line_too_long() {
        let long_line = format!("; {}\n", "x".repeat(MAX_LINE_LEN));
        let (context, ok) = first_pass(&long_line);
        assert!(!ok);
        assert!(context.diagnostics.messages()[0].contains("maximum allowed length"));
    }

    #[test]
    fn test_data_value_out_of_range() {
        let (context, ok) = first_pass(".data 512\n");
        assert!(!ok);
        assert_eq!(context.dc, 0);
        assert!(context.diagnostics.messages()[0].contains("does not fit"));
    }

    #[test]
    fn test_memory_exhaustion_reported_once() {
        // 40 matrices of 4 cells each overflow the 156-word budget
        let mut source = String::new();
        for _ in 0..40 {
            source.push_str(".mat [2][2] 1,2,3,4\n");
        }
        let (context, ok) = first_pass(&source);
        assert!(!ok);
        assert_eq!(context.memory_usage(), tenbit_types::MEMORY_CAPACITY);
        let exhausted: Vec<_> = context
            .diagnostics
            .messages()
            .iter()
            .filter(|m| m.contains("out of memory"))
            .collect();
        assert_eq!(exhausted.len(), 1);
    }
}
