// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Whole-pipeline tests: preprocessing, both passes and the output
//! writers driven through the public API.

use pretty_assertions::assert_eq;

use tenbit_assembler::files::write_object;
use tenbit_assembler::fixup::ExternalUse;
use tenbit_assembler::{assemble_text, AssemblyOutcome};
use tenbit_types::{MEMORY_CAPACITY, MEMORY_OFFSET};

fn assemble(source: &str) -> AssemblyOutcome {
    assemble_text("test.as", source)
}

#[test]
fn test_trivial_halt() {
    let outcome = assemble("stop\n");
    assert!(outcome.success);
    let context = &outcome.context;
    assert_eq!((context.ic, context.dc), (1, 0));
    assert_eq!(context.code.cells(), &[(100, 0b1111_00_00_00)]);

    let mut buffer = vec![];
    write_object(context, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text.lines().next().unwrap(), "ab  aa");
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_two_register_packing() {
    let outcome = assemble("mov r3, r4\nstop\n");
    assert!(outcome.success);
    let context = &outcome.context;
    assert_eq!((context.ic, context.dc), (3, 0));

    // r3 in the source register bits, r4 in the destination bits
    assert_eq!(context.code.get(101), Some((3 << 6) | (4 << 2)));
    assert_eq!(context.code.get(102), Some(15 << 6));
}

#[test]
fn test_extern_label_and_data() {
    let source = ".extern X\nLOOP: mov X, r1\nDAT: .data 5, -3\nstop\n";
    let outcome = assemble(source);
    assert!(outcome.success);
    let context = &outcome.context;
    assert_eq!((context.ic, context.dc), (4, 2));

    assert_eq!(context.labels.get("LOOP").unwrap().address, 100);
    assert_eq!(context.labels.get("DAT").unwrap().address, 104);
    assert_eq!(context.labels.get("X").unwrap().address, 0);

    // the patched word keeps address 0 and carries the external tag
    assert_eq!(context.code.get(101), Some(0b01));
    assert_eq!(
        context.externals,
        vec![ExternalUse { name: "X".to_string(), address: 101 }]
    );

    assert_eq!(context.data.cells(), &[(104, 5), (105, 1021)]);
}

#[test]
fn test_matrix_operand_encoding() {
    let source = "M: .mat [2][2] 1,2,3,4\nmov M[r1][r2], r3\nstop\n";
    let outcome = assemble(source);
    assert!(outcome.success);
    let context = &outcome.context;

    // main word, label word, index register pair, destination register
    assert_eq!((context.ic, context.dc), (5, 4));
    let code = context.code.cells();
    assert_eq!(code[0].0, 100);
    assert_eq!(code[2].1, (1 << 6) | (2 << 2));
    assert_eq!(code[3].1, 3 << 2);

    // matrix label resolves to the start of the data image
    let matrix_address = context.labels.get("M").unwrap().address;
    assert_eq!(matrix_address, 105);
    assert_eq!(context.code.get(101), Some(((matrix_address as u16) << 2) | 0b10));

    assert_eq!(
        context.data.cells(),
        &[(105, 1), (106, 2), (107, 3), (108, 4)]
    );
}

#[test]
fn test_entry_of_external_fails() {
    let outcome = assemble(".extern K\n.entry K\n");
    assert!(!outcome.success);
    assert!(outcome
        .context
        .diagnostics
        .messages()
        .iter()
        .any(|m| m.contains("cannot be an entry")));
}

#[test]
fn test_macro_error_reports_the_definition_line() {
    // the broken body line sits on source line 2, inside the macro
    let source = "mcro BAD\nmov r1\nmcroend\nBAD\nstop\n";
    let outcome = assemble(source);
    assert!(!outcome.success);
    assert!(outcome.context.diagnostics.messages()[0].starts_with("test.as::2:"));
}

#[test]
fn test_macro_expansion_assembles_like_flat_source() {
    let with_macro = "mcro GREET\nmov r1, r2\nadd r1, r2\nmcroend\nGREET\nGREET\nstop\n";
    let flat = "mov r1, r2\nadd r1, r2\nmov r1, r2\nadd r1, r2\nstop\n";

    let first = assemble(with_macro);
    let second = assemble(flat);
    assert!(first.success && second.success);
    assert_eq!(first.context.code.cells(), second.context.code.cells());
}

#[test]
fn test_string_directive_emits_codes_and_terminator() {
    let outcome = assemble("S: .string \"HELLO\"\nstop\n");
    assert!(outcome.success);
    let words: Vec<u16> = outcome
        .context
        .data
        .cells()
        .iter()
        .map(|(_, word)| *word)
        .collect();
    assert_eq!(words, vec![72, 69, 76, 76, 79, 0]);
}

#[test]
fn test_address_invariants() {
    let source = "MAIN: mov DAT, r1\nprn #5\nstop\nDAT: .data 1, 2, 3\n.entry MAIN\n";
    let outcome = assemble(source);
    assert!(outcome.success);
    let context = &outcome.context;

    assert!(context.ic + context.dc <= MEMORY_CAPACITY);

    // code addresses dense in [offset, offset + ic)
    for (position, (address, _)) in context.code.cells().iter().enumerate() {
        assert_eq!(*address, MEMORY_OFFSET + position as u32);
    }
    // data addresses dense right after the code image
    for (position, (address, _)) in context.data.cells().iter().enumerate() {
        assert_eq!(*address, MEMORY_OFFSET + context.ic + position as u32);
    }

    // every entry label is a defined, non-external label
    for label in context.labels.iter().filter(|label| label.is_entry) {
        assert_eq!(label.definition, tenbit_assembler::labels::Definition::Normal);
    }
}

#[test]
fn test_failing_source_reports_every_line() {
    let source = "mov r1\n.data x\nbad r1, r2\n";
    let outcome = assemble(source);
    assert!(!outcome.success);
    assert_eq!(outcome.context.diagnostics.messages().len(), 3);
    assert!(outcome.expanded.is_some());
}

#[test]
fn test_preprocessor_error_stops_the_pipeline() {
    let outcome = assemble("mcro stop\nmov r1, r2\nmcroend\n");
    assert!(!outcome.success);
    assert!(outcome.expanded.is_none());
    assert_eq!(outcome.context.ic, 0);
}
