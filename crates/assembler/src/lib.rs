// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The assembler back-end: symbol table, memory images, instruction
//! encoding, the two passes over the expanded text, and the output
//! file writers.
//!
//! The pipeline per source is preprocessor, first pass, second pass,
//! emitters. Each stage only runs when the previous one finished
//! without recorded errors, and no output files are written for a
//! source that had any.

pub mod context;
pub mod diagnostics;
pub mod driver;
pub mod encoder;
pub mod files;
pub mod first_pass;
pub mod fixup;
pub mod labels;
pub mod memory;
pub mod second_pass;

use tenbit_parser::preprocessor;

pub use context::AssemblyContext;

/// Result of assembling one source text. The expanded text is absent
/// when preprocessing failed; `success` is true only when every stage
/// ran clean.
#[derive(Debug)]
pub struct AssemblyOutcome {
    pub context: AssemblyContext,
    pub expanded: Option<String>,
    pub success: bool,
}

/// Runs preprocessing and both passes over one source text.
/// `source_name` labels the diagnostics; file handling stays with the
/// driver.
pub fn assemble_text(source_name: &str, source: &str) -> AssemblyOutcome {
    let mut context = AssemblyContext::new(source_name);

    let expansion = preprocessor::expand(source);
    context.macros = expansion.macros;
    context.line_map = expansion.line_map;
    if !expansion.errors.is_empty() {
        for (line, error) in &expansion.errors {
            context.diagnostics.report_line(*line, error);
        }
        return AssemblyOutcome { context, expanded: None, success: false };
    }
    log::info!("preprocessing completed");

    let expanded = expansion.text;
    if !first_pass::run(&mut context, &expanded) {
        context.dump();
        return AssemblyOutcome { context, expanded: Some(expanded), success: false };
    }
    log::info!("first pass completed, IC = {}, DC = {}", context.ic, context.dc);

    let success = second_pass::run(&mut context, &expanded);
    if success {
        log::info!("second pass completed");
    }
    context.dump();

    AssemblyOutcome { context, expanded: Some(expanded), success }
}
