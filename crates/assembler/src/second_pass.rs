// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The second pass: marks entry labels, relocates both images and the
//! symbol table to their final addresses, then patches every operand
//! word that was waiting for a label.
//!
//! Relocation order matters: the code image moves first, the data
//! image lands right after it, the recorded fix-up addresses follow
//! the code image, and only then are labels updated and the patches
//! applied.

use tenbit_parser::directive::parse_entry_label;
use tenbit_parser::is_comment_or_empty;
use tenbit_parser::line::{peel_label, split_first_token};
use tenbit_types::opcode::ENTRY_DIRECTIVE;
use tenbit_types::{Era, MEMORY_OFFSET};

use crate::context::AssemblyContext;
use crate::diagnostics::PassError;
use crate::encoder::encode_resolved_address;
use crate::fixup::ExternalUse;
use crate::labels::Definition;

pub fn run(context: &mut AssemblyContext, expanded: &str) -> bool {
    let mut ok = mark_entries(context, expanded);

    relocate(context);

    if !apply_fixups(context) {
        ok = false;
    }
    ok
}

/// Re-scans the expanded text for `.entry` lines; everything else was
/// already handled by the first pass.
fn mark_entries(context: &mut AssemblyContext, expanded: &str) -> bool {
    let mut ok = true;
    for (index, raw_line) in expanded.lines().enumerate() {
        let line_no = (index + 1) as u32;
        if is_comment_or_empty(raw_line) {
            continue;
        }

        // label definitions were validated in the first pass
        let (_, rest) = peel_label(raw_line);
        let Some((head, tail)) = split_first_token(rest) else {
            continue;
        };
        if head != ENTRY_DIRECTIVE {
            continue;
        }

        let name = match parse_entry_label(tail) {
            Ok(name) => name,
            Err(error) => {
                context.report(line_no, error);
                ok = false;
                continue;
            }
        };
        match context.labels.get_mut(&name) {
            None => {
                context.report(line_no, PassError::EntryUndefined(name));
                ok = false;
            }
            Some(label) if label.definition == Definition::External => {
                context.report(line_no, PassError::EntryIsExternal(name));
                ok = false;
            }
            Some(label) => label.is_entry = true,
        }
    }
    ok
}

fn relocate(context: &mut AssemblyContext) {
    let final_ic = context.ic;
    context.code.relocate(MEMORY_OFFSET);
    context.data.relocate(MEMORY_OFFSET + final_ic);
    for fixup in &mut context.fixups {
        fixup.address += MEMORY_OFFSET;
    }
    context.labels.relocate(final_ic);
}

/// Resolves every recorded fix-up in order and overwrites the blank
/// operand words. Stops at the first undefined label; the file cannot
/// produce output past that point.
fn apply_fixups(context: &mut AssemblyContext) -> bool {
    let fixups = std::mem::take(&mut context.fixups);

    for fixup in fixups {
        let name = fixup.label_name().to_string();
        let Some(label) = context.labels.get(&name) else {
            context.report(fixup.line, PassError::UndefinedLabel(name));
            return false;
        };

        let era = if label.definition == Definition::External {
            Era::External
        } else {
            Era::Relocatable
        };
        let address = label.address;
        if era == Era::External {
            context.externals.push(ExternalUse { name, address: fixup.address });
        }

        let word = match encode_resolved_address(address, era) {
            Ok(word) => word,
            Err(overflow) => {
                context.diagnostics.report_file(overflow);
                return false;
            }
        };
        if !context.code.patch(fixup.address, word) {
            context
                .diagnostics
                .report_file(format!("no code word at address {} to patch", fixup.address));
            return false;
        }
    }
    true
}
