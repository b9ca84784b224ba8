// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Instruction encoding: one parsed instruction in, a short run of
//! machine words out, plus a fix-up request for every operand word
//! that still waits for a label address.

use thiserror::Error;

use tenbit_parser::instruction::InstructionNode;
use tenbit_parser::operand::Operand;
use tenbit_types::{
    main_word, operand_data_word, register_pair_word, Era, FieldOverflow, IMMEDIATE_MAX,
    IMMEDIATE_MIN, OPERAND_DATA_BITS,
};

use crate::fixup::Fixup;

/// The words of one encoded instruction, in emission order: main word
/// first, then the source operand words, then the destination operand
/// words. Fix-up addresses are relative to the IC the encoder was
/// called with.
#[derive(Debug, PartialEq)]
pub struct EncodedInstruction {
    pub words: Vec<u16>,
    pub fixups: Vec<Fixup>,
}

#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("the immediate value {0} is outside the operand range {IMMEDIATE_MIN}..{IMMEDIATE_MAX}.")]
    ImmediateOutOfRange(i32),

    /// A bit-field overflow is a bug in the assembler, not in the
    /// source program.
    #[error(transparent)]
    Field(#[from] FieldOverflow),
}

enum Slot {
    Source,
    Destination,
}

/// Encodes one instruction at instruction counter `ic`. `line` is the
/// expanded-file line, carried into the fix-up requests.
pub fn encode_instruction(
    node: &InstructionNode,
    ic: u32,
    line: u32,
) -> Result<EncodedInstruction, EncodeError> {
    let opcode = node.opcode;
    let main = main_word(
        opcode.code,
        node.src.as_ref().map(Operand::mode),
        node.dst.as_ref().map(Operand::mode),
        opcode.era,
    )?;

    // two register operands share a single packed word
    if let (Some(Operand::Register(src)), Some(Operand::Register(dst))) = (&node.src, &node.dst) {
        let packed = register_pair_word(Some(*src), Some(*dst), Era::Absolute)?;
        return Ok(EncodedInstruction {
            words: vec![main, packed],
            fixups: vec![],
        });
    }

    let mut words = vec![main];
    let mut fixups = vec![];
    if let Some(operand) = &node.src {
        encode_operand(operand, Slot::Source, ic, line, &mut words, &mut fixups)?;
    }
    if let Some(operand) = &node.dst {
        encode_operand(operand, Slot::Destination, ic, line, &mut words, &mut fixups)?;
    }

    Ok(EncodedInstruction { words, fixups })
}

fn encode_operand(
    operand: &Operand,
    slot: Slot,
    ic: u32,
    line: u32,
    words: &mut Vec<u16>,
    fixups: &mut Vec<Fixup>,
) -> Result<(), EncodeError> {
    match operand {
        Operand::Immediate(value) => {
            if *value < IMMEDIATE_MIN || *value > IMMEDIATE_MAX {
                return Err(EncodeError::ImmediateOutOfRange(*value));
            }
            let field = (*value as u16) & 0xFF;
            words.push(operand_data_word(field, Era::Absolute)?);
        }

        Operand::Register(register) => {
            let word = match slot {
                Slot::Source => register_pair_word(Some(*register), None, Era::Absolute)?,
                Slot::Destination => register_pair_word(None, Some(*register), Era::Absolute)?,
            };
            words.push(word);
        }

        Operand::Direct { .. } => {
            // data field stays blank until the label resolves
            words.push(operand_data_word(0, Era::Unknown)?);
            fixups.push(Fixup {
                address: ic + words.len() as u32 - 1,
                operand: operand.clone(),
                line,
            });
        }

        Operand::Matrix { row_reg, col_reg, .. } => {
            words.push(operand_data_word(0, Era::Unknown)?);
            fixups.push(Fixup {
                address: ic + words.len() as u32 - 1,
                operand: operand.clone(),
                line,
            });
            words.push(register_pair_word(Some(*row_reg), Some(*col_reg), Era::Absolute)?);
        }
    }
    Ok(())
}

/// Packs a resolved label address with its ERA tag into an operand
/// word, for patching over a blank word from the first pass.
pub fn encode_resolved_address(address: u32, era: Era) -> Result<u16, FieldOverflow> {
    if address >= (1 << OPERAND_DATA_BITS) {
        return Err(FieldOverflow {
            field: "operand data",
            value: address,
            bits: OPERAND_DATA_BITS,
        });
    }
    operand_data_word(address as u16, era)
}
