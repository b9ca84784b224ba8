// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Instruction line parsing: operand arity and per-slot addressing
//! mode validation against the opcode table.

use thiserror::Error;

use tenbit_types::opcode::Opcode;

use crate::operand::{extract_operands, parse_operand, Operand, OperandError};

/// A fully parsed instruction, ready for encoding.
#[derive(Debug, PartialEq)]
pub struct InstructionNode {
    pub opcode: &'static Opcode,
    pub src: Option<Operand>,
    pub dst: Option<Operand>,
}

#[derive(Debug, Error, PartialEq)]
pub enum InstructionError {
    #[error("no operands found for opcode \"{0}\".")]
    MissingOperands(&'static str),

    #[error("not enough operands for opcode \"{0}\".")]
    NotEnoughOperands(&'static str),

    #[error("found more operands than required for opcode \"{0}\".")]
    TooManyOperands(&'static str),

    #[error("invalid source operand.")]
    InvalidSource,

    #[error("invalid destination operand.")]
    InvalidDestination,

    #[error("{0} addressing is not allowed for the source operand of \"{1}\".")]
    SourceModeNotAllowed(tenbit_types::AddrMode, &'static str),

    #[error("{0} addressing is not allowed for the destination operand of \"{1}\".")]
    DestinationModeNotAllowed(tenbit_types::AddrMode, &'static str),

    #[error(transparent)]
    Operand(#[from] OperandError),
}

enum Slot {
    Source,
    Destination,
}

/// Parses the operand field of an instruction line. `field` is the
/// text after the mnemonic.
pub fn parse_instruction(
    opcode: &'static Opcode,
    field: &str,
) -> Result<InstructionNode, InstructionError> {
    if opcode.operands == 0 {
        if !field.trim().is_empty() {
            return Err(InstructionError::TooManyOperands(opcode.mnemonic));
        }
        return Ok(InstructionNode { opcode, src: None, dst: None });
    }

    let operands = extract_operands(field)?;
    match (opcode.operands, operands.len()) {
        (_, 0) => return Err(InstructionError::MissingOperands(opcode.mnemonic)),
        (2, 1) => return Err(InstructionError::NotEnoughOperands(opcode.mnemonic)),
        (1, 1) | (2, 2) => {}
        _ => return Err(InstructionError::TooManyOperands(opcode.mnemonic)),
    }

    let (src, dst) = if opcode.operands == 2 {
        (
            Some(parse_slot(&operands[0], Slot::Source)?),
            Some(parse_slot(&operands[1], Slot::Destination)?),
        )
    } else {
        (None, Some(parse_slot(&operands[0], Slot::Destination)?))
    };

    if let Some(operand) = &src {
        if !opcode.src_modes.allows(operand.mode()) {
            return Err(InstructionError::SourceModeNotAllowed(
                operand.mode(),
                opcode.mnemonic,
            ));
        }
    }
    if let Some(operand) = &dst {
        if !opcode.dst_modes.allows(operand.mode()) {
            return Err(InstructionError::DestinationModeNotAllowed(
                operand.mode(),
                opcode.mnemonic,
            ));
        }
    }

    Ok(InstructionNode { opcode, src, dst })
}

fn parse_slot(token: &str, slot: Slot) -> Result<Operand, InstructionError> {
    match parse_operand(token) {
        Ok(operand) => Ok(operand),
        Err(OperandError::Unrecognized(_)) => Err(match slot {
            Slot::Source => InstructionError::InvalidSource,
            Slot::Destination => InstructionError::InvalidDestination,
        }),
        Err(error) => Err(error.into()),
    }
}
