// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

pub mod opcode;

use std::fmt::{self, Display};

// machine word
//
// main instruction word:
//
// |  9 8 7 6  |  5 4  |  3 2  |  1 0  |
// |  opcode   | s.mode| d.mode|  ERA  |
//
// operand extra word:
//
// |  9 8 7 6 5 4 3 2  |  1 0  |
// |   operand data    |  ERA  |
//
// register pair word (matrix index word, or two packed register operands):
//
// |  9 8 7 6  |  5 4 3 2  |  1 0  |
// |  src reg  |  dst reg  |  ERA  |
pub const WORD_BITS: u32 = 10;
pub const WORD_MASK: u16 = (1 << WORD_BITS) - 1;

pub const OPCODE_BITS: u32 = 4;
pub const OPCODE_SHIFT: u32 = 6;
pub const SRC_MODE_BITS: u32 = 2;
pub const SRC_MODE_SHIFT: u32 = 4;
pub const DST_MODE_BITS: u32 = 2;
pub const DST_MODE_SHIFT: u32 = 2;
pub const ERA_BITS: u32 = 2;
pub const ERA_SHIFT: u32 = 0;

pub const OPERAND_DATA_BITS: u32 = 8;
pub const OPERAND_DATA_SHIFT: u32 = 2;
pub const SRC_REG_BITS: u32 = 4;
pub const SRC_REG_SHIFT: u32 = 6;
pub const DST_REG_BITS: u32 = 4;
pub const DST_REG_SHIFT: u32 = 2;

/// Total machine memory in words.
pub const MEMORY_SIZE: u32 = 256;

/// First address available to a user program, the load offset
/// added to every address during relocation.
pub const MEMORY_OFFSET: u32 = 100;

/// Words available to a user program (code plus data).
pub const MEMORY_CAPACITY: u32 = MEMORY_SIZE - MEMORY_OFFSET;

pub const MAX_LINE_LEN: usize = 80;
pub const NAME_MAX_LEN: usize = 30;

/// Character budget (sign included) of an immediate literal after '#'.
pub const MAX_IMMEDIATE_CHARS: usize = 5;

/// Signed range of the 8-bit operand data field.
pub const IMMEDIATE_MIN: i32 = -(1 << (OPERAND_DATA_BITS - 1));
pub const IMMEDIATE_MAX: i32 = (1 << (OPERAND_DATA_BITS - 1)) - 1;

/// Signed range of a full 10-bit data word.
pub const DATA_MIN: i64 = -(1 << (WORD_BITS - 1));
pub const DATA_MAX: i64 = (1 << (WORD_BITS - 1)) - 1;

/// Fixed digit widths of the base-4 object file columns.
pub const OBJ_ADDRESS_WIDTH: usize = 4;
pub const OBJ_WORD_WIDTH: usize = 5;

/// ERA tag of an encoded word.
///
/// `Unknown` marks an operand word waiting for label resolution and
/// must never survive into emitted output.
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Era {
    Absolute = 0,
    External = 1,
    Relocatable = 2,
    Unknown = 3,
}

/// Addressing mode tag of an operand, as stored in the mode bit-fields.
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddrMode {
    Immediate = 0,
    Direct = 1,
    Matrix = 2,
    Register = 3,
}

impl AddrMode {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl Display for AddrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddrMode::Immediate => "immediate",
            AddrMode::Direct => "direct",
            AddrMode::Matrix => "matrix",
            AddrMode::Register => "register",
        };
        f.write_str(name)
    }
}

/// Set of addressing modes an opcode accepts in one operand slot.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ModeSet(u8);

impl ModeSet {
    pub const NONE: ModeSet = ModeSet(0);
    pub const AM12: ModeSet = ModeSet(0b0110); // direct, matrix
    pub const AM123: ModeSet = ModeSet(0b1110); // direct, matrix, register
    pub const ALL: ModeSet = ModeSet(0b1111);

    pub fn allows(self, mode: AddrMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A value did not fit the bit-field it was being packed into.
///
/// Every field width is decided at compile time, so an overflow is a
/// programming error rather than a source error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FieldOverflow {
    pub field: &'static str,
    pub value: u32,
    pub bits: u32,
}

impl Display for FieldOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value {} does not fit the {}-bit {} field",
            self.value, self.bits, self.field
        )
    }
}

impl std::error::Error for FieldOverflow {}

fn insert_field(
    word: u16,
    value: u16,
    bits: u32,
    shift: u32,
    field: &'static str,
) -> Result<u16, FieldOverflow> {
    if u32::from(value) >= (1u32 << bits) {
        return Err(FieldOverflow {
            field,
            value: u32::from(value),
            bits,
        });
    }
    Ok((word | (value << shift)) & WORD_MASK)
}

/// Packs the main instruction word. An absent operand slot leaves its
/// mode bits at zero.
pub fn main_word(
    opcode: u16,
    src_mode: Option<AddrMode>,
    dst_mode: Option<AddrMode>,
    era: Era,
) -> Result<u16, FieldOverflow> {
    let mut word = insert_field(0, opcode, OPCODE_BITS, OPCODE_SHIFT, "opcode")?;
    if let Some(mode) = src_mode {
        word = insert_field(word, mode as u16, SRC_MODE_BITS, SRC_MODE_SHIFT, "source mode")?;
    }
    if let Some(mode) = dst_mode {
        word = insert_field(
            word,
            mode as u16,
            DST_MODE_BITS,
            DST_MODE_SHIFT,
            "destination mode",
        )?;
    }
    insert_field(word, era as u16, ERA_BITS, ERA_SHIFT, "ERA")
}

/// Packs an operand extra word: 8 data bits plus the ERA tag.
pub fn operand_data_word(data: u16, era: Era) -> Result<u16, FieldOverflow> {
    let word = insert_field(0, data, OPERAND_DATA_BITS, OPERAND_DATA_SHIFT, "operand data")?;
    insert_field(word, era as u16, ERA_BITS, ERA_SHIFT, "ERA")
}

/// Packs a register word. A standalone register operand fills only the
/// bits of its own slot; a matrix index word or a packed register pair
/// fills both.
pub fn register_pair_word(
    src_reg: Option<u8>,
    dst_reg: Option<u8>,
    era: Era,
) -> Result<u16, FieldOverflow> {
    let mut word = 0;
    if let Some(reg) = src_reg {
        word = insert_field(word, u16::from(reg), SRC_REG_BITS, SRC_REG_SHIFT, "source register")?;
    }
    if let Some(reg) = dst_reg {
        word = insert_field(
            word,
            u16::from(reg),
            DST_REG_BITS,
            DST_REG_SHIFT,
            "destination register",
        )?;
    }
    insert_field(word, era as u16, ERA_BITS, ERA_SHIFT, "ERA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_word_without_operands() {
        // "stop": opcode 15 in bits 9..6, everything else zero
        let word = main_word(15, None, None, Era::Absolute).unwrap();
        assert_eq!(word, 0b1111_00_00_00);
    }

    #[test]
    fn test_main_word_with_both_modes() {
        // direct source (1), register destination (3)
        let word = main_word(0, Some(AddrMode::Direct), Some(AddrMode::Register), Era::Absolute)
            .unwrap();
        assert_eq!(word, 0b0000_01_11_00);
    }

    #[test]
    fn test_operand_data_word() {
        let word = operand_data_word(0xFF, Era::Relocatable).unwrap();
        assert_eq!(word, (0xFF << 2) | 2);
    }

    #[test]
    fn test_register_pair_word() {
        let word = register_pair_word(Some(3), Some(4), Era::Absolute).unwrap();
        assert_eq!(word, (3 << 6) | (4 << 2));

        let src_only = register_pair_word(Some(7), None, Era::Absolute).unwrap();
        assert_eq!(src_only, 7 << 6);

        let dst_only = register_pair_word(None, Some(7), Era::Absolute).unwrap();
        assert_eq!(dst_only, 7 << 2);
    }

    #[test]
    fn test_field_overflow_is_rejected() {
        let err = main_word(16, None, None, Era::Absolute).unwrap_err();
        assert_eq!(err.field, "opcode");
        assert_eq!(err.value, 16);

        assert!(operand_data_word(256, Era::Absolute).is_err());
        assert!(register_pair_word(Some(16), None, Era::Absolute).is_err());
    }

    #[test]
    fn test_mode_sets() {
        assert!(ModeSet::ALL.allows(AddrMode::Immediate));
        assert!(!ModeSet::AM123.allows(AddrMode::Immediate));
        assert!(ModeSet::AM123.allows(AddrMode::Register));
        assert!(ModeSet::AM12.allows(AddrMode::Direct));
        assert!(!ModeSet::AM12.allows(AddrMode::Register));
        assert!(ModeSet::NONE.is_empty());
    }
}
