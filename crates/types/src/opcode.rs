// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The instruction set tables: opcode descriptors, register names and
//! the reserved keywords of the source language.

use crate::{Era, ModeSet};

/// One row of the opcode table.
#[derive(Debug, PartialEq)]
pub struct Opcode {
    pub code: u16,
    pub mnemonic: &'static str,

    /// Expected number of operands, 0..=2.
    pub operands: u8,

    pub src_modes: ModeSet,
    pub dst_modes: ModeSet,
    pub era: Era,
}

pub const OPCODE_TABLE: [Opcode; 16] = [
    opcode(0, "mov", 2, ModeSet::ALL, ModeSet::AM123),
    opcode(1, "cmp", 2, ModeSet::ALL, ModeSet::ALL),
    opcode(2, "add", 2, ModeSet::ALL, ModeSet::AM123),
    opcode(3, "sub", 2, ModeSet::ALL, ModeSet::AM123),
    opcode(4, "lea", 2, ModeSet::AM12, ModeSet::AM123),
    opcode(5, "clr", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(6, "not", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(7, "inc", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(8, "dec", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(9, "jmp", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(10, "bne", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(11, "jsr", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(12, "red", 1, ModeSet::NONE, ModeSet::AM123),
    opcode(13, "prn", 1, ModeSet::NONE, ModeSet::ALL),
    opcode(14, "rts", 0, ModeSet::NONE, ModeSet::NONE),
    opcode(15, "stop", 0, ModeSet::NONE, ModeSet::NONE),
];

const fn opcode(
    code: u16,
    mnemonic: &'static str,
    operands: u8,
    src_modes: ModeSet,
    dst_modes: ModeSet,
) -> Opcode {
    Opcode {
        code,
        mnemonic,
        operands,
        src_modes,
        dst_modes,
        era: Era::Absolute,
    }
}

pub const REGISTERS: [&str; 8] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

pub const DATA_DIRECTIVE: &str = ".data";
pub const STRING_DIRECTIVE: &str = ".string";
pub const MATRIX_DIRECTIVE: &str = ".mat";
pub const ENTRY_DIRECTIVE: &str = ".entry";
pub const EXTERN_DIRECTIVE: &str = ".extern";

pub const DIRECTIVES: [&str; 5] = [
    DATA_DIRECTIVE,
    STRING_DIRECTIVE,
    MATRIX_DIRECTIVE,
    ENTRY_DIRECTIVE,
    EXTERN_DIRECTIVE,
];

pub const MACRO_START: &str = "mcro";
pub const MACRO_END: &str = "mcroend";

pub fn opcode_by_mnemonic(name: &str) -> Option<&'static Opcode> {
    OPCODE_TABLE.iter().find(|entry| entry.mnemonic == name)
}

pub fn is_opcode(name: &str) -> bool {
    opcode_by_mnemonic(name).is_some()
}

/// Register index of `name`, when `name` is one of `r0`..`r7`.
pub fn register_index(name: &str) -> Option<u8> {
    REGISTERS
        .iter()
        .position(|register| *register == name)
        .map(|index| index as u8)
}

pub fn is_register(name: &str) -> bool {
    register_index(name).is_some()
}

pub fn is_directive_word(name: &str) -> bool {
    DIRECTIVES.contains(&name)
}

/// Whether `name` collides with a keyword of the language: an opcode,
/// a register, a directive (with or without the leading dot) or one of
/// the macro declaration words. Such a name cannot be used for a label
/// or a macro.
pub fn is_reserved_word(name: &str) -> bool {
    if is_opcode(name) || is_register(name) {
        return true;
    }
    if name == MACRO_START || name == MACRO_END {
        return true;
    }
    DIRECTIVES
        .iter()
        .any(|directive| *directive == name || directive[1..] == *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddrMode;

    #[test]
    fn test_opcode_lookup() {
        let mov = opcode_by_mnemonic("mov").unwrap();
        assert_eq!(mov.code, 0);
        assert_eq!(mov.operands, 2);
        assert!(mov.src_modes.allows(AddrMode::Immediate));
        assert!(!mov.dst_modes.allows(AddrMode::Immediate));

        let stop = opcode_by_mnemonic("stop").unwrap();
        assert_eq!(stop.code, 15);
        assert_eq!(stop.operands, 0);

        assert!(opcode_by_mnemonic("halt").is_none());
    }

    #[test]
    fn test_register_index() {
        assert_eq!(register_index("r0"), Some(0));
        assert_eq!(register_index("r7"), Some(7));
        assert_eq!(register_index("r8"), None);
        assert_eq!(register_index("R1"), None);
    }

    #[test]
    fn test_reserved_words() {
        for name in ["mov", "stop", "r3", "mcro", "mcroend", ".data", "data", "entry"] {
            assert!(is_reserved_word(name), "{} should be reserved", name);
        }
        for name in ["LOOP", "main", "x", "r9"] {
            assert!(!is_reserved_word(name), "{} should be available", name);
        }
    }
}
