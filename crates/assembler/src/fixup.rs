// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Deferred operand writes. The first pass records a request for every
//! label-referencing operand word it leaves blank; the second pass
//! resolves the label and patches the word in place.

use tenbit_parser::operand::Operand;

/// A code word waiting for a label address.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixup {
    /// Address of the blank word in the code image. Recorded against
    /// the pre-relocation address and shifted together with the image.
    pub address: u32,

    /// The direct or matrix operand that referenced the label.
    pub operand: Operand,

    /// Expanded-file line of the referencing operand, for diagnostics
    /// raised during resolution.
    pub line: u32,
}

impl Fixup {
    pub fn label_name(&self) -> &str {
        // only label-carrying operands are ever recorded
        self.operand.label().unwrap_or_default()
    }
}

/// One use of an external label, feeding the externals sidecar file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalUse {
    pub name: String,

    /// Final (relocated) address of the code word that references the
    /// label.
    pub address: u32,
}
