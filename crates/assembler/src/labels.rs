// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! The symbol table. Labels keep their insertion order; lookups are by
//! exact name.

use tenbit_parser::preprocessor::MacroTable;
use tenbit_types::{opcode::is_reserved_word, MEMORY_OFFSET};

/// Which image a label points into. An external label stays
/// `Unresolved`; its address belongs to another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Code,
    Data,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    Normal,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub address: u32,
    pub segment: Segment,
    pub definition: Definition,
    pub is_entry: bool,
}

#[derive(Debug, Default)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a label. Uniqueness is the caller's check, made before
    /// the line owning the label is processed.
    pub fn add(&mut self, name: String, address: u32, segment: Segment, definition: Definition) {
        self.labels.push(Label {
            name,
            address,
            segment,
            definition,
            is_entry: false,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Label> {
        self.labels.iter_mut().find(|label| label.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn has_entries(&self) -> bool {
        self.labels.iter().any(|label| label.is_entry)
    }

    /// Moves every label to its final address: code labels land after
    /// the load offset, data labels after the code image. External
    /// labels keep address 0.
    pub fn relocate(&mut self, final_ic: u32) {
        for label in &mut self.labels {
            match label.segment {
                Segment::Code => label.address += MEMORY_OFFSET,
                Segment::Data => label.address += MEMORY_OFFSET + final_ic,
                Segment::Unresolved => {}
            }
        }
    }
}

/// Whether `name` is still free to define: not a keyword of the
/// language, not a label, not a macro.
pub fn can_define_name(name: &str, labels: &LabelTable, macros: &MacroTable) -> bool {
    !is_reserved_word(name) && !labels.contains(name) && !macros.contains(name)
}
