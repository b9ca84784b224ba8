// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Per-source assembly state. One context is created when a source
//! file enters the pipeline and dropped when the file is done; nothing
//! survives across inputs.

use std::fmt::Display;

use tenbit_parser::lines_map::LineMap;
use tenbit_parser::preprocessor::MacroTable;
use tenbit_types::MEMORY_CAPACITY;

use crate::diagnostics::{Diagnostics, PassError};
use crate::fixup::{ExternalUse, Fixup};
use crate::labels::LabelTable;
use crate::memory::MemoryImage;

#[derive(Debug)]
pub struct AssemblyContext {
    pub source_name: String,

    /// Words emitted into the code image so far.
    pub ic: u32,

    /// Words emitted into the data image so far.
    pub dc: u32,

    pub code: MemoryImage,
    pub data: MemoryImage,
    pub labels: LabelTable,
    pub fixups: Vec<Fixup>,
    pub externals: Vec<ExternalUse>,
    pub macros: MacroTable,
    pub line_map: LineMap,
    pub diagnostics: Diagnostics,

    memory_full_reported: bool,
}

impl AssemblyContext {
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            ic: 0,
            dc: 0,
            code: MemoryImage::new(),
            data: MemoryImage::new(),
            labels: LabelTable::new(),
            fixups: vec![],
            externals: vec![],
            macros: MacroTable::new(),
            line_map: LineMap::new(),
            diagnostics: Diagnostics::new(source_name),
            memory_full_reported: false,
        }
    }

    pub fn memory_usage(&self) -> u32 {
        self.ic + self.dc
    }

    /// Reports a source error at an expanded-file line, translated to
    /// the original source line through the line map.
    pub fn report(&mut self, expanded_line: u32, error: impl Display) {
        let source_line = self.line_map.source_line(expanded_line);
        self.diagnostics.report_line(source_line, error);
    }

    /// Appends a word to the code image. `false` once the shared word
    /// budget is exhausted; the exhaustion is reported a single time.
    pub(crate) fn emit_code(&mut self, word: u16, expanded_line: u32) -> bool {
        if !self.reserve_word(expanded_line) {
            return false;
        }
        self.code.push(self.ic, word);
        self.ic += 1;
        true
    }

    /// Appends a word to the data image, under the same budget as the
    /// code image.
    pub(crate) fn emit_data(&mut self, word: u16, expanded_line: u32) -> bool {
        if !self.reserve_word(expanded_line) {
            return false;
        }
        self.data.push(self.dc, word);
        self.dc += 1;
        true
    }

    fn reserve_word(&mut self, expanded_line: u32) -> bool {
        if self.memory_usage() >= MEMORY_CAPACITY {
            if !self.memory_full_reported {
                self.memory_full_reported = true;
                self.report(expanded_line, PassError::OutOfMemory);
            }
            return false;
        }
        true
    }

    /// Debug dump of the collected tables, active when the logger runs
    /// at debug level.
    pub fn dump(&self) {
        log::debug!("IC = {}  DC = {}  usage = {}", self.ic, self.dc, self.memory_usage());
        for (address, word) in self.code.cells() {
            log::debug!("code {:4}: {:010b}", address, word);
        }
        for (address, word) in self.data.cells() {
            log::debug!("data {:4}: {:010b}", address, word);
        }
        for label in self.labels.iter() {
            log::debug!(
                "label {} -> {} ({:?}, {:?}{})",
                label.name,
                label.address,
                label.segment,
                label.definition,
                if label.is_entry { ", entry" } else { "" }
            );
        }
        for fixup in &self.fixups {
            log::debug!("pending patch at {} -> {}", fixup.address, fixup.label_name());
        }
        for external in &self.externals {
            log::debug!("external use {} @ {}", external.name, external.address);
        }
        for macro_def in self.macros.iter() {
            log::debug!(
                "macro {} ({} lines, defined at line {})",
                macro_def.name,
                macro_def.body.len(),
                macro_def.defined_at
            );
        }
    }
}
