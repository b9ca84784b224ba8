// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Output rendering: the base-4 notation and the object, entries and
//! externals writers. The writers emit to any `io::Write`, so the
//! driver hands them files and the tests hand them buffers.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tenbit_types::{OBJ_ADDRESS_WIDTH, OBJ_WORD_WIDTH};

use crate::context::AssemblyContext;

pub const SOURCE_EXTENSION: &str = "as";
pub const EXPANDED_EXTENSION: &str = "am";
pub const OBJECT_EXTENSION: &str = "obj";
pub const ENTRIES_EXTENSION: &str = "ent";
pub const EXTERNALS_EXTENSION: &str = "ext";

const BASE4_DIGITS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Base-4 rendering with a fixed digit count, zero ('a') padded.
pub fn to_base4_fixed(value: u32, width: usize) -> String {
    let mut digits = vec!['a'; width];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = BASE4_DIGITS[(rest % 4) as usize];
        rest /= 4;
    }
    digits.into_iter().collect()
}

/// Base-4 rendering at natural width, two digits minimum.
pub fn to_base4(value: u32) -> String {
    let mut width = 1;
    let mut rest = value;
    while rest >= 4 {
        rest /= 4;
        width += 1;
    }
    to_base4_fixed(value, width.max(2))
}

/// The object image: a header with the image sizes, then every code
/// word and every data word in address order.
pub fn write_object(context: &AssemblyContext, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}  {}", to_base4(context.ic), to_base4(context.dc))?;
    for (address, word) in context.code.cells().iter().chain(context.data.cells()) {
        writeln!(
            out,
            "{}  {}",
            to_base4_fixed(*address, OBJ_ADDRESS_WIDTH),
            to_base4_fixed(u32::from(*word), OBJ_WORD_WIDTH)
        )?;
    }
    Ok(())
}

/// One line per entry label: name and final address.
pub fn write_entries(context: &AssemblyContext, out: &mut impl Write) -> io::Result<()> {
    for label in context.labels.iter().filter(|label| label.is_entry) {
        writeln!(
            out,
            "{}  {}",
            label.name,
            to_base4_fixed(label.address, OBJ_ADDRESS_WIDTH)
        )?;
    }
    Ok(())
}

/// One line per recorded use of an external label.
pub fn write_externals(context: &AssemblyContext, out: &mut impl Write) -> io::Result<()> {
    for external in &context.externals {
        writeln!(
            out,
            "{}  {}",
            external.name,
            to_base4_fixed(external.address, OBJ_ADDRESS_WIDTH)
        )?;
    }
    Ok(())
}

/// Path of a sibling output file: the file name is cut at its first
/// dot and the new extension appended.
pub fn sibling_with_extension(source: &Path, extension: &str) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or("").to_string();
    source.with_file_name(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{first_pass, second_pass};
    use pretty_assertions::assert_eq;

    fn assembled(source: &str) -> AssemblyContext {
        let mut context = AssemblyContext::new("test.as");
        assert!(first_pass::run(&mut context, source));
        assert!(second_pass::run(&mut context, source));
        context
    }

    #[test]
    fn test_base4_rendering() {
        assert_eq!(to_base4(0), "aa");
        assert_eq!(to_base4(1), "ab");
        assert_eq!(to_base4(4), "ba");
        assert_eq!(to_base4(100), "bcba");
        assert_eq!(to_base4_fixed(100, OBJ_ADDRESS_WIDTH), "bcba");
        assert_eq!(to_base4_fixed(960, OBJ_WORD_WIDTH), "ddaaa");
        assert_eq!(to_base4_fixed(0, OBJ_WORD_WIDTH), "aaaaa");
    }

    #[test]
    fn test_object_for_trivial_halt() {
        let context = assembled("stop\n");
        let mut buffer = vec![];
        write_object(&context, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "ab  aa\nbcba  ddaaa\n");
    }

    #[test]
    fn test_object_lists_code_then_data() {
        let context = assembled("stop\n.data 1\n");
        let mut buffer = vec![];
        write_object(&context, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ab  ab");
        assert_eq!(lines[1], "bcba  ddaaa");
        // data word 1 right after the code image, at address 101
        assert_eq!(lines[2], "bcbb  aaaab");
    }

    #[test]
    fn test_entries_file() {
        let context = assembled("MAIN: stop\n.entry MAIN\n");
        let mut buffer = vec![];
        write_entries(&context, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "MAIN  bcba\n");
    }

    #[test]
    fn test_externals_file() {
        let context = assembled(".extern X\nmov X, r1\nstop\n");
        let mut buffer = vec![];
        write_externals(&context, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "X  bcbb\n");
    }

    #[test]
    fn test_sibling_with_extension() {
        assert_eq!(
            sibling_with_extension(Path::new("dir/prog.as"), OBJECT_EXTENSION),
            PathBuf::from("dir/prog.obj")
        );
        assert_eq!(
            sibling_with_extension(Path::new("prog.as"), ENTRIES_EXTENSION),
            PathBuf::from("prog.ent")
        );
    }
}
