// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! File-level orchestration: resolves the source path, runs the
//! pipeline and writes the output files of one source.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::files::{
    sibling_with_extension, write_entries, write_externals, write_object, ENTRIES_EXTENSION,
    EXPANDED_EXTENSION, EXTERNALS_EXTENSION, OBJECT_EXTENSION, SOURCE_EXTENSION,
};
use crate::{assemble_text, AssemblyOutcome};

/// A failure of the surrounding system, as opposed to an error in the
/// assembly source. Aborts the current source file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("\"{0}\" is not an assembly source file (.{SOURCE_EXTENSION}).")]
    NotAssemblySource(String),

    #[error("can't open \"{path}\": {source}")]
    Open { path: String, source: io::Error },

    #[error("can't write \"{path}\": {source}")]
    Write { path: String, source: io::Error },
}

/// Runs the whole pipeline on one source path. `Ok(true)` when the
/// file assembled cleanly and its outputs were written; `Ok(false)`
/// when the source had errors (already reported through the
/// diagnostics sink).
pub fn assemble_path(path_arg: &str) -> Result<bool, FileError> {
    let source_path = resolve_source_path(path_arg)?;
    let source_name = source_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_arg.to_string());

    remove_stale_outputs(&source_path);

    let text = fs::read_to_string(&source_path).map_err(|source| FileError::Open {
        path: source_path.display().to_string(),
        source,
    })?;

    log::info!("assembling {}", source_name);
    let AssemblyOutcome { context, expanded, success } = assemble_text(&source_name, &text);

    // the expanded text exists whenever preprocessing succeeded, even
    // if a later pass failed
    if let Some(expanded_text) = &expanded {
        let expanded_path = sibling_with_extension(&source_path, EXPANDED_EXTENSION);
        write_text(&expanded_path, expanded_text)?;
    }

    if !success {
        return Ok(false);
    }

    let object_path = sibling_with_extension(&source_path, OBJECT_EXTENSION);
    let mut object_file = create(&object_path)?;
    write_object(&context, &mut object_file).map_err(|source| FileError::Write {
        path: object_path.display().to_string(),
        source,
    })?;
    log::info!("wrote {}", object_path.display());

    if !context.externals.is_empty() {
        let externals_path = sibling_with_extension(&source_path, EXTERNALS_EXTENSION);
        let mut externals_file = create(&externals_path)?;
        write_externals(&context, &mut externals_file).map_err(|source| FileError::Write {
            path: externals_path.display().to_string(),
            source,
        })?;
        log::info!("wrote {}", externals_path.display());
    }

    if context.labels.has_entries() {
        let entries_path = sibling_with_extension(&source_path, ENTRIES_EXTENSION);
        let mut entries_file = create(&entries_path)?;
        write_entries(&context, &mut entries_file).map_err(|source| FileError::Write {
            path: entries_path.display().to_string(),
            source,
        })?;
        log::info!("wrote {}", entries_path.display());
    }

    Ok(true)
}

/// A path given without an extension gets `.as` appended; any other
/// extension is rejected.
fn resolve_source_path(path_arg: &str) -> Result<PathBuf, FileError> {
    let path = PathBuf::from(path_arg);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    match file_name.rsplit_once('.') {
        None => Ok(path.with_file_name(format!("{}.{}", file_name, SOURCE_EXTENSION))),
        Some((_, extension)) if extension == SOURCE_EXTENSION => Ok(path),
        Some(_) => Err(FileError::NotAssemblySource(path_arg.to_string())),
    }
}

/// Outputs of a previous run must not survive a failing run.
fn remove_stale_outputs(source_path: &Path) {
    for extension in [
        OBJECT_EXTENSION,
        EXPANDED_EXTENSION,
        ENTRIES_EXTENSION,
        EXTERNALS_EXTENSION,
    ] {
        let stale = sibling_with_extension(source_path, extension);
        let _ = fs::remove_file(stale);
    }
}

fn create(path: &Path) -> Result<File, FileError> {
    File::create(path).map_err(|source| FileError::Open {
        path: path.display().to_string(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), FileError> {
    fs::write(path, text).map_err(|source| FileError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_source_path() {
        assert_eq!(resolve_source_path("prog.as").unwrap(), PathBuf::from("prog.as"));
        assert_eq!(resolve_source_path("prog").unwrap(), PathBuf::from("prog.as"));
        assert_eq!(
            resolve_source_path("dir/prog").unwrap(),
            PathBuf::from("dir/prog.as")
        );
        assert!(matches!(
            resolve_source_path("prog.txt"),
            Err(FileError::NotAssemblySource(_))
        ));
    }
}
