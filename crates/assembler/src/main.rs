// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Command line driver. Each argument is an assembly source path,
//! processed in order; a trailing literal `debug` raises the log level
//! and turns on the table dumps.

use std::env;
use std::process::ExitCode;

use log::LevelFilter;

use tenbit_assembler::driver::assemble_path;

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let debug = args.last().map(|arg| arg == "debug").unwrap_or(false);
    if debug {
        args.pop();
    }

    env_logger::builder()
        .filter_level(if debug { LevelFilter::Debug } else { LevelFilter::Info })
        .init();

    if args.is_empty() {
        eprintln!("ERROR: Missing assembly source file input. Processing cannot continue.");
        return ExitCode::FAILURE;
    }

    let total = args.len();
    let mut succeeded = 0;
    for path in &args {
        match assemble_path(path) {
            Ok(true) => {
                succeeded += 1;
                log::info!("{}: assembled successfully", path);
            }
            Ok(false) => {
                log::info!("{}: assembly failed", path);
            }
            Err(error) => {
                eprintln!("{}: ERROR: {}", path, error);
            }
        }
    }

    log::info!("{} out of {} files assembled successfully", succeeded, total);
    ExitCode::SUCCESS
}
