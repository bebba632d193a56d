// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! jetspider CLI - compiles a resolved JavaScript syntax tree to bytecode
//!
//! The tree is read as JSON from a file or stdin, as produced by an external
//! parser and resolver. The resulting object file is printed as a listing.

mod listing;

use anyhow::Context;
use clap::Parser;
use jetspider_codegen::{CodeGenerator, CodegenOptions, Program};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "jetspider",
    about = "Compiles resolved JavaScript syntax trees to SpiderMonkey-style bytecode",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Syntax tree as JSON, or `-` to read stdin
    input: PathBuf,

    /// Emit additions of number literals without folding them
    #[arg(long)]
    no_fold: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Print the listing without colors
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "jetspider=debug,jetspider_codegen=debug"
    } else {
        "jetspider=warn,jetspider_codegen=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(listing) => {
            print!("{}", listing);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.no_color {
                eprintln!("Error: {:#}", e);
            } else {
                eprintln!("{}: {:#}", "Error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let source = read_input(&cli.input)?;
    let program = Program::from_json(&source)
        .with_context(|| format!("cannot load syntax tree from {}", cli.input.display()))?;
    debug!(
        filename = %program.filename,
        statements = program.body.len(),
        "loaded syntax tree"
    );

    let generator = CodeGenerator::with_options(CodegenOptions {
        fold_constants: !cli.no_fold,
    });
    debug!(options = ?generator.options(), "generating object file");
    let object_file = generator.generate_object_file(&program)?;
    Ok(listing::render(&object_file, !cli.no_color)?)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("cannot read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}
