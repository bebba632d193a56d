// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # jetspider-codegen
//!
//! The code-generation backend of a JavaScript compiler targeting a
//! SpiderMonkey-style stack VM.
//!
//! ## Overview
//!
//! The input is a syntax tree whose variable references were already
//! resolved to parameters, locals or globals by an external resolver. The
//! output is an [`ObjectFile`] holding one sealed unit per top-level function
//! plus one for the top-level program.
//!
//! Only a deliberately small subset of the language is compiled. Anything
//! outside it fails with a typed [`Error`] naming the construct; nothing is
//! silently approximated.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jetspider_codegen::{Program, compile};
//!
//! let program = Program::from_json(&std::fs::read_to_string("tree.json")?)?;
//! let object_file = compile(&program)?;
//! print!("{}", object_file);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod compiler;
pub mod literal;

pub use ast::Program;
pub use compiler::{CodeGenerator, CodegenOptions, ObjectFile, Unit};

use thiserror::Error;

/// Result type for code generation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while generating code for a unit.
#[derive(Debug, Error)]
pub enum Error {
    /// A node kind, operator or operand shape outside the implemented subset
    #[error("{0} not implemented")]
    Unsupported(&'static str),

    /// A number literal beyond the signed 32-bit range
    #[error("number literal {0} is too large")]
    NumberTooLarge(f64),

    /// A structural restriction of the implemented subset
    #[error("SemanticError: {0}")]
    Semantic(String),

    /// A string literal that is not valid literal syntax
    #[error("invalid string literal: {0}")]
    InvalidStringLiteral(String),

    /// A generator invariant was violated
    #[error("InternalError: {0}")]
    Internal(String),

    /// The serialized tree could not be read
    #[error("invalid syntax tree: {0}")]
    Tree(#[from] serde_json::Error),
}

/// A code generation failure, tagged with the unit being compiled.
#[derive(Debug, Error)]
#[error("{filename}:{lineno}: in {unit}: {error}")]
pub struct CompileError {
    /// Function name, or `<toplevel>`
    pub unit: String,
    /// Source file of the unit
    pub filename: String,
    /// Line the unit starts on
    pub lineno: u32,
    /// What went wrong
    pub error: Error,
}

/// Compiles a resolved program with default options.
pub fn compile(program: &Program) -> std::result::Result<ObjectFile, CompileError> {
    CodeGenerator::new().generate_object_file(program)
}
