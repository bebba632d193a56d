//! Bytecode compiler for resolved JavaScript trees.
//!
//! # Module Structure
//!
//! - `bytecode`: Opcodes, operands and instructions
//! - `assembler`: Per-unit instruction emission and jump labels
//! - `object_file`: Sealed units and the container collecting them
//! - `codegen`: Code generation from the resolved tree
//!   - `codegen::statements`: Statement and control-flow lowering
//!   - `codegen::expressions`: Expression lowering
//!   - `codegen::variables`: Reads and writes by binding
//!   - `codegen::loops`: Break/continue targets
//!   - `codegen::fold`: Constant folding of additions

pub mod assembler;
pub mod bytecode;
pub mod codegen;
pub mod object_file;

pub use assembler::{Assembler, Label};
pub use bytecode::{Instruction, OpCode, Operand};
pub use codegen::{CodeGenerator, CodegenOptions};
pub use object_file::{ObjectFile, Unit};
