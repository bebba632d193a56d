//! Code generation from the resolved tree to bytecode.
//!
//! [`CodeGenerator`] drives compilation: every top-level function becomes a
//! unit of its own, followed by the top-level program. Each unit is compiled
//! by a fresh [`Compiler`], which owns everything that must not leak between
//! units: the assembler, the loop stack and the top-level flag.

mod expressions;
mod fold;
mod loops;
mod statements;
mod variables;


pub use fold::fold_constants;
pub use loops::{LoopContext, LoopStack};

use tracing::{debug, instrument};

use crate::ast::{FunctionDeclaration, Program};
use crate::compiler::assembler::Assembler;
use crate::compiler::object_file::{ObjectFile, Unit};
use crate::{CompileError, Error};

/// Name reported for the top-level unit in errors and logs.
pub const TOPLEVEL_UNIT: &str = "<toplevel>";

/// Code generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Fold additions of number literals before emitting them
    pub fold_constants: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
        }
    }
}

/// Compiles a resolved program into an [`ObjectFile`].
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    options: CodegenOptions,
}

impl CodeGenerator {
    /// Creates a generator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator with the given options.
    pub fn with_options(options: CodegenOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    pub fn options(&self) -> CodegenOptions {
        self.options
    }

    /// Compiles every top-level function, then the top-level program.
    ///
    /// The first failing unit aborts generation; no unit is produced for it.
    pub fn generate_object_file(&self, program: &Program) -> Result<ObjectFile, CompileError> {
        let mut object_file = ObjectFile::new();

        for function in program.global_functions() {
            let unit = self
                .compile_function(function, &program.filename)
                .map_err(|error| CompileError {
                    unit: function.name.clone(),
                    filename: program.filename.clone(),
                    lineno: function.lineno,
                    error,
                })?;
            object_file.push(unit);
        }

        let unit = self
            .compile_toplevel(program)
            .map_err(|error| CompileError {
                unit: TOPLEVEL_UNIT.to_string(),
                filename: program.filename.clone(),
                lineno: program.lineno,
                error,
            })?;
        object_file.push(unit);

        debug!(
            filename = %program.filename,
            units = object_file.units().len(),
            "generated object file"
        );
        Ok(object_file)
    }

    /// Compiles one function body into a unit.
    #[instrument(level = "debug", skip_all, fields(unit = %function.name))]
    pub fn compile_function(
        &self,
        function: &FunctionDeclaration,
        filename: &str,
    ) -> Result<Unit, Error> {
        let asm = Assembler::new(function.scope.clone(), filename, function.lineno);
        let mut compiler = Compiler::new(asm, false, self.options);
        compiler.compile_statements(&function.body)?;
        compiler.finish()
    }

    /// Compiles the top-level statements into a unit.
    #[instrument(level = "debug", skip_all, fields(unit = TOPLEVEL_UNIT))]
    pub fn compile_toplevel(&self, program: &Program) -> Result<Unit, Error> {
        let asm = Assembler::new(program.scope.clone(), &program.filename, program.lineno);
        let mut compiler = Compiler::new(asm, true, self.options);
        compiler.compile_statements(&program.body)?;
        compiler.finish()
    }
}

/// Per-unit generation context.
#[derive(Debug)]
pub struct Compiler {
    asm: Assembler,
    loops: LoopStack,
    toplevel: bool,
    options: CodegenOptions,
}

impl Compiler {
    /// Creates a context emitting into `asm`.
    ///
    /// `toplevel` selects the top-level discard form for expression
    /// statements and allows function declarations as statements.
    pub fn new(asm: Assembler, toplevel: bool, options: CodegenOptions) -> Self {
        Self {
            asm,
            loops: LoopStack::new(),
            toplevel,
            options,
        }
    }

    /// The assembler of the open unit.
    pub fn assembler(&self) -> &Assembler {
        &self.asm
    }

    /// Whether this context compiles the top-level program.
    pub fn is_toplevel(&self) -> bool {
        self.toplevel
    }

    /// Seals the unit.
    pub fn finish(self) -> Result<Unit, Error> {
        if !self.loops.is_empty() {
            return Err(Error::Internal(format!(
                "{} loop context(s) still open at unit close",
                self.loops.depth()
            )));
        }
        let unit = self.asm.close()?;
        debug!(
            instructions = unit.instructions().len(),
            atoms = unit.atoms().len(),
            "closed unit"
        );
        Ok(unit)
    }
}

/// Converts an argument or element count to its operand width.
fn count_operand(count: usize) -> Result<u16, Error> {
    u16::try_from(count).map_err(|_| Error::Unsupported("argument list longer than 65535"))
}
