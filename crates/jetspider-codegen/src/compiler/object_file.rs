//! Compiled units and the container that collects them.

use std::fmt;

use crate::ast::Scope;
use crate::compiler::bytecode::{Instruction, OpCode, Operand};

/// A sealed compilation unit: one function body or the top-level program.
///
/// Units are only produced by [`Assembler::close`](super::Assembler::close)
/// and expose no way to append further instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    scope: Scope,
    filename: String,
    lineno: u32,
    instructions: Vec<Instruction>,
    atoms: Vec<String>,
}

impl Unit {
    pub(crate) fn new(
        scope: Scope,
        filename: String,
        lineno: u32,
        instructions: Vec<Instruction>,
        atoms: Vec<String>,
    ) -> Self {
        Self {
            scope,
            filename,
            lineno,
            instructions,
            atoms,
        }
    }

    /// The unit's parameters and locals.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Source file the unit was compiled from.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Line the unit starts on.
    pub fn lineno(&self) -> u32 {
        self.lineno
    }

    /// The instruction stream, ending with `stop`.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Interned names and string constants.
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// Looks up an atom by index.
    pub fn atom(&self, index: u32) -> Option<&str> {
        self.atoms.get(index as usize).map(String::as_str)
    }

    /// Opcodes in emission order.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions.iter().map(|insn| insn.opcode).collect()
    }

    /// Renders one operand the way listings show it.
    pub fn format_operand(&self, operand: &Operand) -> String {
        match *operand {
            Operand::Slot(slot) => slot.to_string(),
            Operand::Atom(index) => match self.atom(index) {
                Some(name) => format!("{:?}", name),
                None => format!("<atom {}>", index),
            },
            Operand::Int8(v) => v.to_string(),
            Operand::Uint16(v) => v.to_string(),
            Operand::Uint24(v) => v.to_string(),
            Operand::Int32(v) => v.to_string(),
            Operand::ArgCount(n) => n.to_string(),
            Operand::Length(n) => n.to_string(),
            Operand::Jump(target) => format!("{:04}", target),
            Operand::Label(label) => format!("L{}", label.index()),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "; {}:{} nargs={} nfixed={}",
            self.filename,
            self.lineno,
            self.scope.nargs(),
            self.scope.nfixed()
        )?;
        for (index, insn) in self.instructions.iter().enumerate() {
            match &insn.operand {
                Some(operand) => writeln!(
                    f,
                    "{:04}  {:<10} {}",
                    index,
                    insn.opcode.name(),
                    self.format_operand(operand)
                )?,
                None => writeln!(f, "{:04}  {}", index, insn.opcode.name())?,
            }
        }
        Ok(())
    }
}

/// The compiler's output: functions in declaration order, then the
/// top-level unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectFile {
    units: Vec<Unit>,
}

impl ObjectFile {
    /// Creates an empty object file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sealed unit.
    pub fn push(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// All units in output order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// The top-level unit, always last.
    pub fn toplevel(&self) -> Option<&Unit> {
        self.units.last()
    }

    /// The function units, all but the last.
    pub fn functions(&self) -> &[Unit] {
        match self.units.split_last() {
            Some((_, functions)) => functions,
            None => &[],
        }
    }
}

impl fmt::Display for ObjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unit) in self.units.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", unit)?;
        }
        Ok(())
    }
}
