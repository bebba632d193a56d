//! Instruction emission for one compilation unit.
//!
//! The [`Assembler`] appends instructions to an open unit and manages jump
//! targets. Forward targets are lazy: a [`Label`] is allocated before its
//! position is known, jumps to it are recorded as pending patch sites, and
//! fixing the label backpatches all of them. [`Assembler::close`] refuses to
//! seal a unit while any label is still unfixed.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::Error;
use crate::ast::Scope;
use crate::compiler::bytecode::{Instruction, OpCode, Operand};
use crate::compiler::object_file::Unit;

/// A jump target handle, an index into the assembler's label arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

impl Label {
    /// The arena index of this label.
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct LabelSlot {
    /// Instruction index the label was fixed at
    position: Option<u32>,
    /// Instructions whose jump operand waits for this label
    pending: Vec<usize>,
}

/// Emits instructions into a single open unit.
#[derive(Debug)]
pub struct Assembler {
    scope: Scope,
    filename: String,
    lineno: u32,
    instructions: Vec<Instruction>,
    atoms: Vec<String>,
    atom_index: FxHashMap<String, u32>,
    labels: Vec<LabelSlot>,
}

impl Assembler {
    /// Opens a new unit.
    pub fn new(scope: Scope, filename: impl Into<String>, lineno: u32) -> Self {
        Self {
            scope,
            filename: filename.into(),
            lineno,
            instructions: Vec::new(),
            atoms: Vec::new(),
            atom_index: FxHashMap::default(),
            labels: Vec::new(),
        }
    }

    /// The unit's namespace.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Instructions emitted so far.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The index the next instruction will be written at.
    pub fn position(&self) -> usize {
        self.instructions.len()
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    /// Emits an instruction without operand.
    pub fn op(&mut self, opcode: OpCode) -> usize {
        self.emit(Instruction::simple(opcode))
    }

    /// Interns a name or string constant and returns its atom index.
    pub fn atom(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.atom_index.get(name) {
            return index;
        }
        let index = self.atoms.len() as u32;
        self.atoms.push(name.to_string());
        self.atom_index.insert(name.to_string(), index);
        index
    }

    fn emit_atom(&mut self, opcode: OpCode, name: &str) -> usize {
        let atom = self.atom(name);
        self.emit(Instruction::with_operand(opcode, Operand::Atom(atom)))
    }

    // ========================================================================
    // Named instructions
    // ========================================================================

    /// `int8 value`
    pub fn int8(&mut self, value: i8) -> usize {
        self.emit(Instruction::with_operand(OpCode::Int8, Operand::Int8(value)))
    }

    /// `uint16 value`
    pub fn uint16(&mut self, value: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::Uint16, Operand::Uint16(value)))
    }

    /// `uint24 value`; the value must fit in 24 bits.
    pub fn uint24(&mut self, value: u32) -> usize {
        debug_assert!(value < 1 << 24);
        self.emit(Instruction::with_operand(OpCode::Uint24, Operand::Uint24(value)))
    }

    /// `int32 value`
    pub fn int32(&mut self, value: i32) -> usize {
        self.emit(Instruction::with_operand(OpCode::Int32, Operand::Int32(value)))
    }

    /// `string atom`
    pub fn string(&mut self, value: &str) -> usize {
        self.emit_atom(OpCode::String, value)
    }

    /// `getarg slot`
    pub fn getarg(&mut self, slot: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::GetArg, Operand::Slot(slot)))
    }

    /// `setarg slot`
    pub fn setarg(&mut self, slot: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::SetArg, Operand::Slot(slot)))
    }

    /// `getlocal slot`
    pub fn getlocal(&mut self, slot: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::GetLocal, Operand::Slot(slot)))
    }

    /// `setlocal slot`
    pub fn setlocal(&mut self, slot: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::SetLocal, Operand::Slot(slot)))
    }

    /// `getgname name`
    pub fn getgname(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::GetGName, name)
    }

    /// `bindgname name`
    pub fn bindgname(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::BindGName, name)
    }

    /// `setgname name`
    pub fn setgname(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::SetGName, name)
    }

    /// `getprop name`
    pub fn getprop(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::GetProp, name)
    }

    /// `setprop name`
    pub fn setprop(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::SetProp, name)
    }

    /// `callgname name`
    pub fn callgname(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::CallGName, name)
    }

    /// `callprop name`
    pub fn callprop(&mut self, name: &str) -> usize {
        self.emit_atom(OpCode::CallProp, name)
    }

    /// `call argc`
    pub fn call(&mut self, argc: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::Call, Operand::ArgCount(argc)))
    }

    /// `new argc`
    pub fn construct(&mut self, argc: u16) -> usize {
        self.emit(Instruction::with_operand(OpCode::New, Operand::ArgCount(argc)))
    }

    /// `newarray length`
    pub fn newarray(&mut self, length: u32) -> usize {
        self.emit(Instruction::with_operand(OpCode::NewArray, Operand::Length(length)))
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Allocates a label whose position is not known yet.
    pub fn lazy_location(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(LabelSlot::default());
        label
    }

    /// Returns a label already fixed at the current position, usable as a
    /// backward jump target.
    pub fn location(&mut self) -> Label {
        let label = self.lazy_location();
        self.labels[label.0 as usize].position = Some(self.position() as u32);
        label
    }

    /// Binds `label` to the current position and patches every jump that
    /// was emitted against it.
    pub fn fix_location(&mut self, label: Label) -> Result<(), Error> {
        let position = self.position() as u32;
        let slot = self
            .labels
            .get_mut(label.0 as usize)
            .ok_or_else(|| Error::Internal(format!("unknown label L{}", label.0)))?;
        if let Some(previous) = slot.position {
            return Err(Error::Internal(format!(
                "label L{} fixed twice (at {} and {})",
                label.0, previous, position
            )));
        }
        slot.position = Some(position);
        let pending = std::mem::take(&mut slot.pending);
        trace!(label = label.0, position, patched = pending.len(), "fixed label");
        for site in pending {
            self.instructions[site].operand = Some(Operand::Jump(position));
        }
        Ok(())
    }

    /// Whether `label` has been bound to a position.
    pub fn is_fixed(&self, label: Label) -> bool {
        self.labels
            .get(label.0 as usize)
            .is_some_and(|slot| slot.position.is_some())
    }

    fn emit_jump(&mut self, opcode: OpCode, label: Label) -> usize {
        let site = self.position();
        let operand = match self.labels.get_mut(label.0 as usize) {
            Some(LabelSlot {
                position: Some(position),
                ..
            }) => Operand::Jump(*position),
            Some(slot) => {
                slot.pending.push(site);
                Operand::Label(label)
            }
            // Unknown labels stay unresolved and are reported by `close`.
            None => Operand::Label(label),
        };
        self.emit(Instruction::with_operand(opcode, operand))
    }

    /// `goto label`
    pub fn goto(&mut self, label: Label) -> usize {
        self.emit_jump(OpCode::Goto, label)
    }

    /// `ifeq label`: pops the condition, jumps when it is falsy.
    pub fn ifeq(&mut self, label: Label) -> usize {
        self.emit_jump(OpCode::IfEq, label)
    }

    /// Appends the terminating `stop` and seals the unit.
    ///
    /// Fails with an internal error if any jump still targets an unfixed
    /// label.
    pub fn close(mut self) -> Result<Unit, Error> {
        self.op(OpCode::Stop);

        let unfixed = self
            .labels
            .iter()
            .filter(|slot| slot.position.is_none())
            .count();
        let unresolved = self
            .instructions
            .iter()
            .filter(|insn| matches!(insn.operand, Some(Operand::Label(_))))
            .count();
        if unfixed > 0 || unresolved > 0 {
            return Err(Error::Internal(format!(
                "{} label(s) left unfixed, {} jump(s) unresolved at unit close",
                unfixed, unresolved
            )));
        }

        Ok(Unit::new(
            self.scope,
            self.filename,
            self.lineno,
            self.instructions,
            self.atoms,
        ))
    }
}
