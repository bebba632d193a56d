//! Variable access lowering.
//!
//! Reads and writes are selected by the binding the resolver attached to
//! each reference:
//!
//! | Binding | Read | Write |
//! |---------|------|-------|
//! | parameter | `getarg n` | value, `setarg n` |
//! | local | `getlocal n` | value, `setlocal n` |
//! | global | `getgname x` | `bindgname x`, value, `setgname x` |
//!
//! Global writes bind the target before the value is computed. Property and
//! element writes evaluate the object (and key) before the value. Every
//! write leaves the assigned value on the stack.

use crate::Error;
use crate::ast::{Binding, Expression, IndexExpression, MemberExpression, Variable};
use crate::compiler::bytecode::OpCode;

use super::Compiler;

impl Compiler {
    /// Pushes the value of a variable.
    pub(super) fn get_variable(&mut self, var: &Variable) {
        match &var.binding {
            Binding::Parameter { slot } => self.asm.getarg(*slot),
            Binding::Local { slot } => self.asm.getlocal(*slot),
            Binding::Global { name } => self.asm.getgname(name),
        };
    }

    /// Stores into a variable the value pushed by `value`.
    pub(super) fn set_variable<F>(&mut self, var: &Variable, value: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        match &var.binding {
            Binding::Parameter { slot } => {
                value(self)?;
                self.asm.setarg(*slot);
            }
            Binding::Local { slot } => {
                value(self)?;
                self.asm.setlocal(*slot);
            }
            Binding::Global { name } => {
                self.asm.bindgname(name);
                value(self)?;
                self.asm.setgname(name);
            }
        }
        Ok(())
    }

    /// Stores into any assignable target the value pushed by `value`.
    pub(super) fn assign<F>(&mut self, target: &Expression, value: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        match target {
            Expression::Identifier(var) => self.set_variable(var, value),
            Expression::Member(member) => self.set_property(member, value),
            Expression::Index(index) => self.set_element(index, value),
            _ => Err(Error::Unsupported("assignment to this target")),
        }
    }

    fn set_property<F>(&mut self, member: &MemberExpression, value: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        self.compile_expression(&member.object)?;
        value(self)?;
        self.asm.setprop(&member.property);
        Ok(())
    }

    fn set_element<F>(&mut self, index: &IndexExpression, value: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        self.compile_expression(&index.object)?;
        self.compile_expression(&index.key)?;
        value(self)?;
        self.asm.op(OpCode::SetElem);
        Ok(())
    }

    // ========================================================================
    // Postfix increment
    // ========================================================================

    /// `x++` on a global: leaves the old value, stores old + 1.
    pub(super) fn global_increment(&mut self, name: &str) {
        self.asm.getgname(name);
        self.asm.bindgname(name);
        self.asm.getgname(name);
        self.asm.op(OpCode::One);
        self.asm.op(OpCode::Add);
        self.asm.setgname(name);
        self.asm.op(OpCode::Pop);
    }

    /// `x++` on a parameter or local slot.
    pub(super) fn variable_increment(&mut self, var: &Variable) -> Result<(), Error> {
        self.get_variable(var);
        self.get_variable(var);
        self.asm.op(OpCode::One);
        self.asm.op(OpCode::Add);
        self.set_variable(var, |_| Ok(()))?;
        self.asm.op(OpCode::Pop);
        Ok(())
    }

    /// `obj.p++`: the object is evaluated once and the property read once.
    /// `setprop` leaves the new value, subtracting one recovers the old.
    pub(super) fn property_increment(&mut self, member: &MemberExpression) -> Result<(), Error> {
        self.compile_expression(&member.object)?;
        self.asm.op(OpCode::Dup);
        self.asm.getprop(&member.property);
        self.asm.op(OpCode::One);
        self.asm.op(OpCode::Add);
        self.asm.setprop(&member.property);
        self.asm.op(OpCode::One);
        self.asm.op(OpCode::Sub);
        Ok(())
    }

    /// `obj[k]++` in a single `eleminc`.
    pub(super) fn element_increment(&mut self, index: &IndexExpression) -> Result<(), Error> {
        self.compile_expression(&index.object)?;
        self.compile_expression(&index.key)?;
        self.asm.op(OpCode::ElemInc);
        Ok(())
    }
}
