//! Statement compilation.
//!
//! Statements leave nothing on the stack. Control flow is lowered with
//! lazy labels that the assembler backpatches once their position is known.
//!
//! ### If Statement
//!
//! ```text
//!   [test]
//!   ifeq ELSE
//!   [consequent]
//!   goto MERGE
//! ELSE:
//!   [alternate]
//! MERGE:
//! ```
//!
//! ### While Loop
//!
//! ```text
//! ENTRY:               <- continue
//!   [test]
//!   ifeq EXIT
//!   [body]
//!   goto ENTRY
//! EXIT:                <- break
//! ```
//!
//! ### For Loop
//!
//! The update is placed before the test so that the first iteration skips
//! it:
//!
//! ```text
//!   [init]
//!   goto BODY
//! ENTRY:               <- continue
//!   [update]
//!   pop
//! BODY:
//!   [test]
//!   ifeq EXIT
//!   [body]
//!   goto ENTRY
//! EXIT:                <- break
//! ```

use crate::Error;
use crate::ast::*;
use crate::compiler::bytecode::OpCode;

use super::{Compiler, LoopContext};

impl Compiler {
    /// Compiles a statement list in order.
    pub fn compile_statements(&mut self, statements: &[Statement]) -> Result<(), Error> {
        for stmt in statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    /// Compiles one statement.
    pub fn compile_statement(&mut self, stmt: &Statement) -> Result<(), Error> {
        match stmt {
            Statement::Empty => {}
            Statement::Block(block) => self.compile_statements(&block.body)?,
            Statement::Expression(expr) => {
                self.compile_expression(&expr.expression)?;
                self.pop_statement_value();
            }
            Statement::VariableDeclaration(decl) => self.compile_variable_declaration(decl)?,
            Statement::FunctionDeclaration(_) => {
                // Top-level functions are compiled as units of their own.
                if !self.toplevel {
                    return Err(Error::Semantic("nested function not implemented".into()));
                }
            }
            Statement::If(if_stmt) => self.compile_if_statement(if_stmt)?,
            Statement::While(while_stmt) => self.compile_while_statement(while_stmt)?,
            Statement::For(for_stmt) => self.compile_for_statement(for_stmt)?,
            Statement::Break => {
                let target = self.loops.innermost("break")?.exit;
                self.asm.goto(target);
            }
            Statement::Continue => {
                let target = self.loops.innermost("continue")?.entry;
                self.asm.goto(target);
            }
            Statement::Return(ret) => {
                match &ret.argument {
                    Some(arg) => self.compile_expression(arg)?,
                    None => {
                        self.asm.op(OpCode::Push);
                    }
                }
                self.asm.op(OpCode::Return);
            }
            Statement::DoWhile(_) => return Err(Error::Unsupported("do-while statement")),
            Statement::ForIn(_) => return Err(Error::Unsupported("for-in statement")),
            Statement::Switch(_) => return Err(Error::Unsupported("switch statement")),
            Statement::Try(_) => return Err(Error::Unsupported("try statement")),
            Statement::Throw(_) => return Err(Error::Unsupported("throw statement")),
            Statement::With(_) => return Err(Error::Unsupported("with statement")),
            Statement::Labeled(_) => return Err(Error::Unsupported("labeled statement")),
        }
        Ok(())
    }

    /// Discards an expression statement's value. The top-level program
    /// records it as the completion value instead of dropping it.
    fn pop_statement_value(&mut self) {
        if self.toplevel {
            self.asm.op(OpCode::PopV);
        } else {
            self.asm.op(OpCode::Pop);
        }
    }

    fn compile_variable_declaration(&mut self, decl: &VariableDeclaration) -> Result<(), Error> {
        match decl.kind {
            VariableKind::Var => {}
            VariableKind::Let => return Err(Error::Unsupported("let declaration")),
            VariableKind::Const => return Err(Error::Unsupported("const declaration")),
        }

        for declarator in &decl.declarations {
            // Without an initializer the slot already holds undefined.
            let Some(init) = &declarator.init else {
                continue;
            };
            self.set_variable(&declarator.id, |c| c.compile_expression(init))?;
            self.asm.op(OpCode::Pop);
        }
        Ok(())
    }

    fn compile_if_statement(&mut self, if_stmt: &IfStatement) -> Result<(), Error> {
        self.compile_expression(&if_stmt.test)?;
        let else_loc = self.asm.lazy_location();
        let merge_loc = self.asm.lazy_location();
        self.asm.ifeq(else_loc);
        self.compile_statement(&if_stmt.consequent)?;
        self.asm.goto(merge_loc);
        self.asm.fix_location(else_loc)?;
        if let Some(alternate) = &if_stmt.alternate {
            self.compile_statement(alternate)?;
        }
        self.asm.fix_location(merge_loc)
    }

    fn compile_while_statement(&mut self, while_stmt: &WhileStatement) -> Result<(), Error> {
        let exit = self.asm.lazy_location();
        let entry = self.asm.location();
        self.loops.push(LoopContext { entry, exit });

        self.compile_expression(&while_stmt.test)?;
        self.asm.ifeq(exit);
        self.compile_statement(&while_stmt.body)?;
        self.asm.goto(entry);
        self.asm.fix_location(exit)?;

        self.loops.pop();
        Ok(())
    }

    fn compile_for_statement(&mut self, for_stmt: &ForStatement) -> Result<(), Error> {
        if let Some(init) = &for_stmt.init {
            self.compile_for_init(init)?;
        }

        let body = self.asm.lazy_location();
        self.asm.goto(body);

        let entry = self.asm.location();
        if let Some(update) = &for_stmt.update {
            self.compile_expression(update)?;
            self.asm.op(OpCode::Pop);
        }

        let exit = self.asm.lazy_location();
        self.loops.push(LoopContext { entry, exit });
        self.asm.fix_location(body)?;

        // Without a test the loop only ends through `break`.
        if let Some(test) = &for_stmt.test {
            self.compile_expression(test)?;
            self.asm.ifeq(exit);
        }
        self.compile_statement(&for_stmt.body)?;
        self.asm.goto(entry);
        self.asm.fix_location(exit)?;

        self.loops.pop();
        Ok(())
    }

    fn compile_for_init(&mut self, init: &Statement) -> Result<(), Error> {
        match init {
            Statement::VariableDeclaration(decl) => self.compile_variable_declaration(decl),
            Statement::Expression(expr) => {
                self.compile_expression(&expr.expression)?;
                self.asm.op(OpCode::Pop);
                Ok(())
            }
            Statement::Empty => Ok(()),
            _ => Err(Error::Unsupported("for-loop initializer of this kind")),
        }
    }
}
