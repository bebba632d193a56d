//! Expression compilation.
//!
//! Every expression leaves exactly one value on the stack. Operands are
//! emitted before the instruction that consumes them.
//!
//! ### Conditional Expression
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
//! ### Array Literal
//!
//! ```text
//!   newarray N
//!   [0] [element 0] initelem
//!   [1] [element 1] initelem
//!   ...
//!   endinit
//! ```
//!
//! ### Call
//!
//! ```text
//!   callgname f          |  [obj] callprop p  |  [obj] [key] callelem
//!   [arg 0] ... [arg n-1]
//!   call n
//! ```

use crate::Error;
use crate::ast::*;
use crate::compiler::bytecode::OpCode;
use crate::literal::decode_string;

use super::{Compiler, count_operand, fold_constants};

/// The shape of a call target, which selects the call instruction.
enum Callee<'a> {
    /// `f(...)`
    Name(&'a Variable),
    /// `obj.p(...)`
    Property(&'a MemberExpression),
    /// `obj[k](...)`
    Element(&'a IndexExpression),
}

impl<'a> Callee<'a> {
    fn classify(expr: &'a Expression) -> Result<Self, Error> {
        match expr {
            Expression::Identifier(var) => Ok(Callee::Name(var)),
            Expression::Member(member) => Ok(Callee::Property(member)),
            Expression::Index(index) => Ok(Callee::Element(index)),
            _ => Err(Error::Unsupported("call of this callee")),
        }
    }
}

impl Compiler {
    /// Compiles an expression, leaving its value on the stack.
    pub fn compile_expression(&mut self, expr: &Expression) -> Result<(), Error> {
        match expr {
            Expression::Number { value } => self.compile_number(*value)?,
            Expression::String { raw } => {
                let value = decode_string(raw)?;
                self.asm.string(&value);
            }
            Expression::Null => {
                self.asm.op(OpCode::Null);
            }
            Expression::True => {
                self.asm.op(OpCode::True);
            }
            Expression::False => {
                self.asm.op(OpCode::False);
            }
            Expression::This => {
                self.asm.op(OpCode::This);
            }
            Expression::Identifier(var) => self.get_variable(var),
            Expression::Array(array) => self.compile_array(array)?,
            Expression::Binary(bin) => self.compile_binary(expr, bin)?,
            Expression::Unary(unary) => self.compile_unary(unary)?,
            Expression::Update(update) => self.compile_update(update)?,
            Expression::Assignment(assign) => self.compile_assignment(assign)?,
            Expression::Call(call) => self.compile_call(call)?,
            Expression::New(new) => self.compile_new(new)?,
            Expression::Member(member) => {
                self.compile_expression(&member.object)?;
                self.asm.getprop(&member.property);
            }
            Expression::Index(index) => {
                self.compile_expression(&index.object)?;
                self.compile_expression(&index.key)?;
                self.asm.op(OpCode::GetElem);
            }
            Expression::Conditional(cond) => self.compile_conditional(cond)?,
            Expression::Comma(comma) => {
                self.compile_expression(&comma.left)?;
                self.asm.op(OpCode::Pop);
                self.compile_expression(&comma.right)?;
            }
            Expression::Function(_) => {
                return Err(Error::Semantic("nested function not implemented".into()));
            }
            Expression::RegExp { .. } => return Err(Error::Unsupported("regular expression")),
            Expression::Object(_) => return Err(Error::Unsupported("object literal")),
        }
        Ok(())
    }

    // ========================================================================
    // Literals
    // ========================================================================

    /// Pushes an integer literal using the narrowest operand that holds it.
    fn compile_number(&mut self, value: f64) -> Result<(), Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(Error::Unsupported("non-integer number literal"));
        }

        if value == 1.0 {
            self.asm.op(OpCode::One);
        } else if (-128.0..128.0).contains(&value) {
            self.asm.int8(value as i8);
        } else if (0.0..65536.0).contains(&value) {
            self.asm.uint16(value as u16);
        } else if (0.0..16_777_216.0).contains(&value) {
            self.asm.uint24(value as u32);
        } else if (-2_147_483_648.0..2_147_483_648.0).contains(&value) {
            self.asm.int32(value as i32);
        } else {
            return Err(Error::NumberTooLarge(value));
        }
        Ok(())
    }

    fn compile_array(&mut self, array: &ArrayExpression) -> Result<(), Error> {
        if array.elements.iter().any(Option::is_none) {
            return Err(Error::Unsupported("array hole"));
        }

        let length = u32::try_from(array.elements.len())
            .map_err(|_| Error::Unsupported("array literal longer than 2^32 - 1"))?;
        self.asm.newarray(length);
        for (index, element) in array.elements.iter().flatten().enumerate() {
            self.compile_number(index as f64)?;
            self.compile_expression(element)?;
            self.asm.op(OpCode::InitElem);
        }
        self.asm.op(OpCode::EndInit);
        Ok(())
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn compile_binary(&mut self, expr: &Expression, bin: &BinaryExpression) -> Result<(), Error> {
        if bin.operator == BinaryOperator::Add {
            return self.compile_addition(expr, bin);
        }

        let opcode = binary_opcode(bin.operator)?;
        self.compile_expression(&bin.left)?;
        self.compile_expression(&bin.right)?;
        self.asm.op(opcode);
        Ok(())
    }

    fn compile_addition(&mut self, expr: &Expression, bin: &BinaryExpression) -> Result<(), Error> {
        if !self.options.fold_constants {
            return self.emit_addition(bin);
        }

        let folded = fold_constants(expr);
        match &*folded {
            Expression::Binary(folded_bin) => self.emit_addition(folded_bin),
            other => self.compile_expression(other),
        }
    }

    fn emit_addition(&mut self, bin: &BinaryExpression) -> Result<(), Error> {
        self.compile_expression(&bin.left)?;
        self.compile_expression(&bin.right)?;
        self.asm.op(OpCode::Add);
        Ok(())
    }

    fn compile_unary(&mut self, unary: &UnaryExpression) -> Result<(), Error> {
        match unary.operator {
            UnaryOperator::LogicalNot => {
                self.compile_expression(&unary.argument)?;
                self.asm.op(OpCode::Not);
                Ok(())
            }
            UnaryOperator::Minus => Err(Error::Unsupported("unary minus")),
            UnaryOperator::Plus => Err(Error::Unsupported("unary plus")),
            UnaryOperator::BitwiseNot => Err(Error::Unsupported("bitwise not")),
            UnaryOperator::Typeof => Err(Error::Unsupported("typeof operator")),
            UnaryOperator::Void => Err(Error::Unsupported("void operator")),
            UnaryOperator::Delete => Err(Error::Unsupported("delete operator")),
        }
    }

    /// Postfix `++`; the expression's value is the operand before the
    /// increment.
    fn compile_update(&mut self, update: &UpdateExpression) -> Result<(), Error> {
        if update.operator == UpdateOperator::Decrement {
            return Err(Error::Unsupported("decrement operator"));
        }
        if update.prefix {
            return Err(Error::Unsupported("prefix increment"));
        }

        match update.argument.as_ref() {
            Expression::Member(member) => self.property_increment(member),
            Expression::Index(index) => self.element_increment(index),
            Expression::Identifier(var) => match &var.binding {
                Binding::Global { name } => {
                    self.global_increment(name);
                    Ok(())
                }
                Binding::Parameter { .. } | Binding::Local { .. } => self.variable_increment(var),
            },
            _ => Err(Error::Unsupported("increment of this operand")),
        }
    }

    fn compile_assignment(&mut self, assign: &AssignmentExpression) -> Result<(), Error> {
        let name = match assign.operator {
            AssignmentOperator::Assign => {
                return self.assign(&assign.target, |c| c.compile_expression(&assign.value));
            }
            AssignmentOperator::AddAssign => "+= operator",
            AssignmentOperator::SubtractAssign => "-= operator",
            AssignmentOperator::MultiplyAssign => "*= operator",
            AssignmentOperator::DivideAssign => "/= operator",
            AssignmentOperator::ModuloAssign => "%= operator",
            AssignmentOperator::BitwiseAndAssign => "&= operator",
            AssignmentOperator::BitwiseOrAssign => "|= operator",
            AssignmentOperator::BitwiseXorAssign => "^= operator",
            AssignmentOperator::LeftShiftAssign => "<<= operator",
            AssignmentOperator::RightShiftAssign => ">>= operator",
            AssignmentOperator::UnsignedRightShiftAssign => ">>>= operator",
        };
        Err(Error::Unsupported(name))
    }

    fn compile_conditional(&mut self, cond: &ConditionalExpression) -> Result<(), Error> {
        self.compile_expression(&cond.test)?;
        let else_loc = self.asm.lazy_location();
        let merge_loc = self.asm.lazy_location();
        self.asm.ifeq(else_loc);
        self.compile_expression(&cond.consequent)?;
        self.asm.goto(merge_loc);
        self.asm.fix_location(else_loc)?;
        self.compile_expression(&cond.alternate)?;
        self.asm.fix_location(merge_loc)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn compile_call(&mut self, call: &CallExpression) -> Result<(), Error> {
        let argc = count_operand(call.arguments.len())?;

        match Callee::classify(&call.callee)? {
            // Bare calls always go through the global object.
            Callee::Name(var) => {
                self.asm.callgname(&var.name);
            }
            Callee::Property(member) => {
                self.compile_expression(&member.object)?;
                self.asm.callprop(&member.property);
            }
            Callee::Element(index) => {
                self.compile_expression(&index.object)?;
                self.compile_expression(&index.key)?;
                self.asm.op(OpCode::CallElem);
            }
        }

        self.compile_arguments(&call.arguments)?;
        self.asm.call(argc);
        Ok(())
    }

    fn compile_new(&mut self, new: &NewExpression) -> Result<(), Error> {
        let Expression::Identifier(constructor) = new.callee.as_ref() else {
            return Err(Error::Unsupported("new with a computed constructor"));
        };
        let argc = count_operand(new.arguments.len())?;

        self.get_variable(constructor);
        self.asm.op(OpCode::Push);
        self.compile_arguments(&new.arguments)?;
        self.asm.construct(argc);
        Ok(())
    }

    fn compile_arguments(&mut self, arguments: &[Expression]) -> Result<(), Error> {
        for arg in arguments {
            self.compile_expression(arg)?;
        }
        Ok(())
    }
}

/// Maps a binary operator to its stack instruction.
fn binary_opcode(op: BinaryOperator) -> Result<OpCode, Error> {
    let opcode = match op {
        BinaryOperator::Add => OpCode::Add,
        BinaryOperator::Subtract => OpCode::Sub,
        BinaryOperator::Multiply => OpCode::Mul,
        BinaryOperator::Divide => OpCode::Div,
        BinaryOperator::Modulo => OpCode::Mod,
        BinaryOperator::Equal => OpCode::Eq,
        BinaryOperator::NotEqual => OpCode::Ne,
        BinaryOperator::StrictEqual => OpCode::StrictEq,
        BinaryOperator::StrictNotEqual => OpCode::StrictNe,
        BinaryOperator::LessThan => OpCode::Lt,
        BinaryOperator::LessThanEqual => OpCode::Le,
        BinaryOperator::GreaterThan => OpCode::Gt,
        BinaryOperator::GreaterThanEqual => OpCode::Ge,
        BinaryOperator::LogicalAnd => OpCode::And,
        BinaryOperator::LogicalOr => OpCode::Or,
        BinaryOperator::BitwiseAnd => return Err(Error::Unsupported("bitwise and")),
        BinaryOperator::BitwiseOr => return Err(Error::Unsupported("bitwise or")),
        BinaryOperator::BitwiseXor => return Err(Error::Unsupported("bitwise xor")),
        BinaryOperator::LeftShift => return Err(Error::Unsupported("left shift")),
        BinaryOperator::RightShift => return Err(Error::Unsupported("right shift")),
        BinaryOperator::UnsignedRightShift => {
            return Err(Error::Unsupported("unsigned right shift"));
        }
        BinaryOperator::In => return Err(Error::Unsupported("in operator")),
        BinaryOperator::InstanceOf => return Err(Error::Unsupported("instanceof")),
    };
    Ok(opcode)
}
