//! Bytecode definitions.
//!
//! Opcodes follow SpiderMonkey's naming. Their numbering and byte encoding
//! belong to the object-file writer, not to this crate.

use std::fmt;

use crate::compiler::assembler::Label;

/// A single bytecode instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation code
    pub opcode: OpCode,
    /// Optional operand
    pub operand: Option<Operand>,
}

impl Instruction {
    /// Creates a new instruction with no operand.
    pub fn simple(opcode: OpCode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    /// Creates a new instruction with an operand.
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    /// Whether this instruction transfers control to a jump target.
    pub fn is_jump(&self) -> bool {
        matches!(self.opcode, OpCode::Goto | OpCode::IfEq)
    }
}

/// Instruction operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// Argument or local slot
    Slot(u16),
    /// Index into the unit's atom table
    Atom(u32),
    /// Signed 8-bit immediate
    Int8(i8),
    /// Unsigned 16-bit immediate
    Uint16(u16),
    /// Unsigned 24-bit immediate
    Uint24(u32),
    /// Signed 32-bit immediate
    Int32(i32),
    /// Number of call or constructor arguments
    ArgCount(u16),
    /// Number of array elements
    Length(u32),
    /// Resolved jump target (instruction index)
    Jump(u32),
    /// Jump target not fixed yet; replaced by `Jump` when the label is fixed
    Label(Label),
}

impl Operand {
    /// Returns the integer value of an immediate operand.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Operand::Int8(v) => Some(v.into()),
            Operand::Uint16(v) => Some(v.into()),
            Operand::Uint24(v) => Some(v.into()),
            Operand::Int32(v) => Some(v.into()),
            _ => None,
        }
    }
}

/// Operation codes for the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Constants
    /// Push undefined
    Push,
    /// Push null
    Null,
    /// Push true
    True,
    /// Push false
    False,
    /// Push the receiver
    This,
    /// Push the number 1
    One,
    /// Push a signed 8-bit integer
    Int8,
    /// Push an unsigned 16-bit integer
    Uint16,
    /// Push an unsigned 24-bit integer
    Uint24,
    /// Push a signed 32-bit integer
    Int32,
    /// Push a string atom
    String,

    // Stack operations
    /// Pop the top value
    Pop,
    /// Pop the top value and record it as the program's completion value
    PopV,
    /// Duplicate the top value
    Dup,

    // Arithmetic operations
    /// Add top two values
    Add,
    /// Subtract
    Sub,
    /// Multiply
    Mul,
    /// Divide
    Div,
    /// Modulo
    Mod,

    // Comparison operations
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Strict equal (===)
    StrictEq,
    /// Strict not equal (!==)
    StrictNe,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,

    // Logical operations
    /// Logical AND of the top two values
    And,
    /// Logical OR of the top two values
    Or,
    /// Logical NOT
    Not,

    // Variable operations
    /// Load an argument slot
    GetArg,
    /// Store to an argument slot, leaving the value
    SetArg,
    /// Load a local slot
    GetLocal,
    /// Store to a local slot, leaving the value
    SetLocal,
    /// Load a global by name
    GetGName,
    /// Push the global object as the target of a following `SetGName`
    BindGName,
    /// Store to a global by name, leaving the value
    SetGName,

    // Property operations
    /// Get a named property
    GetProp,
    /// Set a named property, leaving the value
    SetProp,
    /// Get a computed element
    GetElem,
    /// Set a computed element, leaving the value
    SetElem,
    /// Postfix-increment a computed element, leaving the old value
    ElemInc,

    // Function operations
    /// Push a global function and an undefined receiver
    CallGName,
    /// Push a method looked up by name and its receiver
    CallProp,
    /// Push a method looked up by computed key and its receiver
    CallElem,
    /// Call a function
    Call,
    /// Construct an object
    New,
    /// Return from function
    Return,

    // Array operations
    /// Create a new array
    NewArray,
    /// Initialize one element of the array being built
    InitElem,
    /// Finish an array initializer
    EndInit,

    // Control flow
    /// Unconditional jump
    Goto,
    /// Jump if false
    IfEq,
    /// End of unit
    Stop,
}

impl OpCode {
    /// The mnemonic used in listings.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Push => "push",
            OpCode::Null => "null",
            OpCode::True => "true",
            OpCode::False => "false",
            OpCode::This => "this",
            OpCode::One => "one",
            OpCode::Int8 => "int8",
            OpCode::Uint16 => "uint16",
            OpCode::Uint24 => "uint24",
            OpCode::Int32 => "int32",
            OpCode::String => "string",
            OpCode::Pop => "pop",
            OpCode::PopV => "popv",
            OpCode::Dup => "dup",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Mod => "mod",
            OpCode::Eq => "eq",
            OpCode::Ne => "ne",
            OpCode::StrictEq => "stricteq",
            OpCode::StrictNe => "strictne",
            OpCode::Lt => "lt",
            OpCode::Le => "le",
            OpCode::Gt => "gt",
            OpCode::Ge => "ge",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Not => "not",
            OpCode::GetArg => "getarg",
            OpCode::SetArg => "setarg",
            OpCode::GetLocal => "getlocal",
            OpCode::SetLocal => "setlocal",
            OpCode::GetGName => "getgname",
            OpCode::BindGName => "bindgname",
            OpCode::SetGName => "setgname",
            OpCode::GetProp => "getprop",
            OpCode::SetProp => "setprop",
            OpCode::GetElem => "getelem",
            OpCode::SetElem => "setelem",
            OpCode::ElemInc => "eleminc",
            OpCode::CallGName => "callgname",
            OpCode::CallProp => "callprop",
            OpCode::CallElem => "callelem",
            OpCode::Call => "call",
            OpCode::New => "new",
            OpCode::Return => "return",
            OpCode::NewArray => "newarray",
            OpCode::InitElem => "initelem",
            OpCode::EndInit => "endinit",
            OpCode::Goto => "goto",
            OpCode::IfEq => "ifeq",
            OpCode::Stop => "stop",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
