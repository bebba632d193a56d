//! Break and continue targets of the enclosing loops.

use crate::Error;
use crate::compiler::assembler::Label;

/// Jump targets of one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopContext {
    /// Where `continue` jumps: the test of a `while`, the update of a `for`
    pub entry: Label,
    /// Where `break` jumps, fixed after the loop's last instruction
    pub exit: Label,
}

/// Stack of loop contexts, innermost last.
#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopContext>,
}

impl LoopStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a loop.
    pub fn push(&mut self, context: LoopContext) {
        self.frames.push(context);
    }

    /// Leaves the innermost loop.
    pub fn pop(&mut self) -> Option<LoopContext> {
        self.frames.pop()
    }

    /// The innermost enclosing loop.
    ///
    /// `statement` names the jump being resolved and is used in the error
    /// raised when there is no enclosing loop.
    pub fn innermost(&self, statement: &str) -> Result<LoopContext, Error> {
        self.frames
            .last()
            .copied()
            .ok_or_else(|| Error::Semantic(format!("{} outside of loop", statement)))
    }

    /// Number of enclosing loops.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no loop is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
