//! Per-function namespace produced by the resolver.

use serde::Deserialize;

/// The parameters and `var` locals of one compilation unit.
///
/// Slot indices carried by [`Binding`](super::Binding) index into these
/// lists. The top-level unit normally has neither: its variables are globals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scope {
    /// Formal parameter names, in slot order
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Local variable names, in slot order
    #[serde(default)]
    pub locals: Vec<String>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a formal parameter and returns its slot.
    pub fn declare_parameter(&mut self, name: impl Into<String>) -> u16 {
        let index = self.parameters.len();
        self.parameters.push(name.into());
        index as u16
    }

    /// Declares a local and returns its slot.
    ///
    /// Redeclaring a name reuses the existing slot, as `var` does.
    pub fn declare_local(&mut self, name: impl Into<String>) -> u16 {
        let name = name.into();
        if let Some(index) = self.locals.iter().position(|local| *local == name) {
            return index as u16;
        }
        let index = self.locals.len();
        self.locals.push(name);
        index as u16
    }

    /// Number of formal parameters.
    pub fn nargs(&self) -> usize {
        self.parameters.len()
    }

    /// Number of fixed local slots.
    pub fn nfixed(&self) -> usize {
        self.locals.len()
    }
}
