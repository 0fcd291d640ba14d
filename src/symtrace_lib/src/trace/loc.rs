//! Abstract storage locations: the keys of the evaluator's environment map.

use crate::prelude::*;
use crate::trace::AddrEntry;

/// An abstract storage location: either an SSA value inside a function
/// activation, or a memory cell.
///
/// `Loc` is the key type of [`crate::evaluator::state::SymbolicState::info`].
/// SSA form guarantees `IdLoc` entries are written at most once per function
/// activation; `MemLoc` entries follow last-writer-wins semantics, as
/// ordinary memory does.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Loc {
    /// An SSA name inside a specific function.
    IdLoc(String, String),
    /// A memory cell, identified by its tagged address.
    MemLoc(AddrEntry),
}

impl Loc {
    /// Build an `IdLoc` for the identifier `name` inside function `function`.
    pub fn id(function: impl Into<String>, name: impl Into<String>) -> Loc {
        Loc::IdLoc(function.into(), name.into())
    }

    /// Build a `MemLoc` for the given address.
    pub fn mem(addr: AddrEntry) -> Loc {
        Loc::MemLoc(addr)
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Loc::IdLoc(func, name) => write!(f, "{}::%{}", func, name),
            Loc::MemLoc(addr) => write!(f, "{}", addr.pretty()),
        }
    }
}

#[cfg(test)]
mod tests;
