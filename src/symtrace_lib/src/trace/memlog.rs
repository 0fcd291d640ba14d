//! Dynamic trace events (`MemlogOp`) and the messages the evaluator emits
//! for them.

use crate::intermediate_representation::Expr;
use crate::prelude::*;
use crate::trace::AddrEntry;

/// The kind of memory operation tagged by an `Addr` event.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum AddrOp {
    Load,
    Store,
    BranchAddr,
    SelectAddr,
}

impl AddrOp {
    /// Decode the `u64` wire tag of §6.
    pub fn from_wire(tag: u64) -> Result<AddrOp> {
        Ok(match tag {
            0 => AddrOp::Load,
            1 => AddrOp::Store,
            2 => AddrOp::BranchAddr,
            3 => AddrOp::SelectAddr,
            other => bail!("unknown AddrOp tag {}", other),
        })
    }
}

/// One dynamic record popped by the associator in lock-step with the static
/// instruction stream (§4.3).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum MemlogOp {
    /// A tagged address observed for a load, store, indirect branch target,
    /// or select condition.
    Addr(AddrOp, AddrEntry),
    /// The outcome of a conditional branch: `0` means the true target was
    /// taken, any other value means the false target was taken.
    Branch(u32),
    /// The outcome of a `Select` instruction: `0` selects the true value.
    Select(u32),
    /// The address a `memset` intrinsic call wrote to.
    Memset(AddrEntry),
    /// The source and destination addresses of a `memcpy` intrinsic call.
    Memcpy(AddrEntry, AddrEntry),
    /// A nested trace for an inlined helper-function call.
    HelperFunc(Vec<MemlogOp>),
}

/// A message emitted by the evaluator, visible to queries.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum Message {
    /// A memory load or store to an "interesting" address (§3).
    Memory {
        op: AddrOp,
        address: String,
        value: Expr,
        /// The address expression with its outer `IntToPtr` cast stripped,
        /// if one could be built; `None` if the address was itself a
        /// constant or otherwise had no useful origin expression.
        origin: Option<Expr>,
    },
    /// A conditional branch, with its condition expression and which side
    /// was taken.
    Branch { condition: Expr, taken: bool },
    /// An unconditional branch.
    UnconditionalBranch,
    /// A non-fatal warning, mirrored into the message stream so queries see
    /// it alongside the memory/branch messages for the same IP.
    Warning(String),
}

impl Message {
    /// Render the way §4.4 specifies for the message stream:
    /// `" - (<hex-ip-or-unknown>) <text>"`.
    pub fn format_warning(ip: Option<u64>, text: &str) -> String {
        match ip {
            Some(ip) => format!(" - (0x{:x}) {}", ip, text),
            None => format!(" - (unknown) {}", text),
        }
    }
}

#[cfg(test)]
mod tests;
