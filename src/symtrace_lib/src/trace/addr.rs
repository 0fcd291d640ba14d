//! Tagged guest addresses, as they appear both in the static IR (as operands
//! of `Load`/`Store` instructions, once resolved) and in the dynamic trace
//! (as the payload of `Addr` records, see [`super::memlog`]).

use crate::prelude::*;

/// The kind of an [`AddrEntry`]: what "space" the address value lives in.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum AddrKind {
    /// Host address (host-process virtual memory, used for e.g. MMIO shims).
    HAddr = 0,
    /// Guest physical memory address.
    MAddr = 1,
    /// Guest I/O address space.
    IAddr = 2,
    /// A literal/logging address, carries no real storage.
    LAddr = 3,
    /// A general-purpose guest register, `value` is the register index.
    GReg = 4,
    /// A "special" guest register (flags, segment bases, ...).
    GSpec = 5,
    /// Unknown/unresolved address.
    Unk = 6,
    /// A compile-time constant, not a memory location at all.
    Const = 7,
    /// The synthetic "return value" location.
    Ret = 8,
}

impl AddrKind {
    /// Decode the `u64` wire tag of §6 into an `AddrKind`.
    pub fn from_wire(tag: u64) -> Result<AddrKind> {
        Ok(match tag {
            0 => AddrKind::HAddr,
            1 => AddrKind::MAddr,
            2 => AddrKind::IAddr,
            3 => AddrKind::LAddr,
            4 => AddrKind::GReg,
            5 => AddrKind::GSpec,
            6 => AddrKind::Unk,
            7 => AddrKind::Const,
            8 => AddrKind::Ret,
            other => bail!("unknown AddrEntry kind tag {}", other),
        })
    }
}

/// Why an address should (or should not) be treated as "interesting" for
/// message emission purposes, beyond the plain kind/value check.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum AddrFlag {
    /// The address is known to be uninteresting; suppress messages for it.
    Irrelevant,
    /// No special flag.
    None,
    /// The access happened while handling a guest exception.
    Exception,
    /// The access was a replay of a previously logged value (not a fresh
    /// dynamic observation).
    Readlog,
    /// The access is a function argument passed through this location.
    Funcarg,
}

impl AddrFlag {
    /// Decode the signed 32-bit wire tag of §6. The tag is read as a
    /// *signed* quantity specifically so that `-1` (`Irrelevant`) is
    /// distinguished from the unsigned fields around it in the same
    /// record; see the Open Questions in DESIGN.md.
    pub fn from_wire(tag: i32) -> Result<AddrFlag> {
        Ok(match tag {
            -1 => AddrFlag::Irrelevant,
            0 => AddrFlag::None,
            1 => AddrFlag::Exception,
            2 => AddrFlag::Readlog,
            3 => AddrFlag::Funcarg,
            other => bail!("unknown AddrEntry flag tag {}", other),
        })
    }
}

/// A tagged guest address, as read off the wire or resolved from the IR.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct AddrEntry {
    /// What address space `value` lives in.
    pub kind: AddrKind,
    /// The raw address/register-index/constant value.
    pub value: u64,
    /// A byte offset applied on top of `value` (e.g. within a struct).
    pub offset: u32,
    /// Additional qualification of the address.
    pub flag: AddrFlag,
}

/// The highest general-purpose register index this analyzer tracks.
/// `GReg` addresses at or beyond this index are outside the tracked
/// register file and are treated as uninteresting, matching the emulator's
/// own register window.
pub const TRACKED_GENERAL_REGISTER_COUNT: u64 = 16;

impl AddrEntry {
    /// Build a plain `AddrEntry` with no offset and no flag.
    pub fn new(kind: AddrKind, value: u64) -> AddrEntry {
        AddrEntry {
            kind,
            value,
            offset: 0,
            flag: AddrFlag::None,
        }
    }

    /// `true` if stores/loads to this address should *not* produce a
    /// `Message`, per §3: addresses flagged `Irrelevant`, or `GReg`
    /// addresses beyond the tracked general-purpose register file.
    pub fn is_uninteresting(&self) -> bool {
        self.flag == AddrFlag::Irrelevant
            || (self.kind == AddrKind::GReg && self.value >= TRACKED_GENERAL_REGISTER_COUNT)
    }

    /// Render the address the way query responses do: `"0x" + 8 hex digits`
    /// for memory-like addresses, or a short symbolic form for registers.
    pub fn pretty(&self) -> String {
        match self.kind {
            AddrKind::GReg => format!("%reg{}", self.value),
            AddrKind::GSpec => format!("%spec{}", self.value),
            AddrKind::Const => format!("#0x{:x}", self.value),
            _ => format!("0x{:08x}", self.value),
        }
    }
}

#[cfg(test)]
mod tests;
