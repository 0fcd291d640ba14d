//! Type annotations used on expression nodes and IR values.

use crate::prelude::*;

/// The size, in bytes, of a value or register. A thin newtype so call sites
/// cannot accidentally mix up bytes and bits or pass a raw `u64` where a
/// size was meant.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    PartialOrd,
    Ord,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Construct a `ByteSize` from a byte count.
    pub fn new(bytes: u64) -> ByteSize {
        ByteSize(bytes)
    }

    /// The size in bits.
    pub fn as_bit_length(self) -> u64 {
        self.0 * 8
    }
}

/// The type annotation carried by every [`super::Expr`] node.
///
/// The translation from source IR types to `ExprT` is lossy by design:
/// any integer width other than 8 collapses onto `Int32` or `Int64`, and
/// unrecognized types collapse onto `Void`. See [`ExprT::from_ir_integer_bits`]
/// for the one deliberately-preserved quirk in that translation.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ExprT {
    /// No value (e.g. the result type of a `Store` or `Ret` with no value).
    Void,
    /// A pointer-sized value, architecture word size.
    Ptr,
    /// An 8-bit integer.
    Int8,
    /// A 32-bit integer (and the catch-all for "some integer wider than 8 bits
    /// that isn't 64", as well as the 64-bit quirk below).
    Int32,
    /// A 64-bit integer.
    Int64,
    /// A 32-bit IEEE-754 float.
    Float,
    /// A 64-bit IEEE-754 float.
    Double,
}

impl ExprT {
    /// Map an integer bit width exactly onto an [`ExprT`], with no quirks:
    /// `8 -> Int8`, `32 -> Int32`, `64 -> Int64`, anything else -> `Int32`.
    /// Used when translating explicit cast instructions (`Trunc`, `ZExt`, ...)
    /// whose result width is given directly by the instruction.
    pub fn from_bits_exact(bits: u64) -> ExprT {
        match bits {
            8 => ExprT::Int8,
            64 => ExprT::Int64,
            _ => ExprT::Int32,
        }
    }

    /// Map an integer bit width the way the original tool's IR-type
    /// translation does, reproducing its one known quirk: 64-bit integer
    /// *types* (as opposed to 64-bit cast results, see
    /// [`ExprT::from_bits_exact`]) collapse onto `Int32` rather than
    /// `Int64`. This is load-bearing for downstream expression rendering
    /// that some call sites still rely on, so it is reproduced verbatim
    /// rather than "fixed" (see DESIGN.md, Open Question 1).
    pub fn from_ir_integer_bits(bits: u64) -> ExprT {
        match bits {
            8 => ExprT::Int8,
            _ => ExprT::Int32,
        }
    }

    /// `true` if this is one of the integer variants (`Int8`, `Int32`, `Int64`).
    pub fn is_integer(self) -> bool {
        matches!(self, ExprT::Int8 | ExprT::Int32 | ExprT::Int64)
    }

    /// The bit width named by this type, where that makes sense (`Void` and
    /// `Ptr` have none in the abstract; `Ptr` returns `None` since the
    /// pointer width is architecture-dependent and not tracked here).
    pub fn bit_width(self) -> Option<u64> {
        match self {
            ExprT::Int8 => Some(8),
            ExprT::Int32 => Some(32),
            ExprT::Int64 => Some(64),
            ExprT::Float => Some(32),
            ExprT::Double => Some(64),
            ExprT::Void | ExprT::Ptr => None,
        }
    }
}

#[cfg(test)]
mod tests;
