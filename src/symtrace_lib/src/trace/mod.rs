//! The address/trace record model (component B) and the binary trace-log
//! reader (ambient interface H, §6 of the full spec).

pub mod addr;
pub mod loc;
pub mod memlog;
pub mod reader;

pub use addr::{AddrEntry, AddrFlag, AddrKind};
pub use loc::Loc;
pub use memlog::{Message, MemlogOp};
