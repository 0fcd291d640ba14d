//! Common imports used throughout the crate.
//!
//! Every module that needs `Serialize`/`Deserialize` derives or the crate's
//! `Result` alias pulls this in with `use crate::prelude::*;` instead of
//! repeating the same three imports everywhere.

pub use crate::intermediate_representation::ByteSize;
pub use crate::intermediate_representation::Tid;
pub use anyhow::{anyhow, bail, Context};
pub use serde::{Deserialize, Serialize};

/// The result type used for fatal, run-aborting errors (associator alignment
/// faults, trace parse faults, internal contract violations). Recoverable
/// evaluation problems are warnings, not `Err`s; see `utils::log`.
pub type Result<T> = anyhow::Result<T>;
