//! The binary trace-log reader: decodes the 40-byte little-endian records
//! described in the external-interfaces section of the full spec into a
//! flat list of [`RawEvent`]s.
//!
//! This is deliberately a *flat* decode only: the wire format carries just
//! three entry types (`Addr`, `Branch`, `Select`). The richer
//! [`crate::trace::MemlogOp`] variants used internally (`Memset`, `Memcpy`,
//! `HelperFunc`) are synthesized by the associator while it walks the IR
//! against this flat stream, not read directly off the wire.

use std::convert::TryInto;
use std::io::Read;

use crate::prelude::*;
use crate::trace::{AddrEntry, AddrFlag, AddrKind};
use crate::trace::memlog::AddrOp;

/// The size in bytes of one trace record.
pub const RECORD_SIZE: usize = 40;

/// One decoded entry straight off the wire, before any IR-directed
/// reinterpretation by the associator.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RawEvent {
    /// A tagged address observation.
    Addr(AddrOp, AddrEntry),
    /// A conditional branch outcome.
    Branch(u32),
    /// A select outcome.
    Select(u32),
}

/// Read every record from `reader` until EOF, decoding each into a
/// [`RawEvent`]. A malformed `entry_type`, `addr_kind`, or `addr_flag` is a
/// fatal parse error (category 2 of the error design), matching the "any
/// other value is a fatal parse error" rule of the external interface.
pub fn read_memlog<R: Read>(mut reader: R) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    let mut buf = [0u8; RECORD_SIZE];
    loop {
        match read_exact_or_eof(&mut reader, &mut buf)? {
            false => break,
            true => events.push(decode_record(&buf)?),
        }
    }
    Ok(events)
}

/// Like `Read::read_exact`, but returns `Ok(false)` instead of erroring when
/// zero bytes were available at the start of the read (clean EOF between
/// records), and still errors on a truncated record.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            if total == 0 {
                return Ok(false);
            }
            bail!("truncated trace record: got {} of {} bytes", total, buf.len());
        }
        total += n;
    }
    Ok(true)
}

fn decode_record(buf: &[u8; RECORD_SIZE]) -> Result<RawEvent> {
    let entry_type = u64::from_le_bytes(buf[0..8].try_into().unwrap());
    match entry_type {
        0 => {
            let addr_op = u64::from_le_bytes(buf[8..16].try_into().unwrap());
            let addr_kind = u64::from_le_bytes(buf[16..24].try_into().unwrap());
            let addr_val = u64::from_le_bytes(buf[24..32].try_into().unwrap());
            let addr_off = u32::from_le_bytes(buf[32..36].try_into().unwrap());
            let addr_flag = i32::from_le_bytes(buf[36..40].try_into().unwrap());
            let op = AddrOp::from_wire(addr_op)?;
            let kind = AddrKind::from_wire(addr_kind)?;
            let flag = AddrFlag::from_wire(addr_flag)?;
            Ok(RawEvent::Addr(
                op,
                AddrEntry {
                    kind,
                    value: addr_val,
                    offset: addr_off,
                    flag,
                },
            ))
        }
        1 => {
            let branch_taken = u32::from_le_bytes(buf[8..12].try_into().unwrap());
            Ok(RawEvent::Branch(branch_taken))
        }
        2 => {
            let bool_select = u32::from_le_bytes(buf[8..12].try_into().unwrap());
            Ok(RawEvent::Select(bool_select))
        }
        other => bail!("unknown trace entry_type {}", other),
    }
}

#[cfg(test)]
mod tests;
