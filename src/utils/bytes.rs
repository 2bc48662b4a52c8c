//! Byte-slice helpers for bounds-oriented parsing.
//!
//! Every read in the crate funnels through [`slice_r`], so a bad offset is always reported as
//! `DeserializationError::Truncated` with the offset and the number of bytes that were missing.
//!
//! Offsets are absolute positions into the slice passed in.

use crate::err::DeserializationError;

#[inline]
pub(crate) fn truncated(
    what: &'static str,
    offset: usize,
    need: usize,
    end: usize,
) -> DeserializationError {
    DeserializationError::Truncated {
        what,
        offset: offset as u64,
        need,
        have: end.saturating_sub(offset),
    }
}

/// Borrow `len` bytes at `offset`, refusing to cross `end`.
pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    end: usize,
    what: &'static str,
) -> Result<&'a [u8], DeserializationError> {
    let stop = offset
        .checked_add(len)
        .ok_or_else(|| truncated(what, offset, len, end))?;
    if stop > end {
        return Err(truncated(what, offset, len, end));
    }
    buf.get(offset..stop)
        .ok_or_else(|| truncated(what, offset, len, end))
}

/// Read `N` raw bytes at `offset`.
pub(crate) fn read_array_r<const N: usize>(
    buf: &[u8],
    offset: usize,
    end: usize,
    what: &'static str,
) -> Result<[u8; N], DeserializationError> {
    let bytes = slice_r(buf, offset, N, end, what)?;
    let mut out = [0_u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Offset of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
