use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding::EncodingRef;
use log::warn;

use crate::err::{DeserializationError, DeserializationResult};
use crate::model::Value;
use crate::schema::FieldType;
use crate::utils::bytes;
use crate::utils::text::decode_fixed_text;

/// A cursor over a window `[start, end)` of an immutable byte slice.
///
/// Positions are absolute offsets into the backing slice, so errors and logs report file offsets
/// no matter how deeply the cursor is nested. Reads never cross `end`, which is what keeps a
/// section decoder inside its own section.
///
/// [`ByteCursor::seek`] and [`ByteCursor::skip`] do not validate; a bad position is reported by
/// the next read.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteCursor {
            buf,
            start: 0,
            end: buf.len(),
            pos: 0,
        }
    }

    /// A cursor limited to `len` bytes starting at `start`.
    ///
    /// A window running past the end of `buf` is clamped to it.
    pub fn bounded(buf: &'a [u8], start: usize, len: usize) -> Self {
        let start_clamped = start.min(buf.len());
        let end = start.saturating_add(len).min(buf.len());
        if end - start_clamped < len {
            warn!(
                "window of {} bytes at offset {} is cut short by the end of the buffer ({} bytes available)",
                len,
                start,
                end - start_clamped
            );
        }

        ByteCursor {
            buf,
            start: start_clamped,
            end,
            pos: start_clamped,
        }
    }

    /// Splits the next `len` bytes off into their own bounded cursor and advances past them.
    pub fn sub_cursor(&mut self, len: usize, what: &'static str) -> DeserializationResult<Self> {
        let start = self.pos;
        self.read(len, what)?;
        Ok(ByteCursor {
            buf: self.buf,
            start,
            end: start + len,
            pos: start,
        })
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn seek(&mut self, absolute: usize) {
        self.pos = absolute;
    }

    #[inline]
    pub fn skip(&mut self, delta: isize) {
        self.pos = self.pos.wrapping_add_signed(delta);
    }

    /// Bytes left before the end of the window.
    #[inline]
    pub fn remaining(&self) -> usize {
        if self.pos < self.start {
            return 0;
        }
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.remaining() > 0
    }

    #[inline]
    fn check_in_window(&self, need: usize, what: &'static str) -> DeserializationResult<()> {
        if self.pos < self.start {
            return Err(DeserializationError::Truncated {
                what,
                offset: self.pos as u64,
                need,
                have: 0,
            });
        }
        Ok(())
    }

    pub fn read(&mut self, n: usize, what: &'static str) -> DeserializationResult<&'a [u8]> {
        self.check_in_window(n, what)?;
        let out = bytes::slice_r(self.buf, self.pos, n, self.end, what)?;
        self.pos += n;
        Ok(out)
    }

    pub fn array<const N: usize>(&mut self, what: &'static str) -> DeserializationResult<[u8; N]> {
        self.check_in_window(N, what)?;
        let v = bytes::read_array_r::<N>(self.buf, self.pos, self.end, what)?;
        self.pos += N;
        Ok(v)
    }

    #[inline]
    pub fn u8_named(&mut self, what: &'static str) -> DeserializationResult<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    #[inline]
    pub fn u16_named(&mut self, what: &'static str) -> DeserializationResult<u16> {
        Ok(LittleEndian::read_u16(&self.array::<2>(what)?))
    }

    #[inline]
    pub fn u32_named(&mut self, what: &'static str) -> DeserializationResult<u32> {
        Ok(LittleEndian::read_u32(&self.array::<4>(what)?))
    }

    #[inline]
    pub fn i16_be_named(&mut self, what: &'static str) -> DeserializationResult<i16> {
        Ok(BigEndian::read_i16(&self.array::<2>(what)?))
    }

    #[inline]
    pub fn u32_be_named(&mut self, what: &'static str) -> DeserializationResult<u32> {
        Ok(BigEndian::read_u32(&self.array::<4>(what)?))
    }

    /// Decodes one value of `field_type` at the current position.
    pub fn read_primitive(
        &mut self,
        field_type: FieldType,
        what: &'static str,
        ansi_codec: EncodingRef,
    ) -> DeserializationResult<Value> {
        Ok(match field_type {
            FieldType::U8 => Value::U8(self.u8_named(what)?),
            FieldType::U16 => Value::U16(self.u16_named(what)?),
            FieldType::U32 => Value::U32(self.u32_named(what)?),
            FieldType::I16Be => Value::I16(self.i16_be_named(what)?),
            FieldType::U32Be => Value::U32(self.u32_be_named(what)?),
            FieldType::Text(len) => Value::Text(decode_fixed_text(self.read(len, what)?, ansi_codec)),
        })
    }

    /// Absolute offset of the first `value` at or after the current position.
    pub fn find_byte(&self, value: u8, what: &'static str) -> DeserializationResult<usize> {
        self.find_subsequence(&[value], what)
    }

    /// Absolute offset of the first occurrence of `needle` at or after the current position.
    pub fn find_subsequence(&self, needle: &[u8], what: &'static str) -> DeserializationResult<usize> {
        let not_found = DeserializationError::NotFound {
            what,
            offset: self.pos as u64,
        };
        if self.pos < self.start || self.pos >= self.end {
            return Err(not_found);
        }

        bytes::find_subsequence(&self.buf[self.pos..self.end], needle)
            .map(|idx| self.pos + idx)
            .ok_or(not_found)
    }
}
