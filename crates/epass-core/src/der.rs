//! # DER TLV Helpers
//!
//! The minimum of ASN.1 DER needed to rebuild ICAO 9303 structures byte for
//! byte: definite-length encoding, TLV construction, and a forward-only
//! reader for walking signed attributes.

use crate::error::PassportError;

/// `SEQUENCE` (constructed).
pub const TAG_SEQUENCE: u8 = 0x30;
/// `SET` (constructed).
pub const TAG_SET: u8 = 0x31;
/// `INTEGER`.
pub const TAG_INTEGER: u8 = 0x02;
/// `OCTET STRING`.
pub const TAG_OCTET_STRING: u8 = 0x04;
/// `NULL`.
pub const TAG_NULL: u8 = 0x05;
/// `OBJECT IDENTIFIER`.
pub const TAG_OID: u8 = 0x06;
/// `UTCTime`.
pub const TAG_UTC_TIME: u8 = 0x17;

/// Encode a definite length in the shortest DER form.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    let mut out = Vec::with_capacity(1 + be.len() - skip);
    out.push(0x80 | (be.len() - skip) as u8);
    out.extend_from_slice(&be[skip..]);
    out
}

/// Encode a TLV with a (possibly multi-byte) tag.
pub fn encode_tlv(tag: &[u8], value: &[u8]) -> Vec<u8> {
    let len = encode_length(value.len());
    let mut out = Vec::with_capacity(tag.len() + len.len() + value.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(&len);
    out.extend_from_slice(value);
    out
}

/// Encode a small non-negative `INTEGER`.
pub fn encode_small_integer(value: u8) -> Vec<u8> {
    if value < 0x80 {
        encode_tlv(&[TAG_INTEGER], &[value])
    } else {
        encode_tlv(&[TAG_INTEGER], &[0x00, value])
    }
}

/// One decoded TLV, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// Single-byte tag.
    pub tag: u8,
    /// Offset of the value within the buffer the reader was created over.
    pub value_offset: usize,
    /// The value octets.
    pub value: &'a [u8],
}

/// Forward-only DER reader over a byte buffer.
///
/// Offsets reported in [`Tlv::value_offset`] are absolute with respect to
/// the buffer passed to [`DerReader::new`], plus the `base` supplied to
/// [`DerReader::with_base`].
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> DerReader<'a> {
    /// Reader over a whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, base: 0 }
    }

    /// Reader over a slice that starts at `base` inside some outer buffer.
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8, PassportError> {
        let b = *self.buf.get(self.pos).ok_or_else(|| {
            PassportError::malformed(format!("DER truncated at offset {}", self.base + self.pos))
        })?;
        self.pos += 1;
        Ok(b)
    }

    /// Read the next single-byte-tag TLV.
    pub fn read(&mut self) -> Result<Tlv<'a>, PassportError> {
        let tag = self.byte()?;
        if tag & 0x1f == 0x1f {
            return Err(PassportError::malformed(format!(
                "multi-byte DER tag at offset {} not supported here",
                self.base + self.pos - 1
            )));
        }
        let first = self.byte()?;
        let len = if first < 0x80 {
            usize::from(first)
        } else {
            let n = usize::from(first & 0x7f);
            if n == 0 || n > std::mem::size_of::<usize>() {
                return Err(PassportError::malformed(format!(
                    "unsupported DER length form 0x{first:02x}"
                )));
            }
            let mut len = 0usize;
            for _ in 0..n {
                len = (len << 8) | usize::from(self.byte()?);
            }
            len
        };
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                PassportError::malformed(format!(
                    "DER value of length {len} at offset {} overruns buffer",
                    self.base + start
                ))
            })?;
        self.pos = end;
        Ok(Tlv {
            tag,
            value_offset: self.base + start,
            value: &self.buf[start..end],
        })
    }

    /// Read the next TLV and require `tag`.
    pub fn expect(&mut self, tag: u8) -> Result<Tlv<'a>, PassportError> {
        let tlv = self.read()?;
        if tlv.tag != tag {
            return Err(PassportError::malformed(format!(
                "expected DER tag 0x{tag:02x}, found 0x{:02x} at offset {}",
                tlv.tag,
                tlv.value_offset
            )));
        }
        Ok(tlv)
    }
}

impl<'a> Tlv<'a> {
    /// Reader over this TLV's value, keeping absolute offsets.
    pub fn children(&self) -> DerReader<'a> {
        DerReader::with_base(self.value, self.value_offset)
    }
}
