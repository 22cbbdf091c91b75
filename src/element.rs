//! Data-element header decoding.
//!
//! Two physical encodings share the same 8-byte slot:
//!
//! ```text
//! normal  [ type: u32 ][ byte_len: u32 ][ payload ... padded to 8 ]
//! small   [ type: u16 | byte_len: u16 ][ payload (<= 4 bytes)    ]
//! ```
//!
//! There is no format flag telling them apart.  The upper half of the first
//! 32-bit word (bytes 2-3 in a little-endian file) is zero for every normal
//! header whose type tag fits in 16 bits, so a nonzero upper half is taken to
//! mean "small".  A normal-form element with a type tag above 0xFFFF would be
//! misread; this matches what every Level 5 reader does.
//!
//! `miCOMPRESSED` elements never reach the caller: they are inflated in place
//! and the header read restarts on the decompressed bytes.

use tracing::debug;

use crate::buffer::{ByteBuffer, ALIGNMENT};
use crate::codec::{inflate_in_place, Codec};
use crate::error::{DecodeError, Result};
use crate::types::DataType;

pub const NORMAL_HEADER_SIZE: usize = 8;
pub const SMALL_HEADER_SIZE:  usize = 4;
/// Payload capacity of a small element.
pub const SMALL_PAYLOAD_MAX:  usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    pub data_type: DataType,
    pub byte_len:  usize,
    /// Offset of the first header byte.
    pub offset:    usize,
    pub small:     bool,
}

impl ElementHeader {
    pub fn header_size(&self) -> usize {
        if self.small { SMALL_HEADER_SIZE } else { NORMAL_HEADER_SIZE }
    }

    pub fn payload_start(&self) -> usize {
        self.offset + self.header_size()
    }

    /// One past the last declared payload byte (padding excluded).
    pub fn payload_end(&self) -> usize {
        self.payload_start() + self.byte_len
    }

    /// Fail with `UnexpectedDataType` unless `accept` holds for this type.
    pub fn expect(
        &self,
        context:  &'static str,
        expected: &str,
        accept:   impl Fn(DataType) -> bool,
    ) -> Result<()> {
        if accept(self.data_type) {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedDataType {
                offset:   self.offset,
                context,
                expected: expected.to_string(),
                found:    self.data_type.to_string(),
            })
        }
    }

    /// Fail with `InvalidLength` unless the byte length equals `len`.
    pub fn expect_len(&self, context: &'static str, len: usize) -> Result<()> {
        if self.byte_len == len {
            Ok(())
        } else {
            Err(DecodeError::InvalidLength {
                offset: self.offset,
                context,
                detail: format!("expected {len} byte(s), found {}", self.byte_len),
            })
        }
    }
}

/// Read the next element header, leaving the cursor at its payload.
///
/// The cursor is first rounded up to an 8-byte boundary, which also skips
/// any padding left behind by the previous element.
pub fn read_element_header(buf: &mut ByteBuffer, codec: &dyn Codec) -> Result<ElementHeader> {
    loop {
        buf.align()?;
        let offset = buf.position();
        if offset % ALIGNMENT != 0 {
            return Err(DecodeError::MisalignedElement { offset });
        }

        let word = buf.peek_u32()?;
        let header = if word >> 16 != 0 {
            buf.advance(SMALL_HEADER_SIZE)?;
            let header = ElementHeader {
                data_type: DataType::from_tag(word & 0xFFFF),
                byte_len:  (word >> 16) as usize,
                offset,
                small:     true,
            };
            if header.byte_len > SMALL_PAYLOAD_MAX {
                return Err(DecodeError::InvalidLength {
                    offset,
                    context: "small element",
                    detail:  format!(
                        "{} byte(s) do not fit the {SMALL_PAYLOAD_MAX}-byte payload slot",
                        header.byte_len
                    ),
                });
            }
            header
        } else {
            let tag = buf.read_u32()?;
            let len = buf.read_u32()? as usize;
            ElementHeader { data_type: DataType::from_tag(tag), byte_len: len, offset, small: false }
        };

        debug!(
            offset,
            data_type = header.data_type.name(),
            byte_len  = header.byte_len,
            small     = header.small,
            "element header"
        );

        if header.data_type == DataType::Compressed {
            inflate_in_place(buf, offset, header.byte_len, codec)?;
            continue;
        }
        return Ok(header);
    }
}

/// Read the payload of `header`, which must be the element just decoded.
pub fn read_payload<'a>(buf: &'a mut ByteBuffer, header: &ElementHeader) -> Result<&'a [u8]> {
    buf.read_bytes(header.byte_len)
}

/// Skip the payload of `header` by byte count.
pub fn skip_payload(buf: &mut ByteBuffer, header: &ElementHeader) -> Result<()> {
    buf.advance(header.byte_len)
}
