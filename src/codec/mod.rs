//! Inflator: zlib decompression of `miCOMPRESSED` elements, spliced back
//! into the live buffer.
//!
//! # Sizing
//! The format does not record the uncompressed size.  The output buffer
//! starts at `inflate_ratio` times the compressed size; when zlib fills it
//! before reaching the end of the stream the buffer is doubled and
//! decompression continues, up to `max_inflate_growths` times.  Running out
//! of input before the end of the stream, or any zlib data/checksum error,
//! is a hard failure.
//!
//! # Splice
//! The compressed wrapper is always a normal-form element, so the region
//! replaced is `8 + byte_len` bytes starting at the wrapper's header.  After
//! the splice the byte that followed the compressed payload follows the
//! uncompressed bytes, and the cursor is back on the wrapper's old header
//! offset, which now holds the first header of the uncompressed stream.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;
use tracing::debug;

use crate::buffer::ByteBuffer;
use crate::element::NORMAL_HEADER_SIZE;
use crate::error::{DecodeError, Result};
use crate::options::DecodeOptions;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("corrupt stream: {0}")]
    Corrupt(String),
    #[error("stream truncated after {consumed} of {available} input byte(s)")]
    Truncated { consumed: usize, available: usize },
    #[error("output exceeded {limit} byte(s) after {growths} growth(s)")]
    OutputLimit { limit: usize, growths: usize },
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec {
    fn name(&self) -> &'static str;
    fn decompress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CodecError>;
}

/// zlib (RFC 1950) inflate with ratio-based output sizing.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    pub ratio:       usize,
    pub max_growths: usize,
}

impl ZlibCodec {
    pub fn from_options(opts: &DecodeOptions) -> Self {
        Self { ratio: opts.inflate_ratio.max(1), max_growths: opts.max_inflate_growths }
    }
}

impl Codec for ZlibCodec {
    fn name(&self) -> &'static str { "zlib" }

    fn decompress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        let mut z       = Decompress::new(true);
        let mut out     = Vec::with_capacity(data.len().saturating_mul(self.ratio).max(64));
        let mut growths = 0usize;

        loop {
            let consumed  = z.total_in() as usize;
            let before_in = z.total_in();
            let before_out = z.total_out();

            let status = z
                .decompress_vec(&data[consumed..], &mut out, FlushDecompress::Finish)
                .map_err(|e| CodecError::Corrupt(e.to_string()))?;

            if status == Status::StreamEnd {
                return Ok(out);
            }

            if out.len() == out.capacity() {
                // Buffer too small: grow and keep going.
                if growths == self.max_growths {
                    return Err(CodecError::OutputLimit { limit: out.capacity(), growths });
                }
                growths += 1;
                let extra = out.capacity();
                out.reserve(extra);
                debug!(capacity = out.capacity(), growths, "inflate output grown");
                continue;
            }

            if z.total_in() == before_in && z.total_out() == before_out {
                return Err(CodecError::Truncated {
                    consumed:  z.total_in() as usize,
                    available: data.len(),
                });
            }
        }
    }
}

// ── Splice ───────────────────────────────────────────────────────────────────

/// Inflate the compressed payload of `byte_len` bytes at the cursor and
/// splice the result over the whole compressed element starting at
/// `header_start`.  On return the cursor is at `header_start`.
pub fn inflate_in_place(
    buf:          &mut ByteBuffer,
    header_start: usize,
    byte_len:     usize,
    codec:        &dyn Codec,
) -> Result<()> {
    let payload_start = buf.position();
    let inflated = {
        let payload = buf.peek_bytes(byte_len)?;
        codec.decompress(payload).map_err(|e| DecodeError::DecompressionFailed {
            offset: header_start,
            reason: format!("{}: {e}", codec.name()),
        })?
    };

    let region_len = NORMAL_HEADER_SIZE + byte_len;
    if payload_start != header_start + NORMAL_HEADER_SIZE {
        return Err(DecodeError::DecompressionFailed {
            offset: header_start,
            reason: "compressed element does not use the normal 8-byte header".into(),
        });
    }
    if inflated.len() <= region_len {
        return Err(DecodeError::DecompressionFailed {
            offset: header_start,
            reason: format!(
                "inflated size {} does not exceed the {region_len}-byte compressed region",
                inflated.len()
            ),
        });
    }

    debug!(
        offset       = header_start,
        compressed   = byte_len,
        uncompressed = inflated.len(),
        "spliced compressed element"
    );
    buf.replace_region(header_start, region_len, &inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn inflates_with_growth() {
        let data = vec![7u8; 100_000];
        let packed = zlib(&data);
        // Ratio 1 forces several growths for a highly compressible input.
        let codec = ZlibCodec { ratio: 1, max_growths: 16 };
        assert_eq!(codec.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn growth_limit_is_reported() {
        let data = vec![0u8; 100_000];
        let packed = zlib(&data);
        let codec = ZlibCodec { ratio: 1, max_growths: 0 };
        assert!(matches!(codec.decompress(&packed), Err(CodecError::OutputLimit { .. })));
    }

    #[test]
    fn corrupt_stream_fails() {
        let codec = ZlibCodec { ratio: 20, max_growths: 4 };
        assert!(matches!(codec.decompress(&[0xFF; 16]), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn truncated_stream_fails() {
        let packed = zlib(&(0u8..=255).cycle().take(4096).collect::<Vec<_>>());
        let codec = ZlibCodec { ratio: 20, max_growths: 4 };
        let cut = &packed[..packed.len() / 2];
        assert!(matches!(
            codec.decompress(cut),
            Err(CodecError::Truncated { .. }) | Err(CodecError::Corrupt(_))
        ));
    }

    #[test]
    fn splice_shifts_tail() {
        let inner: Vec<u8> = (0u8..64).collect();
        let packed = zlib(&inner);

        let mut raw = Vec::new();
        raw.extend_from_slice(&15u32.to_le_bytes());
        raw.extend_from_slice(&(packed.len() as u32).to_le_bytes());
        raw.extend_from_slice(&packed);
        raw.extend_from_slice(&[0xAB, 0xCD]);

        let mut buf = ByteBuffer::new(raw);
        buf.advance(NORMAL_HEADER_SIZE).unwrap();
        let codec = ZlibCodec { ratio: 20, max_growths: 4 };
        inflate_in_place(&mut buf, 0, packed.len(), &codec).unwrap();

        assert_eq!(buf.position(), 0);
        assert_eq!(&buf.as_slice()[..64], &inner[..]);
        assert_eq!(&buf.as_slice()[64..], &[0xAB, 0xCD]);
    }
}
