//! The fixed 128-byte file header at offset 0.
//!
//! ```text
//! 0    116  descriptive text (not NUL-terminated, usually space padded)
//! 116    8  subsystem data offset
//! 124    2  version (0x0100)
//! 126    2  endianness indicator: "IM" little-endian writer, "MI" big-endian
//! ```
//!
//! The indicator is read first: it decides the byte order of the version
//! word, the subsystem offset, and every data element that follows.

use std::io::{self, Read};

use serde::Serialize;

use crate::buffer::Endian;
use crate::error::{DecodeError, Result};

pub const HEADER_SIZE:    usize = 128;
pub const SIGNATURE_SIZE: usize = 116;
pub const VERSION:        u16   = 0x0100;

#[derive(Debug, Clone, Serialize)]
pub struct FileHeader {
    #[serde(skip)]
    pub signature:        [u8; SIGNATURE_SIZE],
    pub subsystem_offset: u64,
    pub version:          u16,
    pub indicator:        [u8; 2],
    pub endian:           Endian,
}

impl FileHeader {
    /// Parse the header.  With `strict` set, the indicator must be `IM` or
    /// `MI` and the version must be 0x0100; otherwise an unrecognised
    /// indicator falls back to little-endian and any version is accepted.
    pub fn read<R: Read>(mut reader: R, strict: bool) -> Result<Self> {
        let mut raw = [0u8; HEADER_SIZE];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::InvalidHeader(format!(
                "file shorter than the {HEADER_SIZE}-byte header"
            )),
            _ => DecodeError::Io(e),
        })?;

        let indicator = [raw[126], raw[127]];
        let endian = match &indicator {
            b"IM" => Endian::Little,
            b"MI" => Endian::Big,
            other if strict => {
                return Err(DecodeError::InvalidHeader(format!(
                    "unknown endianness indicator 0x{}",
                    hex::encode(other)
                )));
            }
            _ => Endian::Little,
        };

        let version = endian.u16(&raw[124..126]);
        if strict && version != VERSION {
            return Err(DecodeError::InvalidHeader(format!(
                "unsupported version 0x{version:04x}"
            )));
        }

        let mut signature = [0u8; SIGNATURE_SIZE];
        signature.copy_from_slice(&raw[..SIGNATURE_SIZE]);

        Ok(Self {
            signature,
            subsystem_offset: endian.u64(&raw[116..124]),
            version,
            indicator,
            endian,
        })
    }

    /// Descriptive text with NUL bytes and trailing whitespace removed.
    pub fn signature_text(&self) -> String {
        let end = self
            .signature
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SIGNATURE_SIZE);
        String::from_utf8_lossy(&self.signature[..end]).trim_end().to_string()
    }

    /// False when the subsystem offset field is unused, which writers mark
    /// with all zeros or all spaces.
    pub fn has_subsystem_data(&self) -> bool {
        self.subsystem_offset != 0 && self.subsystem_offset != 0x2020_2020_2020_2020
    }
}
