//! Top-level driver.
//!
//! [`MatReader`] owns the buffer and yields top-level matrices one at a
//! time; every other top-level element type is skipped by byte count.
//! [`MatFile`] collects everything and adds name/path lookups.
//!
//! Decoding stops at the first error: a misread moves the cursor
//! unpredictably, so nothing after it can be trusted.

use std::path::Path;

use tracing::{debug, warn};

use crate::buffer::{align_up, ByteBuffer};
use crate::codec::ZlibCodec;
use crate::element::{read_element_header, skip_payload, NORMAL_HEADER_SIZE};
use crate::error::Result;
use crate::header::{FileHeader, HEADER_SIZE};
use crate::matrix::{Matrix, MatrixData, MatrixDecoder};
use crate::options::DecodeOptions;
use crate::types::DataType;

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct MatReader {
    buf:    ByteBuffer,
    header: FileHeader,
    codec:  ZlibCodec,
    opts:   DecodeOptions,
    failed: bool,
}

impl MatReader {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        Self::with_options(bytes, DecodeOptions::default())
    }

    /// Parse the file header and position the cursor on the first element.
    pub fn with_options(bytes: Vec<u8>, opts: DecodeOptions) -> Result<Self> {
        let header = FileHeader::read(&bytes[..], opts.strict_header)?;
        let mut buf = ByteBuffer::new(bytes);
        buf.set_endian(header.endian);
        buf.advance(HEADER_SIZE)?;
        debug!(
            version = header.version,
            endian  = ?header.endian,
            len     = buf.len(),
            "file header"
        );
        Ok(Self { buf, header, codec: ZlibCodec::from_options(&opts), opts, failed: false })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn position(&self) -> usize {
        self.buf.position()
    }

    /// Decode the next top-level matrix, or `None` once fewer bytes than
    /// one element header are left; those are padding.
    pub fn next_matrix(&mut self) -> Result<Option<Matrix>> {
        loop {
            let left = self.buf.len().saturating_sub(align_up(self.buf.position()));
            if left < NORMAL_HEADER_SIZE {
                return Ok(None);
            }
            self.buf.align()?;

            let hdr = read_element_header(&mut self.buf, &self.codec)?;
            if hdr.data_type == DataType::Matrix {
                let m = MatrixDecoder::new(&mut self.buf, &self.codec, self.opts.max_depth)
                    .decode(&hdr)?;
                debug!(offset = hdr.offset, name = %m.name, class = m.class().name(), "matrix");
                return Ok(Some(m));
            }

            warn!(
                offset    = hdr.offset,
                data_type = hdr.data_type.name(),
                byte_len  = hdr.byte_len,
                "skipping top-level element"
            );
            skip_payload(&mut self.buf, &hdr)?;
        }
    }

    /// The buffer as it stands, with every compressed element decoded so
    /// far replaced by its uncompressed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner()
    }
}

impl Iterator for MatReader {
    type Item = Result<Matrix>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_matrix() {
            Ok(m) => m.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

// ── MatFile ──────────────────────────────────────────────────────────────────

/// A fully decoded file.
#[derive(Debug, Clone)]
pub struct MatFile {
    header:   FileHeader,
    matrices: Vec<Matrix>,
}

impl MatFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, DecodeOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, opts: DecodeOptions) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes_with_options(bytes, opts)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(bytes, DecodeOptions::default())
    }

    pub fn from_bytes_with_options(bytes: Vec<u8>, opts: DecodeOptions) -> Result<Self> {
        let mut reader = MatReader::with_options(bytes, opts)?;
        let mut matrices = Vec::new();
        while let Some(m) = reader.next_matrix()? {
            matrices.push(m);
        }
        Ok(Self { header: reader.header, matrices })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.matrices.iter().map(|m| m.name.as_str()).collect()
    }

    /// Top-level matrix by name.
    pub fn get(&self, name: &str) -> Option<&Matrix> {
        self.matrices.iter().find(|m| m.name == name)
    }

    /// Any matrix by attribution path, e.g. `s.field` or `s(2).inner.x`.
    pub fn lookup(&self, path: &str) -> Option<&Matrix> {
        fn find<'m>(m: &'m Matrix, path: &str) -> Option<&'m Matrix> {
            if m.path == path {
                return Some(m);
            }
            match &m.data {
                MatrixData::Struct(s) => s
                    .elements
                    .iter()
                    .flatten()
                    .find_map(|child| find(child, path)),
                _ => None,
            }
        }
        self.matrices.iter().find_map(|m| find(m, path))
    }

    /// Paths of every non-struct value nested inside a struct.  With
    /// `only_2d`, only values with two dimensions, neither of them 1.
    pub fn field_paths(&self, only_2d: bool) -> Vec<String> {
        fn collect(m: &Matrix, only_2d: bool, out: &mut Vec<String>) {
            if let MatrixData::Struct(s) = &m.data {
                for child in s.elements.iter().flatten() {
                    match child.data {
                        MatrixData::Struct(_) => collect(child, only_2d, out),
                        _ if only_2d && !child.is_2d() => {}
                        _ => out.push(child.path.clone()),
                    }
                }
            }
        }
        let mut out = Vec::new();
        for m in &self.matrices {
            collect(m, only_2d, &mut out);
        }
        out
    }
}
