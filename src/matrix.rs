//! Recursive-descent decoder for `miMATRIX` elements.
//!
//! A matrix body is a fixed sequence of subelements:
//!
//! ```text
//! array flags  miUINT32, 8 bytes   class | flags << 8, max nonzero
//! dimensions   miINT32,  4 * ndims
//! name         miINT8 / miUINT8    empty for struct members
//! body         depends on class
//! ```
//!
//! Struct bodies carry a field-name length, a fixed-width field-name blob,
//! and then one nested `miMATRIX` per field per struct-array element, all
//! inside the struct's own element.  Each struct frame owns its own
//! [`StructFieldWalker`], and the current attribution path is passed down
//! explicitly instead of living in shared state.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::buffer::{align_up, ByteBuffer, Endian};
use crate::codec::Codec;
use crate::element::{read_element_header, read_payload, ElementHeader};
use crate::error::{DecodeError, Result};
use crate::types::{DataType, MatrixClass};
use crate::walker::StructFieldWalker;

const FLAG_COMPLEX: u32 = 0x0800;
const FLAG_GLOBAL:  u32 = 0x0400;
const FLAG_LOGICAL: u32 = 0x0200;

// ── Data model ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayFlags {
    pub class:       MatrixClass,
    pub complex:     bool,
    pub global:      bool,
    pub logical:     bool,
    /// Only meaningful for sparse arrays.
    pub max_nonzero: u32,
}

impl ArrayFlags {
    pub fn from_words(flags: u32, max_nonzero: u32) -> Self {
        Self {
            class:   MatrixClass::from_tag((flags & 0xFF) as u8),
            complex: flags & FLAG_COMPLEX != 0,
            global:  flags & FLAG_GLOBAL  != 0,
            logical: flags & FLAG_LOGICAL != 0,
            max_nonzero,
        }
    }
}

/// Raw numeric payload.  Element-wise interpretation is left to the
/// accessors below.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericData {
    pub data_type: DataType,
    pub endian:    Endian,
    pub real:      Vec<u8>,
    /// Imaginary part, present when the complex flag is set.  Kept raw.
    pub imag:      Option<Vec<u8>>,
}

impl NumericData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self.data_type.element_size() {
            0    => 0,
            size => self.real.len() / size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        convert_to_f64(self.data_type, self.endian, &self.real)
    }

    pub fn imag_to_f64_vec(&self) -> Option<Vec<f64>> {
        self.imag.as_ref().map(|b| convert_to_f64(self.data_type, self.endian, b))
    }
}

fn convert_to_f64(data_type: DataType, endian: Endian, bytes: &[u8]) -> Vec<f64> {
    let size = data_type.element_size();
    if size == 0 {
        return Vec::new();
    }
    bytes
        .chunks_exact(size)
        .map(|b| match data_type {
            DataType::Int8   => b[0] as i8 as f64,
            DataType::Uint8  => b[0] as f64,
            DataType::Int16  => endian.i16(b) as f64,
            DataType::Uint16 => endian.u16(b) as f64,
            DataType::Int32  => endian.i32(b) as f64,
            DataType::Uint32 => endian.u32(b) as f64,
            DataType::Int64  => endian.i64(b) as f64,
            DataType::Uint64 => endian.u64(b) as f64,
            DataType::Single => endian.f32(b) as f64,
            DataType::Double => endian.f64(b),
            _ => f64::NAN,
        })
        .collect()
}

impl Serialize for NumericData {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("NumericData", 4)?;
        st.serialize_field("data_type", self.data_type.name())?;
        st.serialize_field("byte_len", &self.real.len())?;
        st.serialize_field("values", &self.to_f64_vec())?;
        st.serialize_field("imag", &self.imag_to_f64_vec())?;
        st.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructData {
    /// Shared by every element of the struct array.
    pub field_names: Vec<String>,
    /// One entry per struct-array element, each holding one value per field
    /// in field-name order.
    pub elements:    Vec<Vec<Matrix>>,
}

impl StructData {
    /// Value of `field` in struct-array element `index`.
    pub fn get(&self, index: usize, field: &str) -> Option<&Matrix> {
        let pos = self.field_names.iter().position(|f| f == field)?;
        self.elements.get(index)?.get(pos)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MatrixData {
    Numeric(NumericData),
    Char { data_type: DataType, text: String },
    Struct(StructData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    /// Contents of the name subelement (empty for struct members).
    pub name:  String,
    /// Field name when this matrix is a struct member.
    pub field: Option<String>,
    /// Attribution path: `A`, `s.field`, `s(2).field`, `outer.inner.x`.
    pub path:  String,
    pub flags: ArrayFlags,
    pub dims:  Vec<i32>,
    pub data:  MatrixData,
}

impl Matrix {
    pub fn class(&self) -> MatrixClass {
        self.flags.class
    }

    pub fn as_numeric(&self) -> Option<&NumericData> {
        match &self.data {
            MatrixData::Numeric(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            MatrixData::Char { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructData> {
        match &self.data {
            MatrixData::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Field of the first struct element.
    pub fn field(&self, name: &str) -> Option<&Matrix> {
        self.as_struct()?.get(0, name)
    }

    /// True for exactly two dimensions, neither of them 1.  Empty `0xN`
    /// arrays count.
    pub fn is_2d(&self) -> bool {
        self.dims.len() == 2 && self.dims[0] != 1 && self.dims[1] != 1
    }

    /// Numeric 2-D payload as rows.  Storage is column-major, so element
    /// `(r, c)` lives at `c * rows + r`.
    pub fn to_rows(&self) -> Option<Vec<Vec<f64>>> {
        let values = self.as_numeric()?.to_f64_vec();
        if self.dims.len() != 2 || self.dims[0] < 0 || self.dims[1] < 0 {
            return None;
        }
        let (rows, cols) = (self.dims[0] as usize, self.dims[1] as usize);
        if values.len() != rows.checked_mul(cols)? {
            return None;
        }
        Some(
            (0..rows)
                .map(|r| (0..cols).map(|c| values[c * rows + r]).collect())
                .collect(),
        )
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────────

/// Declared end of an element, held as a distance from the end of the
/// buffer.  A compressed subelement spliced in ahead of it grows the buffer
/// but leaves that distance unchanged.
#[derive(Debug, Clone, Copy)]
struct EndMark {
    tail: usize,
}

impl EndMark {
    fn new(buf: &ByteBuffer, end: usize) -> Result<Self> {
        if end > buf.len() {
            return Err(DecodeError::OutOfBounds {
                offset:    buf.position(),
                needed:    end.saturating_sub(buf.position()),
                available: buf.remaining(),
            });
        }
        Ok(Self { tail: buf.len() - end })
    }

    fn resolve(self, buf: &ByteBuffer) -> usize {
        buf.len().saturating_sub(self.tail)
    }
}

pub struct MatrixDecoder<'a> {
    buf:       &'a mut ByteBuffer,
    codec:     &'a dyn Codec,
    max_depth: usize,
}

impl<'a> MatrixDecoder<'a> {
    pub fn new(buf: &'a mut ByteBuffer, codec: &'a dyn Codec, max_depth: usize) -> Self {
        Self { buf, codec, max_depth }
    }

    /// Decode a top-level matrix whose header has just been read.  On
    /// success the cursor is at the declared end of the element.
    pub fn decode(&mut self, outer: &ElementHeader) -> Result<Matrix> {
        self.decode_matrix(outer, None, None, 0)
    }

    fn read_header(&mut self) -> Result<ElementHeader> {
        read_element_header(self.buf, self.codec)
    }

    fn decode_matrix(
        &mut self,
        outer:  &ElementHeader,
        walker: Option<&mut StructFieldWalker>,
        parent: Option<&str>,
        depth:  usize,
    ) -> Result<Matrix> {
        let end = EndMark::new(self.buf, outer.payload_end())?;

        // 1. Array flags.
        let hdr = self.read_header()?;
        hdr.expect("array flags", "miUINT32", |t| t == DataType::Uint32)?;
        hdr.expect_len("array flags", 8)?;
        let flags = ArrayFlags::from_words(self.buf.read_u32()?, self.buf.read_u32()?);

        let supported = matches!(flags.class, MatrixClass::Struct | MatrixClass::Char)
            || flags.class.is_numeric();
        if !supported {
            return Err(DecodeError::UnsupportedMatrixClass {
                offset: outer.offset,
                class:  flags.class.to_string(),
            });
        }

        // 2. Field attribution.
        let field = match walker {
            Some(w) => Some(w.next_field_name(outer.offset)?),
            None    => None,
        };

        // 3. Dimensions.
        let hdr = self.read_header()?;
        hdr.expect("dimensions", "miINT32", |t| t == DataType::Int32)?;
        if hdr.byte_len % 4 != 0 {
            return Err(DecodeError::InvalidLength {
                offset:  hdr.offset,
                context: "dimensions",
                detail:  format!("{} byte(s) is not a multiple of 4", hdr.byte_len),
            });
        }
        let mut dims = Vec::with_capacity(hdr.byte_len / 4);
        for _ in 0..hdr.byte_len / 4 {
            dims.push(self.buf.read_i32()?);
        }

        // 4. Name.
        let hdr = self.read_header()?;
        hdr.expect("array name", "miINT8 or miUINT8", DataType::is_byte)?;
        let name = decode_name(read_payload(self.buf, &hdr)?);

        let path = match (parent, &field) {
            (Some(p), Some(f)) => format!("{p}.{f}"),
            (None, Some(f))    => f.clone(),
            _                  => name.clone(),
        };
        if field.is_some() {
            trace!(path = %path, class = flags.class.name(), "struct field");
        }

        // 5. Body.
        let data = match flags.class {
            MatrixClass::Struct => {
                if depth >= self.max_depth {
                    return Err(DecodeError::DepthLimitExceeded {
                        offset: outer.offset,
                        limit:  self.max_depth,
                    });
                }
                MatrixData::Struct(self.decode_struct(outer, end, &dims, &path, depth)?)
            }
            MatrixClass::Char => self.decode_char()?,
            _ => MatrixData::Numeric(self.decode_numeric(flags.complex)?),
        };

        let end = end.resolve(self.buf);
        let consumed = self.buf.position();
        if consumed > end {
            return Err(DecodeError::InvalidLength {
                offset:  outer.offset,
                context: "matrix",
                detail:  format!("body runs to offset {consumed}, past the declared end {end}"),
            });
        }
        self.buf.seek(end)?;

        Ok(Matrix { name, field, path, flags, dims, data })
    }

    fn decode_struct(
        &mut self,
        outer: &ElementHeader,
        end:   EndMark,
        dims:  &[i32],
        path:  &str,
        depth: usize,
    ) -> Result<StructData> {
        let hdr = self.read_header()?;
        hdr.expect("field name length", "miINT32", |t| t == DataType::Int32)?;
        hdr.expect_len("field name length", 4)?;
        let name_len = self.buf.read_i32()?;
        if name_len <= 0 {
            return Err(DecodeError::InvalidLength {
                offset:  hdr.offset,
                context: "field name length",
                detail:  format!("field name length {name_len} must be positive"),
            });
        }
        let name_len = name_len as usize;

        let hdr = self.read_header()?;
        hdr.expect("field names", "miINT8 or miUINT8", DataType::is_byte)?;
        if hdr.byte_len % name_len != 0 {
            return Err(DecodeError::InvalidLength {
                offset:  hdr.offset,
                context: "field names",
                detail:  format!(
                    "{} byte(s) is not a multiple of the field name length {name_len}",
                    hdr.byte_len
                ),
            });
        }
        let names: Vec<String> = read_payload(self.buf, &hdr)?
            .chunks(name_len)
            .map(decode_name)
            .collect();

        let field_count   = names.len();
        let element_count = element_count(dims, outer.offset)?;
        let expected = field_count.checked_mul(element_count).ok_or(DecodeError::InvalidLength {
            offset:  outer.offset,
            context: "struct",
            detail:  "field count times element count overflows".into(),
        })?;

        let mut walker = StructFieldWalker::new(names);
        let mut values: Vec<Matrix> = Vec::new();
        let mut record = 0usize;

        while align_up(self.buf.position()) < end.resolve(self.buf) {
            if walker.is_exhausted() && record + 1 < element_count {
                record += 1;
                walker.rewind();
            }
            let member = self.read_header()?;
            member.expect("struct field", "miMATRIX", |t| t == DataType::Matrix)?;
            let prefix = if element_count > 1 {
                format!("{path}({})", record + 1)
            } else {
                path.to_string()
            };
            let value = self.decode_matrix(&member, Some(&mut walker), Some(&prefix), depth + 1)?;
            values.push(value);
        }

        if values.len() != expected {
            return Err(DecodeError::InvalidLength {
                offset:  outer.offset,
                context: "struct",
                detail:  format!(
                    "{field_count} field(s) x {element_count} element(s) declared, {} value(s) found",
                    values.len()
                ),
            });
        }

        let mut it = values.into_iter();
        let elements = (0..element_count)
            .map(|_| it.by_ref().take(field_count).collect())
            .collect();
        Ok(StructData { field_names: walker.into_field_names(), elements })
    }

    fn decode_char(&mut self) -> Result<MatrixData> {
        let hdr = self.read_header()?;
        hdr.expect("char data", "miUTF8, miUTF16 or miUTF32", DataType::is_text)?;
        let endian = self.buf.endian();
        let unit = match hdr.data_type {
            DataType::Utf16 => 2,
            DataType::Utf32 => 4,
            _ => 1,
        };
        if hdr.byte_len % unit != 0 {
            return Err(DecodeError::InvalidLength {
                offset:  hdr.offset,
                context: "char data",
                detail:  format!("{} byte(s) is not a multiple of {unit}", hdr.byte_len),
            });
        }
        let bytes = read_payload(self.buf, &hdr)?;
        let text = match hdr.data_type {
            DataType::Utf16 => {
                let units: Vec<u16> = bytes.chunks_exact(2).map(|b| endian.u16(b)).collect();
                String::from_utf16_lossy(&units)
            }
            DataType::Utf32 => bytes
                .chunks_exact(4)
                .map(|b| char::from_u32(endian.u32(b)).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
            _ => String::from_utf8_lossy(bytes).into_owned(),
        };
        Ok(MatrixData::Char { data_type: hdr.data_type, text })
    }

    fn decode_numeric(&mut self, complex: bool) -> Result<NumericData> {
        let endian = self.buf.endian();
        let (data_type, real) = self.read_numeric_element("numeric data")?;
        let imag = if complex {
            let (imag_type, bytes) = self.read_numeric_element("imaginary data")?;
            if imag_type != data_type {
                trace!(real = data_type.name(), imag = imag_type.name(), "mixed storage types");
            }
            Some(bytes)
        } else {
            None
        };
        Ok(NumericData { data_type, endian, real, imag })
    }

    fn read_numeric_element(&mut self, context: &'static str) -> Result<(DataType, Vec<u8>)> {
        let hdr = self.read_header()?;
        hdr.expect(context, "a numeric type", |t| t.element_size() != 0)?;
        let size = hdr.data_type.element_size();
        if hdr.byte_len % size != 0 {
            return Err(DecodeError::InvalidLength {
                offset: hdr.offset,
                context,
                detail: format!(
                    "{} byte(s) is not a multiple of the {}-byte {}",
                    hdr.byte_len,
                    size,
                    hdr.data_type.name()
                ),
            });
        }
        Ok((hdr.data_type, read_payload(self.buf, &hdr)?.to_vec()))
    }
}

/// Name bytes up to the first NUL.
fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn element_count(dims: &[i32], offset: usize) -> Result<usize> {
    dims.iter().try_fold(1usize, |acc, &d| {
        usize::try_from(d)
            .ok()
            .and_then(|d| acc.checked_mul(d))
            .ok_or_else(|| DecodeError::InvalidLength {
                offset,
                context: "dimensions",
                detail:  format!("dimensions {dims:?} do not give a valid element count"),
            })
    })
}
