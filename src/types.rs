//! Type tables: data-type tags and matrix-class tags.
//!
//! Both tables are closed.  Unknown data-type tags are preserved as
//! [`DataType::Unknown`] with no resolvable element size; unknown class tags
//! are preserved as [`MatrixClass::Unknown`] and rejected by the matrix
//! decoder.

use serde::Serialize;

// ── Data types ───────────────────────────────────────────────────────────────

pub const MI_INT8:       u32 = 1;
pub const MI_UINT8:      u32 = 2;
pub const MI_INT16:      u32 = 3;
pub const MI_UINT16:     u32 = 4;
pub const MI_INT32:      u32 = 5;
pub const MI_UINT32:     u32 = 6;
pub const MI_SINGLE:     u32 = 7;
pub const MI_DOUBLE:     u32 = 9;
pub const MI_INT64:      u32 = 12;
pub const MI_UINT64:     u32 = 13;
pub const MI_MATRIX:     u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8:       u32 = 16;
pub const MI_UTF16:      u32 = 17;
pub const MI_UTF32:      u32 = 18;

/// Data-element type tag.  Tags 8, 10 and 11 are reserved and land in
/// `Unknown` along with anything above 18.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Single,
    Double,
    Int64,
    Uint64,
    Matrix,
    Compressed,
    Utf8,
    Utf16,
    Utf32,
    Unknown(u32),
}

impl DataType {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            MI_INT8       => DataType::Int8,
            MI_UINT8      => DataType::Uint8,
            MI_INT16      => DataType::Int16,
            MI_UINT16     => DataType::Uint16,
            MI_INT32      => DataType::Int32,
            MI_UINT32     => DataType::Uint32,
            MI_SINGLE     => DataType::Single,
            MI_DOUBLE     => DataType::Double,
            MI_INT64      => DataType::Int64,
            MI_UINT64     => DataType::Uint64,
            MI_MATRIX     => DataType::Matrix,
            MI_COMPRESSED => DataType::Compressed,
            MI_UTF8       => DataType::Utf8,
            MI_UTF16      => DataType::Utf16,
            MI_UTF32      => DataType::Utf32,
            other         => DataType::Unknown(other),
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            DataType::Int8       => MI_INT8,
            DataType::Uint8      => MI_UINT8,
            DataType::Int16      => MI_INT16,
            DataType::Uint16     => MI_UINT16,
            DataType::Int32      => MI_INT32,
            DataType::Uint32     => MI_UINT32,
            DataType::Single     => MI_SINGLE,
            DataType::Double     => MI_DOUBLE,
            DataType::Int64      => MI_INT64,
            DataType::Uint64     => MI_UINT64,
            DataType::Matrix     => MI_MATRIX,
            DataType::Compressed => MI_COMPRESSED,
            DataType::Utf8       => MI_UTF8,
            DataType::Utf16      => MI_UTF16,
            DataType::Utf32      => MI_UTF32,
            DataType::Unknown(t) => t,
        }
    }

    /// Size in bytes of one numeric element, or 0 for non-numeric and
    /// unknown tags.
    pub fn element_size(self) -> usize {
        match self {
            DataType::Int8   | DataType::Uint8  => 1,
            DataType::Int16  | DataType::Uint16 => 2,
            DataType::Int32  | DataType::Uint32 | DataType::Single => 4,
            DataType::Double | DataType::Int64  | DataType::Uint64 => 8,
            _ => 0,
        }
    }

    /// Human-readable name (diagnostics only — never parsed).
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int8       => "miINT8",
            DataType::Uint8      => "miUINT8",
            DataType::Int16      => "miINT16",
            DataType::Uint16     => "miUINT16",
            DataType::Int32      => "miINT32",
            DataType::Uint32     => "miUINT32",
            DataType::Single     => "miSINGLE",
            DataType::Double     => "miDOUBLE",
            DataType::Int64      => "miINT64",
            DataType::Uint64     => "miUINT64",
            DataType::Matrix     => "miMATRIX",
            DataType::Compressed => "miCOMPRESSED",
            DataType::Utf8       => "miUTF8",
            DataType::Utf16      => "miUTF16",
            DataType::Utf32      => "miUTF32",
            DataType::Unknown(_) => "Invalid",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, DataType::Utf8 | DataType::Utf16 | DataType::Utf32)
    }

    pub fn is_byte(self) -> bool {
        matches!(self, DataType::Int8 | DataType::Uint8)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.tag())
    }
}

// ── Matrix classes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatrixClass {
    Cell,
    Struct,
    Object,
    Char,
    Sparse,
    Double,
    Single,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Unknown(u8),
}

impl MatrixClass {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1  => MatrixClass::Cell,
            2  => MatrixClass::Struct,
            3  => MatrixClass::Object,
            4  => MatrixClass::Char,
            5  => MatrixClass::Sparse,
            6  => MatrixClass::Double,
            7  => MatrixClass::Single,
            8  => MatrixClass::Int8,
            9  => MatrixClass::Uint8,
            10 => MatrixClass::Int16,
            11 => MatrixClass::Uint16,
            12 => MatrixClass::Int32,
            13 => MatrixClass::Uint32,
            14 => MatrixClass::Int64,
            15 => MatrixClass::Uint64,
            other => MatrixClass::Unknown(other),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            MatrixClass::Cell       => 1,
            MatrixClass::Struct     => 2,
            MatrixClass::Object     => 3,
            MatrixClass::Char       => 4,
            MatrixClass::Sparse     => 5,
            MatrixClass::Double     => 6,
            MatrixClass::Single     => 7,
            MatrixClass::Int8       => 8,
            MatrixClass::Uint8      => 9,
            MatrixClass::Int16      => 10,
            MatrixClass::Uint16     => 11,
            MatrixClass::Int32      => 12,
            MatrixClass::Uint32     => 13,
            MatrixClass::Int64      => 14,
            MatrixClass::Uint64     => 15,
            MatrixClass::Unknown(t) => t,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MatrixClass::Cell       => "mxCELL_CLASS",
            MatrixClass::Struct     => "mxSTRUCT_CLASS",
            MatrixClass::Object     => "mxOBJECT_CLASS",
            MatrixClass::Char       => "mxCHAR_CLASS",
            MatrixClass::Sparse     => "mxSPARSE_CLASS",
            MatrixClass::Double     => "mxDOUBLE_CLASS",
            MatrixClass::Single     => "mxSINGLE_CLASS",
            MatrixClass::Int8       => "mxINT8_CLASS",
            MatrixClass::Uint8      => "mxUINT8_CLASS",
            MatrixClass::Int16      => "mxINT16_CLASS",
            MatrixClass::Uint16     => "mxUINT16_CLASS",
            MatrixClass::Int32      => "mxINT32_CLASS",
            MatrixClass::Uint32     => "mxUINT32_CLASS",
            MatrixClass::Int64      => "mxINT64_CLASS",
            MatrixClass::Uint64     => "mxUINT64_CLASS",
            MatrixClass::Unknown(_) => "Invalid",
        }
    }

    /// Double, single and the eight integer classes.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            MatrixClass::Double
                | MatrixClass::Single
                | MatrixClass::Int8
                | MatrixClass::Uint8
                | MatrixClass::Int16
                | MatrixClass::Uint16
                | MatrixClass::Int32
                | MatrixClass::Uint32
                | MatrixClass::Int64
                | MatrixClass::Uint64
        )
    }
}

impl std::fmt::Display for MatrixClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.tag())
    }
}
