pub mod buffer;
pub mod types;
pub mod error;
pub mod options;
pub mod header;
pub mod codec;
pub mod element;
pub mod walker;
pub mod matrix;
pub mod reader;

#[cfg(test)]
mod testutil;

pub use error::{DecodeError, Result};
pub use options::DecodeOptions;
pub use header::FileHeader;
pub use types::{DataType, MatrixClass};
pub use element::{ElementHeader, read_element_header};
pub use matrix::{Matrix, MatrixData, NumericData, StructData};
pub use reader::{MatFile, MatReader};
