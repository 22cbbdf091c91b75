//! Field attribution while descending into a struct's member matrices.
//!
//! A walker is created when a struct-class matrix is entered and owned by
//! that struct's decode frame, so a nested struct gets its own walker and
//! the enclosing one resumes untouched once the nested struct is done.

use crate::error::{DecodeError, Result};

#[derive(Debug, Clone)]
pub struct StructFieldWalker {
    names: Vec<String>,
    index: usize,
}

impl StructFieldWalker {
    pub fn new(names: Vec<String>) -> Self {
        Self { names, index: 0 }
    }

    /// Name for the next member matrix.  `offset` is the member's element
    /// offset, used for the error when every field has been handed out.
    pub fn next_field_name(&mut self, offset: usize) -> Result<String> {
        let name = self.names.get(self.index).cloned().ok_or(DecodeError::FieldIndexExceeded {
            offset,
            index: self.index,
            count: self.names.len(),
        })?;
        self.index += 1;
        Ok(name)
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.names.len()
    }

    /// Start over for the next element of a struct array.
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    pub fn into_field_names(self) -> Vec<String> {
        self.names
    }
}
