//! Little-endian element writer for unit tests.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

use crate::types::*;

#[derive(Default)]
pub(crate) struct Writer {
    out: Vec<u8>,
}

impl Writer {
    pub fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    fn pad(&mut self) {
        while self.out.len() % 8 != 0 {
            self.out.push(0);
        }
    }

    pub fn element(&mut self, tag: u32, payload: &[u8]) {
        self.raw(&tag.to_le_bytes());
        self.raw(&(payload.len() as u32).to_le_bytes());
        self.raw(payload);
        self.pad();
    }

    pub fn small(&mut self, tag: u32, payload: &[u8]) {
        assert!(payload.len() <= 4);
        self.raw(&(((payload.len() as u32) << 16) | tag).to_le_bytes());
        self.raw(payload);
        self.pad();
    }

    /// Name subelement: small form for 1..=4 bytes, normal otherwise.
    pub fn name(&mut self, name: &str) {
        if (1..=4).contains(&name.len()) {
            self.small(MI_INT8, name.as_bytes());
        } else {
            self.element(MI_INT8, name.as_bytes());
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

pub(crate) fn flags_payload(class: u8, flag_byte: u8) -> Vec<u8> {
    let mut p = (class as u32 | (flag_byte as u32) << 8).to_le_bytes().to_vec();
    p.extend_from_slice(&0u32.to_le_bytes());
    p
}

pub(crate) fn matrix_body(
    class:     u8,
    flag_byte: u8,
    dims:      &[i32],
    name:      &str,
    body:      impl FnOnce(&mut Writer),
) -> Vec<u8> {
    let mut w = Writer::default();
    w.element(MI_UINT32, &flags_payload(class, flag_byte));
    let dims: Vec<u8> = dims.iter().flat_map(|d| d.to_le_bytes()).collect();
    w.element(MI_INT32, &dims);
    w.name(name);
    body(&mut w);
    w.into_bytes()
}

fn wrap_matrix(body: &[u8]) -> Vec<u8> {
    let mut w = Writer::default();
    w.element(MI_MATRIX, body);
    w.into_bytes()
}

pub(crate) fn double_matrix(name: &str, dims: &[i32], values: &[f64]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    wrap_matrix(&matrix_body(6, 0, dims, name, |w| w.element(MI_DOUBLE, &payload)))
}

pub(crate) fn char_matrix(name: &str, tag: u32, text: &str) -> Vec<u8> {
    let payload: Vec<u8> = match tag {
        MI_UTF16 => text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect(),
        MI_UTF32 => text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect(),
        _        => text.as_bytes().to_vec(),
    };
    let dims = [1, text.chars().count() as i32];
    wrap_matrix(&matrix_body(4, 0, &dims, name, |w| w.element(tag, &payload)))
}

pub(crate) fn struct_matrix(
    name:      &str,
    dims:      &[i32],
    field_len: usize,
    fields:    &[&str],
    members:   &[Vec<u8>],
) -> Vec<u8> {
    let mut blob = Vec::new();
    for f in fields {
        let mut padded = f.as_bytes().to_vec();
        padded.resize(field_len, 0);
        blob.extend_from_slice(&padded);
    }
    wrap_matrix(&matrix_body(2, 0, dims, name, |w| {
        w.small(MI_INT32, &(field_len as i32).to_le_bytes());
        w.element(MI_INT8, &blob);
        for m in members {
            w.raw(m);
        }
    }))
}

/// Wrap `element` in an `miCOMPRESSED` element.  The zlib stream is
/// zero-filled to a multiple of 8 inside the declared length, so the
/// element is aligned both before and after it is spliced.
pub(crate) fn compressed(element: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(element).unwrap();
    let mut packed = enc.finish().unwrap();
    packed.resize(packed.len().next_multiple_of(8), 0);
    let mut out = MI_COMPRESSED.to_le_bytes().to_vec();
    out.extend_from_slice(&(packed.len() as u32).to_le_bytes());
    out.extend_from_slice(&packed);
    out
}

/// 128-byte little-endian file header followed by `elements`.
pub(crate) fn file(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![b' '; 116];
    let text = b"MATLAB 5.0 MAT-file, test fixture";
    out[..text.len()].copy_from_slice(text);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&0x0100u16.to_le_bytes());
    out.extend_from_slice(b"IM");
    for e in elements {
        out.extend_from_slice(e);
    }
    out
}
