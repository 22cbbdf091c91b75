//! Fixture writer shared by the integration tests.  Emits either byte order
//! so big-endian files can be exercised end to end.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub const MI_INT8:       u32 = 1;
pub const MI_UINT8:      u32 = 2;
pub const MI_INT32:      u32 = 5;
pub const MI_UINT32:     u32 = 6;
pub const MI_DOUBLE:     u32 = 9;
pub const MI_MATRIX:     u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8:       u32 = 16;

pub const CLASS_STRUCT: u8 = 2;
pub const CLASS_CHAR:   u8 = 4;
pub const CLASS_SPARSE: u8 = 5;
pub const CLASS_DOUBLE: u8 = 6;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

pub struct MatWriter {
    order: Order,
    out:   Vec<u8>,
}

impl MatWriter {
    pub fn new(order: Order) -> Self {
        Self { order, out: Vec::new() }
    }

    pub fn u16(&self, v: u16) -> [u8; 2] {
        match self.order {
            Order::Little => v.to_le_bytes(),
            Order::Big    => v.to_be_bytes(),
        }
    }

    pub fn u32(&self, v: u32) -> [u8; 4] {
        match self.order {
            Order::Little => v.to_le_bytes(),
            Order::Big    => v.to_be_bytes(),
        }
    }

    pub fn f64s(&self, values: &[f64]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| match self.order {
                Order::Little => v.to_le_bytes(),
                Order::Big    => v.to_be_bytes(),
            })
            .collect()
    }

    pub fn i32s(&self, values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| self.u32(*v as u32)).collect()
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    fn pad(&mut self) {
        while self.out.len() % 8 != 0 {
            self.out.push(0);
        }
    }

    pub fn element(&mut self, tag: u32, payload: &[u8]) -> &mut Self {
        let (t, l) = (self.u32(tag), self.u32(payload.len() as u32));
        self.raw(&t).raw(&l).raw(payload);
        self.pad();
        self
    }

    /// Small element: the first word holds the length in its upper half and
    /// the type in its lower half, in file byte order.
    pub fn small(&mut self, tag: u32, payload: &[u8]) -> &mut Self {
        assert!(payload.len() <= 4);
        let word = self.u32(((payload.len() as u32) << 16) | tag);
        self.raw(&word).raw(payload);
        self.pad();
        self
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        if (1..=4).contains(&name.len()) {
            self.small(MI_INT8, name.as_bytes())
        } else {
            self.element(MI_INT8, name.as_bytes())
        }
    }

    pub fn matrix_prefix(&mut self, class: u8, flag_byte: u8, dims: &[i32], name: &str) -> &mut Self {
        let mut flags = self.u32(class as u32 | (flag_byte as u32) << 8).to_vec();
        flags.extend_from_slice(&self.u32(0));
        self.element(MI_UINT32, &flags);
        let dims = self.i32s(dims);
        self.element(MI_INT32, &dims);
        self.name(name)
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

/// Wrap a matrix body in its `miMATRIX` element header.
pub fn wrap_matrix(order: Order, body: &[u8]) -> Vec<u8> {
    let mut w = MatWriter::new(order);
    w.element(MI_MATRIX, body);
    w.into_bytes()
}

pub fn double_matrix(order: Order, name: &str, dims: &[i32], values: &[f64]) -> Vec<u8> {
    let mut w = MatWriter::new(order);
    let payload = w.f64s(values);
    w.matrix_prefix(CLASS_DOUBLE, 0, dims, name).element(MI_DOUBLE, &payload);
    wrap_matrix(order, &w.into_bytes())
}

pub fn char_matrix(order: Order, name: &str, text: &str) -> Vec<u8> {
    let mut w = MatWriter::new(order);
    w.matrix_prefix(CLASS_CHAR, 0, &[1, text.len() as i32], name)
        .element(MI_UTF8, text.as_bytes());
    wrap_matrix(order, &w.into_bytes())
}

pub fn struct_matrix(
    order:     Order,
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
    let mut w = MatWriter::new(order);
    let len = w.u32(field_len as u32);
    w.matrix_prefix(CLASS_STRUCT, 0, dims, name)
        .small(MI_INT32, &len)
        .element(MI_INT8, &blob);
    for m in members {
        w.raw(m);
    }
    wrap_matrix(order, &w.into_bytes())
}

pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

/// `element` wrapped in an `miCOMPRESSED` element whose declared length is
/// exactly the zlib stream, as top-level writers emit it.
pub fn compressed(order: Order, element: &[u8]) -> Vec<u8> {
    let packed = zlib(element);
    let mut w = MatWriter::new(order);
    let (t, l) = (w.u32(MI_COMPRESSED), w.u32(packed.len() as u32));
    w.raw(&t).raw(&l).raw(&packed);
    w.into_bytes()
}

/// Like [`compressed`], but the zlib stream is zero-filled to a multiple of
/// 8 inside the declared length, so the element can sit anywhere inside a
/// matrix and everything after it stays aligned once it is spliced.
pub fn compressed_aligned(order: Order, element: &[u8]) -> Vec<u8> {
    let mut packed = zlib(element);
    packed.resize(packed.len().next_multiple_of(8), 0);
    let mut w = MatWriter::new(order);
    w.element(MI_COMPRESSED, &packed);
    w.into_bytes()
}

/// Double matrix whose `miDOUBLE` data element is compressed.
pub fn double_matrix_packed_data(order: Order, name: &str, dims: &[i32], values: &[f64]) -> Vec<u8> {
    let mut data = MatWriter::new(order);
    let payload = data.f64s(values);
    data.element(MI_DOUBLE, &payload);
    let mut w = MatWriter::new(order);
    w.matrix_prefix(CLASS_DOUBLE, 0, dims, name)
        .raw(&compressed_aligned(order, &data.into_bytes()));
    wrap_matrix(order, &w.into_bytes())
}

pub fn header(order: Order, text: &str) -> Vec<u8> {
    let mut out = vec![b' '; 116];
    out[..text.len()].copy_from_slice(text.as_bytes());
    out.extend_from_slice(&[0u8; 8]);
    let w = MatWriter::new(order);
    out.extend_from_slice(&w.u16(0x0100));
    out.extend_from_slice(match order {
        Order::Little => b"IM",
        Order::Big    => b"MI",
    });
    out
}

pub fn file(order: Order, elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = header(order, "MATLAB 5.0 MAT-file, Platform: test, Created on: today");
    for e in elements {
        out.extend_from_slice(e);
    }
    out
}
