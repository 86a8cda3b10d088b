// dynamic.rs
//
// Dynamic section entries: a signed tag and a word-sized value whose meaning
// (address or plain integer) depends on the tag.

use crate::codec::{Endian, Reader, Writer};
use crate::consts::{DT_NULL, dynamic_tag_is_address};
use crate::error::Result;
use crate::ident::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dyn32 {
    pub d_tag: i32,
    pub d_val: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dyn64 {
    pub d_tag: i64,
    pub d_val: u64,
}

/// How a dynamic entry's value is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicValue {
    Address(u64),
    Integer(u64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynamicFields {
    pub d_tag: i64,
    pub d_val: u64,
}

impl DynamicFields {
    pub fn is_null(&self) -> bool {
        self.d_tag == DT_NULL
    }

    pub fn value(&self) -> DynamicValue {
        if dynamic_tag_is_address(self.d_tag) {
            DynamicValue::Address(self.d_val)
        } else {
            DynamicValue::Integer(self.d_val)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dynamic {
    Elf32(Dyn32),
    Elf64(Dyn64),
}

impl Dynamic {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 16 } else { 8 }
    }

    pub fn class(&self) -> Class {
        match self {
            Dynamic::Elf32(_) => Class::Elf32,
            Dynamic::Elf64(_) => Class::Elf64,
        }
    }

    pub fn from_fields(class: Class, f: &DynamicFields) -> Self {
        if class.is_64() {
            Dynamic::Elf64(Dyn64 { d_tag: f.d_tag, d_val: f.d_val })
        } else {
            Dynamic::Elf32(Dyn32 { d_tag: f.d_tag as i32, d_val: f.d_val as u32 })
        }
    }

    pub fn fields(&self) -> DynamicFields {
        match *self {
            Dynamic::Elf32(d) => DynamicFields { d_tag: d.d_tag as i64, d_val: d.d_val as u64 },
            Dynamic::Elf64(d) => DynamicFields { d_tag: d.d_tag, d_val: d.d_val },
        }
    }

    pub fn encode(&self, endian: Endian) -> Vec<u8> {
        let mut w = Writer::with_capacity(endian, Self::size(self.class()));
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn write(&self, w: &mut Writer) {
        match self {
            Dynamic::Elf32(d) => {
                w.i32(d.d_tag);
                w.u32(d.d_val);
            }
            Dynamic::Elf64(d) => {
                w.i64(d.d_tag);
                w.u64(d.d_val);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(Dynamic::Elf64(Dyn64 { d_tag: r.i64()?, d_val: r.u64()? }))
        } else {
            Ok(Dynamic::Elf32(Dyn32 { d_tag: r.i32()?, d_val: r.u32()? }))
        }
    }
}
