// relocation.rs
//
// Relocation entries, with (RELA) and without (REL) an explicit addend.
// r_info packs the symbol index and the machine-specific type code; the
// split point depends on the class.

use crate::codec::{Endian, Reader, Writer};
use crate::error::Result;
use crate::ident::Class;

pub fn r_info32(sym: u32, r_type: u32) -> u32 {
    (sym << 8) | (r_type & 0xff)
}

pub fn r_info64(sym: u32, r_type: u32) -> u64 {
    ((sym as u64) << 32) | r_type as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rel32 {
    pub r_offset: u32,
    pub r_info: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rel64 {
    pub r_offset: u64,
    pub r_info: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rela32 {
    pub r_offset: u32,
    pub r_info: u32,
    pub r_addend: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rela64 {
    pub r_offset: u64,
    pub r_info: u64,
    pub r_addend: i64,
}

/// Class-independent view of a relocation. Symbol index 0 means the
/// relocation refers to no symbol. REL entries always report an addend of 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationFields {
    pub r_offset: u64,
    pub r_sym: u32,
    pub r_type: u32,
    pub r_addend: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    Elf32(Rel32),
    Elf64(Rel64),
}

impl Rel {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 16 } else { 8 }
    }

    pub fn class(&self) -> Class {
        match self {
            Rel::Elf32(_) => Class::Elf32,
            Rel::Elf64(_) => Class::Elf64,
        }
    }

    pub fn from_fields(class: Class, f: &RelocationFields) -> Self {
        if class.is_64() {
            Rel::Elf64(Rel64 { r_offset: f.r_offset, r_info: r_info64(f.r_sym, f.r_type) })
        } else {
            Rel::Elf32(Rel32 { r_offset: f.r_offset as u32, r_info: r_info32(f.r_sym, f.r_type) })
        }
    }

    pub fn fields(&self) -> RelocationFields {
        match *self {
            Rel::Elf32(r) => RelocationFields {
                r_offset: r.r_offset as u64,
                r_sym: r.r_info >> 8,
                r_type: r.r_info & 0xff,
                r_addend: 0,
            },
            Rel::Elf64(r) => RelocationFields {
                r_offset: r.r_offset,
                r_sym: (r.r_info >> 32) as u32,
                r_type: r.r_info as u32,
                r_addend: 0,
            },
        }
    }

    pub fn encode(&self, endian: Endian) -> Vec<u8> {
        let mut w = Writer::with_capacity(endian, Self::size(self.class()));
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn write(&self, w: &mut Writer) {
        match self {
            Rel::Elf32(r) => {
                w.u32(r.r_offset);
                w.u32(r.r_info);
            }
            Rel::Elf64(r) => {
                w.u64(r.r_offset);
                w.u64(r.r_info);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(Rel::Elf64(Rel64 { r_offset: r.u64()?, r_info: r.u64()? }))
        } else {
            Ok(Rel::Elf32(Rel32 { r_offset: r.u32()?, r_info: r.u32()? }))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rela {
    Elf32(Rela32),
    Elf64(Rela64),
}

impl Rela {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 24 } else { 12 }
    }

    pub fn class(&self) -> Class {
        match self {
            Rela::Elf32(_) => Class::Elf32,
            Rela::Elf64(_) => Class::Elf64,
        }
    }

    pub fn from_fields(class: Class, f: &RelocationFields) -> Self {
        if class.is_64() {
            Rela::Elf64(Rela64 {
                r_offset: f.r_offset,
                r_info: r_info64(f.r_sym, f.r_type),
                r_addend: f.r_addend,
            })
        } else {
            Rela::Elf32(Rela32 {
                r_offset: f.r_offset as u32,
                r_info: r_info32(f.r_sym, f.r_type),
                r_addend: f.r_addend as i32,
            })
        }
    }

    pub fn fields(&self) -> RelocationFields {
        match *self {
            Rela::Elf32(r) => RelocationFields {
                r_offset: r.r_offset as u64,
                r_sym: r.r_info >> 8,
                r_type: r.r_info & 0xff,
                r_addend: r.r_addend as i64,
            },
            Rela::Elf64(r) => RelocationFields {
                r_offset: r.r_offset,
                r_sym: (r.r_info >> 32) as u32,
                r_type: r.r_info as u32,
                r_addend: r.r_addend,
            },
        }
    }

    pub fn encode(&self, endian: Endian) -> Vec<u8> {
        let mut w = Writer::with_capacity(endian, Self::size(self.class()));
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn write(&self, w: &mut Writer) {
        match self {
            Rela::Elf32(r) => {
                w.u32(r.r_offset);
                w.u32(r.r_info);
                w.i32(r.r_addend);
            }
            Rela::Elf64(r) => {
                w.u64(r.r_offset);
                w.u64(r.r_info);
                w.i64(r.r_addend);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(Rela::Elf64(Rela64 { r_offset: r.u64()?, r_info: r.u64()?, r_addend: r.i64()? }))
        } else {
            Ok(Rela::Elf32(Rela32 { r_offset: r.u32()?, r_info: r.u32()?, r_addend: r.i32()? }))
        }
    }
}
