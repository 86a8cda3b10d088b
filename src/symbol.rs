// symbol.rs
//
// Symbol table entries. The 64-bit layout groups the byte-sized fields
// before the two 8-byte words; the 32-bit layout puts value and size first.

use crate::codec::{Endian, Reader, Writer};
use crate::consts::{SHN_ABS, SHN_UNDEF, STB_LOCAL, STT_FILE, STT_SECTION, STV_DEFAULT};
use crate::error::Result;
use crate::ident::Class;

/// Pack binding and type into an st_info byte.
pub fn make_st_info(bind: u8, typ: u8) -> u8 {
    (bind << 4) | (typ & 0xf)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol32 {
    pub st_name: u32,
    pub st_value: u32,
    pub st_size: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol64 {
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

/// Class-independent view of a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFields {
    pub st_name: u32,
    pub st_value: u64,
    pub st_size: u64,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
}

impl SymbolFields {
    /// The undefined symbol at index 0.
    pub fn null() -> Self {
        Self::default()
    }

    /// Local section symbol for `section_index`.
    pub fn section(section_index: u16) -> Self {
        Self {
            st_info: make_st_info(STB_LOCAL, STT_SECTION),
            st_shndx: section_index,
            ..Self::default()
        }
    }

    /// Local FILE symbol naming the source file.
    pub fn file(name_index: u32) -> Self {
        Self {
            st_name: name_index,
            st_info: make_st_info(STB_LOCAL, STT_FILE),
            st_shndx: SHN_ABS,
            ..Self::default()
        }
    }

    pub fn bind(&self) -> u8 {
        self.st_info >> 4
    }

    pub fn sym_type(&self) -> u8 {
        self.st_info & 0xf
    }

    pub fn visibility(&self) -> u8 {
        self.st_other & 0x3
    }

    pub fn is_local(&self) -> bool {
        self.bind() == STB_LOCAL
    }

    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }

    pub fn is_default_visibility(&self) -> bool {
        self.visibility() == STV_DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Elf32(Symbol32),
    Elf64(Symbol64),
}

impl Symbol {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 24 } else { 16 }
    }

    pub fn class(&self) -> Class {
        match self {
            Symbol::Elf32(_) => Class::Elf32,
            Symbol::Elf64(_) => Class::Elf64,
        }
    }

    pub fn from_fields(class: Class, f: &SymbolFields) -> Self {
        if class.is_64() {
            Symbol::Elf64(Symbol64 {
                st_name: f.st_name,
                st_info: f.st_info,
                st_other: f.st_other,
                st_shndx: f.st_shndx,
                st_value: f.st_value,
                st_size: f.st_size,
            })
        } else {
            Symbol::Elf32(Symbol32 {
                st_name: f.st_name,
                st_value: f.st_value as u32,
                st_size: f.st_size as u32,
                st_info: f.st_info,
                st_other: f.st_other,
                st_shndx: f.st_shndx,
            })
        }
    }

    pub fn fields(&self) -> SymbolFields {
        match *self {
            Symbol::Elf32(s) => SymbolFields {
                st_name: s.st_name,
                st_value: s.st_value as u64,
                st_size: s.st_size as u64,
                st_info: s.st_info,
                st_other: s.st_other,
                st_shndx: s.st_shndx,
            },
            Symbol::Elf64(s) => SymbolFields {
                st_name: s.st_name,
                st_value: s.st_value,
                st_size: s.st_size,
                st_info: s.st_info,
                st_other: s.st_other,
                st_shndx: s.st_shndx,
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
            Symbol::Elf32(s) => {
                w.u32(s.st_name);
                w.u32(s.st_value);
                w.u32(s.st_size);
                w.u8(s.st_info);
                w.u8(s.st_other);
                w.u16(s.st_shndx);
            }
            Symbol::Elf64(s) => {
                w.u32(s.st_name);
                w.u8(s.st_info);
                w.u8(s.st_other);
                w.u16(s.st_shndx);
                w.u64(s.st_value);
                w.u64(s.st_size);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(Symbol::Elf64(Symbol64 {
                st_name: r.u32()?,
                st_info: r.u8()?,
                st_other: r.u8()?,
                st_shndx: r.u16()?,
                st_value: r.u64()?,
                st_size: r.u64()?,
            }))
        } else {
            Ok(Symbol::Elf32(Symbol32 {
                st_name: r.u32()?,
                st_value: r.u32()?,
                st_size: r.u32()?,
                st_info: r.u8()?,
                st_other: r.u8()?,
                st_shndx: r.u16()?,
            }))
        }
    }
}
