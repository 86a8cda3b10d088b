// section_header.rs
//
// Section headers. Flags, address, offset, size, alignment and entry size
// are words; name, type, link and info are 4 bytes in both classes.

use crate::codec::{Endian, Reader, Writer};
use crate::consts::SHT_NOBITS;
use crate::error::Result;
use crate::ident::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader32 {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u32,
    pub sh_addr: u32,
    pub sh_offset: u32,
    pub sh_size: u32,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u32,
    pub sh_entsize: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader64 {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

/// Class-independent view of a section header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionHeaderFields {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl SectionHeaderFields {
    /// Bytes the section occupies in the file: zero for NOBITS sections,
    /// whose offset only records where they would have been placed.
    pub fn file_size(&self) -> u64 {
        if self.sh_type == SHT_NOBITS { 0 } else { self.sh_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionHeader {
    Elf32(SectionHeader32),
    Elf64(SectionHeader64),
}

impl SectionHeader {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 64 } else { 40 }
    }

    pub fn class(&self) -> Class {
        match self {
            SectionHeader::Elf32(_) => Class::Elf32,
            SectionHeader::Elf64(_) => Class::Elf64,
        }
    }

    /// The all-zero header that occupies index 0 of every section table.
    pub fn null(class: Class) -> Self {
        Self::from_fields(class, &SectionHeaderFields::default())
    }

    pub fn from_fields(class: Class, f: &SectionHeaderFields) -> Self {
        if class.is_64() {
            SectionHeader::Elf64(SectionHeader64 {
                sh_name: f.sh_name,
                sh_type: f.sh_type,
                sh_flags: f.sh_flags,
                sh_addr: f.sh_addr,
                sh_offset: f.sh_offset,
                sh_size: f.sh_size,
                sh_link: f.sh_link,
                sh_info: f.sh_info,
                sh_addralign: f.sh_addralign,
                sh_entsize: f.sh_entsize,
            })
        } else {
            SectionHeader::Elf32(SectionHeader32 {
                sh_name: f.sh_name,
                sh_type: f.sh_type,
                sh_flags: f.sh_flags as u32,
                sh_addr: f.sh_addr as u32,
                sh_offset: f.sh_offset as u32,
                sh_size: f.sh_size as u32,
                sh_link: f.sh_link,
                sh_info: f.sh_info,
                sh_addralign: f.sh_addralign as u32,
                sh_entsize: f.sh_entsize as u32,
            })
        }
    }

    pub fn fields(&self) -> SectionHeaderFields {
        match *self {
            SectionHeader::Elf32(h) => SectionHeaderFields {
                sh_name: h.sh_name,
                sh_type: h.sh_type,
                sh_flags: h.sh_flags as u64,
                sh_addr: h.sh_addr as u64,
                sh_offset: h.sh_offset as u64,
                sh_size: h.sh_size as u64,
                sh_link: h.sh_link,
                sh_info: h.sh_info,
                sh_addralign: h.sh_addralign as u64,
                sh_entsize: h.sh_entsize as u64,
            },
            SectionHeader::Elf64(h) => SectionHeaderFields {
                sh_name: h.sh_name,
                sh_type: h.sh_type,
                sh_flags: h.sh_flags,
                sh_addr: h.sh_addr,
                sh_offset: h.sh_offset,
                sh_size: h.sh_size,
                sh_link: h.sh_link,
                sh_info: h.sh_info,
                sh_addralign: h.sh_addralign,
                sh_entsize: h.sh_entsize,
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
            SectionHeader::Elf32(h) => {
                w.u32(h.sh_name);
                w.u32(h.sh_type);
                w.u32(h.sh_flags);
                w.u32(h.sh_addr);
                w.u32(h.sh_offset);
                w.u32(h.sh_size);
                w.u32(h.sh_link);
                w.u32(h.sh_info);
                w.u32(h.sh_addralign);
                w.u32(h.sh_entsize);
            }
            SectionHeader::Elf64(h) => {
                w.u32(h.sh_name);
                w.u32(h.sh_type);
                w.u64(h.sh_flags);
                w.u64(h.sh_addr);
                w.u64(h.sh_offset);
                w.u64(h.sh_size);
                w.u32(h.sh_link);
                w.u32(h.sh_info);
                w.u64(h.sh_addralign);
                w.u64(h.sh_entsize);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(SectionHeader::Elf64(SectionHeader64 {
                sh_name: r.u32()?,
                sh_type: r.u32()?,
                sh_flags: r.u64()?,
                sh_addr: r.u64()?,
                sh_offset: r.u64()?,
                sh_size: r.u64()?,
                sh_link: r.u32()?,
                sh_info: r.u32()?,
                sh_addralign: r.u64()?,
                sh_entsize: r.u64()?,
            }))
        } else {
            Ok(SectionHeader::Elf32(SectionHeader32 {
                sh_name: r.u32()?,
                sh_type: r.u32()?,
                sh_flags: r.u32()?,
                sh_addr: r.u32()?,
                sh_offset: r.u32()?,
                sh_size: r.u32()?,
                sh_link: r.u32()?,
                sh_info: r.u32()?,
                sh_addralign: r.u32()?,
                sh_entsize: r.u32()?,
            }))
        }
    }
}
