// program_header.rs
//
// Segment descriptors. The two classes differ in field order as well as
// width: the 64-bit layout moves p_flags up next to p_type so the 8-byte
// fields stay naturally aligned.

use crate::codec::{Endian, Reader, Writer};
use crate::error::Result;
use crate::ident::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader32 {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader64 {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

/// Class-independent view of a segment descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramHeaderFields {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl ProgramHeaderFields {
    /// The half-open range of file offsets this segment covers.
    pub fn file_range(&self) -> std::ops::Range<u64> {
        self.p_offset..self.p_offset.saturating_add(self.p_filesz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramHeader {
    Elf32(ProgramHeader32),
    Elf64(ProgramHeader64),
}

impl ProgramHeader {
    pub fn size(class: Class) -> usize {
        if class.is_64() { 56 } else { 32 }
    }

    pub fn class(&self) -> Class {
        match self {
            ProgramHeader::Elf32(_) => Class::Elf32,
            ProgramHeader::Elf64(_) => Class::Elf64,
        }
    }

    pub fn from_fields(class: Class, f: &ProgramHeaderFields) -> Self {
        if class.is_64() {
            ProgramHeader::Elf64(ProgramHeader64 {
                p_type: f.p_type,
                p_flags: f.p_flags,
                p_offset: f.p_offset,
                p_vaddr: f.p_vaddr,
                p_paddr: f.p_paddr,
                p_filesz: f.p_filesz,
                p_memsz: f.p_memsz,
                p_align: f.p_align,
            })
        } else {
            ProgramHeader::Elf32(ProgramHeader32 {
                p_type: f.p_type,
                p_offset: f.p_offset as u32,
                p_vaddr: f.p_vaddr as u32,
                p_paddr: f.p_paddr as u32,
                p_filesz: f.p_filesz as u32,
                p_memsz: f.p_memsz as u32,
                p_flags: f.p_flags,
                p_align: f.p_align as u32,
            })
        }
    }

    pub fn fields(&self) -> ProgramHeaderFields {
        match *self {
            ProgramHeader::Elf32(h) => ProgramHeaderFields {
                p_type: h.p_type,
                p_flags: h.p_flags,
                p_offset: h.p_offset as u64,
                p_vaddr: h.p_vaddr as u64,
                p_paddr: h.p_paddr as u64,
                p_filesz: h.p_filesz as u64,
                p_memsz: h.p_memsz as u64,
                p_align: h.p_align as u64,
            },
            ProgramHeader::Elf64(h) => ProgramHeaderFields {
                p_type: h.p_type,
                p_flags: h.p_flags,
                p_offset: h.p_offset,
                p_vaddr: h.p_vaddr,
                p_paddr: h.p_paddr,
                p_filesz: h.p_filesz,
                p_memsz: h.p_memsz,
                p_align: h.p_align,
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
            ProgramHeader::Elf32(h) => {
                w.u32(h.p_type);
                w.u32(h.p_offset);
                w.u32(h.p_vaddr);
                w.u32(h.p_paddr);
                w.u32(h.p_filesz);
                w.u32(h.p_memsz);
                w.u32(h.p_flags);
                w.u32(h.p_align);
            }
            ProgramHeader::Elf64(h) => {
                w.u32(h.p_type);
                w.u32(h.p_flags);
                w.u64(h.p_offset);
                w.u64(h.p_vaddr);
                w.u64(h.p_paddr);
                w.u64(h.p_filesz);
                w.u64(h.p_memsz);
                w.u64(h.p_align);
            }
        }
    }

    pub fn decode(data: &[u8], offset: usize, class: Class, endian: Endian) -> Result<Self> {
        let mut r = Reader::new(data, offset, endian);
        if class.is_64() {
            Ok(ProgramHeader::Elf64(ProgramHeader64 {
                p_type: r.u32()?,
                p_flags: r.u32()?,
                p_offset: r.u64()?,
                p_vaddr: r.u64()?,
                p_paddr: r.u64()?,
                p_filesz: r.u64()?,
                p_memsz: r.u64()?,
                p_align: r.u64()?,
            }))
        } else {
            Ok(ProgramHeader::Elf32(ProgramHeader32 {
                p_type: r.u32()?,
                p_offset: r.u32()?,
                p_vaddr: r.u32()?,
                p_paddr: r.u32()?,
                p_filesz: r.u32()?,
                p_memsz: r.u32()?,
                p_flags: r.u32()?,
                p_align: r.u32()?,
            }))
        }
    }
}
