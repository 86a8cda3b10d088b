// header.rs
//
// The file header that follows the identification record. Entry point and
// table offsets are one word wide (4 or 8 bytes by class); every other field
// has the same width in both classes.

use crate::codec::{Endian, Reader, Writer};
use crate::consts::{ET_REL, EV_CURRENT, SHN_UNDEF};
use crate::error::Result;
use crate::ident::{Class, Ident};
use crate::program_header::ProgramHeader;
use crate::section_header::SectionHeader;

/// 32-bit file header as laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader32 {
    pub ident: Ident,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

/// 64-bit file header as laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader64 {
    pub ident: Ident,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

/// Class-independent view of the file header, with word fields widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeaderFields {
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl FileHeaderFields {
    /// Fields for an empty object of `class`: no tables, sizes filled in.
    pub fn empty(class: Class) -> Self {
        Self {
            e_type: ET_REL,
            e_machine: 0,
            e_version: EV_CURRENT as u32,
            e_entry: 0,
            e_phoff: 0,
            e_shoff: 0,
            e_flags: 0,
            e_ehsize: FileHeader::size(class) as u16,
            e_phentsize: ProgramHeader::size(class) as u16,
            e_phnum: 0,
            e_shentsize: SectionHeader::size(class) as u16,
            e_shnum: 0,
            e_shstrndx: SHN_UNDEF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileHeader {
    Elf32(FileHeader32),
    Elf64(FileHeader64),
}

impl FileHeader {
    /// Serialized size, identification record included.
    pub fn size(class: Class) -> usize {
        if class.is_64() { 64 } else { 52 }
    }

    /// Build the on-disk form for `ident.class`. Word fields are truncated
    /// to 32 bits for the 32-bit class.
    pub fn from_fields(ident: Ident, f: &FileHeaderFields) -> Self {
        if ident.class.is_64() {
            FileHeader::Elf64(FileHeader64 {
                ident,
                e_type: f.e_type,
                e_machine: f.e_machine,
                e_version: f.e_version,
                e_entry: f.e_entry,
                e_phoff: f.e_phoff,
                e_shoff: f.e_shoff,
                e_flags: f.e_flags,
                e_ehsize: f.e_ehsize,
                e_phentsize: f.e_phentsize,
                e_phnum: f.e_phnum,
                e_shentsize: f.e_shentsize,
                e_shnum: f.e_shnum,
                e_shstrndx: f.e_shstrndx,
            })
        } else {
            FileHeader::Elf32(FileHeader32 {
                ident,
                e_type: f.e_type,
                e_machine: f.e_machine,
                e_version: f.e_version,
                e_entry: f.e_entry as u32,
                e_phoff: f.e_phoff as u32,
                e_shoff: f.e_shoff as u32,
                e_flags: f.e_flags,
                e_ehsize: f.e_ehsize,
                e_phentsize: f.e_phentsize,
                e_phnum: f.e_phnum,
                e_shentsize: f.e_shentsize,
                e_shnum: f.e_shnum,
                e_shstrndx: f.e_shstrndx,
            })
        }
    }

    pub fn fields(&self) -> FileHeaderFields {
        match self {
            FileHeader::Elf32(h) => FileHeaderFields {
                e_type: h.e_type,
                e_machine: h.e_machine,
                e_version: h.e_version,
                e_entry: h.e_entry as u64,
                e_phoff: h.e_phoff as u64,
                e_shoff: h.e_shoff as u64,
                e_flags: h.e_flags,
                e_ehsize: h.e_ehsize,
                e_phentsize: h.e_phentsize,
                e_phnum: h.e_phnum,
                e_shentsize: h.e_shentsize,
                e_shnum: h.e_shnum,
                e_shstrndx: h.e_shstrndx,
            },
            FileHeader::Elf64(h) => FileHeaderFields {
                e_type: h.e_type,
                e_machine: h.e_machine,
                e_version: h.e_version,
                e_entry: h.e_entry,
                e_phoff: h.e_phoff,
                e_shoff: h.e_shoff,
                e_flags: h.e_flags,
                e_ehsize: h.e_ehsize,
                e_phentsize: h.e_phentsize,
                e_phnum: h.e_phnum,
                e_shentsize: h.e_shentsize,
                e_shnum: h.e_shnum,
                e_shstrndx: h.e_shstrndx,
            },
        }
    }

    pub fn ident(&self) -> Ident {
        match self {
            FileHeader::Elf32(h) => h.ident,
            FileHeader::Elf64(h) => h.ident,
        }
    }

    pub fn class(&self) -> Class {
        self.ident().class
    }

    pub fn endian(&self) -> Endian {
        self.ident().endian
    }

    pub fn entry(&self) -> u64 {
        self.fields().e_entry
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(self.endian(), Self::size(self.class()));
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn write(&self, w: &mut Writer) {
        match self {
            FileHeader::Elf32(h) => {
                h.ident.write(w);
                w.u16(h.e_type);
                w.u16(h.e_machine);
                w.u32(h.e_version);
                w.u32(h.e_entry);
                w.u32(h.e_phoff);
                w.u32(h.e_shoff);
                w.u32(h.e_flags);
                w.u16(h.e_ehsize);
                w.u16(h.e_phentsize);
                w.u16(h.e_phnum);
                w.u16(h.e_shentsize);
                w.u16(h.e_shnum);
                w.u16(h.e_shstrndx);
            }
            FileHeader::Elf64(h) => {
                h.ident.write(w);
                w.u16(h.e_type);
                w.u16(h.e_machine);
                w.u32(h.e_version);
                w.u64(h.e_entry);
                w.u64(h.e_phoff);
                w.u64(h.e_shoff);
                w.u32(h.e_flags);
                w.u16(h.e_ehsize);
                w.u16(h.e_phentsize);
                w.u16(h.e_phnum);
                w.u16(h.e_shentsize);
                w.u16(h.e_shnum);
                w.u16(h.e_shstrndx);
            }
        }
    }

    /// Decode the identification record and the file header that follows
    /// it; class and byte order come from the record itself.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let ident = Ident::decode(data)?;
        let mut r = Reader::new(data, Ident::SIZE, ident.endian);

        if ident.class.is_64() {
            Ok(FileHeader::Elf64(FileHeader64 {
                ident,
                e_type: r.u16()?,
                e_machine: r.u16()?,
                e_version: r.u32()?,
                e_entry: r.u64()?,
                e_phoff: r.u64()?,
                e_shoff: r.u64()?,
                e_flags: r.u32()?,
                e_ehsize: r.u16()?,
                e_phentsize: r.u16()?,
                e_phnum: r.u16()?,
                e_shentsize: r.u16()?,
                e_shnum: r.u16()?,
                e_shstrndx: r.u16()?,
            }))
        } else {
            Ok(FileHeader::Elf32(FileHeader32 {
                ident,
                e_type: r.u16()?,
                e_machine: r.u16()?,
                e_version: r.u32()?,
                e_entry: r.u32()?,
                e_phoff: r.u32()?,
                e_shoff: r.u32()?,
                e_flags: r.u32()?,
                e_ehsize: r.u16()?,
                e_phentsize: r.u16()?,
                e_phnum: r.u16()?,
                e_shentsize: r.u16()?,
                e_shnum: r.u16()?,
                e_shstrndx: r.u16()?,
            }))
        }
    }
}
