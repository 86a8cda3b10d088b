// ident.rs
//
// The 16-byte identification record at the start of every object file. It
// must be decoded before anything else because it fixes the word width
// (class) and byte order every later field depends on.

use crate::codec::{Endian, Writer, slice};
use crate::consts::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_NIDENT, EI_OSABI, EI_VERSION, ELF_MAGIC, ELFCLASS32,
    ELFCLASS64, ELFCLASSNONE, ELFDATA2LSB, ELFDATA2MSB, ELFOSABI_SYSV, EV_CURRENT,
};
use crate::error::{ElfError, Result};

/// File class: the width of addresses and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    None,
    Elf32,
    Elf64,
}

impl TryFrom<u8> for Class {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            ELFCLASSNONE => Ok(Class::None),
            ELFCLASS32 => Ok(Class::Elf32),
            ELFCLASS64 => Ok(Class::Elf64),
            _ => Err(value),
        }
    }
}

impl Class {
    pub fn code(self) -> u8 {
        match self {
            Class::None => ELFCLASSNONE,
            Class::Elf32 => ELFCLASS32,
            Class::Elf64 => ELFCLASS64,
        }
    }

    pub fn is_64(self) -> bool {
        self == Class::Elf64
    }

    /// Size in bytes of an address or offset field.
    pub fn word_size(self) -> u64 {
        if self.is_64() { 8 } else { 4 }
    }

    pub fn name(self) -> &'static str {
        match self {
            Class::None => "none",
            Class::Elf32 => "ELF32",
            Class::Elf64 => "ELF64",
        }
    }
}

pub fn endian_code(endian: Endian) -> u8 {
    match endian {
        Endian::Little => ELFDATA2LSB,
        Endian::Big => ELFDATA2MSB,
    }
}

pub fn endian_name(endian: Endian) -> &'static str {
    match endian {
        Endian::Little => "2's complement, little endian",
        Endian::Big => "2's complement, big endian",
    }
}

/// Decoded identification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    pub class: Class,
    pub endian: Endian,
    pub version: u8,
    pub os_abi: u8,
    pub abi_version: u8,
}

impl Ident {
    pub const SIZE: usize = EI_NIDENT;

    pub fn new(class: Class, endian: Endian) -> Self {
        Self { class, endian, version: EV_CURRENT, os_abi: ELFOSABI_SYSV, abi_version: 0 }
    }

    /// Serialize to exactly 16 bytes; the padding bytes are zero.
    pub fn encode(&self) -> [u8; EI_NIDENT] {
        let mut bytes = [0u8; EI_NIDENT];
        bytes[0..4].copy_from_slice(&ELF_MAGIC);
        bytes[EI_CLASS] = self.class.code();
        bytes[EI_DATA] = endian_code(self.endian);
        bytes[EI_VERSION] = self.version;
        bytes[EI_OSABI] = self.os_abi;
        bytes[EI_ABIVERSION] = self.abi_version;
        bytes
    }

    pub fn write(&self, w: &mut Writer) {
        w.bytes(&self.encode());
    }

    /// Decode and validate the record at the start of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let bytes = slice(data, 0, EI_NIDENT).map_err(|_| {
            ElfError::format(format!(
                "file is {} bytes, too short for the {}-byte identification record",
                data.len(),
                EI_NIDENT
            ))
        })?;

        if bytes[0..4] != ELF_MAGIC {
            return Err(ElfError::format(format!(
                "bad magic {:02x} {:02x} {:02x} {:02x}",
                bytes[0], bytes[1], bytes[2], bytes[3]
            )));
        }

        let class = match bytes[EI_CLASS] {
            ELFCLASS32 => Class::Elf32,
            ELFCLASS64 => Class::Elf64,
            other => return Err(ElfError::format(format!("unrecognized class {other}"))),
        };

        let endian = match bytes[EI_DATA] {
            ELFDATA2LSB => Endian::Little,
            ELFDATA2MSB => Endian::Big,
            other => {
                return Err(ElfError::format(format!("unrecognized data encoding {other}")));
            }
        };

        let version = bytes[EI_VERSION];
        if version != EV_CURRENT {
            return Err(ElfError::format(format!("unrecognized format version {version}")));
        }

        Ok(Self {
            class,
            endian,
            version,
            os_abi: bytes[EI_OSABI],
            abi_version: bytes[EI_ABIVERSION],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let ident = Ident::new(Class::Elf64, Endian::Big);
        let bytes = ident.encode();
        assert_eq!(&bytes[0..4], b"\x7fELF");
        assert_eq!(bytes[EI_CLASS], 2);
        assert_eq!(bytes[EI_DATA], 2);
        assert_eq!(bytes[EI_VERSION], 1);
        assert!(bytes[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_every_valid_combination_decodes() {
        for class in [Class::Elf32, Class::Elf64] {
            for endian in [Endian::Little, Endian::Big] {
                let mut ident = Ident::new(class, endian);
                ident.os_abi = 3;
                ident.abi_version = 7;
                assert_eq!(Ident::decode(&ident.encode()).unwrap(), ident);
            }
        }
    }

    #[test]
    fn test_any_magic_byte_change_is_rejected() {
        let good = Ident::new(Class::Elf32, Endian::Little).encode();
        for i in 0..4 {
            let mut bad = good;
            bad[i] ^= 0x20;
            let err = Ident::decode(&bad).unwrap_err();
            assert!(matches!(err, ElfError::Format(_)), "byte {} gave {:?}", i, err);
        }
    }

    #[test]
    fn test_bad_class_encoding_version() {
        let good = Ident::new(Class::Elf64, Endian::Little).encode();

        let mut bad = good;
        bad[EI_CLASS] = 0;
        assert!(Ident::decode(&bad).unwrap_err().is_format());

        let mut bad = good;
        bad[EI_CLASS] = 3;
        assert!(Ident::decode(&bad).unwrap_err().is_format());

        let mut bad = good;
        bad[EI_DATA] = 9;
        assert!(Ident::decode(&bad).unwrap_err().is_format());

        let mut bad = good;
        bad[EI_VERSION] = 0;
        assert!(Ident::decode(&bad).unwrap_err().is_format());
    }

    #[test]
    fn test_short_input() {
        let err = Ident::decode(&[0x7f, b'E', b'L']).unwrap_err();
        assert!(matches!(err, ElfError::Format(_)));
    }

    #[test]
    fn test_class_codes() {
        assert_eq!(Class::try_from(1), Ok(Class::Elf32));
        assert_eq!(Class::try_from(2), Ok(Class::Elf64));
        assert_eq!(Class::try_from(0), Ok(Class::None));
        assert_eq!(Class::try_from(5), Err(5));
        assert_eq!(Class::Elf64.word_size(), 8);
        assert_eq!(Class::Elf32.word_size(), 4);
    }
}
