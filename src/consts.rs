// consts.rs
//
// Raw codes used by the object file format, with lookup functions that turn
// a code into a display name. Codes the tables do not know are rendered as
// "UNKNOWN (<value>)" and are never treated as errors.
//
// Reference: System V ABI, "Object Files" chapter
// https://refspecs.linuxfoundation.org/elf/gabi4+/contents.html

use std::borrow::Cow;

fn named(name: Option<&'static str>, value: u64) -> Cow<'static, str> {
    match name {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("UNKNOWN ({value:#x})")),
    }
}

// ============================================================================
// Identification
// ============================================================================

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
pub const EI_NIDENT: usize = 16;

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;
pub const EI_ABIVERSION: usize = 8;

pub const ELFCLASSNONE: u8 = 0;
pub const ELFCLASS32: u8 = 1;
pub const ELFCLASS64: u8 = 2;

pub const ELFDATANONE: u8 = 0;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;

pub const EV_NONE: u8 = 0;
pub const EV_CURRENT: u8 = 1;

pub const ELFOSABI_SYSV: u8 = 0;
pub const ELFOSABI_HPUX: u8 = 1;
pub const ELFOSABI_NETBSD: u8 = 2;
pub const ELFOSABI_GNU: u8 = 3;
pub const ELFOSABI_SOLARIS: u8 = 6;
pub const ELFOSABI_FREEBSD: u8 = 9;
pub const ELFOSABI_OPENBSD: u8 = 12;
pub const ELFOSABI_ARM: u8 = 97;
pub const ELFOSABI_STANDALONE: u8 = 255;

pub fn osabi_name(value: u8) -> Cow<'static, str> {
    let name = match value {
        ELFOSABI_SYSV => Some("UNIX - System V"),
        ELFOSABI_HPUX => Some("UNIX - HP-UX"),
        ELFOSABI_NETBSD => Some("UNIX - NetBSD"),
        ELFOSABI_GNU => Some("UNIX - GNU"),
        ELFOSABI_SOLARIS => Some("UNIX - Solaris"),
        ELFOSABI_FREEBSD => Some("UNIX - FreeBSD"),
        ELFOSABI_OPENBSD => Some("UNIX - OpenBSD"),
        ELFOSABI_ARM => Some("ARM"),
        ELFOSABI_STANDALONE => Some("Standalone App"),
        _ => None,
    };
    named(name, value as u64)
}

// ============================================================================
// File header
// ============================================================================

pub const ET_NONE: u16 = 0;
pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;
pub const ET_CORE: u16 = 4;

pub fn object_type_name(value: u16) -> Cow<'static, str> {
    let name = match value {
        ET_NONE => Some("NONE (No file type)"),
        ET_REL => Some("REL (Relocatable file)"),
        ET_EXEC => Some("EXEC (Executable file)"),
        ET_DYN => Some("DYN (Shared object file)"),
        ET_CORE => Some("CORE (Core file)"),
        _ => None,
    };
    named(name, value as u64)
}

pub const EM_NONE: u16 = 0;
pub const EM_386: u16 = 3;
pub const EM_MIPS: u16 = 8;
pub const EM_PPC: u16 = 20;
pub const EM_PPC64: u16 = 21;
pub const EM_ARM: u16 = 40;
pub const EM_X86_64: u16 = 62;
pub const EM_AARCH64: u16 = 183;
pub const EM_RISCV: u16 = 243;

pub fn machine_name(value: u16) -> Cow<'static, str> {
    let name = match value {
        EM_NONE => Some("None"),
        EM_386 => Some("Intel 80386"),
        EM_MIPS => Some("MIPS R3000"),
        EM_PPC => Some("PowerPC"),
        EM_PPC64 => Some("PowerPC64"),
        EM_ARM => Some("ARM"),
        EM_X86_64 => Some("Advanced Micro Devices X86-64"),
        EM_AARCH64 => Some("AArch64"),
        EM_RISCV => Some("RISC-V"),
        _ => None,
    };
    named(name, value as u64)
}

// ============================================================================
// Program headers
// ============================================================================

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;
pub const PT_SHLIB: u32 = 5;
pub const PT_PHDR: u32 = 6;
pub const PT_TLS: u32 = 7;
pub const PT_LOOS: u32 = 0x6000_0000;
pub const PT_GNU_EH_FRAME: u32 = 0x6474_e550;
pub const PT_GNU_STACK: u32 = 0x6474_e551;
pub const PT_GNU_RELRO: u32 = 0x6474_e552;
pub const PT_HIOS: u32 = 0x6fff_ffff;
pub const PT_LOPROC: u32 = 0x7000_0000;
pub const PT_RISCV_ATTRIBUTES: u32 = 0x7000_0003;
pub const PT_HIPROC: u32 = 0x7fff_ffff;

pub fn segment_type_name(value: u32) -> Cow<'static, str> {
    let name = match value {
        PT_NULL => Some("NULL"),
        PT_LOAD => Some("LOAD"),
        PT_DYNAMIC => Some("DYNAMIC"),
        PT_INTERP => Some("INTERP"),
        PT_NOTE => Some("NOTE"),
        PT_SHLIB => Some("SHLIB"),
        PT_PHDR => Some("PHDR"),
        PT_TLS => Some("TLS"),
        PT_GNU_EH_FRAME => Some("GNU_EH_FRAME"),
        PT_GNU_STACK => Some("GNU_STACK"),
        PT_GNU_RELRO => Some("GNU_RELRO"),
        PT_RISCV_ATTRIBUTES => Some("RISCV_ATTRIBUTES"),
        PT_LOOS..=PT_HIOS => Some("LOOS+"),
        PT_LOPROC..=PT_HIPROC => Some("LOPROC+"),
        _ => None,
    };
    named(name, value as u64)
}

pub const PF_X: u32 = 0x1;
pub const PF_W: u32 = 0x2;
pub const PF_R: u32 = 0x4;

/// Render segment flags the way readelf does, e.g. "R E".
pub fn segment_flags_string(flags: u32) -> String {
    format!(
        "{}{}{}",
        if flags & PF_R != 0 { "R" } else { " " },
        if flags & PF_W != 0 { "W" } else { " " },
        if flags & PF_X != 0 { "E" } else { " " }
    )
}

// ============================================================================
// Section headers
// ============================================================================

pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_HASH: u32 = 5;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_SHLIB: u32 = 10;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_INIT_ARRAY: u32 = 14;
pub const SHT_FINI_ARRAY: u32 = 15;
pub const SHT_PREINIT_ARRAY: u32 = 16;
pub const SHT_GROUP: u32 = 17;
pub const SHT_SYMTAB_SHNDX: u32 = 18;
pub const SHT_GNU_HASH: u32 = 0x6fff_fff6;
pub const SHT_GNU_VERDEF: u32 = 0x6fff_fffd;
pub const SHT_GNU_VERNEED: u32 = 0x6fff_fffe;
pub const SHT_GNU_VERSYM: u32 = 0x6fff_ffff;
pub const SHT_RISCV_ATTRIBUTES: u32 = 0x7000_0003;

pub fn section_type_name(value: u32) -> Cow<'static, str> {
    let name = match value {
        SHT_NULL => Some("NULL"),
        SHT_PROGBITS => Some("PROGBITS"),
        SHT_SYMTAB => Some("SYMTAB"),
        SHT_STRTAB => Some("STRTAB"),
        SHT_RELA => Some("RELA"),
        SHT_HASH => Some("HASH"),
        SHT_DYNAMIC => Some("DYNAMIC"),
        SHT_NOTE => Some("NOTE"),
        SHT_NOBITS => Some("NOBITS"),
        SHT_REL => Some("REL"),
        SHT_SHLIB => Some("SHLIB"),
        SHT_DYNSYM => Some("DYNSYM"),
        SHT_INIT_ARRAY => Some("INIT_ARRAY"),
        SHT_FINI_ARRAY => Some("FINI_ARRAY"),
        SHT_PREINIT_ARRAY => Some("PREINIT_ARRAY"),
        SHT_GROUP => Some("GROUP"),
        SHT_SYMTAB_SHNDX => Some("SYMTAB_SHNDX"),
        SHT_GNU_HASH => Some("GNU_HASH"),
        SHT_GNU_VERDEF => Some("VERDEF"),
        SHT_GNU_VERNEED => Some("VERNEED"),
        SHT_GNU_VERSYM => Some("VERSYM"),
        SHT_RISCV_ATTRIBUTES => Some("RISCV_ATTRIBUTES"),
        _ => None,
    };
    named(name, value as u64)
}

pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;
pub const SHF_MERGE: u64 = 0x10;
pub const SHF_STRINGS: u64 = 0x20;
pub const SHF_INFO_LINK: u64 = 0x40;
pub const SHF_LINK_ORDER: u64 = 0x80;
pub const SHF_GROUP: u64 = 0x200;
pub const SHF_TLS: u64 = 0x400;

/// Render section flags the way readelf does, e.g. "WAX".
pub fn section_flags_string(flags: u64) -> String {
    let table = [
        (SHF_WRITE, 'W'),
        (SHF_ALLOC, 'A'),
        (SHF_EXECINSTR, 'X'),
        (SHF_MERGE, 'M'),
        (SHF_STRINGS, 'S'),
        (SHF_INFO_LINK, 'I'),
        (SHF_LINK_ORDER, 'L'),
        (SHF_GROUP, 'G'),
        (SHF_TLS, 'T'),
    ];
    table.iter().filter(|(bit, _)| flags & bit != 0).map(|&(_, c)| c).collect()
}

pub const SHN_UNDEF: u16 = 0;
pub const SHN_LORESERVE: u16 = 0xff00;
pub const SHN_ABS: u16 = 0xfff1;
pub const SHN_COMMON: u16 = 0xfff2;
pub const SHN_XINDEX: u16 = 0xffff;

/// Render a symbol's section index, naming the reserved values.
pub fn section_index_name(value: u16) -> Cow<'static, str> {
    match value {
        SHN_UNDEF => Cow::Borrowed("UND"),
        SHN_ABS => Cow::Borrowed("ABS"),
        SHN_COMMON => Cow::Borrowed("COM"),
        SHN_XINDEX => Cow::Borrowed("XINDEX"),
        n => Cow::Owned(n.to_string()),
    }
}

// ============================================================================
// Symbols
// ============================================================================

pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;
pub const STB_GNU_UNIQUE: u8 = 10;

pub fn symbol_binding_name(value: u8) -> Cow<'static, str> {
    let name = match value {
        STB_LOCAL => Some("LOCAL"),
        STB_GLOBAL => Some("GLOBAL"),
        STB_WEAK => Some("WEAK"),
        STB_GNU_UNIQUE => Some("UNIQUE"),
        _ => None,
    };
    named(name, value as u64)
}

pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;
pub const STT_COMMON: u8 = 5;
pub const STT_TLS: u8 = 6;
pub const STT_GNU_IFUNC: u8 = 10;

pub fn symbol_type_name(value: u8) -> Cow<'static, str> {
    let name = match value {
        STT_NOTYPE => Some("NOTYPE"),
        STT_OBJECT => Some("OBJECT"),
        STT_FUNC => Some("FUNC"),
        STT_SECTION => Some("SECTION"),
        STT_FILE => Some("FILE"),
        STT_COMMON => Some("COMMON"),
        STT_TLS => Some("TLS"),
        STT_GNU_IFUNC => Some("IFUNC"),
        _ => None,
    };
    named(name, value as u64)
}

pub const STV_DEFAULT: u8 = 0;
pub const STV_INTERNAL: u8 = 1;
pub const STV_HIDDEN: u8 = 2;
pub const STV_PROTECTED: u8 = 3;

pub fn symbol_visibility_name(value: u8) -> Cow<'static, str> {
    let name = match value {
        STV_DEFAULT => Some("DEFAULT"),
        STV_INTERNAL => Some("INTERNAL"),
        STV_HIDDEN => Some("HIDDEN"),
        STV_PROTECTED => Some("PROTECTED"),
        _ => None,
    };
    named(name, value as u64)
}

// ============================================================================
// Dynamic section
// ============================================================================

pub const DT_NULL: i64 = 0;
pub const DT_NEEDED: i64 = 1;
pub const DT_PLTRELSZ: i64 = 2;
pub const DT_PLTGOT: i64 = 3;
pub const DT_HASH: i64 = 4;
pub const DT_STRTAB: i64 = 5;
pub const DT_SYMTAB: i64 = 6;
pub const DT_RELA: i64 = 7;
pub const DT_RELASZ: i64 = 8;
pub const DT_RELAENT: i64 = 9;
pub const DT_STRSZ: i64 = 10;
pub const DT_SYMENT: i64 = 11;
pub const DT_INIT: i64 = 12;
pub const DT_FINI: i64 = 13;
pub const DT_SONAME: i64 = 14;
pub const DT_RPATH: i64 = 15;
pub const DT_SYMBOLIC: i64 = 16;
pub const DT_REL: i64 = 17;
pub const DT_RELSZ: i64 = 18;
pub const DT_RELENT: i64 = 19;
pub const DT_PLTREL: i64 = 20;
pub const DT_DEBUG: i64 = 21;
pub const DT_TEXTREL: i64 = 22;
pub const DT_JMPREL: i64 = 23;
pub const DT_BIND_NOW: i64 = 24;
pub const DT_INIT_ARRAY: i64 = 25;
pub const DT_FINI_ARRAY: i64 = 26;
pub const DT_INIT_ARRAYSZ: i64 = 27;
pub const DT_FINI_ARRAYSZ: i64 = 28;
pub const DT_RUNPATH: i64 = 29;
pub const DT_FLAGS: i64 = 30;
pub const DT_GNU_HASH: i64 = 0x6fff_fef5;
pub const DT_VERSYM: i64 = 0x6fff_fff0;
pub const DT_FLAGS_1: i64 = 0x6fff_fffb;
pub const DT_VERNEED: i64 = 0x6fff_fffe;
pub const DT_VERNEEDNUM: i64 = 0x6fff_ffff;

pub fn dynamic_tag_name(value: i64) -> Cow<'static, str> {
    let name = match value {
        DT_NULL => Some("NULL"),
        DT_NEEDED => Some("NEEDED"),
        DT_PLTRELSZ => Some("PLTRELSZ"),
        DT_PLTGOT => Some("PLTGOT"),
        DT_HASH => Some("HASH"),
        DT_STRTAB => Some("STRTAB"),
        DT_SYMTAB => Some("SYMTAB"),
        DT_RELA => Some("RELA"),
        DT_RELASZ => Some("RELASZ"),
        DT_RELAENT => Some("RELAENT"),
        DT_STRSZ => Some("STRSZ"),
        DT_SYMENT => Some("SYMENT"),
        DT_INIT => Some("INIT"),
        DT_FINI => Some("FINI"),
        DT_SONAME => Some("SONAME"),
        DT_RPATH => Some("RPATH"),
        DT_SYMBOLIC => Some("SYMBOLIC"),
        DT_REL => Some("REL"),
        DT_RELSZ => Some("RELSZ"),
        DT_RELENT => Some("RELENT"),
        DT_PLTREL => Some("PLTREL"),
        DT_DEBUG => Some("DEBUG"),
        DT_TEXTREL => Some("TEXTREL"),
        DT_JMPREL => Some("JMPREL"),
        DT_BIND_NOW => Some("BIND_NOW"),
        DT_INIT_ARRAY => Some("INIT_ARRAY"),
        DT_FINI_ARRAY => Some("FINI_ARRAY"),
        DT_INIT_ARRAYSZ => Some("INIT_ARRAYSZ"),
        DT_FINI_ARRAYSZ => Some("FINI_ARRAYSZ"),
        DT_RUNPATH => Some("RUNPATH"),
        DT_FLAGS => Some("FLAGS"),
        DT_GNU_HASH => Some("GNU_HASH"),
        DT_VERSYM => Some("VERSYM"),
        DT_FLAGS_1 => Some("FLAGS_1"),
        DT_VERNEED => Some("VERNEED"),
        DT_VERNEEDNUM => Some("VERNEEDNUM"),
        _ => None,
    };
    named(name, value as u64)
}

/// True when the tag's value is a virtual address rather than a plain
/// integer (size, count, string offset or flag word).
pub fn dynamic_tag_is_address(tag: i64) -> bool {
    matches!(
        tag,
        DT_PLTGOT
            | DT_HASH
            | DT_STRTAB
            | DT_SYMTAB
            | DT_RELA
            | DT_INIT
            | DT_FINI
            | DT_REL
            | DT_DEBUG
            | DT_JMPREL
            | DT_INIT_ARRAY
            | DT_FINI_ARRAY
            | DT_GNU_HASH
            | DT_VERSYM
            | DT_VERNEED
    )
}

// ============================================================================
// Notes
// ============================================================================

pub const NT_GNU_ABI_TAG: u32 = 1;
pub const NT_GNU_HWCAP: u32 = 2;
pub const NT_GNU_BUILD_ID: u32 = 3;
pub const NT_GNU_GOLD_VERSION: u32 = 4;
pub const NT_GNU_PROPERTY_TYPE_0: u32 = 5;

pub fn note_type_name(owner: &str, value: u32) -> Cow<'static, str> {
    let name = match (owner, value) {
        ("GNU", NT_GNU_ABI_TAG) => Some("NT_GNU_ABI_TAG (ABI version tag)"),
        ("GNU", NT_GNU_HWCAP) => Some("NT_GNU_HWCAP (DSO-supplied software HWCAP info)"),
        ("GNU", NT_GNU_BUILD_ID) => Some("NT_GNU_BUILD_ID (unique build ID bitstring)"),
        ("GNU", NT_GNU_GOLD_VERSION) => Some("NT_GNU_GOLD_VERSION (gold version)"),
        ("GNU", NT_GNU_PROPERTY_TYPE_0) => Some("NT_GNU_PROPERTY_TYPE_0"),
        _ => None,
    };
    named(name, value as u64)
}

// ============================================================================
// Relocation types
// ============================================================================

pub const R_X86_64_NONE: u32 = 0;
pub const R_X86_64_64: u32 = 1;
pub const R_X86_64_PC32: u32 = 2;
pub const R_X86_64_GOT32: u32 = 3;
pub const R_X86_64_PLT32: u32 = 4;
pub const R_X86_64_COPY: u32 = 5;
pub const R_X86_64_GLOB_DAT: u32 = 6;
pub const R_X86_64_JUMP_SLOT: u32 = 7;
pub const R_X86_64_RELATIVE: u32 = 8;
pub const R_X86_64_GOTPCREL: u32 = 9;
pub const R_X86_64_32: u32 = 10;
pub const R_X86_64_32S: u32 = 11;

pub const R_RISCV_NONE: u32 = 0;
pub const R_RISCV_32: u32 = 1;
pub const R_RISCV_64: u32 = 2;
pub const R_RISCV_RELATIVE: u32 = 3;
pub const R_RISCV_JUMP_SLOT: u32 = 5;
pub const R_RISCV_BRANCH: u32 = 16;
pub const R_RISCV_JAL: u32 = 17;
pub const R_RISCV_CALL: u32 = 18;
pub const R_RISCV_CALL_PLT: u32 = 19;
pub const R_RISCV_PCREL_HI20: u32 = 23;
pub const R_RISCV_PCREL_LO12_I: u32 = 24;
pub const R_RISCV_PCREL_LO12_S: u32 = 25;
pub const R_RISCV_HI20: u32 = 26;
pub const R_RISCV_LO12_I: u32 = 27;
pub const R_RISCV_LO12_S: u32 = 28;
pub const R_RISCV_RELAX: u32 = 51;

/// Relocation type codes are machine specific; only the machines the
/// generator targets have tables.
pub fn relocation_type_name(machine: u16, value: u32) -> Cow<'static, str> {
    let name = match machine {
        EM_X86_64 => match value {
            R_X86_64_NONE => Some("R_X86_64_NONE"),
            R_X86_64_64 => Some("R_X86_64_64"),
            R_X86_64_PC32 => Some("R_X86_64_PC32"),
            R_X86_64_GOT32 => Some("R_X86_64_GOT32"),
            R_X86_64_PLT32 => Some("R_X86_64_PLT32"),
            R_X86_64_COPY => Some("R_X86_64_COPY"),
            R_X86_64_GLOB_DAT => Some("R_X86_64_GLOB_DAT"),
            R_X86_64_JUMP_SLOT => Some("R_X86_64_JUMP_SLOT"),
            R_X86_64_RELATIVE => Some("R_X86_64_RELATIVE"),
            R_X86_64_GOTPCREL => Some("R_X86_64_GOTPCREL"),
            R_X86_64_32 => Some("R_X86_64_32"),
            R_X86_64_32S => Some("R_X86_64_32S"),
            _ => None,
        },
        EM_RISCV => match value {
            R_RISCV_NONE => Some("R_RISCV_NONE"),
            R_RISCV_32 => Some("R_RISCV_32"),
            R_RISCV_64 => Some("R_RISCV_64"),
            R_RISCV_RELATIVE => Some("R_RISCV_RELATIVE"),
            R_RISCV_JUMP_SLOT => Some("R_RISCV_JUMP_SLOT"),
            R_RISCV_BRANCH => Some("R_RISCV_BRANCH"),
            R_RISCV_JAL => Some("R_RISCV_JAL"),
            R_RISCV_CALL => Some("R_RISCV_CALL"),
            R_RISCV_CALL_PLT => Some("R_RISCV_CALL_PLT"),
            R_RISCV_PCREL_HI20 => Some("R_RISCV_PCREL_HI20"),
            R_RISCV_PCREL_LO12_I => Some("R_RISCV_PCREL_LO12_I"),
            R_RISCV_PCREL_LO12_S => Some("R_RISCV_PCREL_LO12_S"),
            R_RISCV_HI20 => Some("R_RISCV_HI20"),
            R_RISCV_LO12_I => Some("R_RISCV_LO12_I"),
            R_RISCV_LO12_S => Some("R_RISCV_LO12_S"),
            R_RISCV_RELAX => Some("R_RISCV_RELAX"),
            _ => None,
        },
        _ => None,
    };
    named(name, value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(section_type_name(SHT_SYMTAB), "SYMTAB");
        assert_eq!(segment_type_name(PT_LOAD), "LOAD");
        assert_eq!(symbol_binding_name(STB_WEAK), "WEAK");
        assert_eq!(symbol_type_name(STT_FUNC), "FUNC");
        assert_eq!(dynamic_tag_name(DT_NEEDED), "NEEDED");
        assert_eq!(machine_name(EM_RISCV), "RISC-V");
        assert_eq!(relocation_type_name(EM_X86_64, R_X86_64_PC32), "R_X86_64_PC32");
    }

    #[test]
    fn test_unknown_names_are_not_errors() {
        assert_eq!(section_type_name(0x1234), "UNKNOWN (0x1234)");
        assert_eq!(segment_type_name(99), "UNKNOWN (0x63)");
        assert_eq!(symbol_type_name(9), "UNKNOWN (0x9)");
        assert_eq!(relocation_type_name(EM_NONE, 1), "UNKNOWN (0x1)");
        assert_eq!(segment_type_name(0x6000_0001), "LOOS+");
    }

    #[test]
    fn test_flag_strings() {
        assert_eq!(segment_flags_string(PF_R | PF_X), "R E");
        assert_eq!(segment_flags_string(PF_R | PF_W), "RW ");
        assert_eq!(section_flags_string(SHF_ALLOC | SHF_EXECINSTR), "AX");
        assert_eq!(section_flags_string(SHF_WRITE | SHF_ALLOC), "WA");
        assert_eq!(section_flags_string(0), "");
    }

    #[test]
    fn test_dynamic_value_kind() {
        assert!(dynamic_tag_is_address(DT_STRTAB));
        assert!(!dynamic_tag_is_address(DT_STRSZ));
        assert!(!dynamic_tag_is_address(DT_NEEDED));
    }
}
