#[cfg(test)]
mod tests {
    use crate::codec::Endian;
    use crate::consts::*;
    use crate::dynamic::{Dynamic, DynamicFields, DynamicValue};
    use crate::header::{FileHeader, FileHeaderFields};
    use crate::ident::{Class, Ident};
    use crate::program_header::{ProgramHeader, ProgramHeaderFields};
    use crate::relocation::{Rel, Rela, RelocationFields, r_info32, r_info64};
    use crate::section_header::{SectionHeader, SectionHeaderFields};
    use crate::symbol::{Symbol, SymbolFields, make_st_info};
    use crate::test_utils::test_helpers::{LAYOUTS, assert_format_error};

    /// Largest value that survives a round trip through an address field.
    fn wide(class: Class, value: u64) -> u64 {
        if class.is_64() { value } else { value & 0xffff_ffff }
    }

    fn sample_file_header(class: Class) -> FileHeaderFields {
        FileHeaderFields {
            e_type: ET_EXEC,
            e_machine: EM_RISCV,
            e_entry: wide(class, 0x1234_5678_9abc_def0),
            e_phoff: FileHeader::size(class) as u64,
            e_shoff: wide(class, 0x0000_0001_0000_2000),
            e_flags: 0x5,
            e_phnum: 3,
            e_shnum: 9,
            e_shstrndx: 8,
            ..FileHeaderFields::empty(class)
        }
    }

    // ========================================================================
    // Identification record
    // ========================================================================

    #[test]
    fn test_ident_accepts_every_valid_combination() {
        for (class, endian) in LAYOUTS {
            let ident = Ident::new(class, endian);
            let bytes = ident.encode();
            assert_eq!(bytes.len(), Ident::SIZE);
            assert_eq!(Ident::decode(&bytes).unwrap(), ident);
        }
    }

    #[test]
    fn test_ident_rejects_any_magic_mismatch() {
        let good = Ident::new(Class::Elf64, Endian::Little).encode();
        for i in 0..4 {
            let mut bytes = good;
            bytes[i] ^= 0xff;
            assert_format_error(Ident::decode(&bytes));
        }
    }

    #[test]
    fn test_ident_rejects_bad_class_data_version() {
        let good = Ident::new(Class::Elf32, Endian::Big).encode();

        let mut bytes = good;
        bytes[EI_CLASS] = 3;
        assert_format_error(Ident::decode(&bytes));

        let mut bytes = good;
        bytes[EI_CLASS] = ELFCLASSNONE;
        assert_format_error(Ident::decode(&bytes));

        let mut bytes = good;
        bytes[EI_DATA] = ELFDATANONE;
        assert_format_error(Ident::decode(&bytes));

        let mut bytes = good;
        bytes[EI_VERSION] = 2;
        assert_format_error(Ident::decode(&bytes));
    }

    #[test]
    fn test_ident_preserves_osabi() {
        let mut ident = Ident::new(Class::Elf64, Endian::Little);
        ident.os_abi = ELFOSABI_FREEBSD;
        ident.abi_version = 2;
        assert_eq!(Ident::decode(&ident.encode()).unwrap(), ident);
    }

    // ========================================================================
    // File header
    // ========================================================================

    #[test]
    fn test_file_header_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = sample_file_header(class);
            let header = FileHeader::from_fields(Ident::new(class, endian), &fields);
            let bytes = header.encode();
            assert_eq!(bytes.len(), FileHeader::size(class));

            let decoded = FileHeader::decode(&bytes).unwrap();
            assert_eq!(decoded, header);
            assert_eq!(decoded.fields(), fields);
            assert_eq!(decoded.class(), class);
            assert_eq!(decoded.endian(), endian);
        }
    }

    #[test]
    fn test_file_header_sizes() {
        assert_eq!(FileHeader::size(Class::Elf32), 52);
        assert_eq!(FileHeader::size(Class::Elf64), 64);

        let fields = FileHeaderFields::empty(Class::Elf64);
        assert_eq!(fields.e_ehsize, 64);
        assert_eq!(fields.e_phentsize, 56);
        assert_eq!(fields.e_shentsize, 64);
    }

    #[test]
    fn test_file_header_byte_order() {
        let fields = sample_file_header(Class::Elf32);
        let le = FileHeader::from_fields(Ident::new(Class::Elf32, Endian::Little), &fields).encode();
        let be = FileHeader::from_fields(Ident::new(Class::Elf32, Endian::Big), &fields).encode();
        assert_eq!(&le[16..18], &ET_EXEC.to_le_bytes());
        assert_eq!(&be[16..18], &ET_EXEC.to_be_bytes());
        assert_eq!(&le[24..28], &0x9abc_def0u32.to_le_bytes());
    }

    #[test]
    fn test_file_header_truncated() {
        let bytes = FileHeader::from_fields(
            Ident::new(Class::Elf64, Endian::Little),
            &sample_file_header(Class::Elf64),
        )
        .encode();
        assert_format_error(FileHeader::decode(&bytes[..40]));
    }

    // ========================================================================
    // Program and section headers
    // ========================================================================

    #[test]
    fn test_program_header_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = ProgramHeaderFields {
                p_type: PT_LOAD,
                p_flags: PF_R | PF_X,
                p_offset: 0x1000,
                p_vaddr: wide(class, 0x7fff_0040_1000),
                p_paddr: wide(class, 0x7fff_0040_1000),
                p_filesz: 0x123,
                p_memsz: 0x456,
                p_align: 0x1000,
            };
            let ph = ProgramHeader::from_fields(class, &fields);
            let bytes = ph.encode(endian);
            assert_eq!(bytes.len(), ProgramHeader::size(class));

            let decoded = ProgramHeader::decode(&bytes, 0, class, endian).unwrap();
            assert_eq!(decoded, ph);
            assert_eq!(decoded.fields(), fields);
        }
    }

    #[test]
    fn test_program_header_64_flags_follow_type() {
        let fields = ProgramHeaderFields { p_type: PT_LOAD, p_flags: PF_R | PF_W, ..Default::default() };
        let bytes64 = ProgramHeader::from_fields(Class::Elf64, &fields).encode(Endian::Little);
        assert_eq!(&bytes64[4..8], &(PF_R | PF_W).to_le_bytes());

        let bytes32 = ProgramHeader::from_fields(Class::Elf32, &fields).encode(Endian::Little);
        assert_eq!(&bytes32[24..28], &(PF_R | PF_W).to_le_bytes());
    }

    #[test]
    fn test_section_header_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = SectionHeaderFields {
                sh_name: 17,
                sh_type: SHT_RELA,
                sh_flags: SHF_INFO_LINK,
                sh_addr: wide(class, 0x1_0000_0000),
                sh_offset: 0x200,
                sh_size: 0x48,
                sh_link: 5,
                sh_info: 1,
                sh_addralign: 8,
                sh_entsize: 24,
            };
            let sh = SectionHeader::from_fields(class, &fields);
            let bytes = sh.encode(endian);
            assert_eq!(bytes.len(), SectionHeader::size(class));
            assert_eq!(SectionHeader::decode(&bytes, 0, class, endian).unwrap().fields(), fields);
        }
        assert_eq!(SectionHeader::size(Class::Elf32), 40);
        assert_eq!(SectionHeader::size(Class::Elf64), 64);
    }

    #[test]
    fn test_null_section_header() {
        for class in [Class::Elf32, Class::Elf64] {
            let bytes = SectionHeader::null(class).encode(Endian::Big);
            assert!(bytes.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_nobits_has_no_file_size() {
        let fields = SectionHeaderFields { sh_type: SHT_NOBITS, sh_size: 64, ..Default::default() };
        assert_eq!(fields.file_size(), 0);
        let fields = SectionHeaderFields { sh_type: SHT_PROGBITS, sh_size: 64, ..Default::default() };
        assert_eq!(fields.file_size(), 64);
    }

    // ========================================================================
    // Symbols
    // ========================================================================

    #[test]
    fn test_symbol_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = SymbolFields {
                st_name: 9,
                st_value: wide(class, 0xffff_8000_0000_1234),
                st_size: 32,
                st_info: make_st_info(STB_WEAK, STT_FUNC),
                st_other: STV_HIDDEN,
                st_shndx: 3,
            };
            let sym = Symbol::from_fields(class, &fields);
            let bytes = sym.encode(endian);
            assert_eq!(bytes.len(), Symbol::size(class));

            let decoded = Symbol::decode(&bytes, 0, class, endian).unwrap().fields();
            assert_eq!(decoded, fields);
            assert_eq!(decoded.bind(), STB_WEAK);
            assert_eq!(decoded.sym_type(), STT_FUNC);
            assert_eq!(decoded.visibility(), STV_HIDDEN);
        }
    }

    #[test]
    fn test_symbol_field_order() {
        let fields = SymbolFields { st_name: 1, st_value: 0x10, st_info: 0x12, st_shndx: 2, ..Default::default() };

        let bytes = Symbol::from_fields(Class::Elf64, &fields).encode(Endian::Little);
        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[4], 0x12);
        assert_eq!(&bytes[6..8], &2u16.to_le_bytes());
        assert_eq!(&bytes[8..16], &0x10u64.to_le_bytes());

        let bytes = Symbol::from_fields(Class::Elf32, &fields).encode(Endian::Little);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[4..8], &0x10u32.to_le_bytes());
        assert_eq!(bytes[12], 0x12);
    }

    #[test]
    fn test_special_symbols() {
        assert_eq!(SymbolFields::null(), SymbolFields::default());
        assert!(SymbolFields::null().is_undefined());

        let sym = SymbolFields::section(4);
        assert_eq!(sym.sym_type(), STT_SECTION);
        assert!(sym.is_local());

        let sym = SymbolFields::file(7);
        assert_eq!(sym.st_shndx, SHN_ABS);
        assert_eq!(sym.sym_type(), STT_FILE);
        assert!(sym.is_default_visibility());
    }

    // ========================================================================
    // Relocations and dynamic entries
    // ========================================================================

    #[test]
    fn test_r_info_packing() {
        assert_eq!(r_info32(5, R_RISCV_CALL), (5 << 8) | 18);
        assert_eq!(r_info64(5, R_X86_64_PC32), (5u64 << 32) | 2);
    }

    #[test]
    fn test_relocation_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = RelocationFields { r_offset: 0x40, r_sym: 3, r_type: 2, r_addend: -4 };

            let rela = Rela::from_fields(class, &fields);
            let bytes = rela.encode(endian);
            assert_eq!(bytes.len(), Rela::size(class));
            assert_eq!(Rela::decode(&bytes, 0, class, endian).unwrap().fields(), fields);

            let rel = Rel::from_fields(class, &fields);
            let bytes = rel.encode(endian);
            assert_eq!(bytes.len(), Rel::size(class));
            let decoded = Rel::decode(&bytes, 0, class, endian).unwrap().fields();
            assert_eq!(decoded.r_offset, 0x40);
            assert_eq!(decoded.r_sym, 3);
            assert_eq!(decoded.r_type, 2);
            assert_eq!(decoded.r_addend, 0);
        }
    }

    #[test]
    fn test_dynamic_round_trip() {
        for (class, endian) in LAYOUTS {
            let fields = DynamicFields { d_tag: DT_STRTAB, d_val: 0x0040_0200 };
            let entry = Dynamic::from_fields(class, &fields);
            let bytes = entry.encode(endian);
            assert_eq!(bytes.len(), Dynamic::size(class));

            let decoded = Dynamic::decode(&bytes, 0, class, endian).unwrap().fields();
            assert_eq!(decoded, fields);
            assert_eq!(decoded.value(), DynamicValue::Address(0x0040_0200));
        }

        let needed = DynamicFields { d_tag: DT_NEEDED, d_val: 1 };
        assert_eq!(needed.value(), DynamicValue::Integer(1));
        assert!(DynamicFields::default().is_null());
    }

    #[test]
    fn test_decode_at_offset_out_of_range() {
        let bytes = Symbol::from_fields(Class::Elf64, &SymbolFields::null()).encode(Endian::Little);
        assert_format_error(Symbol::decode(&bytes, 8, Class::Elf64, Endian::Little));
        assert_format_error(Rela::decode(&bytes, 4, Class::Elf64, Endian::Little));
    }
}
