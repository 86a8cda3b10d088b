#[cfg(test)]
pub mod test_helpers {
    use crate::builder::{Binding, ElfBuilder};
    use crate::codec::Endian;
    use crate::config::BuildConfig;
    use crate::consts::{R_X86_64_32, R_X86_64_PLT32, STT_FUNC};
    use crate::error::Result;
    use crate::ident::Class;
    use crate::object::ElfFile;
    use crate::symbol::SymbolFields;

    /// Every class/byte order combination.
    pub const LAYOUTS: [(Class, Endian); 4] = [
        (Class::Elf32, Endian::Little),
        (Class::Elf32, Endian::Big),
        (Class::Elf64, Endian::Little),
        (Class::Elf64, Endian::Big),
    ];

    /// Eight bytes of x86-64 NOPs.
    pub const NOPS: [u8; 8] = [0x90; 8];

    pub fn config(class: Class, endian: Endian) -> BuildConfig {
        BuildConfig::default().with_class(class).with_endian(endian)
    }

    /// An executable whose text section holds one 8-byte instruction with a
    /// global `main` at its start.
    pub fn build_main_executable(class: Class, endian: Endian) -> Vec<u8> {
        let mut builder = ElfBuilder::new(config(class, endian).executable()).unwrap();
        let text = builder.text();
        builder.append(text, &NOPS).unwrap();
        builder.declare_symbol("main", Binding::Global, text, 0);
        builder.finish().unwrap()
    }

    /// A relocatable object with code, data, bss, locals and relocations
    /// both with and without addends.
    pub fn build_relocatable(class: Class, endian: Endian) -> Vec<u8> {
        let mut builder = ElfBuilder::new(config(class, endian)).unwrap();
        builder.add_file_symbol("unit.s");

        let text = builder.text();
        builder.append(text, &[0xe8, 0, 0, 0, 0, 0xc3]).unwrap();
        builder.declare_symbol("entry", Binding::Global, text, 0);
        builder.set_symbol_type("entry", STT_FUNC).unwrap();
        builder.set_symbol_size("entry", 6).unwrap();
        builder.add_relocation(text, 1, "helper", R_X86_64_PLT32, Some(-4)).unwrap();

        let data = builder.data();
        builder.append(data, &[0; 8]).unwrap();
        builder.declare_symbol("table", Binding::Local, data, 0);
        builder.add_relocation(data, 0, "entry", R_X86_64_32, None).unwrap();

        let bss = builder.bss();
        builder.reserve(bss, 64).unwrap();
        builder.declare_symbol("scratch", Binding::Weak, bss, 0);

        builder.finish().unwrap()
    }

    pub fn parse(bytes: &[u8]) -> ElfFile<'_> {
        ElfFile::parse(bytes).unwrap()
    }

    /// Find a symbol by name in a parsed file.
    pub fn find_symbol(file: &ElfFile, name: &str) -> Option<(usize, SymbolFields)> {
        (0..file.symbols.len())
            .map(|i| (i, file.symbol(i).unwrap()))
            .find(|(_, sym)| file.symbol_name(sym).unwrap() == name)
    }

    pub fn assert_format_error<T: std::fmt::Debug>(result: Result<T>) {
        match result {
            Err(e) => assert!(e.is_format(), "expected a format error, got {:?}", e),
            Ok(value) => panic!("expected a format error, got {:?}", value),
        }
    }
}
