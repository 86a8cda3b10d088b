use elfgen::builder::{Binding, ElfBuilder};
use elfgen::codec::Endian;
use elfgen::config::{BuildConfig, Config, process_cli_args};
use elfgen::consts::{EM_386, EM_X86_64, NT_GNU_BUILD_ID, SHF_ALLOC, SHT_NOTE, STT_FUNC, STT_OBJECT};
use elfgen::dump;
use elfgen::error::ElfError;
use elfgen::ident::Class;
use elfgen::note::Note;
use elfgen::object::ElfFile;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match process_cli_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    init_logging(config.verbose);
    if let Err(e) = main_process(config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins; otherwise warnings only, or debug output with -v.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main_process(config: Config) -> Result<(), ElfError> {
    let color = dump::use_color();
    let mut inputs = config.input_files.clone();

    if let Some(path) = &config.demo_output {
        let class = if config.demo_32 { Class::Elf32 } else { Class::Elf64 };
        let bytes = build_demo(class)?;
        fs::write(path, &bytes)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
        info!(path = %path, size = bytes.len(), "wrote demo executable");
        inputs.insert(0, path.clone());
    }

    for path in &inputs {
        let data = fs::read(path)?;
        let file = ElfFile::parse_named(path, &data)?;
        if inputs.len() > 1 {
            println!("File: {}\n", path);
        }
        print!("{}", dump::render(&file, &config.dump, color)?);
    }

    Ok(())
}

/// A tiny static executable that exits with status 0, plus a little data so
/// every loadable segment kind shows up in the dump.
fn build_demo(class: Class) -> Result<Vec<u8>, ElfError> {
    let (machine, code): (u16, &[u8]) = match class {
        // mov eax, 1; xor ebx, ebx; int 0x80
        Class::Elf32 => (EM_386, &[0xb8, 0x01, 0x00, 0x00, 0x00, 0x31, 0xdb, 0xcd, 0x80]),
        // mov eax, 60; xor edi, edi; syscall
        _ => (EM_X86_64, &[0xb8, 0x3c, 0x00, 0x00, 0x00, 0x31, 0xff, 0x0f, 0x05]),
    };
    let config = BuildConfig::default()
        .with_class(class)
        .with_endian(Endian::Little)
        .with_machine(machine)
        .executable();

    let mut builder = ElfBuilder::new(config)?;
    builder.add_file_symbol("demo.s");

    let text = builder.text();
    let start = builder.append(text, code)?;
    builder.declare_symbol("_start", Binding::Global, text, start);
    builder.set_symbol_type("_start", STT_FUNC)?;
    builder.set_symbol_size("_start", code.len() as u64)?;
    builder.set_entry_symbol("_start");

    let rodata = builder.rodata();
    let message = builder.append(rodata, b"hello from elfgen\n\0")?;
    builder.declare_symbol("message", Binding::Local, rodata, message);
    builder.set_symbol_type("message", STT_OBJECT)?;

    let data = builder.data();
    let counter = builder.append(data, &[0; 8])?;
    builder.declare_symbol("counter", Binding::Global, data, counter);

    let bss = builder.bss();
    let buffer = builder.reserve(bss, 256)?;
    builder.declare_symbol("buffer", Binding::Weak, bss, buffer);

    let note = Note { name: "GNU".to_string(), n_type: NT_GNU_BUILD_ID, desc: vec![0x5a; 20] };
    let notes = builder.section(".note.gnu.build-id", SHT_NOTE, SHF_ALLOC);
    builder.set_alignment(notes, 4)?;
    builder.append(notes, &note.encode(config.endian))?;

    builder.finish()
}
