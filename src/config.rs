// config.rs
//
// Builder settings and CLI argument parsing for the elfgen binary

use crate::codec::Endian;
use crate::consts::{ELFOSABI_SYSV, EM_X86_64, ET_EXEC, ET_REL};
use crate::dump;
use crate::ident::Class;
use std::env;

/// Kind of object the builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Relocatable,
    Executable,
}

impl ObjectKind {
    pub fn e_type(self) -> u16 {
        match self {
            ObjectKind::Relocatable => ET_REL,
            ObjectKind::Executable => ET_EXEC,
        }
    }
}

/// Everything the builder needs to know before the first section is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    pub class: Class,
    pub endian: Endian,
    pub kind: ObjectKind,
    pub machine: u16,
    pub os_abi: u8,
    /// Processor-specific e_flags
    pub flags: u32,
    /// Virtual address the first segment is placed at (executables only)
    pub base_address: u64,
    /// Alignment of loadable segments, normally the page size
    pub segment_align: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            class: Class::Elf64,
            endian: Endian::Little,
            kind: ObjectKind::Relocatable,
            machine: EM_X86_64,
            os_abi: ELFOSABI_SYSV,
            flags: 0,
            base_address: 0x400000,
            segment_align: 0x1000,
        }
    }
}

impl BuildConfig {
    pub fn with_class(mut self, class: Class) -> Self {
        self.class = class;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_os_abi(mut self, os_abi: u8) -> Self {
        self.os_abi = os_abi;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_base_address(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn with_segment_align(mut self, segment_align: u64) -> Self {
        self.segment_align = segment_align;
        self
    }

    /// Shortcut for `with_kind(ObjectKind::Executable)`.
    pub fn executable(self) -> Self {
        self.with_kind(ObjectKind::Executable)
    }

    pub fn is_executable(&self) -> bool {
        self.kind == ObjectKind::Executable
    }
}

/// Complete configuration for the binary
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_files: Vec<String>,
    pub dump: dump::DumpParts,
    pub verbose: bool,
    /// Write a small generated executable to this path before dumping
    pub demo_output: Option<String>,
    /// Build the demo as a 32-bit object
    pub demo_32: bool,
}

/// Parse command-line arguments
pub fn process_cli_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    parse_args(&args)
}

/// Parse an argument vector whose first element is the program name
pub fn parse_args(args: &[String]) -> Result<Config, String> {
    let program_name = args.first().map(String::as_str).unwrap_or("elfgen");
    let mut input_files = Vec::new();
    let mut dump_parts = dump::DumpParts::default();
    let mut verbose = false;
    let mut demo_output = None;
    let mut demo_32 = false;

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];

        if let Some(parts) = arg.strip_prefix("--dump=") {
            dump_parts = dump::parse_dump_parts(parts)?;
        } else {
            match arg.as_str() {
                "--dump" => {
                    dump_parts = dump::DumpParts::default();
                }
                "--demo" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Error: --demo requires an argument".to_string());
                    }
                    demo_output = Some(args[i].clone());
                }
                "--32" => {
                    demo_32 = true;
                }
                "-v" | "--verbose" => {
                    verbose = true;
                }
                "-h" | "--help" => {
                    return Err(print_help(program_name));
                }
                _ => {
                    if arg.starts_with('-') {
                        return Err(format!("Error: unknown option: {}", arg));
                    }
                    input_files.push(arg.to_string());
                }
            }
        }
        i += 1;
    }

    if input_files.is_empty() && demo_output.is_none() {
        return Err("Error: no input files specified".to_string());
    }

    Ok(Config { input_files, dump: dump_parts, verbose, demo_output, demo_32 })
}

/// Print help message
fn print_help(program_name: &str) -> String {
    format!(
        "Usage: {} [options] [file...]

Options:
    --dump[=PARTS]       Select what to print for each file (default: all)
    --demo <file>        Generate a small executable, write it to <file> and dump it
    --32                 Generate the demo as a 32-bit object
    -v, --verbose        Enable debug logging (RUST_LOG overrides)
    -h, --help           Show this help message

  PARTS syntax:
    (empty)      All parts (default)
    headers      File header
    segments     Program headers and section-to-segment mapping
    sections     Section headers
    symbols      Symbol table
    relocations  Relocation tables
    dynamic      Dynamic section
    notes        Note records
    (comma-separated for multiple, e.g., headers,symbols)

Examples:
  {} /bin/true                     # Dump everything
  {} --dump=sections,symbols a.o   # Only section headers and symbols
  {} --demo hello                  # Build, write and dump a demo executable",
        program_name, program_name, program_name, program_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_build_config() {
        let config = BuildConfig::default();
        assert_eq!(config.class, Class::Elf64);
        assert_eq!(config.endian, Endian::Little);
        assert_eq!(config.kind.e_type(), ET_REL);
        assert!(!config.is_executable());
        assert!(config.executable().is_executable());
    }

    #[test]
    fn test_setters_chain() {
        let config = BuildConfig::default()
            .with_class(Class::Elf32)
            .with_endian(Endian::Big)
            .with_base_address(0x10000)
            .with_segment_align(0x100);
        assert_eq!(config.class, Class::Elf32);
        assert_eq!(config.endian, Endian::Big);
        assert_eq!(config.base_address, 0x10000);
        assert_eq!(config.segment_align, 0x100);
    }

    #[test]
    fn test_parse_inputs_and_parts() {
        let config = parse_args(&args(&["elfgen", "-v", "--dump=headers,symbols", "a.o"])).unwrap();
        assert_eq!(config.input_files, vec!["a.o".to_string()]);
        assert!(config.verbose);
        assert!(config.dump.headers);
        assert!(config.dump.symbols);
        assert!(!config.dump.sections);
    }

    #[test]
    fn test_parse_demo_without_inputs() {
        let config = parse_args(&args(&["elfgen", "--demo", "out", "--32"])).unwrap();
        assert_eq!(config.demo_output.as_deref(), Some("out"));
        assert!(config.demo_32);
        assert!(config.input_files.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["elfgen"])).is_err());
        assert!(parse_args(&args(&["elfgen", "--bogus", "a.o"])).is_err());
        assert!(parse_args(&args(&["elfgen", "--demo"])).is_err());
        assert!(parse_args(&args(&["elfgen", "--dump=nothing", "a.o"])).is_err());
    }
}
