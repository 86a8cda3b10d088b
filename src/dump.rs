// dump.rs
//
// Human-readable rendering of a parsed object file, laid out like readelf.
// Every part renders into a String so the binary can print it and tests can
// inspect it.

use crate::consts::*;
use crate::dynamic::DynamicValue;
use crate::error::Result;
use crate::ident::endian_name;
use crate::object::{ElfFile, RelocationTable};
use crate::relocation::RelocationFields;
use crossterm::style::{Stylize, style};
use crossterm::tty::IsTty;
use std::fmt::Write;
use std::io;

// ============================================================================
// Configuration Data Structures
// ============================================================================

/// Parts of the file to dump
#[derive(Debug, Clone, PartialEq)]
pub struct DumpParts {
    pub headers: bool,
    pub segments: bool,
    pub sections: bool,
    pub symbols: bool,
    pub relocations: bool,
    pub dynamic: bool,
    pub notes: bool,
}

impl Default for DumpParts {
    fn default() -> Self {
        Self {
            headers: true,
            segments: true,
            sections: true,
            symbols: true,
            relocations: true,
            dynamic: true,
            notes: true,
        }
    }
}

impl DumpParts {
    pub fn none() -> Self {
        Self {
            headers: false,
            segments: false,
            sections: false,
            symbols: false,
            relocations: false,
            dynamic: false,
            notes: false,
        }
    }
}

/// Parse dump parts string
/// Formats: empty/"" (all), "headers", "headers,symbols", etc.
pub fn parse_dump_parts(s: &str) -> std::result::Result<DumpParts, String> {
    if s.is_empty() || s == "all" {
        return Ok(DumpParts::default());
    }

    let mut parts = DumpParts::none();
    for part in s.split(',') {
        match part.trim() {
            "headers" => parts.headers = true,
            "segments" => parts.segments = true,
            "sections" => parts.sections = true,
            "symbols" => parts.symbols = true,
            "relocations" => parts.relocations = true,
            "dynamic" => parts.dynamic = true,
            "notes" => parts.notes = true,
            other => return Err(format!("Unknown dump part: {}", other)),
        }
    }

    Ok(parts)
}

/// Colour only when stdout is a terminal.
pub fn use_color() -> bool {
    io::stdout().is_tty()
}

fn title(out: &mut String, text: &str, color: bool) -> Result<()> {
    if color {
        writeln!(out, "{}", style(text).bold())?;
    } else {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render(file: &ElfFile, parts: &DumpParts, color: bool) -> Result<String> {
    let mut out = String::new();

    if parts.headers {
        render_file_header(&mut out, file, color)?;
    }
    if parts.segments {
        render_segments(&mut out, file, color)?;
    }
    if parts.sections {
        render_sections(&mut out, file, color)?;
    }
    if parts.symbols {
        render_symbols(&mut out, file, color)?;
    }
    if parts.relocations {
        render_relocations(&mut out, file, color)?;
    }
    if parts.dynamic {
        render_dynamic(&mut out, file, color)?;
    }
    if parts.notes {
        render_notes(&mut out, file, color)?;
    }

    Ok(out)
}

pub fn render_file_header(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    let ident = file.header.ident();
    let h = file.file_header();

    title(out, "ELF Header:", color)?;
    write!(out, "  Magic:   ")?;
    for b in ident.encode() {
        write!(out, "{:02x} ", b)?;
    }
    writeln!(out)?;

    writeln!(out, "  Class:                             {}", ident.class.name())?;
    writeln!(out, "  Data:                              {}", endian_name(ident.endian))?;
    writeln!(out, "  Version:                           {} (current)", ident.version)?;
    writeln!(out, "  OS/ABI:                            {}", osabi_name(ident.os_abi))?;
    writeln!(out, "  ABI Version:                       {}", ident.abi_version)?;
    writeln!(out, "  Type:                              {}", object_type_name(h.e_type))?;
    writeln!(out, "  Machine:                           {}", machine_name(h.e_machine))?;
    writeln!(out, "  Version:                           {:#x}", h.e_version)?;
    writeln!(out, "  Entry point address:               {:#x}", h.e_entry)?;
    writeln!(out, "  Start of program headers:          {} (bytes into file)", h.e_phoff)?;
    writeln!(out, "  Start of section headers:          {} (bytes into file)", h.e_shoff)?;
    writeln!(out, "  Flags:                             {:#x}", h.e_flags)?;
    writeln!(out, "  Size of this header:               {} (bytes)", h.e_ehsize)?;
    writeln!(out, "  Size of program headers:           {} (bytes)", h.e_phentsize)?;
    writeln!(out, "  Number of program headers:         {}", h.e_phnum)?;
    writeln!(out, "  Size of section headers:           {} (bytes)", h.e_shentsize)?;
    writeln!(out, "  Number of section headers:         {}", h.e_shnum)?;
    writeln!(out, "  Section header string table index: {}", h.e_shstrndx)?;
    writeln!(out)?;
    Ok(())
}

pub fn render_segments(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    if file.program_headers.is_empty() {
        writeln!(out, "There are no program headers in this file.")?;
        writeln!(out)?;
        return Ok(());
    }

    title(out, "Program Headers:", color)?;
    writeln!(out, "  Type           Offset             VirtAddr           PhysAddr")?;
    writeln!(out, "                 FileSiz            MemSiz              Flags  Align")?;
    for i in 0..file.program_headers.len() {
        let ph = file.segment(i)?;
        writeln!(
            out,
            "  {:14} 0x{:016x} 0x{:016x} 0x{:016x}",
            segment_type_name(ph.p_type),
            ph.p_offset,
            ph.p_vaddr,
            ph.p_paddr
        )?;
        writeln!(
            out,
            "                 0x{:016x} 0x{:016x}  {}    0x{:x}",
            ph.p_filesz,
            ph.p_memsz,
            segment_flags_string(ph.p_flags),
            ph.p_align
        )?;
    }
    writeln!(out)?;

    title(out, " Section to Segment mapping:", color)?;
    writeln!(out, "  Segment Sections...")?;
    for group in &file.segment_groups {
        write!(out, "   {:02}     ", group.segment_index)?;
        for &index in &group.sections {
            write!(out, "{} ", file.section_name(index)?)?;
        }
        writeln!(out)?;
    }
    if !file.ungrouped_sections.is_empty() {
        write!(out, "   None    ")?;
        for &index in &file.ungrouped_sections {
            write!(out, "{} ", file.section_name(index)?)?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_sections(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    title(out, "Section Headers:", color)?;
    writeln!(out, "  [Nr] Name              Type            Address          Off    Size   ES Flg Lk Inf Al")?;
    for i in 0..file.section_headers.len() {
        let sh = file.section(i)?;
        writeln!(
            out,
            "  [{:2}] {:17} {:15} {:016x} {:06x} {:06x} {:02x} {:>3} {:2} {:3} {:2}",
            i,
            file.section_name(i)?,
            section_type_name(sh.sh_type),
            sh.sh_addr,
            sh.sh_offset,
            sh.sh_size,
            sh.sh_entsize,
            section_flags_string(sh.sh_flags),
            sh.sh_link,
            sh.sh_info,
            sh.sh_addralign
        )?;
    }
    writeln!(out, "Key to Flags:")?;
    writeln!(out, "  W (write), A (alloc), X (execute), M (merge), S (strings), I (info),")?;
    writeln!(out, "  L (link order), G (group), T (TLS)")?;
    writeln!(out)?;
    Ok(())
}

pub fn render_symbols(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    let tables: Vec<usize> =
        [file.dynamic_symbol_table_index, file.symbol_table_index].into_iter().flatten().collect();
    if tables.is_empty() {
        writeln!(out, "No symbol table in this file.")?;
        writeln!(out)?;
        return Ok(());
    }

    for table in tables {
        let symbols = file.symbols_in(table)?;
        let heading = format!(
            "Symbol table '{}' contains {} entries:",
            file.section_name(table)?,
            symbols.len()
        );
        title(out, &heading, color)?;
        writeln!(out, "   Num:    Value          Size Type    Bind   Vis      Ndx Name")?;
        for (i, sym) in symbols.iter().enumerate() {
            let sym = sym.fields();
            writeln!(
                out,
                "  {:4}: {:016x} {:5} {:7} {:6} {:8} {:>3} {}",
                i,
                sym.st_value,
                sym.st_size,
                symbol_type_name(sym.sym_type()),
                symbol_binding_name(sym.bind()),
                symbol_visibility_name(sym.visibility()),
                section_index_name(sym.st_shndx),
                file.symbol_name_in(table, &sym)?
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_relocation_entry<T>(
    out: &mut String,
    file: &ElfFile,
    table: &RelocationTable<T>,
    r: &RelocationFields,
    rela: bool,
) -> Result<()> {
    let name = file.relocation_symbol_name(table, r)?;
    write!(
        out,
        "{:012x}  {:08x} {:20} {}",
        r.r_offset,
        r.r_sym,
        relocation_type_name(file.machine(), r.r_type),
        name
    )?;
    if rela {
        if r.r_addend < 0 {
            write!(out, " - {:x}", r.r_addend.unsigned_abs())?;
        } else {
            write!(out, " + {:x}", r.r_addend)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_relocations(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    if file.rel_tables.is_empty() && file.rela_tables.is_empty() {
        writeln!(out, "There are no relocations in this file.")?;
        writeln!(out)?;
        return Ok(());
    }

    for table in &file.rela_tables {
        let heading = format!(
            "Relocation section '{}' at offset {:#x} contains {} entries:",
            table.name,
            file.section(table.section_index)?.sh_offset,
            table.entries.len()
        );
        title(out, &heading, color)?;
        writeln!(out, "  Offset        Sym      Type                 Sym. Name + Addend")?;
        for entry in &table.entries {
            render_relocation_entry(out, file, table, &entry.fields(), true)?;
        }
        writeln!(out)?;
    }

    for table in &file.rel_tables {
        let heading = format!(
            "Relocation section '{}' at offset {:#x} contains {} entries:",
            table.name,
            file.section(table.section_index)?.sh_offset,
            table.entries.len()
        );
        title(out, &heading, color)?;
        writeln!(out, "  Offset        Sym      Type                 Sym. Name")?;
        for entry in &table.entries {
            render_relocation_entry(out, file, table, &entry.fields(), false)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn render_dynamic(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    if file.dynamic.is_empty() {
        writeln!(out, "There is no dynamic section in this file.")?;
        writeln!(out)?;
        return Ok(());
    }

    title(out, &format!("Dynamic section contains {} entries:", file.dynamic.len()), color)?;
    writeln!(out, "  Tag                Type                 Name/Value")?;
    for entry in file.dynamic_entries() {
        let value = match entry.value() {
            DynamicValue::Address(addr) => format!("{:#x}", addr),
            DynamicValue::Integer(value) => format!("{}", value),
        };
        writeln!(out, "  {:#018x} {:20} {}", entry.d_tag, dynamic_tag_name(entry.d_tag), value)?;
        if entry.is_null() {
            break;
        }
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_notes(out: &mut String, file: &ElfFile, color: bool) -> Result<()> {
    if file.notes.is_empty() {
        writeln!(out, "There are no notes in this file.")?;
        writeln!(out)?;
        return Ok(());
    }

    title(out, "Displaying notes:", color)?;
    writeln!(out, "  Owner                Data size        Description")?;
    for note in &file.notes {
        writeln!(
            out,
            "  {:20} {:#010x}       {}",
            note.name,
            note.desc.len(),
            note_type_name(&note.name, note.n_type)
        )?;
        if note.name == "GNU" && note.n_type == NT_GNU_BUILD_ID {
            write!(out, "    Build ID: ")?;
            for b in &note.desc {
                write!(out, "{:02x}", b)?;
            }
            writeln!(out)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
