// object.rs
//
// The parsed-file model: decodes a complete object file image into headers,
// tables and derived groupings. Parsing is all-or-nothing; a file whose
// header-declared geometry does not fit the buffer is rejected.

use crate::codec::{Endian, slice};
use crate::consts::{
    SHN_LORESERVE, SHN_UNDEF, SHT_DYNAMIC, SHT_DYNSYM, SHT_NOBITS, SHT_NOTE, SHT_NULL, SHT_REL,
    SHT_RELA, SHT_SYMTAB,
};
use crate::dynamic::{Dynamic, DynamicFields};
use crate::error::{ElfError, Result};
use crate::header::{FileHeader, FileHeaderFields};
use crate::ident::Class;
use crate::note::Note;
use crate::program_header::{ProgramHeader, ProgramHeaderFields};
use crate::relocation::{Rel, Rela, RelocationFields};
use crate::section_header::{SectionHeader, SectionHeaderFields};
use crate::strtab::string_at;
use crate::symbol::{Symbol, SymbolFields};
use tracing::{debug, trace};

/// Entries of one REL or RELA section, keyed by the section's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTable<T> {
    pub name: String,
    pub section_index: usize,
    /// Symbol table the entries' symbol indices refer to (`sh_link`).
    pub symbol_table: usize,
    /// Section the relocations apply to (`sh_info`), 0 when none.
    pub target_section: usize,
    pub entries: Vec<T>,
}

/// The sections whose file offsets fall inside one program segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentGroup {
    pub segment_index: usize,
    pub sections: Vec<usize>,
}

/// A fully decoded object file. Borrows the image it was parsed from so
/// section contents and strings can be looked up on demand.
#[derive(Debug, Clone)]
pub struct ElfFile<'a> {
    data: &'a [u8],
    pub header: FileHeader,
    pub program_headers: Vec<ProgramHeader>,
    pub section_headers: Vec<SectionHeader>,
    /// Index of the SYMTAB section the symbols were read from.
    pub symbol_table_index: Option<usize>,
    pub symbols: Vec<Symbol>,
    /// Index of the DYNSYM section, for dynamically linked files.
    pub dynamic_symbol_table_index: Option<usize>,
    pub dynamic_symbols: Vec<Symbol>,
    pub dynamic: Vec<Dynamic>,
    pub notes: Vec<Note>,
    pub rel_tables: Vec<RelocationTable<Rel>>,
    pub rela_tables: Vec<RelocationTable<Rela>>,
    /// Segment groups ordered by their first section index.
    pub segment_groups: Vec<SegmentGroup>,
    /// Sections (other than index 0) that no segment covers.
    pub ungrouped_sections: Vec<usize>,
}

fn to_usize(value: u64, size: usize) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        ElfError::format(format!("value {value:#x} does not fit a {size}-byte image"))
    })
}

/// Decode `count` fixed-stride records starting at `offset`.
fn decode_table<T>(
    data: &[u8],
    what: &str,
    offset: u64,
    count: u64,
    stride: u64,
    min_stride: usize,
    decode: impl Fn(usize) -> Result<T>,
) -> Result<Vec<T>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if stride < min_stride as u64 {
        return Err(ElfError::format(format!(
            "{what} entry size {stride} is smaller than the {min_stride}-byte record"
        )));
    }

    let total = count
        .checked_mul(stride)
        .ok_or_else(|| ElfError::format(format!("{what} size overflows")))?;
    let start = to_usize(offset, data.len())?;
    slice(data, start, to_usize(total, data.len())?)?;

    debug!(what, offset, count, stride, "decoding table");
    let stride = stride as usize;
    (0..count as usize).map(|i| decode(start + i * stride)).collect()
}

impl<'a> ElfFile<'a> {
    /// Parse an object file image, choosing the 32- or 64-bit layout from
    /// the identification record's class byte.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = FileHeader::decode(data)?;
        let class = header.class();
        let endian = header.endian();
        let fh = header.fields();
        debug!(
            class = class.name(),
            ?endian,
            phnum = fh.e_phnum,
            shnum = fh.e_shnum,
            "parsed file header"
        );

        let program_headers = decode_table(
            data,
            "program header table",
            fh.e_phoff,
            fh.e_phnum as u64,
            fh.e_phentsize as u64,
            ProgramHeader::size(class),
            |off| ProgramHeader::decode(data, off, class, endian),
        )?;

        let section_headers = decode_table(
            data,
            "section header table",
            fh.e_shoff,
            fh.e_shnum as u64,
            fh.e_shentsize as u64,
            SectionHeader::size(class),
            |off| SectionHeader::decode(data, off, class, endian),
        )?;

        if fh.e_shstrndx != SHN_UNDEF && fh.e_shstrndx as usize >= section_headers.len() {
            return Err(ElfError::BadIndex {
                what: "section name table",
                index: fh.e_shstrndx as usize,
                count: section_headers.len(),
            });
        }

        let mut file = ElfFile {
            data,
            header,
            program_headers,
            section_headers,
            symbol_table_index: None,
            symbols: Vec::new(),
            dynamic_symbol_table_index: None,
            dynamic_symbols: Vec::new(),
            dynamic: Vec::new(),
            notes: Vec::new(),
            rel_tables: Vec::new(),
            rela_tables: Vec::new(),
            segment_groups: Vec::new(),
            ungrouped_sections: Vec::new(),
        };

        file.decode_symbols()?;
        file.decode_dynamic()?;
        file.decode_notes()?;
        file.decode_relocations()?;
        file.group_sections();

        debug!(
            sections = file.section_headers.len(),
            segments = file.program_headers.len(),
            symbols = file.symbols.len(),
            "parsed object file"
        );
        Ok(file)
    }

    /// Parse bytes read from `name`. The name is only used for diagnostics;
    /// the class always comes from the identification record.
    pub fn parse_named(name: &str, data: &'a [u8]) -> Result<Self> {
        debug!(name, len = data.len(), "parsing object file");
        Self::parse(data)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn class(&self) -> Class {
        self.header.class()
    }

    pub fn endian(&self) -> Endian {
        self.header.endian()
    }

    pub fn file_header(&self) -> FileHeaderFields {
        self.header.fields()
    }

    pub fn entry(&self) -> u64 {
        self.header.entry()
    }

    pub fn machine(&self) -> u16 {
        self.header.fields().e_machine
    }

    pub fn section(&self, index: usize) -> Result<SectionHeaderFields> {
        self.section_headers.get(index).map(SectionHeader::fields).ok_or(ElfError::BadIndex {
            what: "section",
            index,
            count: self.section_headers.len(),
        })
    }

    pub fn segment(&self, index: usize) -> Result<ProgramHeaderFields> {
        self.program_headers.get(index).map(ProgramHeader::fields).ok_or(ElfError::BadIndex {
            what: "segment",
            index,
            count: self.program_headers.len(),
        })
    }

    pub fn symbol(&self, index: usize) -> Result<SymbolFields> {
        self.symbols.get(index).map(Symbol::fields).ok_or(ElfError::BadIndex {
            what: "symbol",
            index,
            count: self.symbols.len(),
        })
    }

    /// Raw contents of a section; NOBITS sections have none.
    pub fn section_data(&self, index: usize) -> Result<&'a [u8]> {
        let sh = self.section(index)?;
        if sh.sh_type == SHT_NOBITS || sh.sh_type == SHT_NULL {
            return Ok(&[]);
        }
        slice(
            self.data,
            to_usize(sh.sh_offset, self.data.len())?,
            to_usize(sh.sh_size, self.data.len())?,
        )
    }

    /// Read a string from the string table stored in section `table`.
    pub fn string_at(&self, table: usize, offset: u32) -> Result<String> {
        string_at(self.section_data(table)?, offset as usize)
    }

    pub fn section_name(&self, index: usize) -> Result<String> {
        let sh = self.section(index)?;
        let shstrndx = self.header.fields().e_shstrndx;
        if shstrndx == SHN_UNDEF {
            return Ok(String::new());
        }
        self.string_at(shstrndx as usize, sh.sh_name)
    }

    pub fn section_by_name(&self, name: &str) -> Option<usize> {
        (0..self.section_headers.len())
            .find(|&i| self.section_name(i).map(|n| n == name).unwrap_or(false))
    }

    /// Decoded symbols of the SYMTAB or DYNSYM section at `table`.
    pub fn symbols_in(&self, table: usize) -> Result<&[Symbol]> {
        if self.symbol_table_index == Some(table) {
            Ok(&self.symbols)
        } else if self.dynamic_symbol_table_index == Some(table) {
            Ok(&self.dynamic_symbols)
        } else {
            Err(ElfError::format(format!("section {table} is not a symbol table")))
        }
    }

    /// Name of a symbol read from the symbol table at section `table`.
    pub fn symbol_name_in(&self, table: usize, symbol: &SymbolFields) -> Result<String> {
        if symbol.st_name == 0 {
            return Ok(String::new());
        }
        let link = self.section(table)?.sh_link as usize;
        self.string_at(link, symbol.st_name)
    }

    /// Name of a symbol from the static symbol table.
    pub fn symbol_name(&self, symbol: &SymbolFields) -> Result<String> {
        let Some(symtab) = self.symbol_table_index else {
            return Err(ElfError::format("file has no symbol table"));
        };
        self.symbol_name_in(symtab, symbol)
    }

    /// Name of the symbol a relocation refers to, looked up in the symbol
    /// table its section links to; index 0 means none.
    pub fn relocation_symbol_name<T>(
        &self,
        table: &RelocationTable<T>,
        reloc: &RelocationFields,
    ) -> Result<String> {
        if reloc.r_sym == 0 {
            return Ok(String::new());
        }
        let symbols = self.symbols_in(table.symbol_table)?;
        let index = reloc.r_sym as usize;
        let symbol = symbols.get(index).map(Symbol::fields).ok_or(ElfError::BadIndex {
            what: "symbol",
            index,
            count: symbols.len(),
        })?;
        self.symbol_name_in(table.symbol_table, &symbol)
    }

    pub fn dynamic_entries(&self) -> Vec<DynamicFields> {
        self.dynamic.iter().map(Dynamic::fields).collect()
    }

    fn first_section_of_type(&self, sh_type: u32) -> Option<(usize, SectionHeaderFields)> {
        self.section_headers
            .iter()
            .map(SectionHeader::fields)
            .enumerate()
            .find(|(_, sh)| sh.sh_type == sh_type)
    }

    /// Stride for a table section: its declared entry size, or the record
    /// size when the header leaves it zero.
    fn stride(sh: &SectionHeaderFields, record: usize) -> u64 {
        if sh.sh_entsize == 0 { record as u64 } else { sh.sh_entsize }
    }

    /// Decode the first section of `sh_type` (SYMTAB or DYNSYM) as symbols.
    fn decode_symbol_section(&self, sh_type: u32) -> Result<Option<(usize, Vec<Symbol>)>> {
        let Some((index, sh)) = self.first_section_of_type(sh_type) else {
            return Ok(None);
        };
        let count = self.section_headers.len();
        if sh.sh_link as usize >= count {
            return Err(ElfError::BadIndex {
                what: "symbol string table",
                index: sh.sh_link as usize,
                count,
            });
        }

        let (data, class, endian) = (self.data, self.class(), self.endian());
        let record = Symbol::size(class);
        let stride = Self::stride(&sh, record);
        let symbols = decode_table(
            data,
            "symbol table",
            sh.sh_offset,
            sh.sh_size / stride,
            stride,
            record,
            |off| Symbol::decode(data, off, class, endian),
        )?;

        // st_shndx values from SHN_LORESERVE up are reserved, not indices
        for symbol in &symbols {
            let shndx = symbol.fields().st_shndx;
            if shndx != SHN_UNDEF && shndx < SHN_LORESERVE && shndx as usize >= count {
                return Err(ElfError::BadIndex {
                    what: "symbol section",
                    index: shndx as usize,
                    count,
                });
            }
        }
        trace!(index, count = symbols.len(), "decoded symbols");
        Ok(Some((index, symbols)))
    }

    fn decode_symbols(&mut self) -> Result<()> {
        if let Some((index, symbols)) = self.decode_symbol_section(SHT_SYMTAB)? {
            self.symbol_table_index = Some(index);
            self.symbols = symbols;
        }
        if let Some((index, symbols)) = self.decode_symbol_section(SHT_DYNSYM)? {
            self.dynamic_symbol_table_index = Some(index);
            self.dynamic_symbols = symbols;
        }
        Ok(())
    }

    fn decode_dynamic(&mut self) -> Result<()> {
        let Some((_, sh)) = self.first_section_of_type(SHT_DYNAMIC) else {
            return Ok(());
        };
        let (data, class, endian) = (self.data, self.class(), self.endian());
        let record = Dynamic::size(class);
        let stride = Self::stride(&sh, record);
        self.dynamic = decode_table(
            data,
            "dynamic table",
            sh.sh_offset,
            sh.sh_size / stride,
            stride,
            record,
            |off| Dynamic::decode(data, off, class, endian),
        )?;
        Ok(())
    }

    fn decode_notes(&mut self) -> Result<()> {
        let Some((index, sh)) = self.first_section_of_type(SHT_NOTE) else {
            return Ok(());
        };
        self.notes = Note::decode_all(self.section_data(index)?, self.endian(), sh.sh_addralign)?;
        Ok(())
    }

    /// Check a relocation section's links and every entry's symbol index.
    fn check_relocations(
        &self,
        sh: &SectionHeaderFields,
        entries: impl Iterator<Item = RelocationFields>,
    ) -> Result<()> {
        let count = self.section_headers.len();
        if sh.sh_link as usize >= count {
            return Err(ElfError::BadIndex {
                what: "relocation symbol table",
                index: sh.sh_link as usize,
                count,
            });
        }
        if sh.sh_info as usize >= count {
            return Err(ElfError::BadIndex {
                what: "relocation target section",
                index: sh.sh_info as usize,
                count,
            });
        }

        let mut referenced = entries.filter(|r| r.r_sym != 0).peekable();
        if referenced.peek().is_none() {
            return Ok(());
        }
        let symbols = self.symbols_in(sh.sh_link as usize)?;
        for reloc in referenced {
            if reloc.r_sym as usize >= symbols.len() {
                return Err(ElfError::BadIndex {
                    what: "symbol",
                    index: reloc.r_sym as usize,
                    count: symbols.len(),
                });
            }
        }
        Ok(())
    }

    fn decode_relocations(&mut self) -> Result<()> {
        let (data, class, endian) = (self.data, self.class(), self.endian());

        for index in 0..self.section_headers.len() {
            let sh = self.section_headers[index].fields();
            if sh.sh_type != SHT_REL && sh.sh_type != SHT_RELA {
                continue;
            }
            let name = self.section_name(index)?;
            let (symbol_table, target_section) = (sh.sh_link as usize, sh.sh_info as usize);

            if sh.sh_type == SHT_REL {
                let record = Rel::size(class);
                let stride = Self::stride(&sh, record);
                let entries = decode_table(
                    data,
                    "relocation table",
                    sh.sh_offset,
                    sh.sh_size / stride,
                    stride,
                    record,
                    |off| Rel::decode(data, off, class, endian),
                )?;
                self.check_relocations(&sh, entries.iter().map(Rel::fields))?;
                trace!(%name, count = entries.len(), "decoded REL table");
                self.rel_tables.push(RelocationTable {
                    name,
                    section_index: index,
                    symbol_table,
                    target_section,
                    entries,
                });
            } else {
                let record = Rela::size(class);
                let stride = Self::stride(&sh, record);
                let entries = decode_table(
                    data,
                    "relocation table",
                    sh.sh_offset,
                    sh.sh_size / stride,
                    stride,
                    record,
                    |off| Rela::decode(data, off, class, endian),
                )?;
                self.check_relocations(&sh, entries.iter().map(Rela::fields))?;
                trace!(%name, count = entries.len(), "decoded RELA table");
                self.rela_tables.push(RelocationTable {
                    name,
                    section_index: index,
                    symbol_table,
                    target_section,
                    entries,
                });
            }
        }
        Ok(())
    }

    /// Group sections under the segments that contain them: by file offset,
    /// or by address for NOBITS sections, which occupy no file bytes. Index 0
    /// is the null section and is never grouped.
    fn group_sections(&mut self) {
        let sections: Vec<SectionHeaderFields> =
            self.section_headers.iter().map(SectionHeader::fields).collect();

        let mut groups: Vec<SegmentGroup> = self
            .program_headers
            .iter()
            .enumerate()
            .map(|(segment_index, ph)| {
                let ph = ph.fields();
                let file_range = ph.file_range();
                let mem_range = ph.p_vaddr..ph.p_vaddr.saturating_add(ph.p_memsz);
                let members = (1..sections.len())
                    .filter(|&i| {
                        let sh = &sections[i];
                        if sh.sh_type == SHT_NOBITS {
                            sh.sh_addr != 0 && mem_range.contains(&sh.sh_addr)
                        } else {
                            file_range.contains(&sh.sh_offset)
                        }
                    })
                    .collect();
                SegmentGroup { segment_index, sections: members }
            })
            .collect();

        groups.sort_by_key(|g| g.sections.first().copied().unwrap_or(usize::MAX));

        self.ungrouped_sections = (1..sections.len())
            .filter(|i| !groups.iter().any(|g| g.sections.contains(i)))
            .collect();
        self.segment_groups = groups;
    }
}
