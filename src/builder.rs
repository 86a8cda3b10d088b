// builder.rs
//
// Object file generation. Sections, symbols and relocations accumulate in an
// ElfBuilder; finish() appends the symbol and string tables, assigns
// sections to segments (executables only), lays out the file and returns the
// complete image.
//
// Sections, symbols and relocation tables refer to each other by name or by
// SectionId. Nothing is resolved to a final header index until finish(),
// because the final order is only known once every section exists.

use crate::codec::{Writer, align_up};
use crate::config::BuildConfig;
use crate::consts::*;
use crate::dynamic::Dynamic;
use crate::error::{ElfError, Result};
use crate::header::{FileHeader, FileHeaderFields};
use crate::ident::{Class, Ident};
use crate::program_header::{ProgramHeader, ProgramHeaderFields};
use crate::relocation::{Rel, Rela, RelocationFields};
use crate::section_header::{SectionHeader, SectionHeaderFields};
use crate::strtab::StringTable;
use crate::symbol::{Symbol, SymbolFields, make_st_info};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

// ============================================================================
// Sections
// ============================================================================

/// Handle to a section inside one builder. This is the creation index, not
/// the section header index in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

impl SectionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a section's sh_info field holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionInfo {
    None,
    /// Header index of the named section, resolved when the file is written
    Section(String),
    Value(u32),
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addralign: u64,
    pub entsize: u64,
    /// Name of the section sh_link refers to
    pub link: Option<String>,
    pub info: SectionInfo,
    data: Vec<u8>,
    nobits_size: u64,
}

impl Section {
    fn new(name: &str, sh_type: u32, flags: u64, class: Class) -> Self {
        let (addralign, entsize) = match sh_type {
            SHT_SYMTAB | SHT_DYNSYM => (class.word_size(), Symbol::size(class) as u64),
            SHT_REL => (class.word_size(), Rel::size(class) as u64),
            SHT_RELA => (class.word_size(), Rela::size(class) as u64),
            SHT_DYNAMIC => (class.word_size(), Dynamic::size(class) as u64),
            _ => (1, 0),
        };
        Self {
            name: name.to_string(),
            sh_type,
            flags,
            addralign,
            entsize,
            link: None,
            info: SectionInfo::None,
            data: Vec::new(),
            nobits_size: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_nobits(&self) -> bool {
        self.sh_type == SHT_NOBITS
    }

    /// Size in memory (sh_size).
    pub fn size(&self) -> u64 {
        if self.is_nobits() { self.nobits_size } else { self.data.len() as u64 }
    }

    /// Bytes the section occupies in the file.
    pub fn file_size(&self) -> u64 {
        if self.is_nobits() { 0 } else { self.data.len() as u64 }
    }

    fn segment_kind(&self) -> Option<SegmentKind> {
        let alloc = self.flags & SHF_ALLOC != 0;
        let write = self.flags & SHF_WRITE != 0;
        let exec = self.flags & SHF_EXECINSTR != 0;
        match self.sh_type {
            SHT_PROGBITS if exec => Some(SegmentKind::Text),
            SHT_PROGBITS | SHT_NOBITS if alloc && write => Some(SegmentKind::Data),
            SHT_PROGBITS if alloc => Some(SegmentKind::ReadOnly),
            _ => None,
        }
    }
}

// ============================================================================
// Symbols
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Local,
    Global,
    Weak,
}

impl Binding {
    pub fn code(self) -> u8 {
        match self {
            Binding::Local => STB_LOCAL,
            Binding::Global => STB_GLOBAL,
            Binding::Weak => STB_WEAK,
        }
    }
}

/// Where a symbol is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSection {
    Undefined,
    Absolute,
    Common,
    Section(SectionId),
}

impl From<SectionId> for SymbolSection {
    fn from(id: SectionId) -> Self {
        SymbolSection::Section(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSymbol {
    pub name: String,
    pub binding: Binding,
    pub sym_type: u8,
    pub visibility: u8,
    pub section: SymbolSection,
    /// Offset within the section; finish() turns it into an address for
    /// executables
    pub value: u64,
    pub size: u64,
}

impl BuilderSymbol {
    pub fn new(name: &str, binding: Binding, section: SymbolSection, value: u64) -> Self {
        Self {
            name: name.to_string(),
            binding,
            sym_type: STT_NOTYPE,
            visibility: STV_DEFAULT,
            section,
            value,
            size: 0,
        }
    }

    fn null() -> Self {
        Self::new("", Binding::Local, SymbolSection::Undefined, 0)
    }

    pub fn is_local(&self) -> bool {
        self.binding == Binding::Local
    }
}

/// Symbol table under construction. Entry 0 is the null symbol and local
/// symbols always form a contiguous prefix, so `local_count` is the value
/// written to the table's sh_info.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: Vec<BuilderSymbol>,
    local_count: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { entries: vec![BuilderSymbol::null()], local_count: 1 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when only the null symbol is present.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Number of local entries, including the null symbol.
    pub fn local_count(&self) -> usize {
        self.local_count
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuilderSymbol> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&BuilderSymbol> {
        self.entries.get(index)
    }

    /// Index of the named symbol. Unnamed entries never match.
    pub fn find(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.entries.iter().position(|sym| sym.name == name)
    }

    /// Return the index of `name`, appending an undefined global for it if
    /// it is not in the table yet.
    pub fn get_or_create(&mut self, name: &str, section: SymbolSection) -> usize {
        match self.find(name) {
            Some(index) => index,
            None => self.insert(BuilderSymbol::new(name, Binding::Global, section, 0)),
        }
    }

    /// Add `symbol`, replacing any existing entry with the same name.
    pub fn define(&mut self, symbol: BuilderSymbol) -> usize {
        match self.find(&symbol.name) {
            Some(index) => self.replace(index, symbol),
            None => self.insert(symbol),
        }
    }

    /// Apply `f` to the named symbol. Returns the symbol's (possibly new)
    /// index, or None when the name is unknown.
    pub fn update<F: FnOnce(&mut BuilderSymbol)>(&mut self, name: &str, f: F) -> Option<usize> {
        let index = self.find(name)?;
        let mut symbol = self.entries[index].clone();
        f(&mut symbol);
        Some(self.replace(index, symbol))
    }

    fn replace(&mut self, index: usize, symbol: BuilderSymbol) -> usize {
        if symbol.is_local() == self.entries[index].is_local() {
            self.entries[index] = symbol;
            return index;
        }

        let old = self.entries.remove(index);
        if old.is_local() {
            self.local_count -= 1;
        }
        self.insert(symbol)
    }

    fn insert(&mut self, symbol: BuilderSymbol) -> usize {
        if symbol.is_local() {
            let index = self.local_count;
            self.entries.insert(index, symbol);
            self.local_count += 1;
            index
        } else {
            self.entries.push(symbol);
            self.entries.len() - 1
        }
    }
}

// ============================================================================
// Relocations and segments
// ============================================================================

#[derive(Debug, Clone)]
struct PendingRelocation {
    offset: u64,
    symbol: String,
    r_type: u32,
    addend: Option<i64>,
}

#[derive(Debug, Clone)]
struct RelocationTableBuilder {
    /// Section whose contents the entries patch
    target: SectionId,
    /// The .rel/.rela section holding the entries
    section: SectionId,
    with_addend: bool,
    entries: Vec<PendingRelocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Text,
    Data,
    ReadOnly,
}

impl SegmentKind {
    const ORDER: [SegmentKind; 3] = [SegmentKind::Text, SegmentKind::Data, SegmentKind::ReadOnly];

    fn flags(self) -> u32 {
        match self {
            SegmentKind::Text => PF_R | PF_X,
            SegmentKind::Data => PF_R | PF_W,
            SegmentKind::ReadOnly => PF_R,
        }
    }
}

#[derive(Debug)]
struct SegmentPlan {
    kind: SegmentKind,
    sections: Vec<SectionId>,
}

// ============================================================================
// ELF Builder
// ============================================================================

pub struct ElfBuilder {
    config: BuildConfig,
    sections: Vec<Section>,
    section_ids: HashMap<String, SectionId>,
    section_names: StringTable,
    symbol_names: StringTable,
    symbols: SymbolTable,
    relocations: Vec<RelocationTableBuilder>,
    entry_symbol: Option<String>,
}

impl ElfBuilder {
    pub fn new(config: BuildConfig) -> Result<Self> {
        if config.class == Class::None {
            return Err(ElfError::BuilderConfig("file class must be 32-bit or 64-bit".to_string()));
        }
        if config.class == Class::Elf32 && config.base_address > u32::MAX as u64 {
            return Err(ElfError::BuilderConfig(format!(
                "base address {:#x} does not fit a 32-bit object",
                config.base_address
            )));
        }
        if config.segment_align > 1 && !config.segment_align.is_power_of_two() {
            return Err(ElfError::BuilderConfig(format!(
                "segment alignment {:#x} is not a power of two",
                config.segment_align
            )));
        }
        checked_align(config.base_address, config.segment_align, "base address")?;

        debug!(class = config.class.name(), kind = ?config.kind, machine = config.machine, "new builder");
        Ok(Self {
            config,
            sections: Vec::new(),
            section_ids: HashMap::new(),
            section_names: StringTable::new(),
            symbol_names: StringTable::new(),
            symbols: SymbolTable::new(),
            relocations: Vec::new(),
            entry_symbol: None,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Open (or fetch) a section with no link or info.
    pub fn section(&mut self, name: &str, sh_type: u32, flags: u64) -> SectionId {
        self.open_section(name, sh_type, flags, None, None)
    }

    /// Open a section by name. A name that already exists returns the
    /// existing section unchanged.
    pub fn open_section(
        &mut self,
        name: &str,
        sh_type: u32,
        flags: u64,
        link: Option<&str>,
        info: Option<&str>,
    ) -> SectionId {
        if let Some(&id) = self.section_ids.get(name) {
            return id;
        }

        let id = SectionId(self.sections.len());
        let mut section = Section::new(name, sh_type, flags, self.config.class);
        section.link = link.map(str::to_string);
        if let Some(info) = info {
            section.info = SectionInfo::Section(info.to_string());
        }

        self.section_names.add(name);
        self.sections.push(section);
        self.section_ids.insert(name.to_string(), id);
        debug!(name, sh_type, flags, id = id.0, "opened section");
        id
    }

    pub fn text(&mut self) -> SectionId {
        let id = self.section(".text", SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR);
        self.raise_alignment(id, 16);
        id
    }

    pub fn data(&mut self) -> SectionId {
        let id = self.section(".data", SHT_PROGBITS, SHF_ALLOC | SHF_WRITE);
        self.raise_alignment(id, self.config.class.word_size());
        id
    }

    pub fn rodata(&mut self) -> SectionId {
        let id = self.section(".rodata", SHT_PROGBITS, SHF_ALLOC);
        self.raise_alignment(id, self.config.class.word_size());
        id
    }

    pub fn bss(&mut self) -> SectionId {
        let id = self.section(".bss", SHT_NOBITS, SHF_ALLOC | SHF_WRITE);
        self.raise_alignment(id, self.config.class.word_size());
        id
    }

    fn raise_alignment(&mut self, id: SectionId, align: u64) {
        let section = &mut self.sections[id.0];
        section.addralign = section.addralign.max(align);
    }

    pub fn section_id(&self, name: &str) -> Option<SectionId> {
        self.section_ids.get(name).copied()
    }

    pub fn get_section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn section_mut(&mut self, id: SectionId) -> Result<&mut Section> {
        let count = self.sections.len();
        self.sections
            .get_mut(id.0)
            .ok_or(ElfError::BadIndex { what: "section id", index: id.0, count })
    }

    /// Append raw bytes and return the offset they start at. For NOBITS
    /// sections only the length counts.
    pub fn append(&mut self, id: SectionId, bytes: &[u8]) -> Result<u64> {
        let section = self.section_mut(id)?;
        let offset = section.size();
        if section.is_nobits() {
            section.nobits_size = grow(section.nobits_size, bytes.len() as u64, "section size")?;
        } else {
            section.data.extend_from_slice(bytes);
        }
        trace!(section = %section.name, offset, len = bytes.len(), "append");
        Ok(offset)
    }

    /// Reserve `size` zero bytes, the usual way to grow a NOBITS section.
    pub fn reserve(&mut self, id: SectionId, size: u64) -> Result<u64> {
        let section = self.section_mut(id)?;
        let offset = section.size();
        if section.is_nobits() {
            section.nobits_size = grow(section.nobits_size, size, "section size")?;
        } else {
            let len = usize::try_from(size)
                .map_err(|_| ElfError::BuilderConfig(format!("cannot reserve {size:#x} bytes")))?;
            section.data.resize(section.data.len() + len, 0);
        }
        Ok(offset)
    }

    /// Pad the section with zeros until its size is a multiple of `align`.
    pub fn align_section(&mut self, id: SectionId, align: u64) -> Result<u64> {
        let size = self.section_mut(id)?.size();
        let aligned = checked_align(size, align, "section size")?;
        self.reserve(id, aligned - size)
    }

    pub fn set_alignment(&mut self, id: SectionId, align: u64) -> Result<()> {
        if align > 1 && !align.is_power_of_two() {
            return Err(ElfError::BuilderConfig(format!("section alignment {align:#x} is not a power of two")));
        }
        self.section_mut(id)?.addralign = align;
        Ok(())
    }

    pub fn set_entry_size(&mut self, id: SectionId, entsize: u64) -> Result<()> {
        self.section_mut(id)?.entsize = entsize;
        Ok(())
    }

    /// Intern a string into the symbol string table.
    pub fn add_string(&mut self, s: &str) -> u32 {
        self.symbol_names.add(s)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbol_index(&self, name: &str) -> Option<usize> {
        self.symbols.find(name)
    }

    /// Declare (or redeclare) a symbol at `value` within `section`.
    pub fn declare_symbol(
        &mut self,
        name: &str,
        binding: Binding,
        section: impl Into<SymbolSection>,
        value: u64,
    ) -> usize {
        let section = section.into();
        let index = match self.symbols.find(name) {
            // keep the type and size a relocation or an earlier declaration set
            Some(_) => self
                .symbols
                .update(name, |sym| {
                    sym.binding = binding;
                    sym.section = section;
                    sym.value = value;
                })
                .unwrap_or(0),
            None => self.symbols.define(BuilderSymbol::new(name, binding, section, value)),
        };
        trace!(name, ?binding, ?section, value, index, "declared symbol");
        index
    }

    /// Add a local STT_FILE symbol naming the source file.
    pub fn add_file_symbol(&mut self, name: &str) -> usize {
        let mut symbol = BuilderSymbol::new(name, Binding::Local, SymbolSection::Absolute, 0);
        symbol.sym_type = STT_FILE;
        self.symbols.define(symbol)
    }

    pub fn set_symbol_type(&mut self, name: &str, sym_type: u8) -> Result<()> {
        self.symbols
            .update(name, |sym| sym.sym_type = sym_type)
            .map(|_| ())
            .ok_or_else(|| ElfError::builder_state(format!("symbol `{name}` was never declared")))
    }

    pub fn set_symbol_size(&mut self, name: &str, size: u64) -> Result<()> {
        self.symbols
            .update(name, |sym| sym.size = size)
            .map(|_| ())
            .ok_or_else(|| ElfError::builder_state(format!("symbol `{name}` was never declared")))
    }

    pub fn set_symbol_visibility(&mut self, name: &str, visibility: u8) -> Result<()> {
        self.symbols
            .update(name, |sym| sym.visibility = visibility)
            .map(|_| ())
            .ok_or_else(|| ElfError::builder_state(format!("symbol `{name}` was never declared")))
    }

    /// Use the named symbol's address as the entry point instead of the
    /// start of the executable segment.
    pub fn set_entry_symbol(&mut self, name: &str) {
        self.entry_symbol = Some(name.to_string());
    }

    /// Record a relocation against `symbol` at `offset` in `target`. An
    /// empty symbol name means "no symbol" (index 0). Entries with an addend
    /// go to `.rela<target>`, the others to `.rel<target>`.
    pub fn add_relocation(
        &mut self,
        target: SectionId,
        offset: u64,
        symbol: &str,
        r_type: u32,
        addend: Option<i64>,
    ) -> Result<()> {
        let target_name = self.section_mut(target)?.name.clone();
        let with_addend = addend.is_some();

        let position = self
            .relocations
            .iter()
            .position(|table| table.target == target && table.with_addend == with_addend);
        let position = match position {
            Some(position) => position,
            None => {
                let (prefix, sh_type) = if with_addend { (".rela", SHT_RELA) } else { (".rel", SHT_REL) };
                let name = format!("{prefix}{target_name}");
                let section = self.open_section(&name, sh_type, SHF_INFO_LINK, Some(".symtab"), Some(&target_name));
                self.relocations.push(RelocationTableBuilder { target, section, with_addend, entries: Vec::new() });
                self.relocations.len() - 1
            }
        };

        if !symbol.is_empty() {
            self.symbols.get_or_create(symbol, SymbolSection::Undefined);
        }

        trace!(section = %target_name, offset, symbol, r_type, ?addend, "relocation");
        self.relocations[position].entries.push(PendingRelocation {
            offset,
            symbol: symbol.to_string(),
            r_type,
            addend,
        });
        Ok(())
    }

    /// Final section order. Executables group sections by segment, in
    /// segment order, with NOBITS sections last in the data segment;
    /// everything else keeps creation order.
    fn plan_layout(&self) -> (Vec<SectionId>, Vec<SegmentPlan>) {
        let all: Vec<SectionId> = (0..self.sections.len()).map(SectionId).collect();
        if !self.config.is_executable() {
            return (all, Vec::new());
        }

        let mut plans = Vec::new();
        let mut order = Vec::with_capacity(all.len());
        for kind in SegmentKind::ORDER {
            let mut members: Vec<SectionId> =
                all.iter().copied().filter(|id| self.sections[id.0].segment_kind() == Some(kind)).collect();
            members.sort_by_key(|id| self.sections[id.0].is_nobits());
            if members.is_empty() {
                continue;
            }
            debug!(?kind, sections = members.len(), "assigned segment");
            order.extend_from_slice(&members);
            plans.push(SegmentPlan { kind, sections: members });
        }
        order.extend(all.iter().copied().filter(|id| self.sections[id.0].segment_kind().is_none()));
        (order, plans)
    }

    /// Lay out and encode the whole file.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let class = self.config.class;
        let endian = self.config.endian;
        let executable = self.config.is_executable();

        // symbol and section names must all be interned before the string
        // table sizes are fixed
        for sym in self.symbols.iter() {
            self.symbol_names.add(&sym.name);
        }
        let symtab = self.open_section(".symtab", SHT_SYMTAB, 0, Some(".strtab"), None);
        let strtab = self.open_section(".strtab", SHT_STRTAB, 0, None, None);
        let shstrtab = self.open_section(".shstrtab", SHT_STRTAB, 0, None, None);

        self.sections[symtab.0].info = SectionInfo::Value(self.symbols.local_count() as u32);
        self.sections[symtab.0].data = vec![0; self.symbols.len() * Symbol::size(class)];
        self.sections[strtab.0].data = self.symbol_names.data().to_vec();
        self.sections[shstrtab.0].data = self.section_names.data().to_vec();
        for table in &self.relocations {
            let entry_size = if table.with_addend { Rela::size(class) } else { Rel::size(class) };
            self.sections[table.section.0].data = vec![0; table.entries.len() * entry_size];
        }

        let (order, plans) = self.plan_layout();
        let mut final_index = vec![0usize; self.sections.len()];
        for (position, id) in order.iter().enumerate() {
            final_index[id.0] = position + 1;
        }
        let shnum = order.len() + 1;
        if shnum >= SHN_LORESERVE as usize {
            return Err(ElfError::builder_state(format!("{shnum} sections exceed the section index range")));
        }

        // File offsets: header, program headers, section contents, then the
        // section header table.
        let ehsize = FileHeader::size(class) as u64;
        let phentsize = ProgramHeader::size(class) as u64;
        let shentsize = SectionHeader::size(class) as u64;
        let phnum = if executable { plans.len() + 1 } else { 0 };
        let phoff = if phnum > 0 { ehsize } else { 0 };

        let mut offsets = vec![0u64; self.sections.len()];
        let mut cursor = ehsize + phnum as u64 * phentsize;
        for id in &order {
            let section = &self.sections[id.0];
            cursor = checked_align(cursor, section.addralign, "file offset")?;
            offsets[id.0] = cursor;
            cursor = grow(cursor, section.file_size(), "file offset")?;
        }
        let shoff = checked_align(cursor, class.word_size(), "file offset")?;
        let file_size = grow(shoff, shnum as u64 * shentsize, "file size")?;

        // Addresses: segments follow each other from the base address, each
        // starting at the next aligned address plus its file offset residue.
        let mut addrs = vec![0u64; self.sections.len()];
        let mut program_headers = Vec::with_capacity(phnum);
        let mut entry = 0;
        if executable {
            let phdr_size = phnum as u64 * phentsize;
            let phdr_align = class.word_size();
            let phdr_vaddr = grow(
                checked_align(self.config.base_address, phdr_align, "base address")?,
                phoff % phdr_align,
                "base address",
            )?;
            program_headers.push(ProgramHeaderFields {
                p_type: PT_PHDR,
                p_flags: PF_R,
                p_offset: phoff,
                p_vaddr: phdr_vaddr,
                p_paddr: phdr_vaddr,
                p_filesz: phdr_size,
                p_memsz: phdr_size,
                p_align: phdr_align,
            });

            let align = self.config.segment_align.max(1);
            let mut running = grow(phdr_vaddr, phdr_size, "segment address")?;
            for plan in &plans {
                let offset = offsets[plan.sections[0].0];
                let vaddr = grow(checked_align(running, align, "segment address")?, offset % align, "segment address")?;
                let mut mem_end = vaddr;
                let mut file_end = offset;
                for id in &plan.sections {
                    let section = &self.sections[id.0];
                    let addr = if section.is_nobits() {
                        checked_align(mem_end, section.addralign, "section address")?
                    } else {
                        file_end = offsets[id.0] + section.file_size();
                        grow(vaddr, offsets[id.0] - offset, "section address")?
                    };
                    addrs[id.0] = addr;
                    mem_end = mem_end.max(grow(addr, section.size(), "section address")?);
                }

                if plan.kind == SegmentKind::Text {
                    entry = vaddr;
                }
                program_headers.push(ProgramHeaderFields {
                    p_type: PT_LOAD,
                    p_flags: plan.kind.flags(),
                    p_offset: offset,
                    p_vaddr: vaddr,
                    p_paddr: vaddr,
                    p_filesz: file_end - offset,
                    p_memsz: mem_end - vaddr,
                    p_align: align,
                });
                debug!(?plan.kind, offset, vaddr, filesz = file_end - offset, memsz = mem_end - vaddr, "segment");
                running = mem_end;
            }
        }

        let symbol_value = |sym: &BuilderSymbol| match sym.section {
            SymbolSection::Section(id) if executable => grow(addrs[id.0], sym.value, "symbol value"),
            _ => Ok(sym.value),
        };

        if let Some(name) = &self.entry_symbol {
            let sym = self
                .symbols
                .find(name)
                .and_then(|index| self.symbols.get(index))
                .filter(|sym| sym.section != SymbolSection::Undefined)
                .ok_or_else(|| ElfError::builder_state(format!("entry symbol `{name}` is not defined")))?;
            entry = symbol_value(sym)?;
        }

        // Encode the symbol table now that values and indices are final.
        let mut w = Writer::with_capacity(endian, self.sections[symtab.0].data.len());
        for sym in self.symbols.iter() {
            let st_name = self
                .symbol_names
                .offset_of(&sym.name)
                .ok_or_else(|| ElfError::builder_state(format!("symbol name `{}` was never interned", sym.name)))?;
            let st_shndx = match sym.section {
                SymbolSection::Undefined => SHN_UNDEF,
                SymbolSection::Absolute => SHN_ABS,
                SymbolSection::Common => SHN_COMMON,
                SymbolSection::Section(id) => match final_index.get(id.0) {
                    Some(&index) => index as u16,
                    None => {
                        return Err(ElfError::builder_state(format!(
                            "symbol `{}` refers to unknown section {}",
                            sym.name, id.0
                        )));
                    }
                },
            };
            let value = symbol_value(sym)?;
            check_width(class, value, "symbol value")?;
            let fields = SymbolFields {
                st_name,
                st_value: value,
                st_size: sym.size,
                st_info: make_st_info(sym.binding.code(), sym.sym_type),
                st_other: sym.visibility,
                st_shndx,
            };
            Symbol::from_fields(class, &fields).write(&mut w);
        }
        self.sections[symtab.0].data = w.into_bytes();

        for table in &self.relocations {
            // executables record addresses, relocatable objects section offsets
            let base = if executable { addrs[table.target.0] } else { 0 };
            let mut w = Writer::with_capacity(endian, self.sections[table.section.0].data.len());
            for entry in &table.entries {
                let r_sym = if entry.symbol.is_empty() {
                    0
                } else {
                    self.symbols.find(&entry.symbol).ok_or_else(|| {
                        ElfError::builder_state(format!("relocation symbol `{}` was never registered", entry.symbol))
                    })? as u32
                };
                let fields = RelocationFields {
                    r_offset: grow(base, entry.offset, "relocation offset")?,
                    r_sym,
                    r_type: entry.r_type,
                    r_addend: entry.addend.unwrap_or(0),
                };
                check_width(class, fields.r_offset, "relocation offset")?;
                if table.with_addend {
                    Rela::from_fields(class, &fields).write(&mut w);
                } else {
                    Rel::from_fields(class, &fields).write(&mut w);
                }
            }
            self.sections[table.section.0].data = w.into_bytes();
        }

        // Section headers, with link and info names resolved to indices.
        let resolve = |name: &str, from: &str| -> Result<u32> {
            self.section_ids
                .get(name)
                .map(|id| final_index[id.0] as u32)
                .ok_or_else(|| ElfError::builder_state(format!("section `{from}` refers to missing section `{name}`")))
        };
        let mut section_headers = Vec::with_capacity(shnum);
        section_headers.push(SectionHeaderFields::default());
        for id in &order {
            let section = &self.sections[id.0];
            let sh_name = self.section_names.offset_of(&section.name).ok_or_else(|| {
                ElfError::builder_state(format!("section name `{}` was never interned", section.name))
            })?;
            let sh_link = match &section.link {
                Some(name) => resolve(name, &section.name)?,
                None => 0,
            };
            let sh_info = match &section.info {
                SectionInfo::None => 0,
                SectionInfo::Value(value) => *value,
                SectionInfo::Section(name) => resolve(name, &section.name)?,
            };
            check_width(class, grow(addrs[id.0], section.size(), "section address")?, "section address")?;
            trace!(name = %section.name, index = final_index[id.0], offset = offsets[id.0], addr = addrs[id.0], "section header");
            section_headers.push(SectionHeaderFields {
                sh_name,
                sh_type: section.sh_type,
                sh_flags: section.flags,
                sh_addr: addrs[id.0],
                sh_offset: offsets[id.0],
                sh_size: section.size(),
                sh_link,
                sh_info,
                sh_addralign: section.addralign,
                sh_entsize: section.entsize,
            });
        }

        check_width(class, file_size, "file size")?;
        check_width(class, entry, "entry point")?;

        let mut header = FileHeaderFields::empty(class);
        header.e_type = self.config.kind.e_type();
        header.e_machine = self.config.machine;
        header.e_entry = entry;
        header.e_phoff = phoff;
        header.e_shoff = shoff;
        header.e_flags = self.config.flags;
        header.e_phnum = phnum as u16;
        header.e_shnum = shnum as u16;
        header.e_shstrndx = final_index[shstrtab.0] as u16;

        let mut ident = Ident::new(class, endian);
        ident.os_abi = self.config.os_abi;

        let capacity = usize::try_from(file_size)
            .map_err(|_| ElfError::BuilderConfig(format!("file size {file_size:#x} is too large")))?;
        let mut w = Writer::with_capacity(endian, capacity);
        FileHeader::from_fields(ident, &header).write(&mut w);
        for ph in &program_headers {
            ProgramHeader::from_fields(class, ph).write(&mut w);
        }
        for id in &order {
            let section = &self.sections[id.0];
            w.pad_to(section.addralign);
            debug_assert_eq!(w.len() as u64, offsets[id.0]);
            if !section.is_nobits() {
                w.bytes(&section.data);
            }
        }
        w.pad_to(class.word_size());
        debug_assert_eq!(w.len() as u64, shoff);
        for sh in &section_headers {
            SectionHeader::from_fields(class, sh).write(&mut w);
        }

        debug!(
            size = w.len(),
            sections = shnum,
            segments = phnum,
            symbols = self.symbols.len(),
            entry,
            "finished object"
        );
        Ok(w.into_bytes())
    }
}

/// `value + by`, failing when the sum leaves the 64-bit address space.
fn grow(value: u64, by: u64, what: &str) -> Result<u64> {
    value
        .checked_add(by)
        .ok_or_else(|| ElfError::BuilderConfig(format!("{what} {value:#x} + {by:#x} overflows")))
}

fn checked_align(value: u64, align: u64, what: &str) -> Result<u64> {
    align_up(value, align)
        .ok_or_else(|| ElfError::BuilderConfig(format!("{what} {value:#x} cannot be aligned to {align:#x}")))
}

fn check_width(class: Class, value: u64, what: &str) -> Result<()> {
    if class == Class::Elf32 && value > u32::MAX as u64 {
        return Err(ElfError::BuilderConfig(format!("{what} {value:#x} does not fit a 32-bit object")));
    }
    Ok(())
}

/// Conventional object file name for a source file: `prog.s` -> `prog.o`.
pub fn output_file_name(source: &str) -> String {
    Path::new(source).with_extension("o").to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(name: &str) -> BuilderSymbol {
        BuilderSymbol::new(name, Binding::Global, SymbolSection::Undefined, 0)
    }

    fn local(name: &str) -> BuilderSymbol {
        BuilderSymbol::new(name, Binding::Local, SymbolSection::Absolute, 0)
    }

    #[test]
    fn test_symbol_table_starts_with_null() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), 1);
        assert!(table.is_empty());
        assert_eq!(table.local_count(), 1);
        assert_eq!(table.find(""), None);
    }

    #[test]
    fn test_locals_inserted_before_globals() {
        let mut table = SymbolTable::new();
        table.define(global("a"));
        table.define(global("b"));
        let index = table.define(local("c"));
        assert_eq!(index, 1);
        assert_eq!(table.local_count(), 2);
        let names: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["", "c", "a", "b"]);
    }

    #[test]
    fn test_binding_change_moves_symbol() {
        let mut table = SymbolTable::new();
        table.define(local("x"));
        table.define(global("y"));
        let index = table.update("x", |sym| sym.binding = Binding::Global).unwrap();
        assert_eq!(index, 2);
        assert_eq!(table.local_count(), 1);
        assert_eq!(table.find("y"), Some(1));

        let index = table.update("y", |sym| sym.binding = Binding::Local).unwrap();
        assert_eq!(index, 1);
        assert_eq!(table.local_count(), 2);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut table = SymbolTable::new();
        let first = table.get_or_create("puts", SymbolSection::Undefined);
        let second = table.get_or_create("puts", SymbolSection::Undefined);
        assert_eq!(first, second);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(first).unwrap().binding, Binding::Global);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("prog.s"), "prog.o");
        assert_eq!(output_file_name("dir/prog"), "dir/prog.o");
        assert_eq!(output_file_name("prog.o"), "prog.o");
    }

    #[test]
    fn test_rejects_class_none() {
        let config = BuildConfig::default().with_class(Class::None);
        assert!(matches!(ElfBuilder::new(config), Err(ElfError::BuilderConfig(_))));
    }

    #[test]
    fn test_rejects_bad_alignment() {
        let config = BuildConfig::default().with_segment_align(0x1800);
        assert!(matches!(ElfBuilder::new(config), Err(ElfError::BuilderConfig(_))));

        let mut builder = ElfBuilder::new(BuildConfig::default()).unwrap();
        let text = builder.text();
        assert!(builder.set_alignment(text, 3).is_err());
        assert!(builder.set_alignment(text, 32).is_ok());
    }
}
