// strtab.rs
//
// String tables: flat buffers of NUL-terminated strings addressed by byte
// offset. The builder interns by exact value so every distinct string is
// stored once.

use crate::error::{ElfError, Result};
use std::collections::HashMap;

/// Read the NUL-terminated string that starts at `offset` in a raw table.
pub fn string_at(table: &[u8], offset: usize) -> Result<String> {
    if offset >= table.len() {
        return Err(ElfError::BadIndex { what: "string table offset", index: offset, count: table.len() });
    }

    let end = table[offset..]
        .iter()
        .position(|&b| b == 0)
        .map(|pos| offset + pos)
        .ok_or_else(|| ElfError::format(format!("unterminated string at offset {offset}")))?;

    Ok(String::from_utf8_lossy(&table[offset..end]).into_owned())
}

/// String table builder that deduplicates strings
#[derive(Debug, Clone)]
pub struct StringTable {
    strings: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// Create a new string table starting with a null byte
    pub fn new() -> Self {
        let mut offsets = HashMap::new();
        offsets.insert(String::new(), 0);
        Self { strings: vec![0], offsets }
    }

    /// Add a string and return its offset
    pub fn add(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }

        let offset = self.strings.len() as u32;
        self.offsets.insert(s.to_string(), offset);
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        offset
    }

    /// Offset of a string that was already added.
    pub fn offset_of(&self, s: &str) -> Option<u32> {
        self.offsets.get(s).copied()
    }

    pub fn data(&self) -> &[u8] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when only the leading null byte is present.
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    pub fn get_string(&self, offset: usize) -> Result<String> {
        string_at(&self.strings, offset)
    }
}
