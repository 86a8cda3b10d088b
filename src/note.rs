// note.rs
//
// Note records: a 12-byte header (name size, descriptor size, type) followed
// by the owner name and the descriptor, each padded to a multiple of 4, or of
// 8 in note sections with 8-byte alignment (e.g. .note.gnu.property).

use crate::codec::{Endian, Reader, Writer, pad_len};
use crate::error::{ElfError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Owner name without its terminating NUL, e.g. "GNU".
    pub name: String,
    pub n_type: u32,
    pub desc: Vec<u8>,
}

impl Note {
    pub const HEADER_SIZE: usize = 12;

    /// Encoded size including padding.
    pub fn size(&self) -> usize {
        let namesz = self.name.len() + 1;
        Self::HEADER_SIZE + namesz + pad_len(namesz, 4) + self.desc.len() + pad_len(self.desc.len(), 4)
    }

    pub fn write(&self, w: &mut Writer) {
        let start = w.len();
        w.u32(self.name.len() as u32 + 1);
        w.u32(self.desc.len() as u32);
        w.u32(self.n_type);
        w.bytes(self.name.as_bytes());
        w.u8(0);
        w.bytes(&vec![0; pad_len(self.name.len() + 1, 4)]);
        w.bytes(&self.desc);
        w.bytes(&vec![0; pad_len(self.desc.len(), 4)]);
        debug_assert_eq!(w.len() - start, self.size());
    }

    pub fn encode(&self, endian: Endian) -> Vec<u8> {
        let mut w = Writer::with_capacity(endian, self.size());
        self.write(&mut w);
        w.into_bytes()
    }

    /// Decode one note at `offset` whose fields are padded to `align`,
    /// returning it with the offset of the next record.
    pub fn decode(data: &[u8], offset: usize, endian: Endian, align: usize) -> Result<(Self, usize)> {
        let mut r = Reader::new(data, offset, endian);
        let namesz = r.u32()? as usize;
        let descsz = r.u32()? as usize;
        let n_type = r.u32()?;

        let name_bytes = r.bytes(namesz)?;
        r.skip(pad_len(namesz, align));
        let desc = r.bytes(descsz)?.to_vec();
        r.skip(pad_len(descsz, align));

        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        let name = String::from_utf8_lossy(&name_bytes[..name_end]).into_owned();

        Ok((Note { name, n_type, desc }, r.position()))
    }

    /// Decode every note in a note section's contents. `section_align` is
    /// the section's `sh_addralign`; only 8 changes the 4-byte padding.
    pub fn decode_all(data: &[u8], endian: Endian, section_align: u64) -> Result<Vec<Self>> {
        let align = if section_align == 8 { 8 } else { 4 };
        let mut notes = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            if data.len() - offset < Self::HEADER_SIZE {
                return Err(ElfError::format(format!(
                    "{} trailing bytes after the last note",
                    data.len() - offset
                )));
            }
            let (note, next) = Self::decode(data, offset, endian, align)?;
            notes.push(note);
            offset = next;
        }
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_id() -> Note {
        Note { name: "GNU".to_string(), n_type: 3, desc: vec![0xde, 0xad, 0xbe, 0xef, 0x01] }
    }

    #[test]
    fn test_padding() {
        let note = build_id();
        let bytes = note.encode(Endian::Little);
        assert_eq!(bytes.len(), 12 + 4 + 8);
        assert_eq!(note.size(), bytes.len());
        assert_eq!(&bytes[12..16], b"GNU\0");
        assert_eq!(&bytes[0..4], &4u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
    }

    #[test]
    fn test_decode_sequence() {
        let first = build_id();
        let second = Note { name: "Go".to_string(), n_type: 4, desc: vec![] };
        let mut w = Writer::new(Endian::Big);
        first.write(&mut w);
        second.write(&mut w);
        let bytes = w.into_bytes();

        let notes = Note::decode_all(&bytes, Endian::Big, 4).unwrap();
        assert_eq!(notes, vec![first, second]);
    }

    #[test]
    fn test_eight_byte_aligned_section() {
        // two GNU property notes as laid out in a 64-bit .note.gnu.property
        let mut w = Writer::new(Endian::Little);
        for desc in [[1u8; 12], [2u8; 12]] {
            w.u32(4);
            w.u32(12);
            w.u32(5);
            w.bytes(b"GNU\0");
            w.bytes(&desc);
            w.bytes(&[0; 4]);
        }
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 64);

        let notes = Note::decode_all(&bytes, Endian::Little, 8).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].name, "GNU");
        assert_eq!(notes[1].n_type, 5);
        assert_eq!(notes[1].desc, vec![2u8; 12]);

        // the same bytes read with 4-byte padding lose the second record
        assert!(Note::decode_all(&bytes, Endian::Little, 4).is_err());
    }

    #[test]
    fn test_truncated_descriptor() {
        let mut bytes = build_id().encode(Endian::Little);
        bytes.truncate(18);
        assert!(Note::decode_all(&bytes, Endian::Little, 4).unwrap_err().is_format());
    }
}
