use std::fmt;

use hashbrown::HashMap;
use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::Serialize;

use crate::err::{DeserializationError, DeserializationResult};
use crate::model::Record;
use crate::utils::ByteCursor;

pub const SECTION_HEADER_SIZE: usize = 12;

/// The four raw bytes identifying a section, e.g. `b"HDR "`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|b| (0x20..=0x7E).contains(b))
    }

    /// The tag as a string, without the space padding. `b"HDR "` is `"HDR"`.
    pub fn key(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..=0x7E).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub tag: Tag,
    pub section_revision: u16,
    pub container_revision: u16,
    pub length: u32,
}

impl SectionHeader {
    pub fn from_cursor(cursor: &mut ByteCursor) -> DeserializationResult<SectionHeader> {
        let tag = Tag(cursor.array::<4>("section tag")?);
        let section_revision = cursor.u16_named("section revision")?;
        let container_revision = cursor.u16_named("container revision")?;
        let length = cursor.u32_named("section length")?;

        Ok(SectionHeader {
            tag,
            section_revision,
            container_revision,
            length,
        })
    }
}

impl Serialize for SectionHeader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SectionHeader", 4)?;
        s.serialize_field("tag", &self.tag)?;
        s.serialize_field("sectionRevision", &self.section_revision)?;
        s.serialize_field("containerRevision", &self.container_revision)?;
        s.serialize_field("length", &self.length)?;
        s.end()
    }
}

/// A problem with one section that did not stop the decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionDiagnostic {
    Failed(DeserializationError),
    UnconsumedBytes(usize),
}

impl fmt::Display for SectionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionDiagnostic::Failed(e) => write!(f, "{}", e),
            SectionDiagnostic::UnconsumedBytes(n) => {
                write!(f, "did not read all data, {} bytes remaining", n)
            }
        }
    }
}

impl Serialize for SectionDiagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionEntry {
    pub header: SectionHeader,
    /// `None` when the decoder failed before producing anything.
    pub data: Option<Record>,
    pub errors: Vec<SectionDiagnostic>,
}

impl SectionEntry {
    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    pub fn key(&self) -> String {
        self.header.tag.key()
    }

    pub fn is_clean(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }
}

impl Serialize for SectionEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.data.is_some()) + usize::from(!self.errors.is_empty()) + 1;
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("header", &self.header)?;
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        map.end()
    }
}

/// The result of a decode: every recognized section, in file order.
///
/// Entries are addressed by their trimmed tag (`"HDR"`, `"MAP"`, ...). When a tag occurs more
/// than once the later section replaces the earlier one, keeping the earlier position.
#[derive(Debug, Clone, Default)]
pub struct QuestDocument {
    preamble: String,
    entries: Vec<SectionEntry>,
    index: HashMap<String, usize>,
}

impl QuestDocument {
    pub fn new(preamble: impl Into<String>) -> Self {
        QuestDocument {
            preamble: preamble.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn insert(&mut self, entry: SectionEntry) {
        let key = entry.key();
        match self.index.get(&key) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SectionEntry> {
        self.index.get(key.trim()).map(|&idx| &self.entries[idx])
    }

    /// Decoded data of a section, if it produced any.
    pub fn data(&self, key: &str) -> Option<&Record> {
        self.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn entries(&self) -> &[SectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| !e.errors.is_empty())
    }
}

impl PartialEq for QuestDocument {
    fn eq(&self, other: &Self) -> bool {
        self.preamble == other.preamble && self.entries == other.entries
    }
}

impl Serialize for QuestDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key(), entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(tag: &[u8; 4], value: u8) -> SectionEntry {
        SectionEntry {
            header: SectionHeader {
                tag: Tag::new(tag),
                section_revision: 1,
                container_revision: 2,
                length: 3,
            },
            data: Some(Record::new().with("value", value)),
            errors: vec![],
        }
    }

    #[test]
    fn test_parses_section_header() {
        let data = [b'T', b'I', b'L', b'E', 2, 0, 3, 0, 0x10, 0x01, 0, 0];
        let header = SectionHeader::from_cursor(&mut ByteCursor::new(&data)).unwrap();

        assert_eq!(
            header,
            SectionHeader {
                tag: Tag::new(b"TILE"),
                section_revision: 2,
                container_revision: 3,
                length: 0x110,
            }
        );
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::new(b"HDR ").key(), "HDR");
        assert_eq!(Tag::new(b"A\x01\xffB").to_string(), "A\\x01\\xffB");
        assert!(!Tag::new(b"A\x01\xffB").is_printable());
    }

    #[test]
    fn test_later_section_replaces_earlier() {
        let mut doc = QuestDocument::new("AG ZC Enhanced Quest File");
        doc.insert(entry(b"HDR ", 1));
        doc.insert(entry(b"TILE", 2));
        doc.insert(entry(b"HDR ", 3));

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.entries()[0].key(), "HDR");
        assert_eq!(doc.data("HDR ").unwrap().get_u64("value"), Some(3));
    }

    #[test]
    fn test_serializes_diagnostics_as_strings() {
        let mut e = entry(b"MAP ", 0);
        e.data = None;
        e.errors.push(SectionDiagnostic::UnconsumedBytes(4));

        let mut doc = QuestDocument::new("");
        doc.insert(e);

        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"MAP":{"header":{"tag":"MAP ","sectionRevision":1,"containerRevision":2,"length":3},"errors":["did not read all data, 4 bytes remaining"]}}"#
        );
    }
}
