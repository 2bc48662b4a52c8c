#![allow(dead_code)]
use std::io::Write;
use std::sync::Once;

use tempfile::NamedTempFile;

static LOGGER_INIT: Once = Once::new();

pub const ENHANCED_PREAMBLE: &str = "AG ZC Enhanced Quest File";

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

/// Builds synthetic quest containers section by section.
pub struct QuestBuilder {
    bytes: Vec<u8>,
}

impl QuestBuilder {
    pub fn new() -> Self {
        QuestBuilder::with_preamble(ENHANCED_PREAMBLE)
    }

    pub fn with_preamble(preamble: &str) -> Self {
        let mut bytes = preamble.as_bytes().to_vec();
        bytes.push(b'\n');
        QuestBuilder { bytes }
    }

    pub fn section(self, tag: &[u8; 4], revision: u16, payload: &[u8]) -> Self {
        self.section_with_length(tag, revision, payload.len() as u32, payload)
    }

    /// A section whose declared length need not match its payload.
    pub fn section_with_length(mut self, tag: &[u8; 4], revision: u16, length: u32, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(tag);
        self.bytes.extend_from_slice(&revision.to_le_bytes());
        self.bytes.extend_from_slice(&0_u16.to_le_bytes());
        self.bytes.extend_from_slice(&length.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn header(self, major: u16, build: u8) -> Self {
        let payload = header_payload(major, build, "Synthetic Quest");
        self.section(b"HDR ", 0, &payload)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_to_tempfile(self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.bytes).unwrap();
        file.flush().unwrap();
        file
    }
}

fn fixed(s: &str, width: usize) -> Vec<u8> {
    let mut raw = s.as_bytes().to_vec();
    raw.resize(width, 0);
    raw
}

/// A revision 0 header section payload.
pub fn header_payload(major: u16, build: u8, title: &str) -> Vec<u8> {
    let mut p = major.to_le_bytes().to_vec();
    p.push(build);
    p.extend_from_slice(&[0; 16]);
    p.extend_from_slice(&0_u16.to_le_bytes());
    p.push(1);
    p.extend_from_slice(&fixed("1.00", 9));
    p.extend_from_slice(&fixed("", 9));
    p.extend_from_slice(&fixed(title, 65));
    p.extend_from_slice(&fixed("zqst", 65));
    p.push(0);
    p
}

/// A tile section payload holding format 1 tiles filled with `fill`, for versions that store
/// a 16-bit count and a format byte per tile.
pub fn tiles_payload(fill: &[u8]) -> Vec<u8> {
    let mut p = (fill.len() as u16).to_le_bytes().to_vec();
    for &b in fill {
        p.push(1);
        p.extend_from_slice(&[b; 128]);
    }
    p
}

pub fn rules_payload(enabled: &[usize]) -> Vec<u8> {
    let mut p = vec![0_u8; 100];
    for &bit in enabled {
        p[bit / 8] |= 1 << (bit % 8);
    }
    p
}
