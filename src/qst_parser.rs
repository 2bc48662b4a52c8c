use std::fs;
use std::path::Path;

use encoding::all::WINDOWS_1252;
use encoding::EncodingRef;
use log::{debug, info, trace, warn};

use crate::err::{QstError, Result};
use crate::qst_structure::{
    QuestDocument, SectionDiagnostic, SectionEntry, SectionHeader, Tag, SECTION_HEADER_SIZE,
};
use crate::schema::Revision;
use crate::sections::{self, SectionContext, HEADER};
use crate::utils::{hexdump_around, ByteCursor};
use crate::version::Version;

pub const ENHANCED_PREAMBLE: &str = "AG ZC Enhanced Quest File";
pub const CLASSIC_PREAMBLE: &str = "AG Zelda Classic Quest File";

/// Longest preamble quoted back in an error.
const PREAMBLE_PREVIEW: usize = 64;

#[derive(Clone)]
pub struct ParserSettings {
    /// Codec used to decode fixed width text fields.
    ansi_codec: EncodingRef,
    /// Scan forward for the next section header when a header looks like garbage.
    resync: bool,
    /// Attach a diagnostic to sections whose decoder did not consume every byte.
    record_unconsumed: bool,
}

impl std::fmt::Debug for ParserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserSettings")
            .field("ansi_codec", &self.ansi_codec.name())
            .field("resync", &self.resync)
            .field("record_unconsumed", &self.record_unconsumed)
            .finish()
    }
}

impl PartialEq for ParserSettings {
    fn eq(&self, other: &ParserSettings) -> bool {
        self.ansi_codec.name() == other.ansi_codec.name()
            && self.resync == other.resync
            && self.record_unconsumed == other.record_unconsumed
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            ansi_codec: WINDOWS_1252,
            resync: true,
            record_unconsumed: true,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    pub fn ansi_codec(mut self, ansi_codec: EncodingRef) -> Self {
        self.ansi_codec = ansi_codec;
        self
    }

    pub fn resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    pub fn record_unconsumed(mut self, record_unconsumed: bool) -> Self {
        self.record_unconsumed = record_unconsumed;
        self
    }

    pub fn get_ansi_codec(&self) -> EncodingRef {
        self.ansi_codec
    }

    pub fn should_resync(&self) -> bool {
        self.resync
    }

    pub fn should_record_unconsumed(&self) -> bool {
        self.record_unconsumed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingPreamble,
    SeekingHeaderTag,
    ReadingSection,
    Done,
}

/// State carried across sections of one decode.
struct DecodeState {
    document: QuestDocument,
    version: Version,
    header_seen: bool,
}

/// Decoder for an extracted quest buffer.
///
/// The parser owns its bytes; [`QstParser::parse`] borrows them and can be called any number of
/// times, always producing the same document.
pub struct QstParser {
    data: Vec<u8>,
    config: ParserSettings,
}

impl QstParser {
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        QstParser {
            data: buffer,
            config: ParserSettings::default(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| QstError::FailedToOpenFile {
            source: e,
            path: path.to_path_buf(),
        })?;
        Ok(QstParser::from_buffer(data))
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.config
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn parse(&self) -> Result<QuestDocument> {
        let mut cursor = ByteCursor::new(&self.data);
        let mut decode = DecodeState {
            document: QuestDocument::default(),
            version: Version::ZERO,
            header_seen: false,
        };
        let mut state = ParseState::SeekingPreamble;

        loop {
            trace!("Offset `0x{:08x}` - {:?}", cursor.pos(), state);
            state = match state {
                ParseState::SeekingPreamble => {
                    let preamble = read_preamble(&mut cursor)?;
                    info!("quest preamble `{}`", preamble);
                    decode.document = QuestDocument::new(preamble);
                    ParseState::SeekingHeaderTag
                }
                ParseState::SeekingHeaderTag => {
                    let offset = cursor
                        .find_subsequence(HEADER.as_bytes(), "header section tag")
                        .map_err(|_| QstError::CorruptContainer {
                            offset: cursor.position(),
                        })?;
                    if offset != cursor.pos() {
                        debug!("skipping {} bytes before the first section", offset - cursor.pos());
                    }
                    cursor.seek(offset);
                    ParseState::ReadingSection
                }
                ParseState::ReadingSection => {
                    if cursor.has_data() {
                        self.read_section(&mut cursor, &mut decode)?;
                        ParseState::ReadingSection
                    } else {
                        ParseState::Done
                    }
                }
                ParseState::Done => return Ok(decode.document),
            };
        }
    }

    fn read_section(&self, cursor: &mut ByteCursor, decode: &mut DecodeState) -> Result<()> {
        let header = self.next_section_header(cursor)?;
        let start = cursor.pos();
        let len = header.length as usize;
        let declared_end = start.saturating_add(len);

        debug!(
            "Offset `0x{:08x}` - section `{}` (revision {}, container revision {}, {} bytes)",
            start, header.tag, header.section_revision, header.container_revision, len
        );

        let decoder = match sections::decoder_for(&header.tag) {
            Some(decoder) if len > 0 => decoder,
            Some(_) => {
                debug!("section `{}` is empty, skipping", header.tag);
                return Ok(());
            }
            None => {
                debug!("no decoder for section `{}`, skipping {} bytes", header.tag, len);
                cursor.seek(declared_end);
                return Ok(());
            }
        };

        let mut section_cursor = ByteCursor::bounded(&self.data, start, len);
        let revision = Revision::new(
            decode.version,
            header.section_revision,
            header.container_revision,
        );
        let ctx = SectionContext::new(revision, &self.config);

        let mut errors = Vec::new();
        let data = match decoder(&mut section_cursor, &ctx) {
            Ok(record) => Some(record),
            Err(e) if e.is_fatal() => {
                return Err(QstError::FatalSection {
                    tag: header.tag,
                    source: e,
                });
            }
            Err(e) => {
                warn!("failed to decode section `{}`: {}", header.tag, e);
                errors.push(SectionDiagnostic::Failed(e));
                None
            }
        };

        if header.tag == HEADER {
            match data.as_ref().and_then(sections::header::version_of) {
                Some(version) if !decode.header_seen => {
                    info!("quest format version {}", version);
                    decode.version = version;
                    decode.header_seen = true;
                }
                Some(version) => {
                    warn!(
                        "ignoring version {} of a repeated header section, keeping {}",
                        version, decode.version
                    );
                }
                None => {}
            }
        }

        let remaining = section_cursor.remaining();
        if remaining != 0 && self.config.should_record_unconsumed() {
            warn!(
                "section `{}`: did not read all data, {} bytes remaining",
                header.tag, remaining
            );
            errors.push(SectionDiagnostic::UnconsumedBytes(remaining));
        }

        decode.document.insert(SectionEntry {
            header,
            data,
            errors,
        });

        // The next section starts where this one says it ends, wherever the decoder stopped.
        cursor.seek(declared_end);
        Ok(())
    }

    /// Reads the next section header, skipping inserted garbage bytes if needed.
    ///
    /// A header whose tag is not printable is garbage, and so is an unregistered tag that does not
    /// frame a section (see [`QstParser::frames_section`]). The scan then moves forward one byte at
    /// a time until a header with a registered tag lines up.
    fn next_section_header(&self, cursor: &mut ByteCursor) -> Result<SectionHeader> {
        let first = cursor.pos();
        let mut skipped = 0_usize;

        loop {
            let offset = cursor.pos();
            // Fewer than a header's worth of bytes left is garbage too, with nothing after it.
            let header = SectionHeader::from_cursor(cursor).map_err(|_| QstError::CorruptContainer {
                offset: offset as u64,
            })?;

            let accepted = if skipped == 0 {
                header.tag.is_printable() && self.frames_section(&header, cursor.pos())
            } else {
                sections::is_registered(&header.tag)
            };
            if accepted {
                if skipped > 0 {
                    debug!(
                        "resynchronized on section `{}` after skipping {} bytes at offset {}",
                        header.tag, skipped, first
                    );
                }
                return Ok(header);
            }

            if skipped == 0 {
                debug!(
                    "malformed section tag `{}` at offset {}\n{}",
                    header.tag,
                    offset,
                    hexdump_around(&self.data, offset, 2 * SECTION_HEADER_SIZE)
                );
                if !self.config.should_resync() {
                    return Err(QstError::CorruptContainer {
                        offset: offset as u64,
                    });
                }
            }

            cursor.seek(offset + 1);
            skipped += 1;
        }
    }

    /// Whether a header read at `body_start - SECTION_HEADER_SIZE` plausibly starts a section.
    ///
    /// Registered tags are trusted. An unregistered tag must end inside the buffer, either exactly
    /// at its end or right before another printable tag. A shifted registered header fails this,
    /// since its length field then holds bytes of the revision counters.
    fn frames_section(&self, header: &SectionHeader, body_start: usize) -> bool {
        if sections::is_registered(&header.tag) {
            return true;
        }

        let end = match body_start.checked_add(header.length as usize) {
            Some(end) if end <= self.data.len() => end,
            _ => return false,
        };
        if end == self.data.len() {
            return true;
        }

        match self.data.get(end..end + SECTION_HEADER_SIZE) {
            Some([a, b, c, d, ..]) => Tag::new(&[*a, *b, *c, *d]).is_printable(),
            _ => false,
        }
    }
}

fn read_preamble(cursor: &mut ByteCursor) -> Result<String> {
    let newline = match cursor.find_byte(b'\n', "preamble terminator") {
        Ok(offset) => offset,
        Err(_) => {
            let preview = cursor
                .read(cursor.remaining().min(PREAMBLE_PREVIEW), "preamble")
                .unwrap_or_default();
            return Err(QstError::UnrecognizedPreamble {
                preamble: String::from_utf8_lossy(preview).into_owned(),
            });
        }
    };

    let raw = cursor
        .read(newline - cursor.pos(), "preamble")
        .unwrap_or_default();
    cursor.seek(newline + 1);

    let preamble = String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\0'])
        .to_string();

    match preamble.as_str() {
        ENHANCED_PREAMBLE => Ok(preamble),
        CLASSIC_PREAMBLE => Err(QstError::UnsupportedPreamble { preamble }),
        _ => Err(QstError::UnrecognizedPreamble { preamble }),
    }
}
