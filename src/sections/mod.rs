//! Per-section decoders.
//!
//! Every decoder gets a cursor bounded to exactly its own section and the [`SectionContext`] of
//! the section header it was found under. Decoders never look at bytes outside of their window.

use encoding::EncodingRef;

use crate::err::DeserializationResult;
use crate::model::Record;
use crate::qst_parser::ParserSettings;
use crate::qst_structure::Tag;
use crate::schema::Revision;
use crate::utils::ByteCursor;
use crate::version::Version;

pub mod colors;
pub mod combos;
pub mod dmaps;
pub mod guys;
pub mod header;
pub mod init;
pub mod items;
pub mod link;
pub mod maps;
pub mod midi;
pub mod rules;
pub mod sfx;
pub mod strings;
pub mod tiles;
pub mod weapons;

pub const HEADER: Tag = Tag::new(b"HDR ");
pub const RULES: Tag = Tag::new(b"RULE");
pub const STRINGS: Tag = Tag::new(b"STR ");
pub const TILES: Tag = Tag::new(b"TILE");
pub const COMBOS: Tag = Tag::new(b"CMBO");
pub const COLORS: Tag = Tag::new(b"CSET");
pub const DMAPS: Tag = Tag::new(b"DMAP");
pub const MAPS: Tag = Tag::new(b"MAP ");
pub const LINK: Tag = Tag::new(b"LINK");
pub const WEAPONS: Tag = Tag::new(b"WPN ");
pub const GUYS: Tag = Tag::new(b"GUY ");
pub const ITEMS: Tag = Tag::new(b"ITEM");
pub const MIDIS: Tag = Tag::new(b"MIDI");
pub const SFX: Tag = Tag::new(b"SFX ");
pub const INIT: Tag = Tag::new(b"INIT");

pub type SectionDecoder = fn(&mut ByteCursor, &SectionContext) -> DeserializationResult<Record>;

const ROUTES: &[(Tag, SectionDecoder)] = &[
    (HEADER, header::decode),
    (RULES, rules::decode),
    (STRINGS, strings::decode),
    (TILES, tiles::decode),
    (COMBOS, combos::decode),
    (COLORS, colors::decode),
    (DMAPS, dmaps::decode),
    (MAPS, maps::decode),
    (LINK, link::decode),
    (WEAPONS, weapons::decode),
    (GUYS, guys::decode),
    (ITEMS, items::decode),
    (MIDIS, midi::decode),
    (SFX, sfx::decode),
    (INIT, init::decode),
];

pub fn decoder_for(tag: &Tag) -> Option<SectionDecoder> {
    ROUTES
        .iter()
        .find(|(t, _)| t == tag)
        .map(|(_, decoder)| *decoder)
}

pub fn is_registered(tag: &Tag) -> bool {
    decoder_for(tag).is_some()
}

pub fn registered_tags() -> impl Iterator<Item = Tag> {
    ROUTES.iter().map(|(t, _)| *t)
}

/// What a decoder knows about the section it is decoding.
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'s> {
    pub revision: Revision,
    pub settings: &'s ParserSettings,
}

impl<'s> SectionContext<'s> {
    pub fn new(revision: Revision, settings: &'s ParserSettings) -> Self {
        SectionContext { revision, settings }
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.revision.version
    }

    #[inline]
    pub fn section_revision(&self) -> u16 {
        self.revision.section
    }

    #[inline]
    pub fn codec(&self) -> EncodingRef {
        self.settings.get_ansi_codec()
    }
}
