use crate::err::{DeserializationError, DeserializationResult};
use crate::model::Record;
use crate::schema::{text, u16, u32, u8, FieldSpec, FieldType, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;
use crate::version::Version;

/// Oldest dmap layout this decoder reads.
const OLDEST: Version = Version::new(0x192, 41);
const PADDED_UNTIL: Version = Version::new(0x193, 0);

const MINIMAP_COUNT: usize = 4;

fn u8_or_u16(wide: bool) -> FieldType {
    if wide { FieldType::U16 } else { FieldType::U8 }
}

const HEAD: &[FieldSpec] = &[
    u8("map"),
    FieldSpec::dynamic("level", |r| u8_or_u16(r.section >= 5)),
    u8("xoff"),
    u8("compass"),
    FieldSpec::dynamic("color", |r| u8_or_u16(r.section >= 9)),
    u8("midi"),
    u8("cont"),
    u8("type"),
    u8("grid").repeat(8),
    text("name", 21),
    text("title", 21),
    text("intro", 73),
];

const MINIMAP: &[FieldSpec] = &[
    FieldSpec::dynamic("tile", |r| {
        if r.section >= 11 {
            FieldType::U32
        } else {
            FieldType::U16
        }
    }),
    u8("cset"),
];

const TAIL: &[FieldSpec] = &[
    u8("tmusic").repeat(56),
    u8("tmusictrack").when(|r| r.section >= 2),
    u8("active_subscreen").when(|r| r.section >= 2),
    u8("passive_subscreen").when(|r| r.section >= 2),
    u8("di").repeat(32).when(|r| r.section >= 3),
    FieldSpec::dynamic("flags", |r| {
        if r.section >= 6 {
            FieldType::U32
        } else {
            FieldType::U8
        }
    })
    .when(|r| r.section >= 4),
    u8("_padding").when(|r| r.version.gt(OLDEST) && r.version.lt(PADDED_UNTIL)),
    u8("sideview").when(|r| r.section >= 10),
    u16("script").when(|r| r.section >= 12),
    u32("initD").repeat(8).when(|r| r.section >= 12),
    text("initDLabel", 65).repeat(8).when(|r| r.section >= 13),
    u16("activeSubscript").when(|r| r.section >= 14),
    u16("passiveSubscript").when(|r| r.section >= 14),
    u32("subInitD").repeat(8).when(|r| r.section >= 14),
    text("subInitDLabel", 65).repeat(8).when(|r| r.section >= 14),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    if ctx.version().lt(OLDEST) {
        return Err(DeserializationError::UnsupportedLayout {
            what: "dmaps older than 0x192 build 41",
            revision: ctx.section_revision(),
        });
    }

    let count = usize::from(cursor.u16_named("dmap count")?);
    let head = Layout::resolve(HEAD, &ctx.revision);
    let minimap = Layout::resolve(MINIMAP, &ctx.revision);
    let tail = Layout::resolve(TAIL, &ctx.revision);

    let mut dmaps = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        let mut dmap = head.read(cursor, ctx.codec())?;
        dmap.insert("minimap", minimap.read_many(cursor, MINIMAP_COUNT, ctx.codec())?);
        dmap.merge(tail.read(cursor, ctx.codec())?);
        dmaps.push(dmap);
    }

    Ok(Record::new().with("dmaps", dmaps))
}
