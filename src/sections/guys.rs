use crate::err::{DeserializationError, DeserializationResult};
use crate::model::Record;
use crate::schema::{text, u16, u32, u8, FieldSpec, Layout};
use crate::sections::weapons::read_named_table;
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

pub const GUY_COUNT: usize = 512;

/// First revision with a layout this decoder does not know.
const UNSUPPORTED_FROM: u16 = 36;

const NAME: &[FieldSpec] = &[text("name", 64)];

const DATA: &[FieldSpec] = &[
    u32("flags"),
    u32("flags2"),
    u16("tile"),
    u8("width"),
    u8("height"),
    u16("s_tile"),
    u8("s_width"),
    u8("s_height"),
    u16("e_tile"),
    u8("e_width"),
    u8("e_height"),
    u16("hp"),
    u16("family"),
    u16("cset"),
    u16("anim"),
    u16("e_anim"),
    u16("frate"),
    u16("e_frate"),
    u16("dp"),
    u16("wdp"),
    u16("weapon"),
    u16("rate"),
    u16("hrate"),
    u16("step"),
    u16("homing"),
    u16("grumble"),
    u16("itemSet"),
    u32("misc").repeat(10).when(|r| r.section >= 22),
    u16("bgsfx"),
    u16("bosspal"),
    u16("extend"),
    u8("defense").repeat(19).when(|r| r.section >= 16),
    u8("hitsfx").when(|r| r.section >= 18),
    u8("deadsfx").when(|r| r.section >= 18),
    u32("misc11").when(|r| r.section >= 22),
    u32("misc12").when(|r| r.section >= 22),
    u8("_padding").repeat(41 - 19).when(|r| r.section > 24),
    u32("txsz").when(|r| r.section > 25),
    u32("tysz").when(|r| r.section > 25),
    u32("hxsz").when(|r| r.section > 25),
    u32("hysz").when(|r| r.section > 25),
    u32("hzsz").when(|r| r.section > 25),
    u32("_padding").repeat(5).when(|r| r.section >= 26),
    u32("frozenTile").when(|r| r.section >= 30),
    u32("frozenCset").when(|r| r.section >= 30),
    u32("frozenClock").when(|r| r.section >= 30),
    u16("frozenMisc").repeat(10).when(|r| r.section >= 30),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    if ctx.section_revision() >= UNSUPPORTED_FROM {
        return Err(DeserializationError::UnsupportedLayout {
            what: "enemies",
            revision: ctx.section_revision(),
        });
    }

    let guys = read_named_table(
        cursor,
        ctx,
        GUY_COUNT,
        &Layout::resolve(NAME, &ctx.revision),
        &Layout::resolve(DATA, &ctx.revision),
    )?;

    Ok(Record::new().with("guys", guys))
}
