use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{text, u16, u32, u8, FieldSpec, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

const NAME: &[FieldSpec] = &[text("name", 64).when(|r| r.section > 2)];

const SPRITE: &[FieldSpec] = &[
    u16("tile"),
    u8("misc"),
    u8("csets"),
    u8("frames"),
    u8("speed"),
    u8("type"),
    u16("script").when(|r| r.section >= 7),
    u32("newtile").when(|r| r.section >= 7),
];

fn weapon_count(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<usize> {
    let version = ctx.version();
    Ok(if version.major_lt(0x185) {
        32
    } else if version.major_lt(0x186) {
        64
    } else if !version.major_gt(0x192) {
        256
    } else {
        usize::from(cursor.u16_named("weapon count")?)
    })
}

/// Reads a names pass followed by a data pass over the same table and zips them together.
pub(crate) fn read_named_table(
    cursor: &mut ByteCursor,
    ctx: &SectionContext,
    count: usize,
    names: &Layout,
    data: &Layout,
) -> DeserializationResult<Vec<Record>> {
    let mut records = names.read_many(cursor, count, ctx.codec())?;
    let rest = data.read_many(cursor, count, ctx.codec())?;
    for (record, rest) in records.iter_mut().zip(rest) {
        record.merge(rest);
    }
    Ok(records)
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let count = weapon_count(cursor, ctx)?;
    let weapons = read_named_table(
        cursor,
        ctx,
        count,
        &Layout::resolve(NAME, &ctx.revision),
        &Layout::resolve(SPRITE, &ctx.revision),
    )?;

    Ok(Record::new().with("weapons", weapons))
}
