use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{u16, u8, FieldSpec, FieldType, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::dynamic("string", |r| FieldType::Text(if r.section >= 2 { 145 } else { 73 })),
    u16("nextString"),
    u16("tile").when(|r| r.section >= 3),
    u8("cset").when(|r| r.section >= 3),
    u8("transparent").when(|r| r.section >= 3),
    u8("font").when(|r| r.section >= 3),
    u16("x").when(|r| r.section >= 3),
    u16("y").when(|r| r.section >= 3),
    u16("width").when(|r| r.section >= 3),
    u16("height").when(|r| r.section >= 3),
    u8("sfx").when(|r| r.section >= 3),
    u16("listPosition").when(|r| r.section >= 4),
    u8("vspace").when(|r| r.section >= 5),
    u8("hspace").when(|r| r.section >= 5),
    u8("stringFlags").when(|r| r.section >= 6),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let count = usize::from(cursor.u16_named("string count")?);
    let strings = Layout::resolve(FIELDS, &ctx.revision).read_many(cursor, count, ctx.codec())?;
    Ok(Record::new().with("strings", strings))
}
