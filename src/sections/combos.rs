use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{text, u16, u32, u8, FieldSpec, FieldType, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

const ATTRIBUTE_COUNT: usize = 4;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::dynamic("tile", |r| {
        if r.section >= 11 {
            FieldType::U32
        } else {
            FieldType::U16
        }
    }),
    u8("flip"),
    u8("walk"),
    u8("type"),
    u8("csets"),
    u8("frames"),
    u8("speed"),
    u16("nextcombo"),
    u8("nextcset"),
    u8("flag"),
    u8("skipanim"),
    u16("nexttimer"),
    u8("skipanimy"),
    u8("animflags"),
    u32("attributes").repeat(ATTRIBUTE_COUNT).when(|r| r.section >= 12),
    u32("usrflags").when(|r| r.section >= 12),
    u32("triggerflags").repeat(3).when(|r| r.section >= 12),
    u32("triggerlevel").when(|r| r.section >= 13),
    text("label", 11).when(|r| r.section >= 14),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let version = ctx.version();
    let count = if version.major_lt(0x174) {
        1024
    } else if version.major_lt(0x191) {
        2048
    } else {
        usize::from(cursor.u16_named("combo count")?)
    };

    let layout = Layout::resolve(FIELDS, &ctx.revision);
    let combos = layout.read_many(cursor, count, ctx.codec())?;

    Ok(Record::new().with("combos", combos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::sections::test_utils::{decode_with, Bytes};
    use crate::version::Version;
    use pretty_assertions::assert_eq;

    const V: Version = Version::new(0x250, 24);

    fn combo(tile_wide: bool) -> Bytes {
        let b = Bytes::new();
        let b = if tile_wide { b.u32(70000) } else { b.u16(300) };
        b.u8(1).u8(2).u8(3).u8(4).u8(5).u8(6).u16(7).u8(8).u8(9).u8(10).u16(11).u8(12).u8(13)
    }

    fn combos(record: &Record) -> Vec<&Record> {
        record
            .get("combos")
            .and_then(Value::as_list)
            .unwrap()
            .iter()
            .filter_map(Value::as_record)
            .collect()
    }

    #[test]
    fn test_tile_widens_at_revision_eleven() {
        let data = Bytes::new().u16(1).raw(&combo(false).0).0;
        let (record, remaining) = decode_with(decode, &data, V, 10);
        let record = record.unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(combos(&record)[0].get_u64("tile"), Some(300));
        assert_eq!(combos(&record)[0].get_u64("animflags"), Some(13));

        let data = Bytes::new().u16(1).raw(&combo(true).0).0;
        let (record, remaining) = decode_with(decode, &data, V, 11);
        assert_eq!(remaining, 0);
        assert_eq!(combos(&record.unwrap())[0].get_u64("tile"), Some(70000));
    }

    #[test]
    fn test_trailing_fields_follow_revision() {
        let data = Bytes::new()
            .u16(1)
            .raw(&combo(true).0)
            .zeros(4 * 4)
            .u32(0xFF)
            .zeros(3 * 4)
            .u32(2)
            .text("door", 11)
            .0;
        let (record, remaining) = decode_with(decode, &data, V, 14);
        let record = record.unwrap();
        let combo = combos(&record)[0];

        assert_eq!(remaining, 0);
        assert_eq!(combo.get_u64("usrflags"), Some(0xFF));
        assert_eq!(combo.get_u64("triggerlevel"), Some(2));
        assert_eq!(combo.get_str("label"), Some("door"));
    }

    #[test]
    fn test_old_versions_have_fixed_count() {
        let mut data = Vec::new();
        for _ in 0..1024 {
            data.extend_from_slice(&combo(false).0);
        }
        let (record, remaining) = decode_with(decode, &data, Version::new(0x173, 0), 0);

        assert_eq!(remaining, 0);
        assert_eq!(combos(&record.unwrap()).len(), 1024);
    }
}
