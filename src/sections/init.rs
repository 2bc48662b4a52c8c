use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{u16, u32, u8, FieldSpec, FieldType, Layout, Revision};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

/// From this revision on owned items are a flag per item id.
const ITEM_FLAGS_REVISION: u16 = 10;
const ITEM_FLAG_COUNT: usize = 256;
const LEVEL_FLAG_BYTES: usize = 32;

fn legacy(r: &Revision) -> bool {
    r.section < ITEM_FLAGS_REVISION
}

const FIELDS: &[FieldSpec] = &[
    u8("items").repeat(ITEM_FLAG_COUNT).when(|r| !legacy(r)),
    u8("sword").when(legacy),
    u8("boomerang").when(legacy),
    u8("arrow").when(legacy),
    u8("candle").when(legacy),
    u8("whistle").when(legacy),
    u8("bait").when(legacy),
    u8("letter").when(legacy),
    u8("potion").when(legacy),
    u8("wand").when(legacy),
    u8("ring").when(legacy),
    u8("wallet").when(legacy),
    u8("amulet").when(legacy),
    u8("shield").when(legacy),
    u8("bow").when(legacy),
    u8("raft").when(legacy),
    u8("ladder").when(legacy),
    u8("book").when(legacy),
    u8("magicKey").when(legacy),
    u8("flippers").when(legacy),
    u8("boots").when(legacy),
    u8("hc"),
    u16("startHeart"),
    u16("contHeart"),
    u8("hcp"),
    u8("maxBombs"),
    u8("keys"),
    u16("rupies"),
    u8("triforce"),
    u8("map").repeat(LEVEL_FLAG_BYTES),
    u8("compass").repeat(LEVEL_FLAG_BYTES),
    u8("bossKey").repeat(LEVEL_FLAG_BYTES).when(|r| r.section >= 5),
    u8("misc").repeat(16),
    u8("swordHearts").repeat(4).when(|r| r.section >= 3),
    u8("lastMap"),
    u8("lastScreen"),
    u16("maxMagic").when(|r| r.section >= 3),
    u16("magic").when(|r| r.section >= 3),
    u8("bombs").when(|r| r.section >= 4),
    u8("superBombs").when(|r| r.section >= 4),
    u8("arrows").when(|r| r.section >= 4),
    u8("maxArrows").when(|r| r.section >= 4),
    FieldSpec::dynamic("startDmap", |r| {
        if r.section >= 13 {
            FieldType::U16
        } else {
            FieldType::U8
        }
    }),
    u8("linkAnimationStyle").when(|r| r.section >= 2),
    u8("subscreenStyle").when(|r| r.section >= 11),
    u16("gravity").when(|r| r.section >= 15 && r.version.major_gt(0x250)),
    u16("terminalVelocity").when(|r| r.section >= 15 && r.version.major_gt(0x250)),
    u8("heroStep").when(|r| r.section >= 16 && r.version.major_gt(0x250)),
    u32("exitWalkDelay").when(|r| r.section >= 17 && r.version.major_gt(0x250)),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    Layout::resolve(FIELDS, &ctx.revision).read(cursor, ctx.codec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::sections::test_utils::{decode_with, field_offset};
    use crate::version::Version;
    use pretty_assertions::assert_eq;

    fn len(version: Version, section: u16) -> usize {
        Layout::resolve(FIELDS, &Revision::new(version, section, 0)).byte_len()
    }

    #[test]
    fn test_item_flags_replace_legacy_equipment() {
        let v = Version::new(0x250, 24);
        let legacy = Layout::resolve(FIELDS, &Revision::new(v, 9, 0));
        let flags = Layout::resolve(FIELDS, &Revision::new(v, 10, 0));

        assert_eq!(flags.byte_len() - legacy.byte_len(), ITEM_FLAG_COUNT - 20);
        assert_eq!(flags.fields()[0].name, "items");
        assert_eq!(legacy.fields()[0].name, "sword");
    }

    #[test]
    fn test_start_dmap() {
        let v = Version::new(0x250, 24);
        let section = 13;
        let mut data = vec![0_u8; len(v, section)];
        let offset = Layout::resolve(FIELDS, &Revision::new(v, section, 0))
            .fields()
            .iter()
            .take_while(|f| f.name != "startDmap")
            .map(|f| f.byte_len())
            .sum::<usize>();
        data[offset..offset + 2].copy_from_slice(&300_u16.to_le_bytes());

        let (record, remaining) = decode_with(decode, &data, v, section);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(record.get_u64("startDmap"), Some(300));
        assert_eq!(record.get("items").and_then(Value::len), Some(256));
    }

    #[test]
    fn test_link_animation_style_and_start_dmap() {
        let v = Version::new(0x211, 7);
        let section = 11;
        let layout = Layout::resolve(FIELDS, &Revision::new(v, section, 0));
        let mut data = vec![0_u8; layout.byte_len()];
        data[field_offset(&layout, "startDmap")] = 4;
        data[field_offset(&layout, "linkAnimationStyle")] = 2;

        let (record, remaining) = decode_with(decode, &data, v, section);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(record.get("startDmap"), Some(&Value::U8(4)));
        assert_eq!(record.get_u64("linkAnimationStyle"), Some(2));
        assert_eq!(record.get("items").and_then(Value::len), Some(256));
    }

    #[test]
    fn test_first_revision_has_no_animation_style() {
        let v = Version::new(0x190, 0);
        let (record, remaining) = decode_with(decode, &vec![0; len(v, 1)], v, 1);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert!(record.contains("sword"));
        assert!(record.contains("startDmap"));
        assert!(!record.contains("linkAnimationStyle"));
    }

    #[test]
    fn test_newer_engine_fields() {
        assert_eq!(len(Version::new(0x254, 0), 17) - len(Version::new(0x250, 24), 17), 2 + 2 + 1 + 4);
    }
}
