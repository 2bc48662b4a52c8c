use crate::err::DeserializationResult;
use crate::model::{Record, Value};
use crate::schema::{u8, FieldSpec, Layout};
use crate::sections::SectionContext;
use crate::utils::text::decode_fixed_text;
use crate::utils::ByteCursor;
use crate::version::Version;

const COLORS_PER_CSET: usize = 16;
const PALETTE_NAMES: usize = 512;
const PALETTE_NAME_SIZE: usize = 17;

/// Before this the palette table holds 100 levels.
const LEVELS_256: Version = Version::new(0x192, 73);

const CYCLE_FIELDS: &[FieldSpec] = &[
    u8("first").repeat(3),
    u8("count").repeat(3),
    u8("speed").repeat(3),
];

fn palette_levels(ctx: &SectionContext) -> usize {
    if ctx.version().lt(LEVELS_256) {
        100
    } else if ctx.section_revision() < 4 {
        256
    } else {
        512
    }
}

/// Number of 16 color sets stored for a given number of levels.
pub fn cset_count(levels: usize) -> usize {
    15 + 30 + 13 * levels
}

/// Expands the 6-bit RGB triplets of one cset into RGBA, index 0 transparent.
///
/// A cset whose colors are all black is unused and becomes an empty list.
fn expand_cset(raw: &[u8]) -> Value {
    if raw.iter().all(|&b| b == 0) {
        return Value::List(Vec::new());
    }

    let colors = raw
        .chunks_exact(3)
        .enumerate()
        .map(|(j, rgb)| {
            let alpha = if j == 0 { 0 } else { 255 };
            Value::List(vec![
                Value::U16(u16::from(rgb[0]) * 4),
                Value::U16(u16::from(rgb[1]) * 4),
                Value::U16(u16::from(rgb[2]) * 4),
                Value::U16(alpha),
            ])
        })
        .collect();
    Value::List(colors)
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let cset_len = COLORS_PER_CSET * 3;
    let blob = cursor.read(cset_count(palette_levels(ctx)) * cset_len, "color data")?;
    let cset_colors: Vec<Value> = blob.chunks_exact(cset_len).map(expand_cset).collect();

    let mut palnames = Vec::with_capacity(PALETTE_NAMES);
    for _ in 0..PALETTE_NAMES {
        let raw = cursor.read(PALETTE_NAME_SIZE, "palette name")?;
        palnames.push(Value::Text(decode_fixed_text(raw, ctx.codec())));
    }

    let cycle_count = usize::from(cursor.u16_named("cycle count")?);
    let cycles = Layout::resolve(CYCLE_FIELDS, &ctx.revision).read_many(cursor, cycle_count, ctx.codec())?;

    Ok(Record::new()
        .with("palnames", palnames)
        .with("cycles", cycles)
        .with("csetColors", cset_colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::test_utils::{decode_with, Bytes};
    use pretty_assertions::assert_eq;

    const V: Version = Version::new(0x250, 24);

    #[test]
    fn test_cset_count_by_tier() {
        assert_eq!(cset_count(100), 1345);
        assert_eq!(cset_count(512), 6701);
    }

    #[test]
    fn test_expands_colors() {
        let mut raw = vec![0_u8; 48];
        raw[0] = 1;
        raw[3..6].copy_from_slice(&[63, 32, 0]);

        let colors = expand_cset(&raw);
        let colors = colors.as_list().unwrap();
        assert_eq!(colors.len(), 16);
        assert_eq!(
            colors[0],
            Value::List(vec![Value::U16(4), Value::U16(0), Value::U16(0), Value::U16(0)])
        );
        assert_eq!(
            colors[1],
            Value::List(vec![Value::U16(252), Value::U16(128), Value::U16(0), Value::U16(255)])
        );
    }

    #[test]
    fn test_all_black_cset_is_empty() {
        assert_eq!(expand_cset(&[0; 48]), Value::List(vec![]));
    }

    #[test]
    fn test_decodes_section() {
        let mut blob = vec![0_u8; cset_count(256) * 48];
        blob[48 + 5] = 10;
        let data = Bytes::new()
            .raw(&blob)
            .text("Overworld", 17)
            .zeros(511 * 17)
            .u16(1)
            .raw(&[1, 2, 3, 4, 5, 6, 7, 8, 9])
            .0;

        let (record, remaining) = decode_with(decode, &data, V, 3);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        let csets = record.get("csetColors").and_then(Value::as_list).unwrap();
        assert_eq!(csets.len(), cset_count(256));
        assert_eq!(csets[0].len(), Some(0));
        assert_eq!(csets[1].len(), Some(16));
        assert_eq!(
            record.get("palnames").and_then(Value::as_list).unwrap()[0],
            Value::Text("Overworld".to_string())
        );
        let cycle = record.get("cycles").and_then(Value::as_list).unwrap()[0]
            .as_record()
            .unwrap();
        assert_eq!(cycle.get("speed"), Some(&Value::Bytes(vec![7, 8, 9])));
    }
}
