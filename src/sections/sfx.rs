use log::warn;

use crate::err::{DeserializationError, DeserializationResult};
use crate::model::{Record, Value};
use crate::schema::{u32, FieldSpec, Layout};
use crate::sections::midi::bit_is_set;
use crate::sections::SectionContext;
use crate::utils::text::decode_fixed_text;
use crate::utils::ByteCursor;

const PRESENCE_MASK_LEN: usize = 32;
const NAME_SIZE: usize = 36;

/// From this revision on the table has 256 slots, a presence mask and names.
const INDEXED_REVISION: u16 = 6;

const SAMPLE: &[FieldSpec] = &[
    u32("bits"),
    u32("stereo"),
    u32("length"),
    u32("frequency"),
    u32("priority").when(|r| r.section >= 2),
    u32("loopStart").when(|r| r.section >= 2),
    u32("loopEnd").when(|r| r.section >= 2),
    u32("param").when(|r| r.section >= 2),
];

pub fn slot_count(section_revision: u16) -> usize {
    if section_revision >= INDEXED_REVISION { 256 } else { 128 }
}

fn sample_data_len(sample: &Record, ctx: &SectionContext, offset: u64) -> DeserializationResult<Option<usize>> {
    let bits = sample.get_u64("bits").unwrap_or(0);
    let bytes_per_sample = match bits {
        8 => 1_u64,
        16 => 2,
        _ => return Ok(None),
    };
    let channels = if ctx.section_revision() >= 3 {
        sample.get_u64("stereo").unwrap_or(0) + 1
    } else {
        1
    };
    let length = sample.get_u64("length").unwrap_or(0);

    bytes_per_sample
        .checked_mul(channels)
        .and_then(|n| n.checked_mul(length))
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or(DeserializationError::InvalidValue {
            what: "sample length",
            value: length,
            offset,
        })
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let slots = slot_count(ctx.section_revision());
    let indexed = ctx.section_revision() >= INDEXED_REVISION;

    let mask = if indexed {
        Some(cursor.read(PRESENCE_MASK_LEN, "sfx presence mask")?)
    } else {
        None
    };
    let present = |slot: usize| slot != 0 && mask.is_none_or(|m| bit_is_set(m, slot));

    let mut names = vec![None; slots];
    if indexed {
        for (slot, name) in names.iter_mut().enumerate() {
            if present(slot) {
                *name = Some(decode_fixed_text(cursor.read(NAME_SIZE, "sfx name")?, ctx.codec()));
            }
        }
    }

    let layout = Layout::resolve(SAMPLE, &ctx.revision);
    let mut sfxs = vec![Value::Null; slots];
    for slot in (0..slots).filter(|&s| present(s)) {
        let offset = cursor.position();
        let mut sample = layout.read(cursor, ctx.codec())?;

        let Some(len) = sample_data_len(&sample, ctx, offset)? else {
            warn!(
                "sfx {} at offset {} has a bit depth of {:?}, not decoding any later samples",
                slot,
                offset,
                sample.get_u64("bits")
            );
            break;
        };
        sample.insert("data", cursor.read(len, "sfx data")?.to_vec());

        let mut record = Record::with_capacity(sample.len() + 1);
        if let Some(name) = names[slot].take() {
            record.insert("name", name);
        }
        record.merge(sample);
        sfxs[slot] = Value::Record(record);
    }

    Ok(Record::new().with("sfxs", sfxs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::test_utils::{decode_with, Bytes};
    use crate::version::Version;
    use pretty_assertions::assert_eq;

    const V: Version = Version::new(0x250, 24);

    fn sample(bits: u32, stereo: u32, data: &[u8]) -> Bytes {
        let frames = data.len() as u32 / (bits / 8).max(1) / (stereo + 1);
        Bytes::new()
            .u32(bits)
            .u32(stereo)
            .u32(frames)
            .u32(22050)
            .zeros(16)
            .raw(data)
    }

    fn sfxs(record: &Record) -> &[Value] {
        record.get("sfxs").and_then(Value::as_list).unwrap()
    }

    #[test]
    fn test_indexed_table() {
        let mut mask = [0_u8; 32];
        mask[0] = 0b0000_0101; // slot 0 is never decoded, even when flagged
        let data = Bytes::new()
            .raw(&mask)
            .text("Sword", 36)
            .raw(&sample(16, 1, &[1, 2, 3, 4]).0)
            .0;

        let (record, remaining) = decode_with(decode, &data, V, 6);
        let record = record.unwrap();
        let sfxs = sfxs(&record);

        assert_eq!(remaining, 0);
        assert_eq!(sfxs.len(), 256);
        assert!(sfxs[0].is_null());
        let sword = sfxs[2].as_record().unwrap();
        assert_eq!(sword.get_str("name"), Some("Sword"));
        assert_eq!(sword.get_u64("frequency"), Some(22050));
        assert_eq!(sword.get("data"), Some(&Value::Bytes(vec![1, 2, 3, 4])));
    }

    #[test]
    fn test_sample_carries_what_a_wav_writer_needs() {
        let mut mask = [0_u8; 32];
        mask[1] = 0b0000_0001;
        let pcm: Vec<u8> = (0..16).collect();
        let data = Bytes::new()
            .raw(&mask)
            .text("Bomb", 36)
            .raw(&sample(16, 1, &pcm).0)
            .0;

        let (record, remaining) = decode_with(decode, &data, V, 6);
        let record = record.unwrap();
        let bomb = sfxs(&record)[8].as_record().unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(
            bomb.names().collect::<Vec<_>>(),
            vec![
                "name", "bits", "stereo", "length", "frequency", "priority", "loopStart", "loopEnd",
                "param", "data"
            ]
        );
        assert_eq!(bomb.get_u64("bits"), Some(16));
        assert_eq!(bomb.get_u64("stereo"), Some(1));
        assert_eq!(bomb.get_u64("length"), Some(4));
        assert_eq!(bomb.get_u64("frequency"), Some(22050));
        // length * channels * bits / 8
        assert_eq!(bomb.get("data").and_then(Value::len), Some(4 * 2 * 16 / 8));
    }

    #[test]
    fn test_old_revision_ignores_stereo_for_length() {
        let mut b = Bytes::new();
        for _ in 1..128 {
            b = b.u32(8).u32(1).u32(2).u32(8000).zeros(16).raw(&[7, 8]);
        }
        let (record, remaining) = decode_with(decode, &b.0, V, 2);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(sfxs(&record).len(), 128);
        assert_eq!(sfxs(&record)[127].as_record().unwrap().get("data").and_then(Value::len), Some(2));
    }

    #[test]
    fn test_bad_bit_depth_stops_decoding() {
        let mut mask = [0_u8; 32];
        mask[0] = 0b0000_1110;
        let data = Bytes::new()
            .raw(&mask)
            .zeros(3 * 36)
            .raw(&sample(8, 0, &[1]).0)
            .raw(&sample(12, 0, &[]).0)
            .raw(&sample(8, 0, &[2]).0)
            .0;

        let (record, remaining) = decode_with(decode, &data, V, 6);
        let record = record.unwrap();
        let sfxs = sfxs(&record);

        assert!(sfxs[1].as_record().is_some());
        assert!(sfxs[2].is_null());
        assert!(sfxs[3].is_null());
        assert_eq!(remaining, 32 + 1);
    }
}
