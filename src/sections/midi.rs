use log::trace;

use crate::err::DeserializationResult;
use crate::model::{Record, Value};
use crate::schema::{text, u16, u32, u8, FieldSpec, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

pub const MIDI_SLOTS: usize = 252;
const PRESENCE_MASK_LEN: usize = 32;
const TRACKS: usize = 32;

const TUNE: &[FieldSpec] = &[
    text("title", 36),
    u32("start"),
    u32("loopStart"),
    u32("loopEnd"),
    u16("loop"),
    u16("volume"),
    u8("flags").when(|r| r.section >= 3),
    u8("format"),
];

/// Whether bit `index` of a little-endian bitmask is set.
pub(crate) fn bit_is_set(mask: &[u8], index: usize) -> bool {
    mask.get(index / 8)
        .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
}

fn read_tune(layout: &Layout, cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let mut tune = layout.read(cursor, ctx.codec())?;
    tune.insert("divisions", cursor.i16_be_named("midi divisions")?);

    let mut tracks = Vec::with_capacity(TRACKS);
    for _ in 0..TRACKS {
        let len = cursor.u32_be_named("midi track length")? as usize;
        tracks.push(Value::Bytes(cursor.read(len, "midi track")?.to_vec()));
    }
    tune.insert("tracks", tracks);
    Ok(tune)
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let mask = cursor.read(PRESENCE_MASK_LEN, "midi presence mask")?;
    let layout = Layout::resolve(TUNE, &ctx.revision);

    let mut tunes = Vec::with_capacity(MIDI_SLOTS);
    for slot in 0..MIDI_SLOTS {
        if !bit_is_set(mask, slot) {
            tunes.push(Value::Null);
            continue;
        }
        trace!("Offset `0x{:08x}` - tune {}", cursor.pos(), slot);
        tunes.push(Value::Record(read_tune(&layout, cursor, ctx)?));
    }

    Ok(Record::new().with("tunes", tunes))
}
