use log::trace;

use crate::err::{DeserializationError, DeserializationResult};
use crate::model::{Record, Value};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;
use crate::version::Version;

/// From here on the tile count is a `u32`.
const WIDE_COUNT: Version = Version::new(0x254, 41);
/// Versions after this store a format byte per tile.
const ENCODED_FORMATS: Version = Version::new(0x211, 4);

/// Packed 4 bits per pixel.
const FORMAT_4BIT: u8 = 1;

fn tile_size(format: u8) -> Option<usize> {
    match format {
        0 => Some(256),
        1..=3 => Some(64 << format),
        4 => Some(768),
        5 => Some(1024),
        _ => None,
    }
}

/// Splits every byte into two pixels, low nibble first.
pub fn unpack_4bit(packed: &[u8]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(packed.len() * 2);
    for &b in packed {
        pixels.push(b & 0x0F);
        pixels.push(b >> 4);
    }
    pixels
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let version = ctx.version();
    let count = if version.gte(WIDE_COUNT) {
        cursor.u32_named("tile count")? as usize
    } else {
        usize::from(cursor.u16_named("tile count")?)
    };
    let has_formats = version.gt(ENCODED_FORMATS);

    trace!("Offset `0x{:08x}` - {} tiles", cursor.pos(), count);

    let mut tiles = Vec::with_capacity(count.min(cursor.remaining()));
    for index in 0..count {
        let offset = cursor.position();
        let format = if has_formats {
            cursor.u8_named("tile format")?
        } else {
            FORMAT_4BIT
        };
        let size = tile_size(format).ok_or(DeserializationError::UnknownTileFormat {
            format,
            index,
            offset,
        })?;
        let pixels = cursor.read(size, "tile pixels")?;

        let tile = match format {
            FORMAT_4BIT => unpack_4bit(pixels),
            4 | 5 => pixels.to_vec(),
            // Combos refer to tiles by position in this list, so undecoded formats keep their slot.
            _ => Vec::new(),
        };
        tiles.push(Value::Bytes(tile));
    }

    Ok(Record::new().with("tiles", tiles))
}
