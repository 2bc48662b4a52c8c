use crate::err::{DeserializationError, DeserializationResult};
use crate::model::Record;
use crate::schema::{u16, u8, FieldSpec, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

const SPRITE: &[FieldSpec] = &[u16("tile"), u8("flip"), u8("extend")];

/// Frames per animation, one per direction.
const DIRECTIONS: usize = 4;

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    if ctx.section_revision() >= 6 {
        return Err(DeserializationError::UnsupportedLayout {
            what: "player sprites",
            revision: ctx.section_revision(),
        });
    }

    let sprite = Layout::resolve(SPRITE, &ctx.revision);
    let mut record = Record::new();
    for animation in ["walk", "stab", "slash"] {
        record.insert(animation, sprite.read_many(cursor, DIRECTIONS, ctx.codec())?);
    }
    Ok(record)
}
