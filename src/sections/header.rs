use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{text, u16, u8, FieldSpec, Layout};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;
use crate::version::Version;

const FIELDS: &[FieldSpec] = &[
    u16("zeldaVersion"),
    u8("build"),
    u8("pwHash").repeat(16),
    u16("internal"),
    u8("questNumber"),
    text("version", 9),
    text("minVersion", 9),
    text("title", 65),
    text("author", 65),
    u8("useKeyfile"),
    u8("dataFlags").repeat(20).when(|r| r.section >= 1),
    text("templatePath", 2048).when(|r| r.section >= 2),
];

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    Layout::resolve(FIELDS, &ctx.revision).read(cursor, ctx.codec())
}

/// The format version a decoded header announces.
pub fn version_of(record: &Record) -> Option<Version> {
    let major = u16::try_from(record.get_u64("zeldaVersion")?).ok()?;
    let build = u8::try_from(record.get_u64("build")?).ok()?;
    Some(Version::new(major, build))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::test_utils::{decode_with, Bytes};
    use pretty_assertions::assert_eq;

    fn header_bytes() -> Bytes {
        Bytes::new()
            .u16(0x211)
            .u8(7)
            .zeros(16)
            .u16(0)
            .u8(3)
            .text("1.0", 9)
            .text("", 9)
            .text("Test Quest", 65)
            .text("Someone", 65)
            .u8(0)
    }

    #[test]
    fn test_decodes_revision_zero_header() {
        let data = header_bytes().0;
        let (record, remaining) = decode_with(decode, &data, Version::ZERO, 0);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(version_of(&record), Some(Version::new(0x211, 7)));
        assert_eq!(record.get_str("title"), Some("Test Quest"));
        assert_eq!(record.get_u64("questNumber"), Some(3));
        assert_eq!(record.get("pwHash").and_then(|v| v.len()), Some(16));
        assert!(!record.contains("dataFlags"));
    }

    #[test]
    fn test_later_revisions_add_trailing_fields() {
        let data = header_bytes().zeros(20).text("templates/base.qst", 2048).0;
        let (record, remaining) = decode_with(decode, &data, Version::ZERO, 2);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(record.get_str("templatePath"), Some("templates/base.qst"));
    }
}
