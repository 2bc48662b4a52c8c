use crate::err::DeserializationResult;
use crate::model::{Record, Value};
use crate::sections::midi::bit_is_set;
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

pub fn rule_bytes(section_revision: u16) -> usize {
    if section_revision < 2 { 20 } else { 100 }
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let rules = cursor.read(rule_bytes(ctx.section_revision()), "rules")?;
    let enabled: Vec<Value> = (0..rules.len() * 8)
        .filter(|&bit| bit_is_set(rules, bit))
        .map(|bit| Value::U16(bit as u16))
        .collect();

    Ok(Record::new()
        .with("rules", rules.to_vec())
        .with("enabled", enabled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::test_utils::decode_with;
    use crate::version::Version;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lists_enabled_rules() {
        let mut data = vec![0_u8; 100];
        data[0] = 0b1000_0001;
        data[99] = 0b1000_0000;

        let (record, remaining) = decode_with(decode, &data, Version::new(0x250, 0), 2);
        let record = record.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(
            record.get("enabled"),
            Some(&Value::List(vec![Value::U16(0), Value::U16(7), Value::U16(799)]))
        );
        assert_eq!(record.get("rules").and_then(Value::len), Some(100));
    }

    #[test]
    fn test_old_rule_block_is_shorter() {
        let (record, remaining) = decode_with(decode, &[0; 24], Version::new(0x190, 0), 1);
        assert_eq!(remaining, 4);
        assert_eq!(record.unwrap().get("rules").and_then(Value::len), Some(20));
    }
}
