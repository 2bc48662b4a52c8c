//! Declarative field layouts.
//!
//! A section layout is written as a static table of [`FieldSpec`]s. Each spec names a field and
//! says, as pure functions of the [`Revision`], which primitive it is, how many times it repeats,
//! and whether it is present at all. [`Layout::resolve`] turns a table into concrete
//! [`FieldDescriptor`]s before a single byte is read, so the byte size of a record is known up
//! front and a record is read in one pass with one bounds check.
//!
//! Fields are packed, with no alignment. Names starting with `_` are padding: they consume their
//! bytes but do not show up in the decoded record.

use encoding::EncodingRef;
use log::trace;

use crate::err::{DeserializationError, DeserializationResult};
use crate::model::{Record, Value};
use crate::utils::ByteCursor;
use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    U8,
    U16,
    U32,
    I16Be,
    U32Be,
    /// NUL padded text of a fixed width.
    Text(usize),
}

impl FieldType {
    pub const fn width(&self) -> usize {
        match self {
            FieldType::U8 => 1,
            FieldType::U16 | FieldType::I16Be => 2,
            FieldType::U32 | FieldType::U32Be => 4,
            FieldType::Text(n) => *n,
        }
    }
}

/// Everything a layout decision may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revision {
    pub version: Version,
    /// The section's own revision counter.
    pub section: u16,
    /// The container revision from the same section header.
    pub container: u16,
}

impl Revision {
    pub const fn new(version: Version, section: u16, container: u16) -> Self {
        Revision {
            version,
            section,
            container,
        }
    }
}

pub type Predicate = fn(&Revision) -> bool;

#[derive(Clone, Copy)]
pub enum TypeRule {
    Fixed(FieldType),
    Dynamic(fn(&Revision) -> FieldType),
}

#[derive(Clone, Copy)]
pub enum CountRule {
    Scalar,
    Fixed(usize),
    Dynamic(fn(&Revision) -> usize),
}

/// One row of a layout table.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    ty: TypeRule,
    count: CountRule,
    when: Option<Predicate>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        FieldSpec {
            name,
            ty: TypeRule::Fixed(ty),
            count: CountRule::Scalar,
            when: None,
        }
    }

    /// A field whose primitive type depends on the revision.
    pub const fn dynamic(name: &'static str, rule: fn(&Revision) -> FieldType) -> Self {
        FieldSpec {
            name,
            ty: TypeRule::Dynamic(rule),
            count: CountRule::Scalar,
            when: None,
        }
    }

    pub const fn repeat(self, count: usize) -> Self {
        FieldSpec {
            count: CountRule::Fixed(count),
            ..self
        }
    }

    pub const fn repeat_with(self, rule: fn(&Revision) -> usize) -> Self {
        FieldSpec {
            count: CountRule::Dynamic(rule),
            ..self
        }
    }

    pub const fn when(self, predicate: Predicate) -> Self {
        FieldSpec {
            when: Some(predicate),
            ..self
        }
    }

    pub fn resolve(&self, rev: &Revision) -> FieldDescriptor {
        let field_type = match self.ty {
            TypeRule::Fixed(t) => t,
            TypeRule::Dynamic(rule) => rule(rev),
        };
        let repeat = match self.count {
            CountRule::Scalar => None,
            CountRule::Fixed(n) => Some(n),
            CountRule::Dynamic(rule) => Some(rule(rev)),
        };
        let included = self.when.is_none_or(|p| p(rev));

        FieldDescriptor {
            name: self.name,
            field_type,
            repeat,
            included,
        }
    }
}

pub const fn u8(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldType::U8)
}

pub const fn u16(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldType::U16)
}

pub const fn u32(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldType::U32)
}

pub const fn text(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec::new(name, FieldType::Text(width))
}

/// A fully resolved field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub field_type: FieldType,
    pub repeat: Option<usize>,
    pub included: bool,
}

impl FieldDescriptor {
    pub fn byte_len(&self) -> usize {
        if !self.included {
            return 0;
        }
        self.field_type
            .width()
            .saturating_mul(self.repeat.unwrap_or(1))
    }

    pub fn is_padding(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// A concrete byte layout: the included fields of a table, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<FieldDescriptor>,
    byte_len: usize,
}

impl Layout {
    pub fn resolve(specs: &[FieldSpec], rev: &Revision) -> Self {
        Layout::from_descriptors(specs.iter().map(|spec| spec.resolve(rev)))
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let fields: Vec<FieldDescriptor> = descriptors.into_iter().filter(|d| d.included).collect();
        let byte_len = fields
            .iter()
            .fold(0_usize, |acc, d| acc.saturating_add(d.byte_len()));
        Layout { fields, byte_len }
    }

    /// Exact number of bytes [`Layout::read`] consumes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Reads one record.
    ///
    /// Repeated `u8` fields become [`Value::Bytes`], other repeated fields [`Value::List`].
    pub fn read(&self, cursor: &mut ByteCursor, ansi_codec: EncodingRef) -> DeserializationResult<Record> {
        let mut record_cursor = cursor.sub_cursor(self.byte_len, "record")?;
        let mut record = Record::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = match field.repeat {
                Some(n) if field.field_type == FieldType::U8 => {
                    Value::Bytes(record_cursor.read(n, field.name)?.to_vec())
                }
                Some(n) => {
                    let mut values = Vec::with_capacity(n);
                    for _ in 0..n {
                        values.push(record_cursor.read_primitive(field.field_type, field.name, ansi_codec)?);
                    }
                    Value::List(values)
                }
                None => record_cursor.read_primitive(field.field_type, field.name, ansi_codec)?,
            };

            if !field.is_padding() {
                record.insert(field.name, value);
            }
        }

        debug_assert_eq!(record_cursor.remaining(), 0);
        Ok(record)
    }

    /// Reads `count` consecutive records.
    pub fn read_many(
        &self,
        cursor: &mut ByteCursor,
        count: usize,
        ansi_codec: EncodingRef,
    ) -> DeserializationResult<Vec<Record>> {
        let total = self
            .byte_len
            .checked_mul(count)
            .ok_or(DeserializationError::InvalidValue {
                what: "record count",
                value: count as u64,
                offset: cursor.position(),
            })?;
        if total > cursor.remaining() {
            return Err(DeserializationError::Truncated {
                what: "record table",
                offset: cursor.position(),
                need: total,
                have: cursor.remaining(),
            });
        }

        trace!(
            "Offset `0x{offset:08x} ({offset})` reading {count} records of {len} bytes",
            offset = cursor.position(),
            count = count,
            len = self.byte_len
        );

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(self.read(cursor, ansi_codec)?);
        }
        Ok(records)
    }
}
