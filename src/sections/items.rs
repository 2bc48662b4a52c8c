use crate::err::DeserializationResult;
use crate::model::Record;
use crate::schema::{text, u16, u32, u8, FieldSpec, FieldType, Layout};
use crate::sections::weapons::read_named_table;
use crate::sections::SectionContext;
use crate::utils::ByteCursor;

/// Names of the built-in items, in item id order, for files that predate embedded names.
pub const DEFAULT_ITEM_NAMES: &[&str] = &[
    "Rupee",
    "5 Rupees",
    "Heart",
    "Bombs",
    "Clock",
    "Wooden Sword",
    "White Sword",
    "Magic Sword",
    "Shield",
    "Key",
    "Blue Candle",
    "Red Candle",
    "Letter",
    "Arrow",
    "Silver Arrow",
    "Bow",
    "Bait",
    "Blue Ring",
    "Red Ring",
    "Power Bracelet",
    "Triforce",
    "Map",
    "Compass",
    "Wooden Boomerang",
    "Magic Boomerang",
    "Wand",
    "Raft",
    "Ladder",
    "Heart Container",
    "Blue Potion",
    "Red Potion",
    "Whistle",
    "Magic Book",
    "Magic Key",
    "Fairy",
    "Fire Boomerang",
    "Master Sword",
    "Magic Shield",
    "Super Bomb",
    "Big Triforce",
];

/// Name for item `id` when the file carries none. Unnamed ids past the table are `zz###`.
pub fn default_item_name(id: usize) -> String {
    match DEFAULT_ITEM_NAMES.get(id) {
        Some(name) => (*name).to_string(),
        None => format!("zz{:03}", id),
    }
}

const NAME: &[FieldSpec] = &[text("name", 64).when(|r| r.section > 1)];

const DATA: &[FieldSpec] = &[
    FieldSpec::dynamic("tile", |r| {
        if r.section >= 35 {
            FieldType::U32
        } else {
            FieldType::U16
        }
    }),
    u8("misc"),
    u8("csets"),
    u8("frames"),
    u8("speed"),
    u8("delay"),
    u32("ltm"),
    u8("family").when(|r| r.section > 1),
    u8("familyLevel").when(|r| r.section > 1),
    u8("power").when(|r| r.section > 1),
    u16("flags").when(|r| r.section > 1),
    u16("script").when(|r| r.section > 1),
    u8("count").when(|r| r.section > 1),
    u16("amount").when(|r| r.section > 1),
    u16("collectScript").when(|r| r.section > 1),
    u16("setMax").when(|r| r.section > 1),
    u16("max").when(|r| r.section > 1),
    u8("playSound").when(|r| r.section > 1),
    u32("initD").repeat(8).when(|r| r.section > 1),
    u8("initA").repeat(2).when(|r| r.section > 1),
    u8("wpn").repeat(10).when(|r| r.section > 4),
    u8("pickupHearts").when(|r| r.section > 4),
    u32("miscData").repeat(10).when(|r| r.section > 4),
    u8("magic").when(|r| r.section > 5),
    u8("useSound").when(|r| r.section > 5),
    u8("useWeapon").when(|r| r.section >= 26),
    u8("useDefense").when(|r| r.section >= 26),
    u32("weaponRange").when(|r| r.section >= 26),
    u32("weaponDuration").when(|r| r.section >= 26),
    u32("weaponPattern").repeat(10).when(|r| r.section >= 26),
    u32("duplicates").when(|r| r.section >= 27),
    u32("drawLayer").when(|r| r.section >= 28),
    u32("collectFlags").when(|r| r.section >= 29 && r.version.major_gt(0x250)),
];

fn item_count(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<usize> {
    let version = ctx.version();
    Ok(if version.major_lt(0x186) {
        64
    } else if !version.major_gt(0x192) {
        256
    } else {
        usize::from(cursor.u16_named("item count")?)
    })
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let count = item_count(cursor, ctx)?;
    let names = Layout::resolve(NAME, &ctx.revision);
    let embedded_names = names.byte_len() > 0;

    let mut items = read_named_table(cursor, ctx, count, &names, &Layout::resolve(DATA, &ctx.revision))?;
    if !embedded_names {
        for (id, item) in items.iter_mut().enumerate() {
            item.insert("name", default_item_name(id));
        }
    }

    Ok(Record::new().with("items", items))
}
