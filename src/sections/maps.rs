//! Maps, their screens and each screen's freeform combos.
//!
//! The screen record is the most heavily revised structure of the format: its fields are gated on
//! the global version, on the section revision, and in a few places on both.

use crate::err::DeserializationResult;
use crate::model::{Record, Value};
use crate::schema::{u16, u32, u8, FieldSpec, FieldType, Layout, Revision};
use crate::sections::SectionContext;
use crate::utils::ByteCursor;
use crate::version::Version;

const V192_10: Version = Version::new(0x192, 10);
const V192_20: Version = Version::new(0x192, 20);
const V192_23: Version = Version::new(0x192, 23);
const V192_97: Version = Version::new(0x192, 97);
const V192_98: Version = Version::new(0x192, 98);
const V192_137: Version = Version::new(0x192, 137);
const V192_145: Version = Version::new(0x192, 145);
const V192_146: Version = Version::new(0x192, 146);
const V192_149: Version = Version::new(0x192, 149);
const V192_153: Version = Version::new(0x192, 153);
const V192_154: Version = Version::new(0x192, 154);
const V211_1: Version = Version::new(0x211, 1);
const V211_2: Version = Version::new(0x211, 2);
const V211_7: Version = Version::new(0x211, 7);
const V211_9: Version = Version::new(0x211, 9);
const V211_14: Version = Version::new(0x211, 14);

const SCREEN_COMBOS: usize = 16 * 11;
const MAX_FFCS: usize = 32;

fn narrow_or(wide: bool, ty: FieldType) -> FieldType {
    if wide { ty } else { FieldType::U8 }
}

/// Warp tables hold four entries once the version is past 0x211 build 7.
fn warp_slots(r: &Revision) -> usize {
    if r.version.gt(V211_7) { 4 } else { 1 }
}

fn secret_combo_count(r: &Revision) -> usize {
    if r.version.lt(V192_137) {
        20
    } else if r.version.major == 0x192 && r.version.build < 154 {
        256
    } else {
        128
    }
}

pub fn screens_per_map(version: Version) -> usize {
    if version.lt(V192_137) { 132 } else { 136 }
}

const SCREEN: &[FieldSpec] = &[
    u8("valid"),
    u8("guy"),
    FieldSpec::dynamic("str", |r| narrow_or(r.version.gt(V192_146), FieldType::U16)),
    u8("room"),
    u8("item"),
    u8("hasitem").when(|r| r.version.gte(V211_14)),
    u8("_padding").when(|r| r.version.lt(V192_154)),
    u8("tileWarpType").repeat_with(warp_slots),
    u16("doorComboSet").when(|r| r.version.gt(V192_153)),
    u8("warpReturnX").repeat_with(warp_slots),
    u8("warpReturnY").repeat_with(warp_slots),
    FieldSpec::dynamic("warpReturnC", |r| narrow_or(r.section >= 18, FieldType::U16))
        .when(|r| r.version.gt(V211_7)),
    u8("stairX"),
    u8("stairY"),
    u8("itemX"),
    u8("itemY"),
    FieldSpec::dynamic("color", |r| narrow_or(r.section > 15, FieldType::U16)),
    u8("enemyFlags"),
    u8("doors").repeat(4),
    FieldSpec::dynamic("tileWarpDmap", |r| narrow_or(r.section > 11, FieldType::U16))
        .repeat_with(warp_slots),
    u8("tileWarpScreen").repeat_with(warp_slots),
    u8("tileWarpOverlayFlags").when(|r| r.section >= 15),
    u8("exitDir"),
    u8("_padding").when(|r| r.version.major_lt(0x193)),
    u8("_padding").when(|r| r.version.gt(V192_145) && r.version.lt(V192_154)),
    FieldSpec::dynamic("enemies", |r| narrow_or(r.version.gte(V192_10), FieldType::U16)).repeat(10),
    u8("pattern"),
    u8("sideWarpType").repeat_with(warp_slots),
    u8("sideWarpOverlayFlags").when(|r| r.section >= 15),
    u8("warpArrivalX"),
    u8("warpArrivalY"),
    u8("path").repeat(4),
    u8("sideWarpScreen").repeat_with(warp_slots),
    FieldSpec::dynamic("sideWarpDmap", |r| narrow_or(r.section > 11, FieldType::U16))
        .repeat_with(warp_slots),
    u8("sideWarpIndex").when(|r| r.version.gt(V211_7)),
    u16("underCombo"),
    u8("old_cpage").when(|r| r.version.major_lt(0x193)),
    u8("underCset"),
    u16("catchAll"),
    u8("flags"),
    u8("flags2"),
    u8("flags3"),
    u8("flags4").when(|r| r.version.gt(V211_1)),
    u8("flags5").when(|r| r.version.gt(V211_7)),
    u16("noreset").when(|r| r.version.gt(V211_7)),
    u16("nocarry").when(|r| r.version.gt(V211_7)),
    u8("flags6").when(|r| r.version.gt(V211_9)),
    u8("flags7").when(|r| r.section > 5),
    u8("flags8").when(|r| r.section > 5),
    u8("flags9").when(|r| r.section > 5),
    u8("flags10").when(|r| r.section > 5),
    u8("csensitive").when(|r| r.section > 5),
    u8("oceanSfx").when(|r| r.section >= 14),
    u8("bossSfx").when(|r| r.section >= 14),
    u8("secretSfx").when(|r| r.section >= 14),
    u8("holdUpSfx").when(|r| r.section >= 15),
    u8("layerMap").repeat(6).when(|r| r.version.gt(V192_97)),
    u8("layerScreen").repeat(6).when(|r| r.version.gt(V192_97)),
    u8("_skip").repeat(4).when(|r| r.version.gt(V192_23) && r.version.lt(V192_98)),
    u8("layerOpacity").repeat(6).when(|r| r.version.gt(V192_149)),
    u8("_padding").when(|r| r.version.equals(V192_153)),
    u16("timedWarpTics").when(|r| r.version.gt(V192_153)),
    u8("nextMap").when(|r| r.version.gt(V211_2)),
    u8("nextScreen").when(|r| r.version.gt(V211_2)),
    FieldSpec::dynamic("secretCombos", |r| narrow_or(!r.version.lt(V192_154), FieldType::U16))
        .repeat_with(secret_combo_count),
    u8("secretCsets").repeat(128).when(|r| r.version.gt(V192_153)),
    u8("secretFlags").repeat(128).when(|r| r.version.gt(V192_153)),
    u8("_padding").when(|r| r.version.gt(V192_97) && r.version.lt(V192_154)),
    u16("data").repeat(SCREEN_COMBOS),
    u8("sflag").repeat(SCREEN_COMBOS).when(|r| r.version.gt(V192_20)),
    u8("cset").repeat(SCREEN_COMBOS).when(|r| r.version.gt(V192_97)),
    u16("screenMidi").when(|r| r.section > 4),
    u8("lensLayer").when(|r| r.section >= 17),
];

const FREEFORM_COMBO: &[FieldSpec] = &[
    u16("data"),
    u8("cset"),
    u16("delay"),
    u32("x").when(|r| r.section >= 9),
    u32("y").when(|r| r.section >= 9),
    u32("xDelta").when(|r| r.section >= 9),
    u32("yDelta").when(|r| r.section >= 9),
    u32("xDelta2").when(|r| r.section >= 9),
    u32("yDelta2").when(|r| r.section >= 9),
    u8("link"),
    u8("width").when(|r| r.section > 7),
    u8("height").when(|r| r.section > 7),
    u32("flags").when(|r| r.section > 7),
    u16("script").when(|r| r.section > 9),
    u32("initd").repeat(8).when(|r| r.section > 10),
    u8("inita").repeat(2).when(|r| r.section > 10),
];

fn is_253_plus(r: &Revision) -> bool {
    r.version.major_gt(0x253)
}

const SCREEN_TRAILER: &[FieldSpec] = &[
    u32("npcStrings").repeat(10).when(|r| r.section >= 19 && is_253_plus(r)),
    u16("newItems").repeat(10).when(|r| r.section >= 19 && is_253_plus(r)),
    u16("newItemX").repeat(10).when(|r| r.section >= 19 && is_253_plus(r)),
    u16("newItemY").repeat(10).when(|r| r.section >= 19 && is_253_plus(r)),
    u16("script").when(|r| r.section >= 20 && is_253_plus(r)),
    u32("screenInitd").repeat(8).when(|r| r.section >= 20 && is_253_plus(r)),
    u8("preloadScript").when(|r| r.section >= 21 && is_253_plus(r)),
    u8("hideLayers").when(|r| r.section >= 22 && is_253_plus(r)),
    u8("hideScriptLayers").when(|r| r.section >= 22 && is_253_plus(r)),
];

struct ScreenLayouts {
    screen: Layout,
    freeform: Option<Layout>,
    trailer: Layout,
}

impl ScreenLayouts {
    fn resolve(rev: &Revision) -> Self {
        ScreenLayouts {
            screen: Layout::resolve(SCREEN, rev),
            freeform: (rev.section > 6).then(|| Layout::resolve(FREEFORM_COMBO, rev)),
            trailer: Layout::resolve(SCREEN_TRAILER, rev),
        }
    }

    fn read_screen(&self, cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
        let mut screen = self.screen.read(cursor, ctx.codec())?;

        let freeform = match &self.freeform {
            Some(layout) => Some(read_freeform_combos(layout, cursor, ctx)?),
            None => None,
        };

        screen.merge(self.trailer.read(cursor, ctx.codec())?);
        if let Some(ff) = freeform {
            screen.insert("ff", ff);
        }
        Ok(screen)
    }
}

/// A presence mask followed by the flagged combos. Absent slots stay in place as `Null`.
fn read_freeform_combos(
    layout: &Layout,
    cursor: &mut ByteCursor,
    ctx: &SectionContext,
) -> DeserializationResult<Vec<Value>> {
    let mask = cursor.u32_named("freeform combo mask")?;
    let mut slots = Vec::with_capacity(MAX_FFCS);
    for slot in 0..MAX_FFCS {
        if mask & (1 << slot) != 0 {
            slots.push(Value::Record(layout.read(cursor, ctx.codec())?));
        } else {
            slots.push(Value::Null);
        }
    }
    Ok(slots)
}

pub fn decode(cursor: &mut ByteCursor, ctx: &SectionContext) -> DeserializationResult<Record> {
    let map_count = usize::from(cursor.u16_named("map count")?);
    let screen_count = screens_per_map(ctx.version());
    let layouts = ScreenLayouts::resolve(&ctx.revision);

    let mut maps = Vec::with_capacity(map_count.min(cursor.remaining()));
    for _ in 0..map_count {
        let mut screens = Vec::with_capacity(screen_count);
        for _ in 0..screen_count {
            screens.push(layouts.read_screen(cursor, ctx)?);
        }
        maps.push(Record::new().with("screens", screens));
    }

    Ok(Record::new().with("maps", maps))
}
