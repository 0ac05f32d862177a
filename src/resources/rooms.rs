//! Room records
//!
//! ```text
//! header     u8 width, u8 height, u8 scene
//!            u8 x8 running entity count per entity group
//!            16 x { u8 left, top, right, bottom, u8 script | 0x80 if once }
//! map        width * height tiles
//! entrances  u8 count, { u16 x, u16 y, u8 orientation } ...
//! entities   { u8 entity, u16 x, u16 y, u8 parameter } ... in group order
//! scripts    u8 count, u16 offset ..., bytecode
//! "ENDR"
//! ```
//!
//! Script offsets are relative to the start of the script block. Script 0
//! is the room's startup script.

use rustc_hash::FxHashSet as HashSet;
use serde::Deserialize;

use super::NameIndex;
use crate::bytecode::InstructionTable;
use crate::diagnostics::{CompileError, ErrorList, Location, ResourceKind};
use crate::gamestate::{room_variables, GameState};
use crate::script::{compile_script, RoomDirectory, Script, ScriptContext};

pub const MAX_ROOM_SCRIPTS: usize = 64;
pub const MAX_SCRIPT_TRIGGERS: usize = 16;
pub const MAX_ENTITY_GROUPS: usize = 8;
pub const MAX_ROOM_ENTITIES: usize = 64;
pub const MAX_ROOM_ENTRANCES: usize = 32;
pub const MAX_ROOM_SIZE: usize = 255;
pub const METATILE_SIZE: usize = 16;

pub const STARTUP_SCRIPT: &str = "startup";
pub const END_MARKER: &[u8; 4] = b"ENDR";

const TRIGGER_SIZE: usize = 5;
pub const HEADER_SIZE: usize = 3 + MAX_ENTITY_GROUPS + MAX_SCRIPT_TRIGGERS * TRIGGER_SIZE;

const MAX_SCRIPT_BLOCK_SIZE: usize = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomEntrance {
    pub name: String,
    pub x: u16,
    pub y: u16,
    #[serde(default)]
    pub orientation: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomEntity {
    pub entity: String,
    pub x: u16,
    pub y: u16,
    #[serde(default)]
    pub parameter: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityGroup {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<RoomEntity>,
}

/// A tile rectangle that starts a room script when the player enters it
///
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptTrigger {
    pub script: String,
    pub left: u8,
    pub top: u8,
    pub right: u8,
    pub bottom: u8,
    #[serde(default)]
    pub once: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomScript {
    pub name: String,
    pub script: Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub name: String,
    pub scene: String,
    pub width: usize,
    pub height: usize,
    /// Row-major metatile indexes
    #[serde(default)]
    pub tiles: Vec<u8>,
    #[serde(default)]
    pub entrances: Vec<RoomEntrance>,
    #[serde(default)]
    pub entity_groups: Vec<EntityGroup>,
    #[serde(default)]
    pub script_triggers: Vec<ScriptTrigger>,
    #[serde(default)]
    pub temp_flags: Vec<String>,
    #[serde(default)]
    pub temp_words: Vec<String>,
    #[serde(default)]
    pub startup_script: Script,
    #[serde(default)]
    pub scripts: Vec<RoomScript>,
}

impl Room {
    /// Script names in script-index order, startup first
    pub fn script_names(&self) -> Vec<&str> {
        std::iter::once(STARTUP_SCRIPT)
            .chain(self.scripts.iter().map(|s| s.name.as_str()))
            .collect()
    }

    fn contains_pixel(&self, x: u16, y: u16) -> bool {
        (x as usize) < self.width.saturating_mul(METATILE_SIZE)
            && (y as usize) < self.height.saturating_mul(METATILE_SIZE)
    }
}

/// Project tables a room may reference
pub struct RoomContext<'a> {
    pub instructions: &'a InstructionTable,
    pub game_state: &'a GameState,
    pub scenes: &'a NameIndex,
    pub entities: &'a NameIndex,
    pub rooms: &'a RoomDirectory,
}

/// Validate and encode `room`, compiling its scripts
///
/// Content errors go to `errors`. Running out of variable space or
/// overflowing the script block is fatal.
pub fn encode_room(
    room: &Room,
    ctx: &RoomContext,
    errors: &mut ErrorList,
) -> Result<Vec<u8>, CompileError> {
    let variables = room_variables(
        ctx.game_state,
        &room.name,
        &room.temp_flags,
        &room.temp_words,
        errors,
    )?;

    let script_names = room.script_names();
    let group_names: Vec<&str> = room.entity_groups.iter().map(|g| g.name.as_str()).collect();

    let mut out = Vec::with_capacity(HEADER_SIZE + room.tiles.len());

    write_header(room, ctx, &script_names, errors, &mut out);
    write_map(room, errors, &mut out);
    write_entrances(room, errors, &mut out);
    write_entities(room, ctx, errors, &mut out);

    let script_ctx = ScriptContext {
        instructions: ctx.instructions,
        variables: &variables,
        room_scripts: &script_names,
        entity_groups: &group_names,
        rooms: ctx.rooms,
    };
    let scripts = encode_scripts(room, &script_ctx, errors)?;
    out.extend_from_slice(&scripts);

    out.extend_from_slice(END_MARKER);

    log::debug!(
        "room {}: {} bytes, {} scripts",
        room.name,
        out.len(),
        script_names.len()
    );
    Ok(out)
}

fn room_error(errors: &mut ErrorList, room: &Room, index: Option<usize>, message: String) {
    let loc = index.map_or(Location::None, Location::Item);
    errors.add_error(ResourceKind::Room, &room.name, loc, message);
}

/// Report duplicate names inside one room collection
fn check_unique<'a>(
    room: &Room,
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
    errors: &mut ErrorList,
) {
    let mut seen = HashSet::default();
    for (i, name) in names.into_iter().enumerate() {
        if !crate::bytecode::is_valid_name(name) {
            room_error(errors, room, Some(i), format!("invalid {} name: {}", what, name));
        }
        if !seen.insert(name) {
            room_error(errors, room, Some(i), format!("duplicate {} name: {}", what, name));
        }
    }
}

fn write_header(
    room: &Room,
    ctx: &RoomContext,
    script_names: &[&str],
    errors: &mut ErrorList,
    out: &mut Vec<u8>,
) {
    for (what, size) in [("width", room.width), ("height", room.height)] {
        if size == 0 || size > MAX_ROOM_SIZE {
            room_error(
                errors,
                room,
                None,
                format!("map {} must be between 1 and {}", what, MAX_ROOM_SIZE),
            );
        }
    }

    let scene = match ctx.scenes.get(&room.scene) {
        Some(i) => i as u8,
        None => {
            room_error(errors, room, None, format!("unknown scene: {}", room.scene));
            0
        }
    };

    out.push(room.width.min(MAX_ROOM_SIZE) as u8);
    out.push(room.height.min(MAX_ROOM_SIZE) as u8);
    out.push(scene);

    // Entity groups
    check_unique(
        room,
        "entity group",
        room.entity_groups.iter().map(|g| g.name.as_str()),
        errors,
    );
    if room.entity_groups.len() > MAX_ENTITY_GROUPS {
        room_error(
            errors,
            room,
            None,
            format!("too many entity groups (maximum is {})", MAX_ENTITY_GROUPS),
        );
    }

    let mut count = 0;
    for i in 0..MAX_ENTITY_GROUPS {
        count += room.entity_groups.get(i).map_or(0, |g| g.entities.len());
        out.push(count.min(u8::MAX as usize) as u8);
    }

    // Script triggers
    if room.script_triggers.len() > MAX_SCRIPT_TRIGGERS {
        room_error(
            errors,
            room,
            None,
            format!("too many script triggers (maximum is {})", MAX_SCRIPT_TRIGGERS),
        );
    }

    for i in 0..MAX_SCRIPT_TRIGGERS {
        let Some(trigger) = room.script_triggers.get(i) else {
            out.extend_from_slice(&[0xFF; TRIGGER_SIZE]);
            continue;
        };

        let (left, top, right, bottom) = (
            trigger.left as usize,
            trigger.top as usize,
            trigger.right as usize,
            trigger.bottom as usize,
        );
        if left >= right || top >= bottom || right > room.width || bottom > room.height {
            room_error(
                errors,
                room,
                Some(i),
                "script trigger must be a non-empty rectangle inside the map".to_string(),
            );
        }

        let script = match script_names.iter().position(|s| *s == trigger.script) {
            Some(s) => s as u8,
            None => {
                room_error(
                    errors,
                    room,
                    Some(i),
                    format!("unknown room script: {}", trigger.script),
                );
                0
            }
        };

        out.extend_from_slice(&[
            trigger.left,
            trigger.top,
            trigger.right,
            trigger.bottom,
            if trigger.once { script | 0x80 } else { script },
        ]);
    }
}

fn write_map(room: &Room, errors: &mut ErrorList, out: &mut Vec<u8>) {
    let expected = room.width.min(MAX_ROOM_SIZE) * room.height.min(MAX_ROOM_SIZE);
    if room.tiles.len() != expected {
        room_error(
            errors,
            room,
            None,
            format!(
                "map has {} tiles, expected {} ({}x{})",
                room.tiles.len(),
                expected,
                room.width,
                room.height
            ),
        );
    }

    let mut tiles = room.tiles.clone();
    tiles.resize(expected, 0);
    out.extend_from_slice(&tiles);
}

fn write_entrances(room: &Room, errors: &mut ErrorList, out: &mut Vec<u8>) {
    check_unique(
        room,
        "entrance",
        room.entrances.iter().map(|e| e.name.as_str()),
        errors,
    );
    if room.entrances.len() > MAX_ROOM_ENTRANCES {
        room_error(
            errors,
            room,
            None,
            format!("too many entrances (maximum is {})", MAX_ROOM_ENTRANCES),
        );
    }

    out.push(room.entrances.len().min(u8::MAX as usize) as u8);
    for (i, entrance) in room.entrances.iter().enumerate() {
        if !room.contains_pixel(entrance.x, entrance.y) {
            room_error(
                errors,
                room,
                Some(i),
                format!("entrance {} is outside the map", entrance.name),
            );
        }
        out.extend_from_slice(&entrance.x.to_le_bytes());
        out.extend_from_slice(&entrance.y.to_le_bytes());
        out.push(entrance.orientation);
    }
}

fn write_entities(room: &Room, ctx: &RoomContext, errors: &mut ErrorList, out: &mut Vec<u8>) {
    let total: usize = room.entity_groups.iter().map(|g| g.entities.len()).sum();
    if total > MAX_ROOM_ENTITIES {
        room_error(
            errors,
            room,
            None,
            format!("too many entities (maximum is {})", MAX_ROOM_ENTITIES),
        );
    }

    let entities = room.entity_groups.iter().flat_map(|g| g.entities.iter());
    for (i, entity) in entities.enumerate() {
        let index = match ctx.entities.get(&entity.entity) {
            Some(e) => e as u8,
            None => {
                room_error(errors, room, Some(i), format!("unknown entity: {}", entity.entity));
                0
            }
        };
        if !room.contains_pixel(entity.x, entity.y) {
            room_error(
                errors,
                room,
                Some(i),
                format!("entity {} is outside the map", entity.entity),
            );
        }

        out.push(index);
        out.extend_from_slice(&entity.x.to_le_bytes());
        out.extend_from_slice(&entity.y.to_le_bytes());
        out.push(entity.parameter);
    }
}

fn encode_scripts(
    room: &Room,
    ctx: &ScriptContext,
    errors: &mut ErrorList,
) -> Result<Vec<u8>, CompileError> {
    check_unique(room, "room script", ctx.room_scripts.iter().copied(), errors);
    if ctx.room_scripts.len() > MAX_ROOM_SCRIPTS {
        room_error(
            errors,
            room,
            None,
            format!("too many room scripts (maximum is {})", MAX_ROOM_SCRIPTS),
        );
    }

    let sources = std::iter::once(&room.startup_script).chain(room.scripts.iter().map(|s| &s.script));

    let count = ctx.room_scripts.len();
    let mut offsets = Vec::with_capacity(count);
    let mut code = Vec::new();
    let table_size = 1 + 2 * count;

    for (name, script) in ctx.room_scripts.iter().zip(sources) {
        let full_name = format!("{}.{}", room.name, name);
        offsets.push(table_size + code.len());
        code.extend(compile_script(&script.nodes, &full_name, ctx, errors)?);
    }

    let size = table_size + code.len();
    if size > MAX_SCRIPT_BLOCK_SIZE {
        return Err(CompileError::RecordTooLarge {
            kind: ResourceKind::Room,
            name: room.name.clone(),
            size,
            max: MAX_SCRIPT_BLOCK_SIZE,
        });
    }

    let mut block = Vec::with_capacity(size);
    block.push(count.min(u8::MAX as usize) as u8);
    for offset in offsets {
        block.extend_from_slice(&(offset as u16).to_le_bytes());
    }
    block.extend_from_slice(&code);
    Ok(block)
}
