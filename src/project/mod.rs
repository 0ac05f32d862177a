//! Project input and compilation
//!
//! [`compile_project`] validates every resource collection, encodes the
//! entity and room records, and only when no error was reported places
//! the data in a fixed order:
//!
//! 1. tile data, at the origin of its bank
//! 2. palettes, metatile tilesets, frame sets
//! 3. entities, projectiles, players
//! 4. rooms

use indexmap::IndexMap;
use rustc_hash::FxHashSet as HashSet;
use serde::Deserialize;
use std::path::Path;

use crate::bytecode::{compile_instruction_table, Instruction, InstructionTable};
use crate::config::MemoryMap;
use crate::diagnostics::{CompileError, ErrorList, Location, ResourceKind};
use crate::gamestate::{validate_game_state, GameState, MAX_FLAGS};
use crate::resources::{
    encode_entries, encode_room, resolve_structs, validate_frame_sets, validate_function_tables,
    BinaryResource, EntityContext, EntityFunctionTable, EntityRomEntry, EntityRomStruct,
    ExportOrder, FrameSet, NameIndex, Room, RoomContext, Scene,
};
use crate::rom::RomDataWriter;
use crate::script::RoomDirectory;

/// Resources referenced by a one byte index can't have more entries than this
pub const MAX_LIST_SIZE: usize = 256;

/// Bulk tile data, placed at the very start of a bank
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileData {
    #[serde(default)]
    pub bank: usize,
    pub data: Vec<u8>,
}

/// Every resource of a project, as read from the project file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub memory_map: Option<MemoryMap>,
    pub constants: IndexMap<String, i64>,
    pub instructions: Vec<Instruction>,
    pub game_state: GameState,
    pub structs: Vec<EntityRomStruct>,
    pub function_tables: Vec<EntityFunctionTable>,
    pub export_orders: Vec<ExportOrder>,
    pub frame_sets: Vec<FrameSet>,
    pub entities: Vec<EntityRomEntry>,
    pub projectiles: Vec<EntityRomEntry>,
    pub players: Vec<EntityRomEntry>,
    pub palettes: Vec<BinaryResource>,
    pub metatile_tilesets: Vec<BinaryResource>,
    pub scenes: Vec<Scene>,
    pub rooms: Vec<Room>,
    pub tile_data: Option<TileData>,
}

impl ProjectInput {
    pub fn from_toml_str(source: &str) -> Result<Self, CompileError> {
        toml::from_str(source).map_err(|e| CompileError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source).map_err(|e| match e {
            CompileError::Config(msg) => CompileError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Path of the binary image as referenced by the side-table's insert directives
    pub binary_path: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            binary_path: "romdata.bin".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRom {
    pub binary: Vec<u8>,
    pub inc_data: String,
    pub warnings: ErrorList,
}

/// Name indexes of the project-wide collections
struct ProjectNames {
    export_orders: NameIndex,
    function_tables: NameIndex,
    frame_sets: NameIndex,
    entities: NameIndex,
    scenes: NameIndex,
    rooms: NameIndex,
}

impl ProjectNames {
    fn build(input: &ProjectInput, errors: &mut ErrorList) -> Self {
        NameIndex::build(
            ResourceKind::Palette,
            input.palettes.iter().map(|p| p.name.as_str()),
            errors,
        );
        NameIndex::build(
            ResourceKind::MetaTileTileset,
            input.metatile_tilesets.iter().map(|t| t.name.as_str()),
            errors,
        );

        Self {
            export_orders: NameIndex::build(
                ResourceKind::ExportOrder,
                input.export_orders.iter().map(|e| e.name.as_str()),
                errors,
            ),
            function_tables: NameIndex::build(
                ResourceKind::EntityFunctionTable,
                input.function_tables.iter().map(|f| f.name.as_str()),
                errors,
            ),
            frame_sets: NameIndex::build(
                ResourceKind::FrameSet,
                input.frame_sets.iter().map(|f| f.name.as_str()),
                errors,
            ),
            // duplicates are reported when the entries are encoded
            entities: NameIndex::build(
                ResourceKind::Entity,
                input.entities.iter().map(|e| e.name.as_str()),
                &mut ErrorList::new(),
            ),
            scenes: NameIndex::build(
                ResourceKind::Scene,
                input.scenes.iter().map(|s| s.name.as_str()),
                errors,
            ),
            rooms: NameIndex::build(
                ResourceKind::Room,
                input.rooms.iter().map(|r| r.name.as_str()),
                errors,
            ),
        }
    }
}

fn check_list_sizes(input: &ProjectInput, errors: &mut ErrorList) {
    let lists = [
        (ResourceKind::EntityFunctionTable, input.function_tables.len()),
        (ResourceKind::FrameSet, input.frame_sets.len()),
        (ResourceKind::Entity, input.entities.len()),
        (ResourceKind::Projectile, input.projectiles.len()),
        (ResourceKind::Player, input.players.len()),
        (ResourceKind::Palette, input.palettes.len()),
        (ResourceKind::MetaTileTileset, input.metatile_tilesets.len()),
        (ResourceKind::Scene, input.scenes.len()),
        (ResourceKind::Room, input.rooms.len()),
    ];

    for (kind, len) in lists {
        if len > MAX_LIST_SIZE {
            errors.add_error(
                ResourceKind::Project,
                "project",
                Location::None,
                format!("too many {} resources: {} (maximum is {})", kind, len, MAX_LIST_SIZE),
            );
        }
    }
}

fn room_directory(rooms: &[Room]) -> RoomDirectory {
    let mut directory = RoomDirectory::new();
    for room in rooms {
        directory.add_room(&room.name, room.entrances.iter().map(|e| e.name.as_str()));
    }
    directory
}

/// Compile a project into the ROM image and the assembler side-table
pub fn compile_project(
    input: &ProjectInput,
    options: &CompileOptions,
) -> Result<CompiledRom, CompileError> {
    let map = input.memory_map.unwrap_or_default();
    map.validate()?;
    log::info!(
        "memory map: {}, {} banks from ${:02X}",
        map.mode,
        map.bank_count,
        map.first_bank
    );

    let mut errors = ErrorList::new();
    let instructions = compile_instruction_table(&input.instructions, MAX_FLAGS, &mut errors)?;

    // Validation
    log::info!("validating resources");
    let names = ProjectNames::build(input, &mut errors);
    check_list_sizes(input, &mut errors);

    let room_names: HashSet<&str> = input.rooms.iter().map(|r| r.name.as_str()).collect();
    validate_game_state(&input.game_state, &room_names, &mut errors)?;

    let structs = resolve_structs(&input.structs, &mut errors);
    validate_function_tables(&input.function_tables, &structs, &names.export_orders, &mut errors);
    validate_frame_sets(&input.frame_sets, &input.export_orders, &names.export_orders, &mut errors);

    // Encoding
    let entity_ctx = EntityContext {
        structs: &structs,
        function_tables: &input.function_tables,
        function_table_names: &names.function_tables,
        frame_sets: &input.frame_sets,
        frame_set_names: &names.frame_sets,
    };
    let entities = encode_entries(ResourceKind::Entity, &input.entities, &entity_ctx, &mut errors);
    let projectiles =
        encode_entries(ResourceKind::Projectile, &input.projectiles, &entity_ctx, &mut errors);
    let players = encode_entries(ResourceKind::Player, &input.players, &entity_ctx, &mut errors);
    log::info!(
        "encoded {} entities, {} projectiles, {} players",
        entities.len(),
        projectiles.len(),
        players.len()
    );

    let rooms = encode_rooms(input, &instructions, &names, &mut errors)?;
    log::info!("encoded {} rooms", rooms.len());

    if errors.has_errors() {
        log::info!("compilation failed with {} error(s)", errors.error_count());
        return Err(CompileError::Validation(errors));
    }
    let warnings = errors.take_warnings();

    // Placement
    log::info!("placing data");
    let mut writer = RomDataWriter::new(map);

    for (name, value) in &input.constants {
        writer.add_constant(name, *value);
    }
    for (name, info) in instructions.instructions_by_opcode() {
        writer.add_constant(&format!("Project.Bytecode.{}", name), info.opcode as i64);
    }
    writer.add_constant("Project.Bytecode.N_OPCODES", instructions.n_opcodes() as i64);

    // Tile data must start at a bank origin, so it goes first
    if let Some(tiles) = &input.tile_data {
        writer.add_fixed_data("Project.TileData", tiles.bank, &tiles.data)?;
    }

    writer.add_long_address_table("Project.PaletteList", &input.palettes)?;
    writer.add_long_address_table("Project.MetaTileTilesetList", &input.metatile_tilesets)?;
    writer.add_long_address_table("Project.FrameSetList", &input.frame_sets)?;
    writer.add_long_address_table("Project.EntityList", &entities)?;
    writer.add_long_address_table("Project.ProjectileList", &projectiles)?;
    writer.add_long_address_table("Project.PlayerList", &players)?;
    writer.add_long_address_table("Project.RoomList", &rooms)?;

    // Emission
    let output = writer.finish(&options.binary_path)?;
    log::info!("rom data: {} bytes", output.binary.len());

    for warning in warnings.iter() {
        log::warn!("{}", warning);
    }

    Ok(CompiledRom {
        binary: output.binary,
        inc_data: output.inc_data,
        warnings,
    })
}

fn encode_rooms(
    input: &ProjectInput,
    instructions: &InstructionTable,
    names: &ProjectNames,
    errors: &mut ErrorList,
) -> Result<Vec<Vec<u8>>, CompileError> {
    let directory = room_directory(&input.rooms);
    let ctx = RoomContext {
        instructions,
        game_state: &input.game_state,
        scenes: &names.scenes,
        entities: &names.entities,
        rooms: &directory,
    };

    input
        .rooms
        .iter()
        .enumerate()
        .filter(|(i, room)| names.rooms.get(&room.name) == Some(*i))
        .map(|(_, room)| encode_room(room, &ctx, errors))
        .collect()
}
