//! Instruction catalogue
//!
//! Builds the opcode table used by the room script compiler. The layout is
//! fixed because the runtime indexes its dispatch tables by opcode:
//!
//! ```text
//! 0            end of script
//! 1            jump
//! 2..=5        branch if word ==, !=, <, >=
//! 6..6+G       branch if flag set, one opcode per 256 flags
//! 6+G..6+2G    branch if flag clear, one opcode per 256 flags
//! 6+2G..       base instructions, then project instructions
//! ```
//!
//! An instruction with a flag argument occupies `G` consecutive opcodes.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Deserialize;
use std::fmt;

use crate::diagnostics::{CompileError, ErrorList, Location, ResourceKind};

pub const MAX_OPCODES: usize = 128;
pub const FLAG_GROUP_SIZE: usize = 256;

pub const OPCODE_END: u8 = 0;
pub const OPCODE_JUMP: u8 = 1;
pub const OPCODE_BRANCH_WORD_EQUAL: u8 = 2;
pub const OPCODE_BRANCH_WORD_NOT_EQUAL: u8 = 3;
pub const OPCODE_BRANCH_WORD_LESS_THAN: u8 = 4;
pub const OPCODE_BRANCH_WORD_GREATER_EQUAL: u8 = 5;
const FIRST_FLAG_BRANCH_OPCODE: usize = 6;

/// Size of a branch target operand
pub const BRANCH_TARGET_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentType {
    #[default]
    Unused,
    Flag,
    Word,
    #[serde(rename = "u16")]
    ImmediateU16,
    RoomScript,
    EntityGroup,
    Room,
    RoomEntrance,
}

impl ArgumentType {
    /// Encoded size in bytes
    pub fn size(self) -> usize {
        match self {
            ArgumentType::Unused => 0,
            ArgumentType::ImmediateU16 => 2,
            ArgumentType::Flag
            | ArgumentType::Word
            | ArgumentType::RoomScript
            | ArgumentType::EntityGroup
            | ArgumentType::Room
            | ArgumentType::RoomEntrance => 1,
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgumentType::Unused => "unused",
            ArgumentType::Flag => "flag",
            ArgumentType::Word => "word",
            ArgumentType::ImmediateU16 => "u16",
            ArgumentType::RoomScript => "room script",
            ArgumentType::EntityGroup => "entity group",
            ArgumentType::Room => "room",
            ArgumentType::RoomEntrance => "room entrance",
        };
        f.write_str(s)
    }
}

/// An instruction declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "InstructionDef")]
pub struct Instruction {
    pub name: String,
    pub arguments: [ArgumentType; 2],
    /// Execution may suspend after this instruction
    pub yields: bool,
}

/// Project file form of [`Instruction`], with up to two arguments
#[derive(Deserialize)]
struct InstructionDef {
    name: String,
    #[serde(default)]
    arguments: Vec<ArgumentType>,
    #[serde(default)]
    yields: bool,
}

impl TryFrom<InstructionDef> for Instruction {
    type Error = String;

    fn try_from(def: InstructionDef) -> Result<Self, Self::Error> {
        if def.arguments.len() > 2 {
            return Err(format!(
                "instruction {} has {} arguments, maximum is 2",
                def.name,
                def.arguments.len()
            ));
        }
        let mut arguments = [ArgumentType::Unused; 2];
        arguments[..def.arguments.len()].copy_from_slice(&def.arguments);

        Ok(Self {
            name: def.name,
            arguments,
            yields: def.yields,
        })
    }
}

impl Instruction {
    pub fn new(name: &str, arguments: [ArgumentType; 2], yields: bool) -> Self {
        Self {
            name: name.to_string(),
            arguments,
            yields,
        }
    }

    pub fn has_flag_argument(&self) -> bool {
        self.arguments.contains(&ArgumentType::Flag)
    }
}

/// Instructions available to every project, allocated before project instructions
pub fn base_instructions() -> Vec<Instruction> {
    use ArgumentType::*;

    vec![
        Instruction::new("set_flag", [Flag, Unused], false),
        Instruction::new("clear_flag", [Flag, Unused], false),
        Instruction::new("set_word", [Word, ImmediateU16], false),
        Instruction::new("add_to_word", [Word, ImmediateU16], false),
        Instruction::new("subtract_from_word", [Word, ImmediateU16], false),
        Instruction::new("increment_word", [Word, Unused], false),
        Instruction::new("decrement_word", [Word, Unused], false),
        Instruction::new("start_script", [RoomScript, Unused], false),
        Instruction::new("spawn_entity_group", [EntityGroup, Unused], false),
        Instruction::new("load_room", [Room, RoomEntrance], true),
        Instruction::new("sleep_frames", [ImmediateU16, Unused], true),
    ]
}

/// A compiled instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionInfo {
    /// First opcode; flag instructions add the flag group to it
    pub opcode: u8,
    pub arguments: [ArgumentType; 2],
    pub yields: bool,
    /// Encoded size in bytes, opcode included
    pub size: usize,
}

impl InstructionInfo {
    pub fn n_arguments(&self) -> usize {
        self.arguments
            .iter()
            .filter(|a| **a != ArgumentType::Unused)
            .count()
    }
}

/// Opcode table, built once per project
#[derive(Debug, Clone)]
pub struct InstructionTable {
    instructions: HashMap<String, InstructionInfo>,
    /// Instruction names in opcode order (one entry per opcode from `first_instruction_opcode`)
    opcode_names: Vec<String>,
    sorted_names: Vec<String>,
    n_flag_groups: usize,
}

impl InstructionTable {
    pub fn get(&self, name: &str) -> Option<&InstructionInfo> {
        self.instructions.get(name)
    }

    pub fn n_flag_groups(&self) -> usize {
        self.n_flag_groups
    }

    pub fn branch_flag_set_opcode(&self) -> u8 {
        FIRST_FLAG_BRANCH_OPCODE as u8
    }

    pub fn branch_flag_clear_opcode(&self) -> u8 {
        (FIRST_FLAG_BRANCH_OPCODE + self.n_flag_groups) as u8
    }

    pub fn first_instruction_opcode(&self) -> u8 {
        (FIRST_FLAG_BRANCH_OPCODE + 2 * self.n_flag_groups) as u8
    }

    /// Total number of opcodes in use
    pub fn n_opcodes(&self) -> usize {
        self.first_instruction_opcode() as usize + self.opcode_names.len()
    }

    /// Sorted names of every instruction
    pub fn instruction_names(&self) -> &[String] {
        &self.sorted_names
    }

    /// Instructions with their first opcode, in opcode order
    pub fn instructions_by_opcode(&self) -> impl Iterator<Item = (&str, &InstructionInfo)> {
        let mut last: Option<&str> = None;
        self.opcode_names.iter().filter_map(move |name| {
            if last == Some(name.as_str()) {
                return None;
            }
            last = Some(name.as_str());
            self.instructions.get(name).map(|info| (name.as_str(), info))
        })
    }

    /// Whether execution may suspend after the instruction at `opcode`
    pub fn yields_at(&self, opcode: u8) -> bool {
        let first = self.first_instruction_opcode() as usize;
        (opcode as usize)
            .checked_sub(first)
            .and_then(|i| self.opcode_names.get(i))
            .and_then(|name| self.instructions.get(name))
            .is_some_and(|info| info.yields)
    }
}

/// Build the opcode table from the base set and the project instructions
///
/// Invalid instructions are reported to `errors` and left out of the
/// table. Running out of opcodes is fatal.
pub fn compile_instruction_table(
    project_instructions: &[Instruction],
    max_flags: usize,
    errors: &mut ErrorList,
) -> Result<InstructionTable, CompileError> {
    let n_flag_groups = max_flags.div_ceil(FLAG_GROUP_SIZE).max(1);
    let first_opcode = FIRST_FLAG_BRANCH_OPCODE + 2 * n_flag_groups;

    let mut instructions = HashMap::default();
    let mut opcode_names = Vec::new();
    let mut seen = HashSet::default();

    let base = base_instructions();
    let all = base.iter().chain(project_instructions.iter());

    for (index, inst) in all.enumerate() {
        let project_index = index.checked_sub(base.len());
        let location = project_index.map_or(Location::None, Location::Item);

        if !seen.insert(inst.name.as_str()) {
            errors.add_error(
                ResourceKind::Instruction,
                &inst.name,
                location,
                "duplicate instruction name",
            );
            continue;
        }
        if !validate_instruction(inst, location, errors) {
            continue;
        }

        let opcode = first_opcode + opcode_names.len();
        let n_opcodes = if inst.has_flag_argument() {
            n_flag_groups
        } else {
            1
        };
        for _ in 0..n_opcodes {
            opcode_names.push(inst.name.clone());
        }

        let size = 1 + inst.arguments.iter().map(|a| a.size()).sum::<usize>();
        instructions.insert(
            inst.name.clone(),
            InstructionInfo {
                opcode: opcode.min(u8::MAX as usize) as u8,
                arguments: inst.arguments,
                yields: inst.yields,
                size,
            },
        );
    }

    let required = first_opcode + opcode_names.len();
    if required > MAX_OPCODES {
        return Err(CompileError::TooManyOpcodes {
            required,
            max: MAX_OPCODES,
        });
    }

    let mut sorted_names: Vec<String> = instructions.keys().cloned().collect();
    sorted_names.sort();

    log::info!(
        "instruction table: {} instructions, {} opcodes",
        instructions.len(),
        required
    );

    Ok(InstructionTable {
        instructions,
        opcode_names,
        sorted_names,
        n_flag_groups,
    })
}

fn validate_instruction(inst: &Instruction, location: Location, errors: &mut ErrorList) -> bool {
    let mut valid = true;
    let mut error = |msg: &str| {
        errors.add_error(ResourceKind::Instruction, &inst.name, location, msg);
        valid = false;
    };

    if !is_valid_name(&inst.name) {
        error("invalid instruction name");
    }

    let n_flags = inst
        .arguments
        .iter()
        .filter(|a| **a == ArgumentType::Flag)
        .count();
    if n_flags > 1 {
        error("an instruction can only have one flag argument");
    }
    if n_flags > 0 && inst.yields {
        error("an instruction with a flag argument cannot yield");
    }

    match inst.arguments {
        [ArgumentType::Unused, second] if second != ArgumentType::Unused => {
            error("the first argument is unused but the second is not");
        }
        [first, ArgumentType::RoomEntrance] if first != ArgumentType::Room => {
            error("a room entrance argument must follow a room argument");
        }
        [ArgumentType::RoomEntrance, _] => {
            error("a room entrance argument must follow a room argument");
        }
        _ => {}
    }

    valid
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
