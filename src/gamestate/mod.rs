//! Game state variables
//!
//! Flags and words share one index space each. Global variables are
//! allocated upwards from index 0 and room-local (temporary) variables
//! downwards from the top, so the two never collide.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{CompileError, ErrorList, Location, ResourceKind};

pub const MAX_FLAGS: usize = 512;
pub const MAX_WORDS: usize = 128;

/// A global variable declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateVariable {
    pub name: String,
    /// Restrict access to a single room
    #[serde(default)]
    pub room: Option<String>,
}

impl GameStateVariable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            room: None,
        }
    }

    pub fn in_room(name: &str, room: &str) -> Self {
        Self {
            name: name.to_string(),
            room: Some(room.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub flags: Vec<GameStateVariable>,
    #[serde(default)]
    pub words: Vec<GameStateVariable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Flag,
    Word,
}

impl VariableKind {
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Flag => "flag",
            VariableKind::Word => "word",
        }
    }

    pub fn capacity(self) -> usize {
        match self {
            VariableKind::Flag => MAX_FLAGS,
            VariableKind::Word => MAX_WORDS,
        }
    }

    fn resource_kind(self) -> ResourceKind {
        match self {
            VariableKind::Flag => ResourceKind::Flag,
            VariableKind::Word => ResourceKind::Word,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Unknown,
    /// The variable belongs to another room
    WrongRoom(String),
}

#[derive(Debug, Clone)]
struct VariableInfo {
    index: u16,
    room: Option<String>,
}

/// Variables of one kind visible from a room
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    vars: HashMap<String, VariableInfo>,
}

impl VariableMap {
    pub fn lookup(&self, name: &str, room: &str) -> Result<u16, LookupError> {
        let info = self.vars.get(name).ok_or(LookupError::Unknown)?;
        match &info.room {
            Some(owner) if owner != room => Err(LookupError::WrongRoom(owner.clone())),
            _ => Ok(info.index),
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Flags and words visible from a single room
#[derive(Debug, Clone)]
pub struct RoomVariables {
    pub room: String,
    pub flags: VariableMap,
    pub words: VariableMap,
}

impl RoomVariables {
    pub fn map(&self, kind: VariableKind) -> &VariableMap {
        match kind {
            VariableKind::Flag => &self.flags,
            VariableKind::Word => &self.words,
        }
    }

    pub fn lookup(&self, kind: VariableKind, name: &str) -> Result<u16, LookupError> {
        self.map(kind).lookup(name, &self.room)
    }
}

/// Report duplicate names and owner rooms that do not exist
///
/// More globals than the variable space holds is fatal, whether or not
/// any room declares temporaries.
pub fn validate_game_state(
    state: &GameState,
    room_names: &HashSet<&str>,
    errors: &mut ErrorList,
) -> Result<(), CompileError> {
    for (kind, vars) in [
        (VariableKind::Flag, &state.flags),
        (VariableKind::Word, &state.words),
    ] {
        if vars.len() > kind.capacity() {
            return Err(CompileError::TooManyGlobals {
                kind: kind.name(),
                count: vars.len(),
                max: kind.capacity(),
            });
        }

        let rk = kind.resource_kind();
        let mut seen = HashSet::default();

        for (i, var) in vars.iter().enumerate() {
            let loc = Location::Item(i);
            if !crate::bytecode::is_valid_name(&var.name) {
                errors.add_error(rk, &var.name, loc, format!("invalid {} name", kind.name()));
            }
            if !seen.insert(var.name.as_str()) {
                errors.add_error(rk, &var.name, loc, format!("duplicate {} name", kind.name()));
            }
            if let Some(room) = &var.room {
                if !room_names.contains(room.as_str()) {
                    errors.add_error(rk, &var.name, loc, format!("unknown room: {}", room));
                }
            }
        }
    }
    Ok(())
}

/// Build the variable maps for `room`, allocating its temporary variables
///
/// Name clashes are reported to `errors`. Exceeding the variable space is fatal.
pub fn room_variables(
    state: &GameState,
    room: &str,
    temp_flags: &[String],
    temp_words: &[String],
    errors: &mut ErrorList,
) -> Result<RoomVariables, CompileError> {
    let flags = allocate(VariableKind::Flag, &state.flags, room, temp_flags, errors)?;
    let words = allocate(VariableKind::Word, &state.words, room, temp_words, errors)?;

    Ok(RoomVariables {
        room: room.to_string(),
        flags,
        words,
    })
}

fn allocate(
    kind: VariableKind,
    globals: &[GameStateVariable],
    room: &str,
    temps: &[String],
    errors: &mut ErrorList,
) -> Result<VariableMap, CompileError> {
    let max = kind.capacity();
    if globals.len() + temps.len() > max {
        return Err(CompileError::TooManyVariables {
            room: room.to_string(),
            kind: kind.name(),
            globals: globals.len(),
            locals: temps.len(),
            max,
        });
    }

    let mut vars = HashMap::default();
    for (i, var) in globals.iter().enumerate() {
        vars.entry(var.name.clone()).or_insert(VariableInfo {
            index: i as u16,
            room: var.room.clone(),
        });
    }

    for (i, name) in temps.iter().enumerate() {
        if vars.contains_key(name) {
            errors.add_error(
                ResourceKind::Room,
                room,
                Location::Item(i),
                format!("temporary {} {} is already declared", kind.name(), name),
            );
            continue;
        }
        vars.insert(
            name.clone(),
            VariableInfo {
                index: (max - 1 - i) as u16,
                room: Some(room.to_string()),
            },
        );
    }

    Ok(VariableMap { vars })
}
