//! Resource binary encoders
//!
//! Validates the cross-referencing resource graph (structs, function
//! tables, frame sets, entity entries, rooms) and serializes entries into
//! their ROM records. Problems are accumulated in an [`ErrorList`]; an
//! encoder always returns a record so later resources are still checked.

pub mod data_type;
pub mod entities;
pub mod rooms;
pub mod structs;

pub use data_type::{parse_integer, DataType};
pub use entities::{
    encode_entries, validate_frame_sets, validate_function_tables, EntityContext,
    EntityFunctionTable, EntityRomEntry, ExportOrder, FieldValue, FrameSet,
};
pub use rooms::{
    encode_room, EntityGroup, Room, RoomContext, RoomEntity, RoomEntrance, RoomScript,
    ScriptTrigger,
};
pub use structs::{resolve_structs, EntityRomStruct, ResolvedStruct, StructField, StructTable};

use rustc_hash::FxHashMap as HashMap;
use serde::Deserialize;
use std::borrow::Cow;

use crate::bytecode::is_valid_name;
use crate::diagnostics::{ErrorList, Location, ResourceKind};
use crate::rom::RomData;

/// A named blob of pre-converted data (palette, tileset)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BinaryResource {
    pub name: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl RomData for BinaryResource {
    fn rom_data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }
}

/// Scenes are referenced by index only; their settings live with the runtime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scene {
    pub name: String,
}

/// Name -> declaration index of one resource collection
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<String, usize>,
}

impl NameIndex {
    /// Index `names`, reporting invalid and duplicate names
    ///
    /// A duplicate keeps the index of its first declaration.
    pub fn build<'a>(
        kind: ResourceKind,
        names: impl IntoIterator<Item = &'a str>,
        errors: &mut ErrorList,
    ) -> Self {
        let mut index = HashMap::default();

        for (i, name) in names.into_iter().enumerate() {
            if !is_valid_name(name) {
                errors.add_error(kind, name, Location::Item(i), format!("invalid {} name", kind));
            }
            if index.contains_key(name) {
                errors.add_error(kind, name, Location::Item(i), format!("duplicate {} name", kind));
                continue;
            }
            index.insert(name.to_string(), i);
        }

        Self { names: index }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
