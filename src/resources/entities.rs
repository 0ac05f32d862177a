//! Entity ROM entries
//!
//! Entities, projectiles and players share one record layout:
//!
//! ```text
//! u8  function table index
//! u8  frame set index
//! u8  default palette
//! u8  display frame
//! ..  struct fields, parent fields first, little endian
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use std::borrow::Cow;

use super::structs::StructTable;
use super::NameIndex;
use crate::diagnostics::{ErrorList, Location, ResourceKind};
use crate::rom::RomData;

/// Named frames a frame set must provide, in runtime order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportOrder {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameSet {
    pub name: String,
    pub export_order: String,
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default = "default_palette_count")]
    pub palette_count: u8,
    /// Pre-converted frame set data
    #[serde(default)]
    pub data: Vec<u8>,
}

fn default_palette_count() -> u8 {
    1
}

impl RomData for FrameSet {
    fn rom_data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityFunctionTable {
    pub name: String,
    #[serde(default)]
    pub entity_struct: Option<String>,
    pub export_order: String,
}

/// A field value, written either as a TOML integer or as text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRomEntry {
    pub name: String,
    pub function_table: String,
    pub frame_set: String,
    #[serde(default)]
    pub default_palette: u8,
    pub display_frame: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

/// Project tables an entity entry may reference
pub struct EntityContext<'a> {
    pub structs: &'a StructTable,
    pub function_tables: &'a [EntityFunctionTable],
    pub function_table_names: &'a NameIndex,
    pub frame_sets: &'a [FrameSet],
    pub frame_set_names: &'a NameIndex,
}

/// Check every frame set against its export order
pub fn validate_frame_sets(
    frame_sets: &[FrameSet],
    export_orders: &[ExportOrder],
    export_order_names: &NameIndex,
    errors: &mut ErrorList,
) {
    for (i, fs) in frame_sets.iter().enumerate() {
        let mut error = |msg: String| {
            errors.add_error(ResourceKind::FrameSet, &fs.name, Location::Item(i), msg);
        };

        if fs.palette_count == 0 {
            error("frame set must have at least one palette".to_string());
        }

        match export_order_names.get(&fs.export_order) {
            Some(eo) => {
                for frame in &export_orders[eo].frames {
                    if !fs.frames.contains(frame) {
                        error(format!(
                            "missing frame {} required by export order {}",
                            frame, fs.export_order
                        ));
                    }
                }
            }
            None => error(format!("unknown export order: {}", fs.export_order)),
        }
    }
}

pub fn validate_function_tables(
    tables: &[EntityFunctionTable],
    structs: &StructTable,
    export_order_names: &NameIndex,
    errors: &mut ErrorList,
) {
    for (i, ft) in tables.iter().enumerate() {
        let loc = Location::Item(i);

        if let Some(s) = &ft.entity_struct {
            if !structs.contains(s) {
                errors.add_error(
                    ResourceKind::EntityFunctionTable,
                    &ft.name,
                    loc,
                    format!("unknown entity struct: {}", s),
                );
            }
        }
        if !export_order_names.contains(&ft.export_order) {
            errors.add_error(
                ResourceKind::EntityFunctionTable,
                &ft.name,
                loc,
                format!("unknown export order: {}", ft.export_order),
            );
        }
    }
}

/// Encode every entry of one list, in declaration order
pub fn encode_entries(
    kind: ResourceKind,
    entries: &[EntityRomEntry],
    ctx: &EntityContext,
    errors: &mut ErrorList,
) -> Vec<Vec<u8>> {
    NameIndex::build(kind, entries.iter().map(|e| e.name.as_str()), errors);

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| encode_entry(kind, i, entry, ctx, errors))
        .collect()
}

fn encode_entry(
    kind: ResourceKind,
    index: usize,
    entry: &EntityRomEntry,
    ctx: &EntityContext,
    errors: &mut ErrorList,
) -> Vec<u8> {
    let loc = Location::Item(index);
    let mut error = |msg: String| errors.add_error(kind, &entry.name, loc, msg);

    let function_table = match ctx.function_table_names.get(&entry.function_table) {
        Some(i) => Some((i, &ctx.function_tables[i])),
        None => {
            error(format!("unknown function table: {}", entry.function_table));
            None
        }
    };
    let frame_set = match ctx.frame_set_names.get(&entry.frame_set) {
        Some(i) => Some((i, &ctx.frame_sets[i])),
        None => {
            error(format!("unknown frame set: {}", entry.frame_set));
            None
        }
    };

    let mut display_frame = 0;
    if let Some((_, fs)) = frame_set {
        if let Some((_, ft)) = function_table {
            if fs.export_order != ft.export_order {
                error(format!(
                    "frame set {} does not use export order {}",
                    fs.name, ft.export_order
                ));
            }
        }
        if entry.default_palette >= fs.palette_count {
            error(format!(
                "default palette {} is out of range (frame set has {} palettes)",
                entry.default_palette, fs.palette_count
            ));
        }
        match fs.frames.iter().position(|f| *f == entry.display_frame) {
            Some(i) => display_frame = i,
            None => error(format!("unknown display frame: {}", entry.display_frame)),
        }
    }

    let mut out = vec![
        function_table.map_or(0, |(i, _)| i as u8),
        frame_set.map_or(0, |(i, _)| i as u8),
        entry.default_palette,
        display_frame as u8,
    ];

    let schema = function_table
        .and_then(|(_, ft)| ft.entity_struct.as_deref())
        .and_then(|s| ctx.structs.get(s));

    if let Some(schema) = schema {
        for name in entry.fields.keys() {
            if schema.field(name).is_none() {
                error(format!("unknown field: {}", name));
            }
        }

        for field in &schema.fields {
            let value = match entry.fields.get(&field.name) {
                Some(FieldValue::Integer(v)) => field.ty.check(*v),
                Some(FieldValue::Text(s)) => field.ty.parse_value(s),
                None => field
                    .default
                    .ok_or_else(|| "missing value (the field has no default)".to_string()),
            };
            let value = value.unwrap_or_else(|msg| {
                error(format!("field {}: {}", field.name, msg));
                0
            });
            field.ty.encode(value, &mut out);
        }
    } else if function_table.is_some() {
        for name in entry.fields.keys() {
            error(format!("unknown field: {}", name));
        }
    }

    out
}
