//! Entity ROM structs
//!
//! A struct may extend one parent. Parent chains are flattened with a
//! worklist: each pass resolves every struct whose parent is already
//! resolved, until a pass makes no progress. Whatever is left has a
//! missing or circular parent.

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Deserialize;

use super::data_type::DataType;
use super::NameIndex;
use crate::diagnostics::{ErrorList, Location, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DataType,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityRomStruct {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub ty: DataType,
    pub default: Option<i64>,
}

/// A struct with its parent fields prepended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStruct {
    pub name: String,
    pub fields: Vec<ResolvedField>,
}

impl ResolvedStruct {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.size()).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructTable {
    structs: HashMap<String, ResolvedStruct>,
}

impl StructTable {
    pub fn get(&self, name: &str) -> Option<&ResolvedStruct> {
        self.structs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}

/// Flatten every struct, reporting unresolvable parents and bad fields
///
/// Structs that fail to resolve are left out of the table.
pub fn resolve_structs(structs: &[EntityRomStruct], errors: &mut ErrorList) -> StructTable {
    let names = NameIndex::build(
        ResourceKind::EntityStruct,
        structs.iter().map(|s| s.name.as_str()),
        errors,
    );

    // first declaration of each name only
    let mut pending: Vec<&EntityRomStruct> = structs
        .iter()
        .enumerate()
        .filter(|(i, s)| names.get(&s.name) == Some(*i))
        .map(|(_, s)| s)
        .collect();

    let mut table = StructTable::default();

    loop {
        let before = pending.len();
        let mut remaining = Vec::with_capacity(pending.len());

        for s in pending {
            let parent_fields = match &s.parent {
                None => Some(Vec::new()),
                Some(parent) => table.get(parent).map(|p| p.fields.clone()),
            };

            match parent_fields {
                Some(fields) => {
                    let resolved = flatten(s, fields, errors);
                    table.structs.insert(s.name.clone(), resolved);
                }
                None => remaining.push(s),
            }
        }

        pending = remaining;
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    for s in pending {
        let parent = s.parent.as_deref().unwrap_or_default();
        let message = if names.contains(parent) {
            format!("circular parent chain through {}", parent)
        } else {
            format!("unknown parent struct: {}", parent)
        };
        errors.add_error(ResourceKind::EntityStruct, &s.name, Location::None, message);
    }

    log::debug!("resolved {} of {} entity structs", table.len(), structs.len());
    table
}

fn flatten(s: &EntityRomStruct, mut fields: Vec<ResolvedField>, errors: &mut ErrorList) -> ResolvedStruct {
    let inherited: HashSet<String> = fields.iter().map(|f| f.name.clone()).collect();
    let mut own = HashSet::default();

    for (i, field) in s.fields.iter().enumerate() {
        let mut error = |msg: String| {
            errors.add_error(ResourceKind::EntityStruct, &s.name, Location::Item(i), msg);
        };

        if !crate::bytecode::is_valid_name(&field.name) {
            error(format!("invalid field name: {}", field.name));
        }
        if inherited.contains(&field.name) {
            error(format!("field {} is already declared in a parent struct", field.name));
            continue;
        }
        if !own.insert(field.name.as_str()) {
            error(format!("duplicate field name: {}", field.name));
            continue;
        }

        let default = match &field.default {
            Some(value) => match field.ty.parse_value(value) {
                Ok(v) => Some(v),
                Err(msg) => {
                    error(format!("default of field {}: {}", field.name, msg));
                    None
                }
            },
            None => None,
        };

        fields.push(ResolvedField {
            name: field.name.clone(),
            ty: field.ty,
            default,
        });
    }

    ResolvedStruct {
        name: s.name.clone(),
        fields,
    }
}
