//! Diagnostics
//!
//! Resource and script problems are accumulated in an [`ErrorList`] so a
//! single run reports every independent error. Budget failures (opcode
//! space, variable space, ROM space) abort the compile via [`CompileError`].

use std::fmt;

use crate::rom::RomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// The kind of resource a diagnostic is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Instruction,
    Flag,
    Word,
    EntityStruct,
    EntityFunctionTable,
    ExportOrder,
    FrameSet,
    Entity,
    Projectile,
    Player,
    Palette,
    MetaTileTileset,
    Scene,
    Room,
    RoomScript,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Project => "project",
            ResourceKind::Instruction => "instruction",
            ResourceKind::Flag => "flag",
            ResourceKind::Word => "word",
            ResourceKind::EntityStruct => "entity struct",
            ResourceKind::EntityFunctionTable => "entity function table",
            ResourceKind::ExportOrder => "export order",
            ResourceKind::FrameSet => "frame set",
            ResourceKind::Entity => "entity",
            ResourceKind::Projectile => "projectile",
            ResourceKind::Player => "player",
            ResourceKind::Palette => "palette",
            ResourceKind::MetaTileTileset => "metatile tileset",
            ResourceKind::Scene => "scene",
            ResourceKind::Room => "room",
            ResourceKind::RoomScript => "room script",
        };
        f.write_str(s)
    }
}

/// Where inside a resource the problem was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    None,
    /// Index of the offending item within the resource (field, entrance, entity, ...)
    Item(usize),
    /// 1-based statement number inside a script
    Line(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ResourceKind,
    pub name: String,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.location {
            Location::None => write!(f, "{}: {} {}: {}", level, self.kind, self.name, self.message),
            Location::Item(i) => write!(
                f,
                "{}: {} {} [{}]: {}",
                level, self.kind, self.name, i, self.message
            ),
            Location::Line(line) => write!(
                f,
                "{}: {} {}:{}: {}",
                level, self.kind, self.name, line, self.message
            ),
        }
    }
}

/// Ordered list of accumulated errors and warnings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.push(Severity::Error, kind, name.into(), location, message.into());
    }

    pub fn add_warning(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.push(Severity::Warning, kind, name.into(), location, message.into());
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: ResourceKind,
        name: String,
        location: Location,
        message: String,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            name,
            location,
            message,
        });
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Remove and return the warnings, leaving only errors behind
    pub fn take_warnings(&mut self) -> ErrorList {
        let (warnings, errors) = std::mem::take(&mut self.diagnostics)
            .into_iter()
            .partition(|d| d.severity == Severity::Warning);
        self.diagnostics = errors;
        ErrorList {
            diagnostics: warnings,
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.diagnostics {
            writeln!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// Fatal compile failure
#[derive(Debug, Clone)]
pub enum CompileError {
    /// One or more resources failed validation or script compilation
    Validation(ErrorList),

    InvalidMemoryMap(String),

    /// The instruction catalogue does not fit in the opcode space
    TooManyOpcodes { required: usize, max: usize },

    /// Global plus room-local variables exceed the variable space
    TooManyVariables {
        room: String,
        kind: &'static str,
        globals: usize,
        locals: usize,
        max: usize,
    },

    /// More global variables than the variable space holds
    TooManyGlobals {
        kind: &'static str,
        count: usize,
        max: usize,
    },

    /// A fixed-width record field cannot hold the encoded data
    RecordTooLarge {
        kind: ResourceKind,
        name: String,
        size: usize,
        max: usize,
    },

    Rom(RomError),

    Io(String),

    Config(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Validation(errors) => {
                write!(f, "compilation failed with {} error(s)", errors.error_count())
            }
            CompileError::InvalidMemoryMap(msg) => write!(f, "invalid memory map: {}", msg),
            CompileError::TooManyOpcodes { required, max } => write!(
                f,
                "too many instructions: {} opcodes required, maximum is {}",
                required, max
            ),
            CompileError::TooManyVariables {
                room,
                kind,
                globals,
                locals,
                max,
            } => write!(
                f,
                "too many {}s in room {}: {} global + {} temporary exceeds {}",
                kind, room, globals, locals, max
            ),
            CompileError::TooManyGlobals { kind, count, max } => write!(
                f,
                "too many global {}s: {} declared, maximum is {}",
                kind, count, max
            ),
            CompileError::RecordTooLarge {
                kind,
                name,
                size,
                max,
            } => write!(
                f,
                "{} {} is too large: {} bytes (maximum {})",
                kind, name, size, max
            ),
            CompileError::Rom(e) => write!(f, "{}", e),
            CompileError::Io(msg) => write!(f, "io error: {}", msg),
            CompileError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<RomError> for CompileError {
    fn from(e: RomError) -> Self {
        CompileError::Rom(e)
    }
}
