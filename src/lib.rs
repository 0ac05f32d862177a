//! romforge - ROM data compiler for a 65816 game engine
//!
//! Compiles a project's resources (entity definitions, rooms, room scripts,
//! palettes, tilesets) into a binary image and an assembler include file
//! that links it into the cartridge.

pub mod bytecode;
pub mod config;
pub mod diagnostics;
pub mod gamestate;
pub mod project;
pub mod resources;
pub mod rom;
pub mod script;

// Re-export commonly used types
pub use config::{MappingMode, MemoryMap};
pub use diagnostics::{CompileError, Diagnostic, ErrorList};
pub use project::{compile_project, CompileOptions, CompiledRom, ProjectInput};
pub use script::{lex, Parser, Script, ScriptNode};
