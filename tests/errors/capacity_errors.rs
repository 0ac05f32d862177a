//! Fatal error tests
//!
//! Running out of opcodes, variables or ROM space aborts the compile
//! instead of being accumulated with the other diagnostics.

use crate::common::*;
use romforge::rom::RomError;
use romforge::CompileError;

/// A LoROM project with `globals` global variables of `kind` ("flag" or
/// "word") and, when `temps` is given, one room declaring those temporaries
fn variables_project(kind: &str, globals: usize, temps: Option<&[&str]>) -> String {
    let globals: Vec<String> = (0..globals).map(|i| format!("{{ name = \"v{}\" }}", i)).collect();
    let mut source = format!(
        r#"
[memory_map]
mode = "lorom"
first_bank = 0x80
bank_count = 1

[game_state]
{}s = [{}]

[[scenes]]
name = "outdoors"
"#,
        kind,
        globals.join(", ")
    );

    if let Some(temps) = temps {
        let temps: Vec<String> = temps.iter().map(|t| format!("\"{}\"", t)).collect();
        source.push_str(&format!(
            r#"
[[rooms]]
name = "town"
scene = "outdoors"
width = 1
height = 1
tiles = [0]
temp_{}s = [{}]
"#,
            kind,
            temps.join(", ")
        ));
    }
    source
}

fn instructions_project(count: usize) -> String {
    let mut source = String::from(
        "[memory_map]\nmode = \"hirom\"\nfirst_bank = 0xC0\nbank_count = 1\n",
    );
    for i in 0..count {
        source.push_str(&format!("\n[[instructions]]\nname = \"custom{}\"\n", i));
    }
    source
}

fn palette_project(size: usize) -> String {
    let data = vec!["0"; size].join(",");
    format!(
        r#"
[memory_map]
mode = "lorom"
first_bank = 0x80
bank_count = 1

[[palettes]]
name = "huge"
data = [{}]
"#,
        data
    )
}

// ============================================================================
// Variable space
// ============================================================================

#[test]
fn variables_fill_the_space_exactly() {
    assert_compiles(&variables_project("word", 127, Some(&["counter"][..])));
}

#[test]
fn flags_fill_the_space_exactly() {
    assert_compiles(&variables_project("flag", 511, Some(&["spare"][..])));
}

#[test]
fn error_too_many_flags() {
    let err = assert_fatal_error(&variables_project("flag", 512, Some(&["spare"][..])));
    assert_eq!(
        err.to_string(),
        "too many flags in room town: 512 global + 1 temporary exceeds 512"
    );
}

#[test]
fn globals_fill_the_space_without_rooms() {
    assert_compiles(&variables_project("flag", 512, None));
    assert_compiles(&variables_project("word", 128, None));
}

#[test]
fn error_too_many_globals_without_rooms() {
    let err = assert_fatal_error(&variables_project("flag", 513, None));
    assert!(matches!(
        err,
        CompileError::TooManyGlobals {
            kind: "flag",
            count: 513,
            max: 512
        }
    ));
    assert_eq!(err.to_string(), "too many global flags: 513 declared, maximum is 512");

    let err = assert_fatal_error(&variables_project("word", 129, None));
    assert!(matches!(err, CompileError::TooManyGlobals { kind: "word", .. }));
}

#[test]
fn error_too_many_variables() {
    let err = assert_fatal_error(&variables_project("word", 127, Some(&["counter", "timer"][..])));
    match err {
        CompileError::TooManyVariables {
            room,
            kind,
            globals,
            locals,
            max,
        } => {
            assert_eq!(room, "town");
            assert_eq!(kind, "word");
            assert_eq!((globals, locals, max), (127, 2, 128));
        }
        other => panic!("Expected TooManyVariables, got {:?}", other),
    }
}

#[test]
fn too_many_variables_message() {
    let err = assert_fatal_error(&variables_project("word", 128, Some(&["counter"][..])));
    assert_eq!(
        err.to_string(),
        "too many words in room town: 128 global + 1 temporary exceeds 128"
    );
}

// ============================================================================
// Opcode space
// ============================================================================

#[test]
fn instructions_fill_the_opcode_space_exactly() {
    let rom = assert_compiles(&instructions_project(105));
    assert!(rom.inc_data.contains("constant Project.Bytecode.custom104 = 127\n"));
    assert!(rom.inc_data.contains("constant Project.Bytecode.N_OPCODES = 128\n"));
}

#[test]
fn error_too_many_opcodes() {
    let err = assert_fatal_error(&instructions_project(106));
    assert!(matches!(
        err,
        CompileError::TooManyOpcodes {
            required: 129,
            max: 128
        }
    ));
}

// ============================================================================
// ROM space
// ============================================================================

#[test]
fn palette_fills_a_bank() {
    // 3 bytes of table leave room for 0x7FFD bytes of palette
    let rom = assert_compiles(&palette_project(0x7FFD));
    assert_eq!(rom.binary.len(), 0x8000);
}

#[test]
fn error_out_of_space() {
    let err = assert_fatal_error(&palette_project(0x8001));
    assert!(matches!(err, CompileError::Rom(RomError::OutOfSpace { size: 0x8001 })));
    assert!(err.to_string().contains("try increasing the number of banks"));
}

#[test]
fn error_tile_data_bank_outside_map() {
    let source = r#"
[memory_map]
mode = "hirom"
first_bank = 0xC0
bank_count = 2

[tile_data]
bank = 2
data = [1, 2, 3]
"#;
    let err = assert_fatal_error(source);
    assert!(matches!(err, CompileError::Rom(RomError::InvalidBank { bank: 2 })));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn error_memory_map_without_banks() {
    let err = assert_fatal_error(
        "[memory_map]\nmode = \"lorom\"\nfirst_bank = 0x80\nbank_count = 0\n",
    );
    assert!(matches!(err, CompileError::InvalidMemoryMap(_)));
}

#[test]
fn error_memory_map_past_address_space() {
    let err = assert_fatal_error(
        "[memory_map]\nmode = \"hirom\"\nfirst_bank = 0xFF\nbank_count = 2\n",
    );
    assert!(err.to_string().contains("exceed the 24 bit address space"));
}

#[test]
fn error_instruction_with_three_arguments() {
    let source = r#"
[[instructions]]
name = "teleport"
arguments = ["flag", "word", "room"]
"#;
    let err = assert_fatal_error(source);
    assert!(matches!(err, CompileError::Config(_)));
    assert!(err.to_string().contains("instruction teleport has 3 arguments, maximum is 2"));
}

#[test]
fn error_project_syntax() {
    let err = assert_fatal_error("[[rooms]\nname = \"town\"\n");
    assert!(matches!(err, CompileError::Config(_)));
}
