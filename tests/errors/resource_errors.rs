//! Resource validation error tests
//!
//! Each test breaks one part of the town fixture and checks the
//! diagnostic it produces.

use crate::common::fixtures::TOWN_PROJECT;
use crate::common::*;

/// The town project with `from` replaced by `to` for every pair
fn town_with(replacements: &[(&str, &str)]) -> String {
    let mut source = TOWN_PROJECT.to_string();
    for (from, to) in replacements {
        assert!(source.contains(from), "fixture does not contain {:?}", from);
        source = source.replacen(from, to, 1);
    }
    source
}

fn errors_of(source: &str) -> String {
    match compile(source) {
        CompileResult::ValidationError(errors) => errors,
        CompileResult::Success(_) => panic!("Expected validation errors, compiled successfully"),
        CompileResult::FatalError(e) => panic!("Expected validation errors, got fatal error: {}", e),
    }
}

#[test]
fn fixture_compiles() {
    assert_compiles(TOWN_PROJECT);
}

// ============================================================================
// Instructions and game state
// ============================================================================

#[test]
fn error_custom_instruction_shadows_base() {
    assert_validation_error(
        &town_with(&[(r#"name = "play_sound""#, r#"name = "sleep_frames""#)]),
        "error: instruction sleep_frames [0]: duplicate instruction name",
    );
}

#[test]
fn error_flag_owner_room_missing() {
    assert_validation_error(
        &town_with(&[(r#"room = "cave""#, r#"room = "dungeon""#)]),
        "error: flag lever_pulled [1]: unknown room: dungeon",
    );
}

#[test]
fn error_temporary_shadows_global() {
    let errors = errors_of(&town_with(&[(
        r#"temp_words = ["counter"]"#,
        r#"temp_words = ["coins", "counter"]"#,
    )]));
    assert!(errors.contains("error: room cave [0]: temporary word coins is already declared"));
}

// ============================================================================
// Structs and entities
// ============================================================================

#[test]
fn error_struct_cycle() {
    let errors = errors_of(&town_with(&[(
        "name = \"BaseEntity\"\n",
        "name = \"BaseEntity\"\nparent = \"Walker\"\n",
    )]));
    assert!(errors.contains("entity struct BaseEntity: circular parent chain through Walker"));
    assert!(errors.contains("entity struct Walker: circular parent chain through BaseEntity"));
    assert!(errors.contains("entity function table walker [0]: unknown entity struct: Walker"));
}

#[test]
fn error_field_redeclared() {
    assert_validation_error(
        &town_with(&[(
            r#"fields = [{ name = "speed", type = "u16", default = "0x100" }]"#,
            r#"fields = [{ name = "health", type = "u16" }]"#,
        )]),
        "entity struct Walker [0]: field health is already declared in a parent struct",
    );
}

#[test]
fn error_missing_field_value() {
    assert_validation_error(
        &town_with(&[(r#", default = "3" }"#, " }")]),
        "entity slime [0]: field health: missing value (the field has no default)",
    );
}

#[test]
fn error_unknown_field() {
    assert_validation_error(
        &town_with(&[("fields = { speed = 0x80 }", "fields = { speed = 0x80, armor = 2 }")]),
        "entity slime [0]: unknown field: armor",
    );
}

#[test]
fn error_field_out_of_range() {
    assert_validation_error(
        &town_with(&[("fields = { speed = 0x80 }", "fields = { speed = 70000 }")]),
        "entity slime [0]: field speed: value 70000 is out of range for u16 (0..=65535)",
    );
}

#[test]
fn error_frame_set_missing_export_frame() {
    let errors = errors_of(&town_with(&[(
        "frames = [\"stand\", \"walk\"]\npalette_count",
        "frames = [\"stand\"]\npalette_count",
    )]));
    assert!(errors.contains("frame set slime [0]: missing frame walk required by export order npc"));
}

#[test]
fn error_entity_references() {
    let errors = errors_of(&town_with(&[
        (r#"display_frame = "stand""#, r#"display_frame = "jump""#),
        (r#"function_table = "walker""#, r#"function_table = "runner""#),
    ]));
    assert!(errors.contains("entity slime [0]: unknown function table: runner"));
    assert!(errors.contains("entity slime [0]: unknown display frame: jump"));
}

// ============================================================================
// Rooms
// ============================================================================

#[test]
fn error_room_unknown_scene() {
    assert_validation_error(
        &town_with(&[("scene = \"outdoors\"\nwidth = 2", "scene = \"indoors\"\nwidth = 2")]),
        "error: room town: unknown scene: indoors",
    );
}

#[test]
fn error_room_entity_and_trigger() {
    let errors = errors_of(&town_with(&[
        (r#"{ entity = "slime", x = 16"#, r#"{ entity = "goblin", x = 16"#),
        (r#"script = "open_gate""#, r#"script = "close_gate""#),
    ]));
    assert!(errors.contains("error: room town [0]: unknown entity: goblin"));
    assert!(errors.contains("error: room town [0]: unknown room script: close_gate"));
}

#[test]
fn error_room_map_size() {
    let errors = errors_of(&town_with(&[("tiles = [0, 1, 1, 0]", "tiles = [0, 1, 1]")]));
    assert!(errors.contains("error: room town: map has 3 tiles, expected 4 (2x2)"));
}

#[test]
fn error_duplicate_entrance() {
    let errors = errors_of(&town_with(&[(
        "[[rooms.entrances]]\nname = \"mouth\"",
        "[[rooms.entrances]]\nname = \"mouth\"\nx = 0\ny = 0\n\n[[rooms.entrances]]\nname = \"mouth\"",
    )]));
    assert!(errors.contains("error: room cave [1]: duplicate entrance name: mouth"));
}

#[test]
fn all_errors_reported_in_one_run() {
    let errors = errors_of(&town_with(&[
        (r#"room = "cave""#, r#"room = "dungeon""#),
        ("fields = { speed = 0x80 }", "fields = { speed = -1 }"),
        ("spawn_entity_group guards;", "spawn_entity_group thieves;"),
        ("load_room town gate;", "load_room town back_door;"),
    ]));

    assert_eq!(errors.lines().filter(|l| l.starts_with("error:")).count(), 4, "{}", errors);
    assert!(errors.contains("room script town.startup:2: unknown entity group: thieves"));
    assert!(errors.contains("room script cave.startup:5: unknown room entrance: back_door in room town"));
}
