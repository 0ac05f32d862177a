//! Room script compiler tests
//!
//! Opcodes of the base table with 512 flags: set_flag 10, clear_flag 12,
//! set_word 14, increment_word 17, start_script 19, spawn_entity_group 20,
//! load_room 21, sleep_frames 22.

use crate::common::*;

// ============================================================================
// Statements
// ============================================================================

#[test]
fn empty_script_is_just_end() {
    assert_eq!(compile_script_ok(""), vec![0]);
    assert_eq!(compile_script_ok("// nothing here"), vec![0]);
}

#[test]
fn flag_statement_selects_group() {
    assert_eq!(compile_script_ok("set_flag door_open;"), vec![10, 0, 0]);
    // `spare` is the topmost flag: group 1, index 255
    assert_eq!(compile_script_ok("set_flag spare;"), vec![11, 255, 0]);
    assert_eq!(compile_script_ok("clear_flag spare;"), vec![13, 255, 0]);
}

#[test]
fn word_and_immediate_arguments() {
    assert_eq!(
        compile_script_ok("set_word coins 0x1234; increment_word counter;"),
        vec![14, 0, 0x34, 0x12, 17, 127, 0]
    );
}

#[test]
fn indexed_arguments() {
    assert_eq!(
        compile_script_ok("start_script open_gate; spawn_entity_group villagers;"),
        vec![19, 1, 20, 1, 0]
    );
}

#[test]
fn load_room_uses_target_room_entrances() {
    assert_eq!(compile_script_ok("load_room cave tunnel;"), vec![21, 1, 1, 0]);
    assert_eq!(compile_script_ok("load_room town gate;"), vec![21, 0, 0, 0]);
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn if_else_branch_targets() {
    let code = compile_script_ok("if flag door_open set { sleep_frames 1; } else { sleep_frames 2; }");

    // branch if clear -> start of else block
    assert_eq!(&code[0..4], &[8, 0, 10, 0]);
    // then block, then jump -> after else block
    assert_eq!(&code[4..7], &[22, 1, 0]);
    assert_eq!(&code[7..10], &[1, 13, 0]);
    assert_eq!(&code[10..13], &[22, 2, 0]);
    assert_eq!(code[13], 0);
    assert_eq!(code.len(), 14);
}

#[test]
fn if_without_else() {
    assert_eq!(
        compile_script_ok("if flag spare clear { set_flag door_open; }"),
        // branch if set, group 1
        vec![7, 255, 6, 0, 10, 0, 0]
    );
}

#[test]
fn word_conditions_are_negated() {
    let cases = [("==", 3), ("!=", 2), ("<", 5), (">=", 4)];
    for (op, branch) in cases {
        let code = compile_script_ok(&format!("if word coins {} 500 {{ }}", op));
        assert_eq!(code, vec![branch, 0, 0xF4, 0x01, 6, 0, 0], "comparator {}", op);
    }
}

#[test]
fn else_if_chain() {
    let code = compile_script_ok(
        "if word coins == 1 { sleep_frames 1; } else if word coins == 2 { sleep_frames 2; }",
    );
    assert_eq!(
        code,
        vec![
            3, 0, 1, 0, 12, 0, // 0: branch != 1 -> 12
            22, 1, 0, // 6
            1, 21, 0, // 9: jump -> 21
            3, 0, 2, 0, 21, 0, // 12: branch != 2 -> 21
            22, 2, 0, // 18
            0,
        ]
    );
}

// ============================================================================
// Loops
// ============================================================================

#[test]
fn while_jumps_back_to_condition() {
    let code = compile_script_ok("sleep_frames 1; while word coins < 10 { sleep_frames 1; }");
    assert_eq!(
        code,
        vec![22, 1, 0, 5, 0, 10, 0, 15, 0, 22, 1, 0, 1, 3, 0, 0]
    );
}

#[test]
fn nested_loops() {
    let code = compile_script_ok(
        "while flag door_open clear { while word coins < 3 { increment_word coins; sleep_frames 1; } }",
    );
    assert_eq!(
        code,
        vec![
            6, 0, 21, 0, // 0: branch if set -> 21
            5, 0, 3, 0, 18, 0, // 4: branch >= 3 -> 18
            17, 0, // 10
            22, 1, 0, // 12
            1, 4, 0, // 15: jump inner head
            1, 0, 0, // 18: jump outer head
            0,
        ]
    );
}
