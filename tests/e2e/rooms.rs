//! Room record tests

use crate::common::fixtures::{room_project, TOWN_PROJECT};
use crate::common::*;
use romforge::CompiledRom;

/// Address of the symbol `name` in the side-table
fn symbol(rom: &CompiledRom, name: &str) -> u32 {
    let prefix = format!("constant {} = 0x", name);
    let line = rom
        .inc_data
        .lines()
        .find(|l| l.starts_with(&prefix))
        .unwrap_or_else(|| panic!("no symbol {}", name));
    u32::from_str_radix(&line[prefix.len()..], 16).unwrap()
}

/// Every room record of a single bank project whose first bank starts at `base`
fn room_records(rom: &CompiledRom, base: u32) -> Vec<&[u8]> {
    let bin = &rom.binary;
    let table = (symbol(rom, "Project.RoomList") - base) as usize;

    let count_line = "constant Project.RoomList.count = ";
    let count: usize = rom
        .inc_data
        .lines()
        .find_map(|l| l.strip_prefix(count_line))
        .and_then(|n| n.parse().ok())
        .expect("no room count");

    let mut records = Vec::new();
    for entry in bin[table..table + 3 * count].chunks_exact(3) {
        let start = (u32::from_le_bytes([entry[0], entry[1], entry[2], 0]) - base) as usize;
        let len = bin[start..]
            .windows(4)
            .position(|w| w == b"ENDR")
            .expect("room record without end marker");
        records.push(&bin[start..start + len + 4]);
    }
    records
}

fn unused_triggers(count: usize) -> Vec<u8> {
    vec![0xFF; count * 5]
}

#[test]
fn town_room_record() {
    let rom = assert_compiles(TOWN_PROJECT);
    let records = room_records(&rom, 0xC00000);
    assert_eq!(records.len(), 2);

    let mut expected = vec![2, 2, 0];
    // one entity in the first group, running totals
    expected.extend_from_slice(&[1; 8]);
    expected.extend_from_slice(&[0, 0, 1, 1, 0x81]);
    expected.extend(unused_triggers(15));
    expected.extend_from_slice(&[0, 1, 1, 0]);
    expected.extend_from_slice(&[1, 8, 0, 8, 0, 0]);
    expected.extend_from_slice(&[0, 16, 0, 16, 0, 1]);
    // startup at 5, open_gate at 12
    expected.extend_from_slice(&[2, 5, 0, 12, 0]);
    expected.extend_from_slice(&[8, 0, 6, 0, 20, 0, 0]);
    expected.extend_from_slice(&[10, 0, 23, 2, 0, 22, 30, 0, 0]);
    expected.extend_from_slice(b"ENDR");

    assert_eq!(records[0], expected.as_slice());
}

#[test]
fn cave_room_record() {
    let rom = assert_compiles(TOWN_PROJECT);
    let records = room_records(&rom, 0xC00000);

    let mut expected = vec![1, 1, 0];
    expected.extend_from_slice(&[0; 8]);
    expected.extend(unused_triggers(16));
    expected.push(0);
    expected.extend_from_slice(&[1, 0, 0, 0, 0, 0]);
    expected.extend_from_slice(&[1, 3, 0]);
    expected.extend_from_slice(&[
        5, 127, 10, 0, 14, 0, // while word counter < 10
        17, 127, // increment_word counter
        22, 1, 0, // sleep_frames 1
        1, 0, 0, // loop
        21, 0, 0, // load_room town gate
        0,
    ]);
    expected.extend_from_slice(b"ENDR");

    assert_eq!(records[1], expected.as_slice());
}

#[test]
fn single_room_layout() {
    let rom = assert_compiles(&room_project("set_flag door_open;"));
    let records = room_records(&rom, 0x808000);
    assert_eq!(records.len(), 1);

    let record = records[0];
    assert_eq!(record.len(), 91 + 1 + 1 + 6 + 4);
    assert_eq!(&record[..3], &[1, 1, 0]);
    // map, no entrances, no entities
    assert_eq!(&record[91..93], &[0, 0]);
    assert_eq!(&record[93..99], &[1, 3, 0, 10, 0, 0]);
}

#[test]
fn room_local_flag() {
    let source = TOWN_PROJECT.replace("load_room town gate;", "set_flag lever_pulled;\nload_room town gate;");
    let rom = assert_compiles(&source);
    let cave = room_records(&rom, 0xC00000)[1];

    let script = &cave[91 + 1 + 6 + 3..cave.len() - 4];
    assert_eq!(&script[14..], &[10, 1, 21, 0, 0, 0]);
}

#[test]
fn room_local_flag_outside_its_room() {
    let source = TOWN_PROJECT.replace("spawn_entity_group guards;", "clear_flag lever_pulled;");
    assert_validation_error(
        &source,
        "error: room script town.startup:2: flag lever_pulled is only accessible in room cave",
    );
}

#[test]
fn temporary_flag_uses_last_index() {
    let source = room_project("set_flag spare; clear_flag spare;").replace(
        "tiles = [0]",
        "tiles = [0]\ntemp_flags = [\"spare\"]",
    );
    let rom = assert_compiles(&source);
    let record = room_records(&rom, 0x808000)[0];

    // flag 511 lives in group 1 at offset 255
    assert_eq!(&record[93..], &[1, 3, 0, 11, 255, 13, 255, 0, b'E', b'N', b'D', b'R']);
}

#[test]
fn temporary_words_are_per_room() {
    // both rooms may use the same temporary name
    let source = TOWN_PROJECT.replace("tiles = [0, 1, 1, 0]", "tiles = [0, 1, 1, 0]\ntemp_words = [\"counter\"]");
    assert_compiles(&source);
}
