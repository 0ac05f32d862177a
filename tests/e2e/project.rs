//! Whole-project layout tests

use crate::common::fixtures::{EMPTY_PROJECT, TOWN_PROJECT};
use crate::common::*;

/// Read the 24 bit little endian address at `offset` of the image
fn long_address(binary: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([binary[offset], binary[offset + 1], binary[offset + 2], 0])
}

#[test]
fn empty_project_side_table() {
    let rom = assert_compiles(EMPTY_PROJECT);

    assert!(rom.binary.is_empty());
    assert!(rom.inc_data.contains("namespace RomData_Bank0 {\n  assert(pc() == 0xc00000)\n}\n"));
    assert!(!rom.inc_data.contains("insert"));
    assert!(rom.inc_data.contains("constant Project.EntityList.count = 0\n"));
}

#[test]
fn town_constants() {
    let rom = assert_compiles(TOWN_PROJECT);

    // project constants come first, in declaration order
    assert!(rom.inc_data.starts_with("constant FRAME_RATE = 60\n"));
    assert!(rom.inc_data.contains("constant Project.Bytecode.sleep_frames = 22\n"));
    assert!(rom.inc_data.contains("constant Project.Bytecode.play_sound = 23\n"));
    assert!(rom.inc_data.contains("constant Project.Bytecode.N_OPCODES = 24\n"));
}

#[test]
fn town_table_addresses() {
    let rom = assert_compiles(TOWN_PROJECT);
    let inc = &rom.inc_data;

    assert!(inc.contains("constant Project.TileData = 0xc10000\n"));
    assert!(inc.contains("constant Project.PaletteList = 0xc00004\n"));
    assert!(inc.contains("constant Project.MetaTileTilesetList = 0xc0000a\n"));
    assert!(inc.contains("constant Project.FrameSetList = 0xc00011\n"));
    assert!(inc.contains("constant Project.EntityList = 0xc0001b\n"));
    // empty tables share one address
    assert!(inc.contains("constant Project.ProjectileList = 0xc0001e\n"));
    assert!(inc.contains("constant Project.PlayerList = 0xc0001e\n"));
    assert!(inc.contains("constant Project.RoomList = 0xc0011d\n"));

    assert!(inc.contains("constant Project.PaletteList.count = 1\n"));
    assert!(inc.contains("constant Project.ProjectileList.count = 0\n"));
    assert!(inc.contains("constant Project.RoomList.count = 2\n"));
}

#[test]
fn town_binary_layout() {
    let rom = assert_compiles(TOWN_PROJECT);
    let bin = &rom.binary;

    // bank 0 holds 0x123 bytes, bank 1 only the tile data
    assert_eq!(bin.len(), 0x123 + 2);
    assert_eq!(&bin[0x123..], &[0xAA, 0xBB]);

    assert_eq!(&bin[0x00..0x04], &[0, 0, 255, 127]);
    assert_eq!(long_address(bin, 0x04), 0xC00000);
    assert_eq!(&bin[0x07..0x0A], &[9, 9, 9]);
    assert_eq!(long_address(bin, 0x0A), 0xC00007);
    assert_eq!(&bin[0x0D..0x11], &[1, 2, 3, 4]);
    assert_eq!(long_address(bin, 0x11), 0xC0000D);

    // function table, frame set, palette, display frame, health, speed
    assert_eq!(&bin[0x14..0x1B], &[0, 0, 0, 0, 3, 0x80, 0]);
    assert_eq!(long_address(bin, 0x1B), 0xC00014);

    assert_eq!(long_address(bin, 0x11D), 0xC0001E);
    assert_eq!(long_address(bin, 0x120), 0xC000A2);
}

#[test]
fn town_bank_inserts() {
    let rom = assert_compiles(TOWN_PROJECT);

    assert!(rom.inc_data.contains(
        "namespace RomData_Bank0 {\n  assert(pc() == 0xc00000)\n  insert \"romdata.bin\", 0, 291\n}\n"
    ));
    assert!(rom.inc_data.contains(
        "namespace RomData_Bank1 {\n  assert(pc() == 0xc10000)\n  insert \"romdata.bin\", 291, 2\n}\n"
    ));
}

#[test]
fn identical_resources_are_stored_once() {
    let source = TOWN_PROJECT.replace("data = [9, 9, 9]", "data = [0, 0, 255, 127]");
    let rom = assert_compiles(&source);

    // same blob, and therefore the same one-entry table
    assert!(rom.inc_data.contains("constant Project.PaletteList = 0xc00004\n"));
    assert!(rom.inc_data.contains("constant Project.MetaTileTilesetList = 0xc00004\n"));
    assert!(rom.inc_data.contains("constant Project.FrameSetList = 0xc0000b\n"));
    assert_eq!(rom.binary.len(), 0x11D + 2);
}

#[test]
fn town_compiles_without_warnings() {
    let rom = assert_compiles(TOWN_PROJECT);
    assert!(rom.warnings.is_empty(), "{}", rom.warnings);
}

#[test]
fn compile_is_deterministic() {
    let a = assert_compiles(TOWN_PROJECT);
    let b = assert_compiles(TOWN_PROJECT);
    assert_eq!(a.binary, b.binary);
    assert_eq!(a.inc_data, b.inc_data);
}
