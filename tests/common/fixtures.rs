//! Common test fixtures and example projects
//!
//! Provides reusable project files for various scenarios

/// Smallest project that compiles: one bank, nothing in it
pub const EMPTY_PROJECT: &str = r#"
[memory_map]
mode = "hirom"
first_bank = 0xC0
bank_count = 1
"#;

/// A two room project touching every resource kind
pub const TOWN_PROJECT: &str = r#"
[memory_map]
mode = "hirom"
first_bank = 0xC0
bank_count = 2

[constants]
FRAME_RATE = 60

[[instructions]]
name = "play_sound"
arguments = ["u16"]

[game_state]
flags = [{ name = "door_open" }, { name = "lever_pulled", room = "cave" }]
words = [{ name = "coins" }]

[[structs]]
name = "BaseEntity"
fields = [{ name = "health", type = "u8", default = "3" }]

[[structs]]
name = "Walker"
parent = "BaseEntity"
fields = [{ name = "speed", type = "u16", default = "0x100" }]

[[export_orders]]
name = "npc"
frames = ["stand", "walk"]

[[function_tables]]
name = "walker"
entity_struct = "Walker"
export_order = "npc"

[[frame_sets]]
name = "slime"
export_order = "npc"
frames = ["stand", "walk"]
palette_count = 2
data = [1, 2, 3, 4]

[[entities]]
name = "slime"
function_table = "walker"
frame_set = "slime"
display_frame = "stand"
fields = { speed = 0x80 }

[[palettes]]
name = "town"
data = [0, 0, 255, 127]

[[metatile_tilesets]]
name = "town"
data = [9, 9, 9]

[[scenes]]
name = "outdoors"

[tile_data]
bank = 1
data = [0xAA, 0xBB]

[[rooms]]
name = "town"
scene = "outdoors"
width = 2
height = 2
tiles = [0, 1, 1, 0]
startup_script = """
if flag door_open set {
    spawn_entity_group guards;
}
"""

[[rooms.entrances]]
name = "gate"
x = 8
y = 8

[[rooms.entity_groups]]
name = "guards"
entities = [{ entity = "slime", x = 16, y = 16, parameter = 1 }]

[[rooms.scripts]]
name = "open_gate"
script = "set_flag door_open; play_sound 2; sleep_frames 30;"

[[rooms.script_triggers]]
script = "open_gate"
left = 0
top = 0
right = 1
bottom = 1
once = true

[[rooms]]
name = "cave"
scene = "outdoors"
width = 1
height = 1
tiles = [0]
temp_words = ["counter"]
startup_script = """
// wait a moment before leaving
while word counter < 10 {
    increment_word counter;
    sleep_frames 1;
}
load_room town gate;
"""

[[rooms.entrances]]
name = "mouth"
x = 0
y = 0
"#;

/// Build a one-room project around a startup script
pub fn room_project(startup_script: &str) -> String {
    format!(
        r#"
[memory_map]
mode = "lorom"
first_bank = 0x80
bank_count = 1

[game_state]
flags = [{{ name = "door_open" }}]
words = [{{ name = "coins" }}]

[[scenes]]
name = "outdoors"

[[rooms]]
name = "town"
scene = "outdoors"
width = 1
height = 1
tiles = [0]
startup_script = """
{}
"""
"#,
        startup_script
    )
}
