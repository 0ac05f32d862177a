//! Room script compiler
//!
//! Lowers a [`ScriptNode`] tree into bytecode. Branch targets are absolute
//! little-endian 16 bit offsets into the script's own byte stream. Forward
//! branches are emitted with a placeholder and patched once the target
//! is known.
//!
//! Name resolution failures are accumulated in the [`ErrorList`] and a
//! placeholder value of 0 is emitted so the rest of the script is still
//! checked.

use rustc_hash::FxHashMap as HashMap;

use super::{Comparator, Condition, ScriptNode, Statement, VariableKind};
use crate::bytecode::{
    ArgumentType, InstructionTable, FLAG_GROUP_SIZE, OPCODE_BRANCH_WORD_EQUAL,
    OPCODE_BRANCH_WORD_GREATER_EQUAL, OPCODE_BRANCH_WORD_LESS_THAN, OPCODE_BRANCH_WORD_NOT_EQUAL,
    OPCODE_END, OPCODE_JUMP,
};
use crate::diagnostics::{CompileError, ErrorList, Location, ResourceKind};
use crate::gamestate::{LookupError, RoomVariables};
use crate::resources::parse_integer;

pub const MAX_NESTING_DEPTH: usize = 8;

/// Largest script that 16 bit branch targets can address
const MAX_SCRIPT_SIZE: usize = 0x10000;

/// Room names and their entrance names, for `room` / `room_entrance` arguments
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, (usize, HashMap<String, usize>)>,
    n_rooms: usize,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next room; rooms are indexed in insertion order
    ///
    /// A duplicate name still takes an index but keeps the first declaration.
    pub fn add_room<'a>(&mut self, name: &str, entrances: impl IntoIterator<Item = &'a str>) {
        let index = self.n_rooms;
        self.n_rooms += 1;

        let mut by_name = HashMap::default();
        for (i, e) in entrances.into_iter().enumerate() {
            by_name.entry(e.to_string()).or_insert(i);
        }
        self.rooms.entry(name.to_string()).or_insert((index, by_name));
    }

    pub fn room_index(&self, name: &str) -> Option<usize> {
        self.rooms.get(name).map(|(i, _)| *i)
    }

    pub fn entrance_index(&self, room: &str, entrance: &str) -> Option<usize> {
        self.rooms
            .get(room)
            .and_then(|(_, entrances)| entrances.get(entrance).copied())
    }
}

/// Read-only tables a room script is compiled against
pub struct ScriptContext<'a> {
    pub instructions: &'a InstructionTable,
    pub variables: &'a RoomVariables,
    /// Scripts of the current room, in script-index order
    pub room_scripts: &'a [&'a str],
    /// Entity groups of the current room
    pub entity_groups: &'a [&'a str],
    pub rooms: &'a RoomDirectory,
}

/// Compile `nodes` into bytecode terminated by the end-of-script opcode
///
/// `name` attributes diagnostics. Only a script too large for 16 bit
/// branch targets fails outright.
pub fn compile_script(
    nodes: &[ScriptNode],
    name: &str,
    ctx: &ScriptContext,
    errors: &mut ErrorList,
) -> Result<Vec<u8>, CompileError> {
    let mut compiler = ScriptCompiler {
        ctx,
        name,
        errors,
        output: Vec::new(),
        depth: 0,
        line: 0,
        depth_reported: false,
    };

    compiler.compile_nodes(nodes);
    compiler.output.push(OPCODE_END);

    if compiler.output.len() > MAX_SCRIPT_SIZE {
        return Err(CompileError::RecordTooLarge {
            kind: ResourceKind::RoomScript,
            name: name.to_string(),
            size: compiler.output.len(),
            max: MAX_SCRIPT_SIZE,
        });
    }

    Ok(compiler.output)
}

struct ScriptCompiler<'a> {
    ctx: &'a ScriptContext<'a>,
    name: &'a str,
    errors: &'a mut ErrorList,
    output: Vec<u8>,
    depth: usize,
    /// Pre-order index of the node being compiled
    line: usize,
    depth_reported: bool,
}

impl ScriptCompiler<'_> {
    fn error(&mut self, message: String) {
        self.errors.add_error(
            ResourceKind::RoomScript,
            self.name,
            Location::Line(self.line),
            message,
        );
    }

    fn compile_nodes(&mut self, nodes: &[ScriptNode]) {
        for node in nodes {
            self.line += 1;

            match node {
                ScriptNode::Statement(stmt) => self.compile_statement(stmt),
                ScriptNode::If {
                    condition,
                    then_branch,
                    else_branch,
                } => self.compile_if(condition, then_branch, else_branch),
                ScriptNode::While { condition, body } => self.compile_while(condition, body),
                ScriptNode::Comment(_) => {}
            }
        }
    }

    fn compile_block(&mut self, nodes: &[ScriptNode]) {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH && !self.depth_reported {
            self.depth_reported = true;
            self.error(format!(
                "too many nested statements (maximum depth is {})",
                MAX_NESTING_DEPTH
            ));
        }
        self.compile_nodes(nodes);
        self.depth -= 1;
    }

    fn compile_if(&mut self, condition: &Condition, then_branch: &[ScriptNode], else_branch: &[ScriptNode]) {
        let skip_then = self.emit_branch_if_false(condition);

        self.compile_block(then_branch);

        if else_branch.is_empty() {
            self.patch(skip_then);
        } else {
            self.output.push(OPCODE_JUMP);
            let skip_else = self.emit_placeholder();
            self.patch(skip_then);

            self.compile_block(else_branch);
            self.patch(skip_else);
        }
    }

    fn compile_while(&mut self, condition: &Condition, body: &[ScriptNode]) {
        let line = self.line;
        let loop_head = self.output.len();
        let exit = self.emit_branch_if_false(condition);

        self.compile_block(body);

        self.output.push(OPCODE_JUMP);
        self.emit_target(loop_head);
        self.patch(exit);

        if !contains_yield(body, self.ctx.instructions) {
            self.errors.add_warning(
                ResourceKind::RoomScript,
                self.name,
                Location::Line(line),
                "while loop may infinitely loop: no instruction in its body yields",
            );
        }
    }

    fn compile_statement(&mut self, stmt: &Statement) {
        let ctx = self.ctx;

        let Some(inst) = ctx.instructions.get(&stmt.opcode) else {
            self.error(format!("unknown instruction: {}", stmt.opcode));
            return;
        };

        let n_args = inst.n_arguments();
        if stmt.arguments.len() != n_args {
            self.error(format!(
                "{} expects {} argument(s), found {}",
                stmt.opcode,
                n_args,
                stmt.arguments.len()
            ));
        }

        let mut opcode = inst.opcode;
        let mut operands = Vec::with_capacity(inst.size);
        let mut room: Option<&str> = None;

        for (i, ty) in inst.arguments.iter().enumerate() {
            let arg = stmt.arguments.get(i).map(String::as_str);

            match ty {
                ArgumentType::Unused => {}
                ArgumentType::Flag => {
                    let index = self.resolve_variable(VariableKind::Flag, arg) as usize;
                    opcode += (index / FLAG_GROUP_SIZE) as u8;
                    operands.push((index % FLAG_GROUP_SIZE) as u8);
                }
                ArgumentType::Word => {
                    let index = self.resolve_variable(VariableKind::Word, arg);
                    operands.push(index as u8);
                }
                ArgumentType::ImmediateU16 => {
                    let value = self.parse_u16(arg);
                    operands.extend_from_slice(&value.to_le_bytes());
                }
                ArgumentType::RoomScript => {
                    let index = self.resolve_index(arg, ctx.room_scripts, "room script");
                    operands.push(index);
                }
                ArgumentType::EntityGroup => {
                    let index = self.resolve_index(arg, ctx.entity_groups, "entity group");
                    operands.push(index);
                }
                ArgumentType::Room => {
                    let index = match arg {
                        Some(name) => match ctx.rooms.room_index(name) {
                            Some(i) => {
                                room = Some(name);
                                i as u8
                            }
                            None => {
                                self.error(format!("unknown room: {}", name));
                                0
                            }
                        },
                        None => 0,
                    };
                    operands.push(index);
                }
                ArgumentType::RoomEntrance => {
                    // Looked up in the target room, not the current one
                    let index = match (room, arg) {
                        (Some(room), Some(name)) => match ctx.rooms.entrance_index(room, name) {
                            Some(i) => i as u8,
                            None => {
                                self.error(format!("unknown room entrance: {} in room {}", name, room));
                                0
                            }
                        },
                        _ => 0,
                    };
                    operands.push(index);
                }
            }
        }

        self.output.push(opcode);
        self.output.extend_from_slice(&operands);
    }

    /// Emit a branch taken when `condition` is false, returning the placeholder position
    fn emit_branch_if_false(&mut self, condition: &Condition) -> usize {
        if !condition.comparator.accepts(condition.kind) {
            self.error(format!(
                "comparator '{}' cannot be used with a {}",
                condition.comparator,
                condition.kind.name()
            ));
            self.output.push(OPCODE_JUMP);
            return self.emit_placeholder();
        }

        match condition.kind {
            VariableKind::Flag => {
                let index = self.resolve_variable(VariableKind::Flag, Some(&condition.variable)) as usize;
                let base = match condition.comparator.negate() {
                    Comparator::Set => self.ctx.instructions.branch_flag_set_opcode(),
                    _ => self.ctx.instructions.branch_flag_clear_opcode(),
                };
                self.output.push(base + (index / FLAG_GROUP_SIZE) as u8);
                self.output.push((index % FLAG_GROUP_SIZE) as u8);
            }
            VariableKind::Word => {
                let index = self.resolve_variable(VariableKind::Word, Some(&condition.variable));
                let opcode = match condition.comparator.negate() {
                    Comparator::Equal => OPCODE_BRANCH_WORD_EQUAL,
                    Comparator::NotEqual => OPCODE_BRANCH_WORD_NOT_EQUAL,
                    Comparator::LessThan => OPCODE_BRANCH_WORD_LESS_THAN,
                    _ => OPCODE_BRANCH_WORD_GREATER_EQUAL,
                };
                let value = match &condition.value {
                    Some(v) => self.parse_u16(Some(v)),
                    None => {
                        self.error(format!("missing value to compare {} with", condition.variable));
                        0
                    }
                };
                self.output.push(opcode);
                self.output.push(index as u8);
                self.output.extend_from_slice(&value.to_le_bytes());
            }
        }

        self.emit_placeholder()
    }

    fn emit_placeholder(&mut self) -> usize {
        let pos = self.output.len();
        self.output.extend_from_slice(&[0, 0]);
        pos
    }

    fn emit_target(&mut self, target: usize) {
        self.output.extend_from_slice(&(target as u16).to_le_bytes());
    }

    /// Point the placeholder at `pos` to the current position
    fn patch(&mut self, pos: usize) {
        let target = (self.output.len() as u16).to_le_bytes();
        self.output[pos..pos + 2].copy_from_slice(&target);
    }

    fn resolve_variable(&mut self, kind: VariableKind, name: Option<&str>) -> u16 {
        let Some(name) = name else {
            return 0;
        };

        match self.ctx.variables.lookup(kind, name) {
            Ok(index) => index,
            Err(LookupError::Unknown) => {
                self.error(format!("unknown {}: {}", kind.name(), name));
                0
            }
            Err(LookupError::WrongRoom(owner)) => {
                self.error(format!(
                    "{} {} is only accessible in room {}",
                    kind.name(),
                    name,
                    owner
                ));
                0
            }
        }
    }

    fn resolve_index(&mut self, name: Option<&str>, names: &[&str], what: &str) -> u8 {
        let Some(name) = name else {
            return 0;
        };

        match names.iter().position(|n| *n == name) {
            Some(i) => i as u8,
            None => {
                self.error(format!("unknown {}: {}", what, name));
                0
            }
        }
    }

    fn parse_u16(&mut self, value: Option<&str>) -> u16 {
        let Some(value) = value else {
            return 0;
        };

        match parse_integer(value).and_then(|v| u16::try_from(v).ok()) {
            Some(v) => v,
            None => {
                self.error(format!("invalid u16 value: {}", value));
                0
            }
        }
    }
}

/// Whether any instruction in `nodes` (or nested below it) yields
fn contains_yield(nodes: &[ScriptNode], instructions: &InstructionTable) -> bool {
    nodes.iter().any(|node| match node {
        ScriptNode::Statement(stmt) => instructions
            .get(&stmt.opcode)
            .is_some_and(|inst| inst.yields),
        ScriptNode::If {
            then_branch,
            else_branch,
            ..
        } => contains_yield(then_branch, instructions) || contains_yield(else_branch, instructions),
        ScriptNode::While { body, .. } => contains_yield(body, instructions),
        ScriptNode::Comment(_) => false,
    })
}
