//! Include file emitter
//!
//! Helper for generating the assembler side-table that links the binary
//! image into the final ROM.

pub struct IncEmitter {
    output: String,
    indent: usize,
}

impl Default for IncEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl IncEmitter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn emit_raw(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    pub fn emit_blank(&mut self) {
        self.output.push('\n');
    }

    /// `constant NAME = value`
    pub fn emit_constant(&mut self, name: &str, value: i64) {
        self.emit_raw(&format!("constant {} = {}", name, value));
    }

    /// `constant NAME = 0xADDR`
    pub fn emit_address(&mut self, name: &str, address: u32) {
        self.emit_raw(&format!("constant {} = 0x{:06x}", name, address));
    }

    pub fn begin_namespace(&mut self, name: &str) {
        self.emit_raw(&format!("namespace {} {{", name));
        self.indent += 1;
    }

    pub fn end_namespace(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.emit_raw("}");
    }

    pub fn emit_assert_pc(&mut self, address: u32) {
        self.emit_raw(&format!("assert(pc() == 0x{:06x})", address));
    }

    pub fn emit_insert(&mut self, path: &str, offset: usize, length: usize) {
        self.emit_raw(&format!("insert \"{}\", {}, {}", path, offset, length));
    }

    pub fn finish(self) -> String {
        self.output
    }
}
