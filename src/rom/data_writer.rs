//! ROM data writer
//!
//! Wraps the [`BankAllocator`] with content deduplication, named symbols,
//! long-address tables and emission of the assembler side-table. The
//! binary image and the side-table are both produced from the same bank
//! state by [`RomDataWriter::finish`].

use rustc_hash::FxHashMap as HashMap;
use std::borrow::Cow;

use super::bank_allocator::{BankAllocator, RomError};
use super::inc_emitter::IncEmitter;
use crate::config::MemoryMap;

/// A resource that can serialize itself into ROM data
pub trait RomData {
    fn rom_data(&self) -> Cow<'_, [u8]>;
}

impl RomData for Vec<u8> {
    fn rom_data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl RomData for [u8] {
    fn rom_data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

/// A named absolute address exported to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSymbol {
    pub name: String,
    pub address: u32,
}

/// Result of [`RomDataWriter::finish`]
#[derive(Debug, Clone)]
pub struct RomOutput {
    pub binary: Vec<u8>,
    pub inc_data: String,
}

pub struct RomDataWriter {
    map: MemoryMap,
    allocator: BankAllocator,
    /// Content -> address of every blob placed through the writer
    placed: HashMap<Vec<u8>, u32>,
    constants: Vec<(String, i64)>,
    symbols: Vec<NamedSymbol>,
    /// (table name, entry count) in creation order
    tables: Vec<(String, usize)>,
}

impl RomDataWriter {
    pub fn new(map: MemoryMap) -> Self {
        Self {
            map,
            allocator: BankAllocator::new(&map),
            placed: HashMap::default(),
            constants: Vec::new(),
            symbols: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn memory_map(&self) -> &MemoryMap {
        &self.map
    }

    pub fn allocator(&self) -> &BankAllocator {
        &self.allocator
    }

    pub fn symbols(&self) -> &[NamedSymbol] {
        &self.symbols
    }

    pub fn symbol(&self, name: &str) -> Option<u32> {
        self.symbols.iter().find(|s| s.name == name).map(|s| s.address)
    }

    /// Place `data`, reusing the address of identical data placed earlier
    pub fn add_data(&mut self, data: &[u8]) -> Result<u32, RomError> {
        if let Some(&addr) = self.placed.get(data) {
            log::debug!("reusing {} bytes at ${:06X}", data.len(), addr);
            return Ok(addr);
        }

        let addr = self.allocator.add(data)?;
        log::debug!("placed {} bytes at ${:06X}", data.len(), addr);
        self.placed.insert(data.to_vec(), addr);
        Ok(addr)
    }

    /// Place `data` at an address whose low 16 bits are not zero
    pub fn add_data_not_null(&mut self, data: &[u8]) -> Result<u32, RomError> {
        if let Some(&addr) = self.placed.get(data) {
            if addr & 0xFFFF != 0 {
                log::debug!("reusing {} bytes at ${:06X}", data.len(), addr);
                return Ok(addr);
            }
        }

        let addr = self.allocator.add_not_null(data)?;
        log::debug!("placed {} not-null bytes at ${:06X}", data.len(), addr);
        self.placed.insert(data.to_vec(), addr);
        Ok(addr)
    }

    pub fn add_named_data(&mut self, name: &str, data: &[u8]) -> Result<u32, RomError> {
        let addr = self.add_data(data)?;
        self.add_symbol(name, addr);
        Ok(addr)
    }

    pub fn add_named_data_not_null(&mut self, name: &str, data: &[u8]) -> Result<u32, RomError> {
        let addr = self.add_data_not_null(data)?;
        self.add_symbol(name, addr);
        Ok(addr)
    }

    /// Place `data` at the origin of bank `bank`
    ///
    /// Must be the first write to that bank.
    pub fn add_fixed_data(&mut self, name: &str, bank: usize, data: &[u8]) -> Result<u32, RomError> {
        if bank >= self.map.bank_count {
            return Err(RomError::InvalidBank { bank });
        }
        let addr = self.map.bank_address(bank);
        self.allocator.add_fixed(bank, addr, data)?;
        log::debug!("placed {} fixed bytes at ${:06X}", data.len(), addr);
        self.add_symbol(name, addr);
        Ok(addr)
    }

    /// Place every item and a table of their 24 bit addresses
    ///
    /// Exports `name` (table address) and `name.count`.
    pub fn add_long_address_table<'a, T, I>(&mut self, name: &str, items: I) -> Result<u32, RomError>
    where
        T: RomData + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut table = Vec::new();
        let mut count = 0;

        for item in items {
            let addr = self.add_data(&item.rom_data())?;
            table.extend_from_slice(&addr.to_le_bytes()[..3]);
            count += 1;
        }

        let addr = self.add_named_data(name, &table)?;
        self.tables.push((name.to_string(), count));
        log::debug!("long address table {} has {} entries", name, count);
        Ok(addr)
    }

    pub fn add_constant(&mut self, name: &str, value: i64) {
        self.constants.push((name.to_string(), value));
    }

    fn add_symbol(&mut self, name: &str, address: u32) {
        self.symbols.push(NamedSymbol {
            name: name.to_string(),
            address,
        });
    }

    /// Produce the binary image and the side-table
    ///
    /// `binary_path` is the path of the image as seen by the assembler.
    pub fn finish(self, binary_path: &str) -> Result<RomOutput, RomError> {
        self.allocator.check_capacity()?;

        let mut emitter = IncEmitter::new();
        let mut binary = Vec::new();

        for (name, value) in &self.constants {
            emitter.emit_constant(name, *value);
        }
        if !self.constants.is_empty() {
            emitter.emit_blank();
        }

        for (id, bank) in self.allocator.banks().iter().enumerate() {
            emitter.begin_namespace(&format!("RomData_Bank{}", id));
            emitter.emit_assert_pc(bank.start);
            if !bank.data.is_empty() {
                emitter.emit_insert(binary_path, binary.len(), bank.data.len());
            }
            emitter.end_namespace();

            binary.extend_from_slice(&bank.data);
        }
        emitter.emit_blank();

        for (name, count) in &self.tables {
            emitter.emit_constant(&format!("{}.count", name), *count as i64);
        }
        for symbol in &self.symbols {
            emitter.emit_address(&symbol.name, symbol.address);
        }

        Ok(RomOutput {
            binary,
            inc_data: emitter.finish(),
        })
    }
}
