//! Configuration and memory map

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::diagnostics::CompileError;

/// Name of the optional configuration file read by [`MemoryMap::load_or_default`]
pub const CONFIG_FILE: &str = "romforge.toml";

/// Cartridge address mapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// 32 KiB banks mapped at `$8000-$FFFF`
    LoRom,
    /// 64 KiB banks mapped at `$0000-$FFFF`
    HiRom,
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingMode::LoRom => write!(f, "LoROM"),
            MappingMode::HiRom => write!(f, "HiROM"),
        }
    }
}

/// Memory map of the data banks the compiler may write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    pub mode: MappingMode,
    pub first_bank: u8,
    pub bank_count: usize,
}

impl MemoryMap {
    pub fn new(mode: MappingMode, first_bank: u8, bank_count: usize) -> Self {
        Self {
            mode,
            first_bank,
            bank_count,
        }
    }

    /// Size of a single bank in bytes
    pub fn bank_size(&self) -> usize {
        match self.mode {
            MappingMode::LoRom => 0x8000,
            MappingMode::HiRom => 0x10000,
        }
    }

    /// Absolute address of the first byte of bank `n`
    pub fn bank_address(&self, n: usize) -> u32 {
        let bank = (self.first_bank as u32 + n as u32) << 16;
        match self.mode {
            MappingMode::LoRom => bank | 0x8000,
            MappingMode::HiRom => bank,
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.bank_count == 0 {
            return Err(CompileError::InvalidMemoryMap(
                "bank count must be at least 1".to_string(),
            ));
        }
        if self.first_bank as usize + self.bank_count > 0x100 {
            return Err(CompileError::InvalidMemoryMap(format!(
                "{} banks starting at ${:02X} exceed the 24 bit address space",
                self.bank_count, self.first_bank
            )));
        }
        Ok(())
    }

    /// Parse the `[memory_map]` table of a configuration file
    pub fn from_config_str(source: &str) -> Result<Self, CompileError> {
        #[derive(Deserialize)]
        struct ConfigFile {
            memory_map: MemoryMap,
        }

        let file: ConfigFile =
            toml::from_str(source).map_err(|e| CompileError::Config(e.to_string()))?;
        Ok(file.memory_map)
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_config_str(&source)
    }

    /// Load `romforge.toml` from the working directory, falling back to the default map
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }

        match Self::load(path) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("ignoring {}: {}", CONFIG_FILE, e);
                Self::default()
            }
        }
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new(MappingMode::HiRom, 0xC0, 4)
    }
}
