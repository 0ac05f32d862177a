//! Bank-based memory allocation
//!
//! Appends data to the first bank with enough room. There is no freeing
//! and no compaction; an allocation that fits nowhere leaves every bank
//! untouched.

use std::fmt;

use crate::config::MemoryMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomError {
    /// No bank has `size` bytes remaining
    OutOfSpace { size: usize },
    InvalidBank { bank: usize },
    /// Fixed data was not the next write in its bank
    FixedPlacement { bank: usize, expected: u32, actual: u32 },
    /// A bank holds more data than the memory map allows
    BankOverflow { bank: usize, size: usize, capacity: usize },
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::OutOfSpace { size } => write!(
                f,
                "cannot fit {} bytes of data in ROM, try increasing the number of banks in the memory map",
                size
            ),
            RomError::InvalidBank { bank } => write!(f, "bank {} is not in the memory map", bank),
            RomError::FixedPlacement {
                bank,
                expected,
                actual,
            } => write!(
                f,
                "cannot place fixed data at ${:06X} in bank {}: next free address is ${:06X}",
                expected, bank, actual
            ),
            RomError::BankOverflow {
                bank,
                size,
                capacity,
            } => write!(
                f,
                "bank {} overflow: {} bytes written, capacity is {}",
                bank, size, capacity
            ),
        }
    }
}

impl std::error::Error for RomError {}

/// An append-only region of the output image
#[derive(Debug, Clone)]
pub struct Bank {
    /// Absolute address of the first byte
    pub start: u32,
    pub data: Vec<u8>,
}

impl Bank {
    /// Absolute address of the next byte to be written
    pub fn next_address(&self) -> u32 {
        self.start + self.data.len() as u32
    }
}

/// Tracks the committed data of every bank in the memory map
#[derive(Debug, Clone)]
pub struct BankAllocator {
    bank_size: usize,
    banks: Vec<Bank>,
}

impl BankAllocator {
    pub fn new(map: &MemoryMap) -> Self {
        let banks = (0..map.bank_count)
            .map(|n| Bank {
                start: map.bank_address(n),
                data: Vec::new(),
            })
            .collect();

        Self {
            bank_size: map.bank_size(),
            banks,
        }
    }

    pub fn bank_size(&self) -> usize {
        self.bank_size
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Bytes still available in bank `id`
    pub fn remaining(&self, id: usize) -> Option<usize> {
        self.banks
            .get(id)
            .map(|b| self.bank_size.saturating_sub(b.data.len()))
    }

    /// Append `data` to the first bank that can hold it, returning its address
    pub fn add(&mut self, data: &[u8]) -> Result<u32, RomError> {
        let id = self
            .find_bank(data.len(), |_| true)
            .ok_or(RomError::OutOfSpace { size: data.len() })?;

        Ok(self.append(id, data))
    }

    /// Like [`add`](Self::add) but the low 16 bits of the address are never zero
    ///
    /// Banks whose next address is already non-null are tried first; otherwise
    /// a padding byte is written before the data.
    pub fn add_not_null(&mut self, data: &[u8]) -> Result<u32, RomError> {
        if let Some(id) = self.find_bank(data.len(), |b| b.next_address() & 0xFFFF != 0) {
            return Ok(self.append(id, data));
        }

        let id = self
            .find_bank(data.len() + 1, |_| true)
            .ok_or(RomError::OutOfSpace { size: data.len() })?;

        self.banks[id].data.push(0);
        Ok(self.append(id, data))
    }

    /// Write `data` at `address`, which must be the next free address of bank `id`
    pub fn add_fixed(&mut self, id: usize, address: u32, data: &[u8]) -> Result<(), RomError> {
        let remaining = self.remaining(id).ok_or(RomError::InvalidBank { bank: id })?;

        let actual = self.banks[id].next_address();
        if actual != address {
            return Err(RomError::FixedPlacement {
                bank: id,
                expected: address,
                actual,
            });
        }
        if data.len() > remaining {
            return Err(RomError::OutOfSpace { size: data.len() });
        }

        self.append(id, data);
        Ok(())
    }

    /// Verify every bank is within capacity
    pub fn check_capacity(&self) -> Result<(), RomError> {
        for (id, bank) in self.banks.iter().enumerate() {
            if bank.data.len() > self.bank_size {
                return Err(RomError::BankOverflow {
                    bank: id,
                    size: bank.data.len(),
                    capacity: self.bank_size,
                });
            }
        }
        Ok(())
    }

    fn find_bank(&self, size: usize, filter: impl Fn(&Bank) -> bool) -> Option<usize> {
        self.banks
            .iter()
            .position(|b| b.data.len() + size <= self.bank_size && filter(b))
    }

    fn append(&mut self, id: usize, data: &[u8]) -> u32 {
        let bank = &mut self.banks[id];
        let addr = bank.next_address();
        bank.data.extend_from_slice(data);
        addr
    }
}
