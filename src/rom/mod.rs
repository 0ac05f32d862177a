//! ROM data placement
//!
//! Packs binary blobs into the banks of a [`MemoryMap`](crate::config::MemoryMap)
//! and emits the side-table the assembler uses to link them.

pub mod bank_allocator;
pub mod data_writer;
pub mod inc_emitter;

pub use bank_allocator::{Bank, BankAllocator, RomError};
pub use data_writer::{NamedSymbol, RomData, RomDataWriter, RomOutput};
pub use inc_emitter::IncEmitter;
