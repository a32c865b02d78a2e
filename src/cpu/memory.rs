//! LS-8 memory subsystem.
//!
//! A flat 256-byte address space. Addresses are `u8`, so every address a
//! program can form is in range by construction.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of bytes in the address space.
pub const MEMORY_SIZE: usize = 256;

/// LS-8 memory: 256 byte-sized cells.
///
/// Deserialisation checks the cell count, so a restored memory always
/// covers the whole address space.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "MemoryImage")]
pub struct Memory {
    cells: Vec<u8>,
}

/// Serialised form of [`Memory`], before its size is checked.
#[derive(Deserialize)]
struct MemoryImage {
    cells: Vec<u8>,
}

impl TryFrom<MemoryImage> for Memory {
    type Error = MemoryError;

    fn try_from(image: MemoryImage) -> Result<Self, Self::Error> {
        if image.cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize { len: image.cells.len() });
        }
        Ok(Self { cells: image.cells })
    }
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the byte at `addr` (the MAR).
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    /// Write `value` (the MDR) to `addr`.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: u8, program: &[u8]) -> Result<(), MemoryError> {
        let start = start_addr as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE - start,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(u8, u8)> {
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i as u8, self.cells[i]))
            .collect()
    }

    /// View the whole address space.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("memory image has {len} cells, expected 256")]
    WrongSize { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(10, 42);
        assert_eq!(mem.read(10), 42);
        assert_eq!(mem.read(11), 0);
    }

    #[test]
    fn test_memory_edges() {
        let mut mem = Memory::new();
        mem.write(0, 1);
        mem.write(255, 2);

        assert_eq!(mem.read(0), 1);
        assert_eq!(mem.read(255), 2);
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.load_program(0, &[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0), 1);
        assert_eq!(mem.read(1), 2);
        assert_eq!(mem.read(2), 3);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        assert!(mem.load_program(0, &[0; MEMORY_SIZE]).is_ok());

        let err = mem.load_program(10, &[0; MEMORY_SIZE]).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 256, available: 246 });
    }

    #[test]
    fn test_clear_and_dump() {
        let mut mem = Memory::new();
        mem.load_program(0, &[9, 8, 7]).unwrap();
        assert_eq!(mem.dump(1, 2), vec![(1, 8), (2, 7)]);
        assert_eq!(mem.dump(254, 10).len(), 2);

        mem.clear();
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_deserialize_checks_size() {
        let mem: Memory = serde_json::from_value(serde_json::json!({ "cells": vec![0u8; 256] })).unwrap();
        assert_eq!(mem.as_slice().len(), MEMORY_SIZE);

        let err = serde_json::from_value::<Memory>(serde_json::json!({ "cells": [0x54, 0] }));
        assert!(err.unwrap_err().to_string().contains("2 cells"));
    }
}
