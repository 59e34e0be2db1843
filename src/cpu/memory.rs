//! Hack data memory.
//!
//! The standard platform has 24577 sixteen-bit cells: general-purpose
//! registers and variables, the screen buffer at 16384, and the keyboard
//! register at 24576.

use crate::cpu::alu::wrap16;
use serde::{Deserialize, Serialize};

/// The default number of memory cells.
pub const MEMORY_SIZE: usize = 24577;

/// Hack data memory: a fixed-size array of signed 16-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i16>,
}

impl Memory {
    /// Create a zeroed memory with `size` cells. `size` must be non-zero.
    pub(crate) fn new(size: usize) -> Self {
        debug_assert!(size > 0, "memory size must be non-zero");
        Self {
            cells: vec![0; size],
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; memory is never empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read a cell. Out-of-range addresses read as 0.
    pub fn get(&self, addr: i32) -> i16 {
        self.index(addr).map(|i| self.cells[i]).unwrap_or(0)
    }

    /// Write a cell, reducing the value to 16 bits.
    ///
    /// Out-of-range addresses are ignored. Returns whether a cell was written.
    pub fn set(&mut self, addr: i32, value: i32) -> bool {
        match self.index(addr) {
            Some(i) => {
                self.cells[i] = wrap16(value);
                true
            }
            None => false,
        }
    }

    /// Map the A register onto a cell index (`A mod size`).
    #[inline]
    pub fn wrap_address(&self, a: i16) -> usize {
        (a as i64).rem_euclid(self.cells.len() as i64) as usize
    }

    /// Read the cell addressed by the A register.
    #[inline]
    pub fn read_at(&self, a: i16) -> i16 {
        self.cells[self.wrap_address(a)]
    }

    /// Write the cell addressed by the A register. Returns the cell index.
    #[inline]
    pub fn write_at(&mut self, a: i16, value: i16) -> usize {
        let index = self.wrap_address(a);
        self.cells[index] = value;
        index
    }

    /// Copy out up to `count` cells starting at `start`, clamped to memory.
    pub fn range(&self, start: i32, count: usize) -> Vec<i16> {
        let len = self.cells.len() as i64;
        let lo = (start as i64).max(0);
        let hi = (start as i64).saturating_add(count as i64).min(len);
        if lo >= hi {
            return Vec::new();
        }
        self.cells[lo as usize..hi as usize].to_vec()
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    fn index(&self, addr: i32) -> Option<usize> {
        usize::try_from(addr).ok().filter(|&i| i < self.cells.len())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MEMORY_SIZE)
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}
