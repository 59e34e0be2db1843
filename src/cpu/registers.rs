//! Hack CPU registers.
//!
//! The Hack CPU has 3 registers:
//! - A: address register (also a general-purpose data register)
//! - D: data register
//! - PC: program counter
//!
//! All three hold 16-bit signed values.

use serde::{Deserialize, Serialize};

/// The Hack register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// A: address register
    pub a: i16,

    /// D: data register
    pub d: i16,

    /// PC: program counter (index into instruction memory)
    pub pc: i16,
}

impl Registers {
    /// Create a zeroed register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance PC to the next instruction.
    #[inline]
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    /// Jump to the address currently held in A.
    #[inline]
    pub fn jump(&mut self) {
        self.pc = self.a;
    }

    /// PC as an instruction-memory index, if non-negative.
    pub fn pc_index(&self) -> Option<usize> {
        usize::try_from(self.pc).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_jump() {
        let mut regs = Registers::new();
        regs.advance_pc();
        regs.advance_pc();
        assert_eq!(regs.pc, 2);

        regs.a = 40;
        regs.jump();
        assert_eq!(regs.pc, 40);
    }

    #[test]
    fn test_pc_wraps() {
        let mut regs = Registers { pc: i16::MAX, ..Registers::new() };
        regs.advance_pc();
        assert_eq!(regs.pc, i16::MIN);
        assert_eq!(regs.pc_index(), None);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers { a: 1, d: 2, pc: 3 };
        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
