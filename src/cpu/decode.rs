//! Instruction decoder for the Hack CPU.
//!
//! Every instruction is one 16-bit word:
//! - Address form `0vvv vvvv vvvv vvvv`: load the 15-bit value into A
//! - Compute form `111a cccc ccdd djjj`: ALU operation, destinations, jump

use crate::asm::tables::{DEST_A, DEST_D, DEST_M};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Destination mask of a compute instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dest {
    pub a: bool,
    pub d: bool,
    pub m: bool,
}

impl Dest {
    /// Create from the 3-bit `ADM` field.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            a: bits & DEST_A != 0,
            d: bits & DEST_D != 0,
            m: bits & DEST_M != 0,
        }
    }

    /// Convert to the 3-bit field.
    pub fn bits(self) -> u8 {
        (if self.a { DEST_A } else { 0 })
            | (if self.d { DEST_D } else { 0 })
            | (if self.m { DEST_M } else { 0 })
    }
}

/// Jump condition, tested against the ALU result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Jump {
    /// 000: never jump
    #[default]
    Never,
    /// 001: result > 0
    Gt,
    /// 010: result == 0
    Eq,
    /// 011: result >= 0
    Ge,
    /// 100: result < 0
    Lt,
    /// 101: result != 0
    Ne,
    /// 110: result <= 0
    Le,
    /// 111: always jump
    Always,
}

impl Jump {
    /// Create from the 3-bit field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Jump::Never,
            0b001 => Jump::Gt,
            0b010 => Jump::Eq,
            0b011 => Jump::Ge,
            0b100 => Jump::Lt,
            0b101 => Jump::Ne,
            0b110 => Jump::Le,
            _ => Jump::Always,
        }
    }

    /// Convert to the 3-bit field.
    pub fn bits(self) -> u8 {
        match self {
            Jump::Never => 0b000,
            Jump::Gt => 0b001,
            Jump::Eq => 0b010,
            Jump::Ge => 0b011,
            Jump::Lt => 0b100,
            Jump::Ne => 0b101,
            Jump::Le => 0b110,
            Jump::Always => 0b111,
        }
    }

    /// Whether the condition holds for an (already 16-bit) result.
    pub fn holds(self, value: i16) -> bool {
        match self {
            Jump::Never => false,
            Jump::Gt => value > 0,
            Jump::Eq => value == 0,
            Jump::Ge => value >= 0,
            Jump::Lt => value < 0,
            Jump::Ne => value != 0,
            Jump::Le => value <= 0,
            Jump::Always => true,
        }
    }
}

/// Decoded Hack instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// `@value`: A := value (0..=32767)
    Address(u16),

    /// `dest=comp;jump`
    Compute {
        /// Operand select: false = A, true = RAM[A]
        a: bool,
        /// 6-bit ALU code
        comp: u8,
        dest: Dest,
        jump: Jump,
    },
}

/// Decode an instruction word.
///
/// Any word with the top bit set is a compute instruction; bits 14 and 13
/// are not inspected.
pub fn decode(word: u16) -> Instruction {
    if word & 0x8000 == 0 {
        return Instruction::Address(word & 0x7FFF);
    }

    Instruction::Compute {
        a: word & 0x1000 != 0,
        comp: ((word >> 6) & 0x3F) as u8,
        dest: Dest::from_bits(((word >> 3) & 0x7) as u8),
        jump: Jump::from_bits((word & 0x7) as u8),
    }
}

/// Encode an instruction to a 16-bit word.
pub fn encode(instr: &Instruction) -> u16 {
    match *instr {
        Instruction::Address(value) => value & 0x7FFF,
        Instruction::Compute { a, comp, dest, jump } => {
            0xE000
                | ((a as u16) << 12)
                | (((comp & 0x3F) as u16) << 6)
                | ((dest.bits() as u16) << 3)
                | jump.bits() as u16
        }
    }
}

/// Render a word as a 16-character binary string.
pub fn format_word(word: u16) -> String {
    format!("{:016b}", word)
}

/// Parse a 16-character binary string.
pub fn parse_word(text: &str) -> Result<u16, DecodeError> {
    if text.len() != 16 {
        return Err(DecodeError::InvalidWidth(text.chars().count()));
    }
    if let Some(bad) = text.chars().find(|c| !matches!(c, '0' | '1')) {
        return Err(DecodeError::InvalidDigit(bad));
    }
    u16::from_str_radix(text, 2).map_err(|_| DecodeError::InvalidWidth(text.len()))
}

/// Errors that can occur while reading machine code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 16 binary digits, found {0} characters")]
    InvalidWidth(usize),

    #[error("invalid binary digit '{0}'")]
    InvalidDigit(char),
}
