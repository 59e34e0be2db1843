//! Machine-code artifacts.
//!
//! A `.hack` file is plain text:
//! - One instruction per line
//! - Each line is exactly 16 `0`/`1` characters
//! - Blank lines are ignored
//! - The file ends with a newline

use crate::asm::assembler::{assemble, AssemblerError};
use crate::asm::disasm::disassemble_word;
use crate::cpu::decode::{format_word, parse_word, DecodeError};
use std::path::Path;
use thiserror::Error;

/// An assembled program: instruction words and the source line behind each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Instruction words, indexed by ROM address.
    pub instructions: Vec<u16>,
    /// Source text for each instruction (same length as `instructions`).
    pub source_lines: Vec<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instruction.
    pub fn push(&mut self, word: u16, source: &str) {
        self.instructions.push(word);
        self.source_lines.push(source.to_string());
    }

    /// Get the number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Split into instruction words and aligned source lines.
    pub fn into_parts(self) -> (Vec<u16>, Vec<String>) {
        (self.instructions, self.source_lines)
    }

    /// Render as `.hack` text.
    pub fn to_hack_string(&self) -> String {
        let mut out = String::with_capacity(self.instructions.len() * 17);
        for &word in &self.instructions {
            out.push_str(&format_word(word));
            out.push('\n');
        }
        out
    }

    /// Parse `.hack` text. Source lines are recovered by disassembly.
    pub fn parse_hack(text: &str) -> Result<Self, ProgramError> {
        let mut program = Program::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let word = parse_word(line).map_err(|source| ProgramError::Decode {
                line: idx + 1,
                source,
            })?;
            program.push(word, &disassemble_word(word));
        }
        Ok(program)
    }
}

/// Save a program as a `.hack` file.
pub fn save_hack<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ProgramError> {
    std::fs::write(path.as_ref(), program.to_hack_string())
        .map_err(|e| ProgramError::Io(e.to_string()))
}

/// Load a `.hack` file.
pub fn load_hack<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ProgramError::Io(e.to_string()))?;
    Program::parse_hack(&text)
}

/// Load a program from disk: `.asm` files are assembled, anything else is
/// read as machine code.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let path = path.as_ref();
    let is_asm = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("asm"))
        .unwrap_or(false);

    if is_asm {
        let source = std::fs::read_to_string(path).map_err(|e| ProgramError::Io(e.to_string()))?;
        Ok(assemble(&source)?)
    } else {
        load_hack(path)
    }
}

/// Errors that can occur while reading or writing programs.
#[derive(Debug, Clone, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("assembly error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("invalid machine code on line {line}: {source}")]
    Decode { line: usize, source: DecodeError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hack_text_has_trailing_newline() {
        let program = assemble("@2\nD=A").unwrap();
        assert_eq!(
            program.to_hack_string(),
            "0000000000000010\n1110110000010000\n"
        );
    }

    #[test]
    fn test_parse_hack_recovers_source() {
        let program = Program::parse_hack("0000000000000111\n\n1110001100001000\n").unwrap();
        assert_eq!(program.instructions, vec![7, 0b1110_0011_0000_1000]);
        assert_eq!(program.source_lines, vec!["@7", "M=D"]);
    }

    #[test]
    fn test_parse_hack_rejects_bad_width() {
        let err = Program::parse_hack("0101\n").unwrap_err();
        assert!(matches!(err, ProgramError::Decode { line: 1, .. }));
        let err = Program::parse_hack("0000000000000000\n000000000000000x\n").unwrap_err();
        assert!(matches!(err, ProgramError::Decode { line: 2, .. }));
    }

    #[test]
    fn test_save_and_load_file() {
        let program = assemble("@5\nD=A\n@0\nM=D").unwrap();
        let path = std::env::temp_dir().join(format!("hack-emu-test-{}.hack", std::process::id()));

        save_hack(&path, &program).unwrap();
        let loaded = load_program(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.instructions, program.instructions);
        assert_eq!(loaded.source_lines, vec!["@5", "D=A", "@0", "M=D"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program("/nonexistent/prog.asm").unwrap_err();
        assert!(matches!(err, ProgramError::Io(_)));
    }
}
