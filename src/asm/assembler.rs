//! Two-pass assembler for Hack programs.
//!
//! Syntax:
//! ```text
//! // Comment
//! (LOOP)          // Label: binds LOOP to the next instruction address
//!     @i          // Address instruction (symbol, variable or decimal literal)
//!     D=M         // Compute instruction: [DEST=]COMP[;JUMP]
//!     @LOOP
//!     D;JGT
//! ```

use crate::asm::program::Program;
use crate::asm::symbols::SymbolTable;
use crate::asm::tables::{self, MAX_ADDRESS};
use crate::cpu::decode::{encode, Dest, Instruction, Jump};
use thiserror::Error;

/// Assemble source code into a program with aligned source lines.
pub fn assemble(source: &str) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A cleaned, non-empty source line and where it came from.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    /// 1-based line number in the raw text.
    number: usize,
    text: &'a str,
}

/// The assembler state.
#[derive(Debug, Default)]
pub struct Assembler {
    /// Symbol table (predefined, labels, variables).
    symbols: SymbolTable,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
        }
    }

    /// Symbols bound by the last call to [`Assembler::assemble`].
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn assemble(&mut self, source: &str) -> Result<Program, AssemblerError> {
        self.symbols = SymbolTable::new();
        let lines = clean_lines(source);

        // Pass 1: bind labels to instruction positions
        self.collect_labels(&lines)?;

        // Pass 2: emit code, allocating variables on first use
        let mut program = Program::new();
        for line in &lines {
            if label_name(line)?.is_some() {
                continue;
            }
            let word = if let Some(symbol) = line.text.strip_prefix('@') {
                self.address_instruction(symbol, line.number)?
            } else {
                compute_instruction(line.text, line.number)?
            };
            program.push(word, line.text);
        }

        tracing::debug!(
            instructions = program.len(),
            symbols = self.symbols.len(),
            "assembly complete"
        );
        Ok(program)
    }

    fn collect_labels(&mut self, lines: &[SourceLine<'_>]) -> Result<(), AssemblerError> {
        let mut counter: usize = 0;
        for line in lines {
            match label_name(line)? {
                Some(label) => {
                    if counter > MAX_ADDRESS as usize {
                        return Err(AssemblerError::ProgramTooLarge { line: line.number });
                    }
                    if !self.symbols.define(label, counter as u16) {
                        return Err(AssemblerError::DuplicateSymbol {
                            line: line.number,
                            symbol: label.to_string(),
                        });
                    }
                }
                None => counter += 1,
            }
        }
        Ok(())
    }

    fn address_instruction(&mut self, symbol: &str, line: usize) -> Result<u16, AssemblerError> {
        if symbol.is_empty() {
            return Err(AssemblerError::MissingSymbol { line });
        }

        let addr = if symbol.bytes().all(|b| b.is_ascii_digit()) {
            match symbol.parse::<u32>() {
                Ok(value) if value <= MAX_ADDRESS as u32 => value as u16,
                _ => {
                    return Err(AssemblerError::AddressOutOfRange {
                        line,
                        value: symbol.to_string(),
                    })
                }
            }
        } else {
            validate_symbol(symbol, line)?;
            self.symbols
                .resolve_or_allocate(symbol)
                .ok_or(AssemblerError::VariableSpaceExhausted { line })?
        };

        Ok(encode(&Instruction::Address(addr)))
    }
}

/// Strip comments and surrounding whitespace, dropping blank lines.
fn clean_lines(source: &str) -> Vec<SourceLine<'_>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            (!text.is_empty()).then_some(SourceLine {
                number: idx + 1,
                text,
            })
        })
        .collect()
}

/// Return the label declared by this line, if it is a label line.
fn label_name<'a>(line: &SourceLine<'a>) -> Result<Option<&'a str>, AssemblerError> {
    let opens = line.text.starts_with('(');
    let closes = line.text.ends_with(')');
    match (opens, closes) {
        (false, false) => Ok(None),
        (true, true) => {
            let inner = &line.text[1..line.text.len() - 1];
            if inner.is_empty() {
                return Err(AssemblerError::EmptyLabel { line: line.number });
            }
            if inner.contains(['(', ')']) {
                return Err(AssemblerError::UnbalancedLabel {
                    line: line.number,
                    text: line.text.to_string(),
                });
            }
            validate_symbol(inner, line.number)?;
            Ok(Some(inner))
        }
        _ => Err(AssemblerError::UnbalancedLabel {
            line: line.number,
            text: line.text.to_string(),
        }),
    }
}

/// Symbols are `[A-Za-z_.$:][A-Za-z0-9_.$:]*`.
fn validate_symbol(symbol: &str, line: usize) -> Result<(), AssemblerError> {
    let is_symbol_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':');
    let starts_with_digit = symbol.starts_with(|c: char| c.is_ascii_digit());
    if symbol.is_empty() || starts_with_digit || !symbol.chars().all(is_symbol_char) {
        return Err(AssemblerError::InvalidSymbol {
            line,
            symbol: symbol.to_string(),
        });
    }
    Ok(())
}

/// Encode a `[DEST=]COMP[;JUMP]` line.
fn compute_instruction(text: &str, line: usize) -> Result<u16, AssemblerError> {
    let (dest_field, rest) = match text.split_once('=') {
        Some((dest, rest)) => (Some(dest), rest),
        None => (None, text),
    };
    let (comp_field, jump_field) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, jump),
        None => (rest, ""),
    };

    if comp_field.is_empty() {
        return Err(AssemblerError::MissingComputation { line });
    }
    let comp = tables::comp_bits(comp_field).ok_or_else(|| AssemblerError::UnknownComputation {
        line,
        comp: comp_field.to_string(),
    })?;

    let dest = match dest_field {
        None => 0,
        Some("") => {
            return Err(AssemblerError::InvalidDestination {
                line,
                dest: String::new(),
            })
        }
        Some(field) => tables::dest_bits(field).map_err(|_| AssemblerError::InvalidDestination {
            line,
            dest: field.to_string(),
        })?,
    };

    let jump = tables::jump_bits(jump_field).ok_or_else(|| AssemblerError::UnknownJump {
        line,
        jump: jump_field.to_string(),
    })?;

    Ok(encode(&Instruction::Compute {
        a: comp & 0b100_0000 != 0,
        comp: comp & 0b11_1111,
        dest: Dest::from_bits(dest),
        jump: Jump::from_bits(jump),
    }))
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("unknown computation on line {line}: '{comp}'")]
    UnknownComputation { line: usize, comp: String },

    #[error("missing computation on line {line}")]
    MissingComputation { line: usize },

    #[error("invalid destination on line {line}: '{dest}'")]
    InvalidDestination { line: usize, dest: String },

    #[error("unknown jump on line {line}: '{jump}'")]
    UnknownJump { line: usize, jump: String },

    #[error("unbalanced label parentheses on line {line}: {text}")]
    UnbalancedLabel { line: usize, text: String },

    #[error("empty label on line {line}")]
    EmptyLabel { line: usize },

    #[error("missing symbol after '@' on line {line}")]
    MissingSymbol { line: usize },

    #[error("invalid symbol on line {line}: {symbol}")]
    InvalidSymbol { line: usize, symbol: String },

    #[error("duplicate symbol on line {line}: {symbol}")]
    DuplicateSymbol { line: usize, symbol: String },

    #[error("address out of range on line {line}: {value} (max 32767)")]
    AddressOutOfRange { line: usize, value: String },

    #[error("no free variable addresses left on line {line}")]
    VariableSpaceExhausted { line: usize },

    #[error("label on line {line} lies beyond the addressable instruction range")]
    ProgramTooLarge { line: usize },
}
