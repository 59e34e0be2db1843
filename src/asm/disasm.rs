//! Disassembler for Hack machine code.
//!
//! Converts instruction words back to readable assembly.

use crate::asm::tables::{comp_mnemonic, dest_mnemonic, jump_mnemonic};
use crate::cpu::decode::{decode, format_word, Instruction};

/// Disassemble a single instruction word to text.
pub fn disassemble_word(word: u16) -> String {
    format_instruction(&decode(word))
}

/// Disassemble a slice of instruction words.
pub fn disassemble(words: &[u16]) -> String {
    let mut output = String::new();
    output.push_str("// Hack Disassembly\n");
    output.push_str("// ----------------\n\n");

    for (addr, &word) in words.iter().enumerate() {
        let line = disassemble_word(word);
        output.push_str(&format!("{:05}: {:<16} // {}\n", addr, line, format_word(word)));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::Address(addr) => format!("@{}", addr),
        Instruction::Compute { a, comp, dest, jump } => {
            let bits = ((a as u8) << 6) | comp;
            let comp = comp_mnemonic(bits).unwrap_or("???");
            let dest = dest_mnemonic(dest.bits());
            let jump = jump_mnemonic(jump.bits());

            let mut text = String::new();
            if !dest.is_empty() {
                text.push_str(&dest);
                text.push('=');
            }
            text.push_str(comp);
            if !jump.is_empty() {
                text.push(';');
                text.push_str(jump);
            }
            text
        }
    }
}
