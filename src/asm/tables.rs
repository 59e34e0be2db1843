//! Encoding tables for the Hack instruction set.
//!
//! A compute instruction is laid out as `111a cccc ccdd djjj`:
//! - `a`: operand select (0 = A register, 1 = RAM[A])
//! - `cccccc`: ALU computation
//! - `ddd`: destination mask (A, D, M)
//! - `jjj`: jump condition

/// Computation mnemonics and their 7-bit `a cccccc` encodings.
///
/// Commutative forms are listed as aliases and share an encoding. The first
/// entry for a given pattern is its canonical spelling for disassembly.
pub const COMP_TABLE: &[(&str, u8)] = &[
    ("0", 0b0_101010),
    ("1", 0b0_111111),
    ("-1", 0b0_111010),
    ("D", 0b0_001100),
    ("A", 0b0_110000),
    ("M", 0b1_110000),
    ("!D", 0b0_001101),
    ("!A", 0b0_110001),
    ("!M", 0b1_110001),
    ("-D", 0b0_001111),
    ("-A", 0b0_110011),
    ("-M", 0b1_110011),
    ("D+1", 0b0_011111),
    ("A+1", 0b0_110111),
    ("M+1", 0b1_110111),
    ("D-1", 0b0_001110),
    ("A-1", 0b0_110010),
    ("M-1", 0b1_110010),
    ("D+A", 0b0_000010),
    ("A+D", 0b0_000010),
    ("D+M", 0b1_000010),
    ("M+D", 0b1_000010),
    ("D-A", 0b0_010011),
    ("D-M", 0b1_010011),
    ("A-D", 0b0_000111),
    ("M-D", 0b1_000111),
    ("D&A", 0b0_000000),
    ("A&D", 0b0_000000),
    ("D&M", 0b1_000000),
    ("M&D", 0b1_000000),
    ("D|A", 0b0_010101),
    ("A|D", 0b0_010101),
    ("D|M", 0b1_010101),
    ("M|D", 0b1_010101),
];

/// Jump mnemonics and their 3-bit encodings. The empty mnemonic is "no jump".
pub const JUMP_TABLE: &[(&str, u8)] = &[
    ("", 0b000),
    ("JGT", 0b001),
    ("JEQ", 0b010),
    ("JGE", 0b011),
    ("JLT", 0b100),
    ("JNE", 0b101),
    ("JLE", 0b110),
    ("JMP", 0b111),
];

/// Destination bits, most significant first.
pub const DEST_A: u8 = 0b100;
pub const DEST_D: u8 = 0b010;
pub const DEST_M: u8 = 0b001;

/// Named platform addresses. `R0`..`R15` are added by [`predefined_symbols`].
pub const PLATFORM_SYMBOLS: &[(&str, u16)] = &[
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("SCREEN", 16384),
    ("KBD", 24576),
];

/// First RAM address handed out to assembly-time variables.
pub const VARIABLE_BASE: u16 = 16;

/// Largest address an address instruction can load (15 bits).
pub const MAX_ADDRESS: u16 = 0x7FFF;

/// Look up the 7-bit encoding of a computation mnemonic.
pub fn comp_bits(mnemonic: &str) -> Option<u8> {
    COMP_TABLE
        .iter()
        .find(|(name, _)| *name == mnemonic)
        .map(|&(_, bits)| bits)
}

/// Canonical mnemonic for a 7-bit computation encoding.
pub fn comp_mnemonic(bits: u8) -> Option<&'static str> {
    COMP_TABLE
        .iter()
        .find(|&&(_, b)| b == bits)
        .map(|&(name, _)| name)
}

/// Look up the 3-bit encoding of a jump mnemonic.
pub fn jump_bits(mnemonic: &str) -> Option<u8> {
    JUMP_TABLE
        .iter()
        .find(|(name, _)| *name == mnemonic)
        .map(|&(_, bits)| bits)
}

/// Mnemonic for a 3-bit jump encoding.
pub fn jump_mnemonic(bits: u8) -> &'static str {
    JUMP_TABLE
        .iter()
        .find(|&&(_, b)| b == bits & 0b111)
        .map(|&(name, _)| name)
        .unwrap_or("")
}

/// Encode a destination field as a 3-bit mask.
///
/// Each of `A`, `D`, `M` sets its own bit; order and repetition do not
/// matter. Returns the first unrecognized character on failure.
pub fn dest_bits(field: &str) -> Result<u8, char> {
    field.chars().try_fold(0u8, |bits, ch| match ch {
        'A' => Ok(bits | DEST_A),
        'D' => Ok(bits | DEST_D),
        'M' => Ok(bits | DEST_M),
        other => Err(other),
    })
}

/// Render a destination mask in the conventional `AMD` order.
pub fn dest_mnemonic(bits: u8) -> String {
    let mut out = String::new();
    if bits & DEST_A != 0 {
        out.push('A');
    }
    if bits & DEST_M != 0 {
        out.push('M');
    }
    if bits & DEST_D != 0 {
        out.push('D');
    }
    out
}

/// Every predefined symbol: `R0`..`R15` followed by the platform addresses.
pub fn predefined_symbols() -> impl Iterator<Item = (String, u16)> {
    (0..16u16)
        .map(|i| (format!("R{}", i), i))
        .chain(PLATFORM_SYMBOLS.iter().map(|&(name, addr)| (name.to_string(), addr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commutative_aliases() {
        let pairs = [
            ("D+A", "A+D"),
            ("D&A", "A&D"),
            ("D|A", "A|D"),
            ("D+M", "M+D"),
            ("D&M", "M&D"),
            ("D|M", "M|D"),
        ];
        for (left, right) in pairs {
            assert_eq!(comp_bits(left), comp_bits(right), "{} vs {}", left, right);
            assert!(comp_bits(left).is_some());
        }
    }

    #[test]
    fn test_canonical_mnemonic_is_first_entry() {
        assert_eq!(comp_mnemonic(0b0_000010), Some("D+A"));
        assert_eq!(comp_mnemonic(0b1_010101), Some("D|M"));
        assert_eq!(comp_mnemonic(0b0_111110), None);
    }

    #[test]
    fn test_dest_bits() {
        assert_eq!(dest_bits(""), Ok(0));
        assert_eq!(dest_bits("M"), Ok(0b001));
        assert_eq!(dest_bits("AMD"), Ok(0b111));
        assert_eq!(dest_bits("MDA"), Ok(0b111));
        assert_eq!(dest_bits("DD"), Ok(0b010));
        assert_eq!(dest_bits("AX"), Err('X'));
        assert_eq!(dest_mnemonic(0b101), "AM");
        assert_eq!(dest_mnemonic(0b011), "MD");
    }

    #[test]
    fn test_jump_table() {
        assert_eq!(jump_bits(""), Some(0));
        assert_eq!(jump_bits("JLE"), Some(0b110));
        assert_eq!(jump_bits("JXX"), None);
        assert_eq!(jump_mnemonic(0b111), "JMP");
    }

    #[test]
    fn test_predefined_symbols() {
        let symbols: Vec<_> = predefined_symbols().collect();
        assert_eq!(symbols.len(), 23);
        assert!(symbols.contains(&("R15".to_string(), 15)));
        assert!(symbols.contains(&("KBD".to_string(), 24576)));
    }
}
