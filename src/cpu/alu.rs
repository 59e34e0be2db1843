//! 16-bit ALU for the Hack CPU.
//!
//! All arithmetic is carried out in `i32` and then reduced to 16-bit two's
//! complement with [`wrap16`] before the result is stored or compared.

/// Reduce an integer to the 16-bit two's-complement range -32768..=32767.
///
/// Keeps the low 16 bits and reinterprets values >= 0x8000 as negative.
#[inline]
pub fn wrap16(value: i32) -> i16 {
    let low = value & 0xFFFF;
    if low >= 0x8000 {
        (low - 0x10000) as i16
    } else {
        low as i16
    }
}

/// Evaluate a 6-bit computation code.
///
/// `operand` is A or RAM[A], depending on the instruction's `a` bit.
/// Codes outside the 18 defined patterns evaluate to 0.
pub fn compute(comp: u8, d: i16, operand: i16) -> i16 {
    let d = d as i32;
    let x = operand as i32;
    let result = match comp & 0x3F {
        0b101010 => 0,
        0b111111 => 1,
        0b111010 => -1,
        0b001100 => d,
        0b110000 => x,
        0b001101 => !d,
        0b110001 => !x,
        0b001111 => -d,
        0b110011 => -x,
        0b011111 => d + 1,
        0b110111 => x + 1,
        0b001110 => d - 1,
        0b110010 => x - 1,
        0b000010 => d + x,
        0b010011 => d - x,
        0b000111 => x - d,
        0b000000 => d & x,
        0b010101 => d | x,
        _ => 0,
    };
    wrap16(result)
}

/// Whether a 6-bit code is one of the defined computations.
pub fn is_defined(comp: u8) -> bool {
    matches!(
        comp & 0x3F,
        0b101010
            | 0b111111
            | 0b111010
            | 0b001100
            | 0b110000
            | 0b001101
            | 0b110001
            | 0b001111
            | 0b110011
            | 0b011111
            | 0b110111
            | 0b001110
            | 0b110010
            | 0b000010
            | 0b010011
            | 0b000111
            | 0b000000
            | 0b010101
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap16_boundaries() {
        assert_eq!(wrap16(32767), 32767);
        assert_eq!(wrap16(32768), -32768);
        assert_eq!(wrap16(-32769), 32767);
        assert_eq!(wrap16(65535), -1);
        assert_eq!(wrap16(65536), 0);
        assert_eq!(wrap16(-1), -1);
    }

    #[test]
    fn test_compute_overflow_wraps() {
        assert_eq!(compute(0b000010, 32767, 1), -32768);
        assert_eq!(compute(0b010011, -32768, 1), 32767);
        assert_eq!(compute(0b001111, -32768, 0), -32768);
        assert_eq!(compute(0b011111, 32767, 0), -32768);
    }

    #[test]
    fn test_compute_table() {
        let (d, x) = (12, 5);
        assert_eq!(compute(0b101010, d, x), 0);
        assert_eq!(compute(0b111111, d, x), 1);
        assert_eq!(compute(0b111010, d, x), -1);
        assert_eq!(compute(0b001100, d, x), 12);
        assert_eq!(compute(0b110000, d, x), 5);
        assert_eq!(compute(0b001101, d, x), -13);
        assert_eq!(compute(0b110001, d, x), -6);
        assert_eq!(compute(0b001111, d, x), -12);
        assert_eq!(compute(0b110011, d, x), -5);
        assert_eq!(compute(0b011111, d, x), 13);
        assert_eq!(compute(0b110111, d, x), 6);
        assert_eq!(compute(0b001110, d, x), 11);
        assert_eq!(compute(0b110010, d, x), 4);
        assert_eq!(compute(0b000010, d, x), 17);
        assert_eq!(compute(0b010011, d, x), 7);
        assert_eq!(compute(0b000111, d, x), -7);
        assert_eq!(compute(0b000000, d, x), 4);
        assert_eq!(compute(0b010101, d, x), 13);
    }

    #[test]
    fn test_undefined_code_is_zero() {
        assert!(!is_defined(0b111110));
        assert_eq!(compute(0b111110, 100, 200), 0);
        assert_eq!(compute(0b100000, -7, 3), 0);
    }

    proptest! {
        #[test]
        fn prop_wrap16_idempotent(value in any::<i32>()) {
            let once = wrap16(value);
            prop_assert_eq!(wrap16(once as i32), once);
        }

        #[test]
        fn prop_wrap16_identity_in_range(value in any::<i16>()) {
            prop_assert_eq!(wrap16(value as i32), value);
        }

        #[test]
        fn prop_wrap16_matches_wrapping_cast(value in any::<i32>()) {
            prop_assert_eq!(wrap16(value), value as i16);
        }

        #[test]
        fn prop_add_matches_wrapping_add(d in any::<i16>(), x in any::<i16>()) {
            prop_assert_eq!(compute(0b000010, d, x), d.wrapping_add(x));
            prop_assert_eq!(compute(0b010011, d, x), d.wrapping_sub(x));
        }
    }
}
