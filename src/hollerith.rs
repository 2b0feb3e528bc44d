//! The Hollerith (BCD) character encoding used by the IBM 7094 that the
//! original ELIZA ran on.
//!
//! ELIZA's MEMORY rule selection depends on a hash of the last word of a
//! sentence, computed the way the 1966 SLIP implementation computed it: by
//! packing the word into a 36-bit machine word using the 7094's 6-bit BCD
//! character codes, then taking the middle bits of that word squared. To
//! reproduce the hash faithfully we have to reproduce the encoding it was
//! built on.

/// Index `i` of this table gives the character held by 6-bit BCD code `i`,
/// or `None` if that code point is unused. Derived from the BCD/Hollerith
/// table in Sherman's "Programming and Coding the IBM 709-7090-7094
/// Computers" (1963), p.62, with BCD code 014 corrected to a prime
/// (apostrophe) rather than a double quote.
const BCD_TO_CHAR: [Option<char>; 64] = [
    Some('0'), Some('1'), Some('2'), Some('3'), Some('4'), Some('5'), Some('6'), Some('7'),
    Some('8'), Some('9'), None, Some('='), Some('\''), None, None, None,
    Some('+'), Some('A'), Some('B'), Some('C'), Some('D'), Some('E'), Some('F'), Some('G'),
    Some('H'), Some('I'), None, Some('.'), Some(')'), None, None, None,
    Some('-'), Some('J'), Some('K'), Some('L'), Some('M'), Some('N'), Some('O'), Some('P'),
    Some('Q'), Some('R'), None, Some('$'), Some('*'), None, None, None,
    Some(' '), Some('/'), Some('S'), Some('T'), Some('U'), Some('V'), Some('W'), Some('X'),
    Some('Y'), Some('Z'), None, Some(','), Some('('), None, None, None,
];

/// The non-Hollerith replacement character used by the character filter.
pub const REPLACEMENT: char = '-';

fn bcd_code(c: char) -> Option<u32> {
    BCD_TO_CHAR.iter().position(|&slot| slot == Some(c)).map(|i| i as u32)
}

/// True if `c` has a defined Hollerith/BCD code.
pub fn is_defined(c: char) -> bool {
    bcd_code(c).is_some()
}

const QUOTE_CODEPOINTS: [u32; 14] = [
    0x2018, 0x2019, 0x0022, 0x0060, 0x00AB, 0x00BB, 0x201A, 0x201B, 0x201C, 0x201D, 0x201E,
    0x201F, 0x2039, 0x203A,
];

/// Filters arbitrary text down to the 48-character Hollerith alphabet.
///
/// Quotation-mark variants become an apostrophe, non-ASCII code points
/// become a dash, `?`/`!` become a full stop, and everything else is
/// uppercased and kept if it is in the Hollerith alphabet, or replaced
/// with a dash if it is not.
pub fn filter(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let code = ch as u32;
        if QUOTE_CODEPOINTS.contains(&code) {
            out.push('\'');
            continue;
        }
        if code > 127 {
            out.push(REPLACEMENT);
            continue;
        }
        if ch == '?' || ch == '!' {
            out.push('.');
            continue;
        }
        let upper = ch.to_ascii_uppercase();
        if is_defined(upper) {
            out.push(upper);
        } else {
            out.push(REPLACEMENT);
        }
    }
    out
}

/// Packs the last chunk (at most six characters) of `word` into a 36-bit
/// value, six bits per character, most-significant character first,
/// right-padded with spaces. Mirrors how a SLIP cell's datum word held a
/// string fragment on the 7094: full 6-character chunks for everything but
/// the tail of a long word.
pub fn last_chunk_as_bcd(word: &str) -> u64 {
    let chars: Vec<char> = word.chars().collect();
    let start = if chars.is_empty() { 0 } else { ((chars.len() - 1) / 6) * 6 };
    let mut result: u64 = 0;
    let mut count = 0;
    for &c in &chars[start..] {
        result = (result << 6) | u64::from(bcd_code(c).unwrap_or(0));
        count += 1;
    }
    while count < 6 {
        result = (result << 6) | u64::from(bcd_code(' ').unwrap());
        count += 1;
    }
    result
}

/// The IBM 7094 mid-square SLIP hash: square the low 35 bits of `d`
/// (the 7094 is sign-magnitude, so the top bit of a 36-bit word is a sign
/// and is excluded from the magnitude) and take the middle `n` bits of the
/// 70-bit product.
pub fn hash(d: u64, n: u32) -> u64 {
    assert!(n <= 15);
    let magnitude = d & 0x7_FFFF_FFFF;
    let squared = magnitude.wrapping_mul(magnitude);
    (squared >> (35 - n / 2)) & ((1u64 << n) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_chunk_of_empty_string_is_six_spaces() {
        assert_eq!(last_chunk_as_bcd(""), 0o606060606060);
    }

    #[test]
    fn last_chunk_of_single_char() {
        assert_eq!(last_chunk_as_bcd("X"), 0o676060606060);
    }

    #[test]
    fn last_chunk_of_here() {
        assert_eq!(last_chunk_as_bcd("HERE"), 0o302551256060);
    }

    #[test]
    fn last_chunk_of_always() {
        assert_eq!(last_chunk_as_bcd("ALWAYS"), 0o214366217062);
    }

    #[test]
    fn hash_of_always_chunk() {
        assert_eq!(hash(0o214366217062, 7), 14);
    }

    #[test]
    fn hash_of_here_chunk() {
        assert_eq!(hash(0o302551256060, 2), 3);
    }

    #[test]
    fn hash_edges() {
        assert_eq!(hash(0, 7), 0);
        assert_eq!(hash(0o777777777777, 7), 0x70);
    }

    #[test]
    fn filter_maps_quotes_and_non_ascii() {
        assert_eq!(filter("\u{2018}hi\u{2019}"), "'HI'");
        assert_eq!(filter("caf\u{e9}"), "CAF-");
        assert_eq!(filter("what?!"), "WHAT..");
    }

    #[test]
    fn filter_keeps_hollerith_alphabet() {
        assert_eq!(filter("Men are all alike."), "MEN ARE ALL ALIKE.");
    }
}
