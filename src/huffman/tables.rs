//! RFC 1951 alphabet constants and precomputed lookup tables (§4.3).
//!
//! The extra-bits tables, base-value tables, and the bl-order permutation are
//! fixed by the format; `length_code`/`dist_code` and the two static trees are
//! derived from them once, the same way the teacher precomputes its hash
//! tables and copy-primitive constants rather than hand-deriving values
//! per-call.

use std::sync::OnceLock;

/// Longest Huffman code this format allows for a literal/length or distance
/// tree.
pub const MAX_BITS: usize = 15;
/// Longest Huffman code allowed for the bit-length (meta) tree.
pub const MAX_BL_BITS: usize = 7;

pub const LENGTH_CODES: usize = 29;
pub const LITERALS: usize = 256;
/// Literal/length alphabet size: 256 literal bytes + end-of-block + 29 length
/// codes.
pub const L_CODES: usize = LITERALS + 1 + LENGTH_CODES;
pub const D_CODES: usize = 30;
pub const BL_CODES: usize = 19;

pub const END_BLOCK: usize = 256;
pub const REP_3_6: usize = 16;
pub const REPZ_3_10: usize = 17;
pub const REPZ_11_138: usize = 18;

pub const MIN_MATCH: usize = 3;
pub const MAX_MATCH: usize = 258;

/// Largest working-array size needed by [`crate::huffman::build_tree`] across
/// all three alphabets this crate ever builds trees over (286, 30, 19).
pub const MAX_HEAP: usize = 2 * L_CODES + 1;

pub const EXTRA_LBITS: [u8; LENGTH_CODES] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

pub const EXTRA_DBITS: [u8; D_CODES] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Codes 0–15 carry a literal code length (no extra bits); 16 repeats the
/// previous length (2 extra bits), 17/18 run-length zero lengths (3/7 extra
/// bits).
pub const EXTRA_BLBITS: [u8; BL_CODES] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7,
];

/// Transmission order of the 19 bit-length codes (§4.3, "Emit").
pub const BL_ORDER: [u8; BL_CODES] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

pub const BASE_LENGTH: [u16; LENGTH_CODES] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 28, 32, 40, 48, 56, 64, 80, 96, 112, 128,
    160, 192, 224, 0,
];

pub const BASE_DIST: [u16; D_CODES] = [
    0, 1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64, 96, 128, 192, 256, 384, 512, 768, 1024, 1536,
    2048, 3072, 4096, 6144, 8192, 12288, 16384, 24576,
];

fn length_code_table() -> &'static [u8; 256] {
    static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u8; 256];
        let mut length = 0usize;
        let mut code = 0usize;
        while code < LENGTH_CODES - 1 {
            let n = 1usize << EXTRA_LBITS[code];
            let mut i = 0;
            while i < n {
                table[length] = code as u8;
                length += 1;
                i += 1;
            }
            code += 1;
        }
        debug_assert_eq!(length, 256);
        // Length 258 (l = 255) can be represented as code 284 + 5 extra bits
        // or code 285 with none; prefer the latter.
        table[length - 1] = code as u8;
        table
    })
}

fn dist_code_table() -> &'static [u8; 512] {
    static TABLE: OnceLock<[u8; 512]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u8; 512];
        let mut dist = 0usize;
        let mut code = 0usize;
        while code < 16 {
            let n = 1usize << EXTRA_DBITS[code];
            let mut i = 0;
            while i < n {
                table[dist] = code as u8;
                dist += 1;
                i += 1;
            }
            code += 1;
        }
        debug_assert_eq!(dist, 256);
        dist >>= 7;
        while code < D_CODES {
            let n = 1usize << (EXTRA_DBITS[code] as usize - 7);
            let mut i = 0;
            while i < n {
                table[256 + dist] = code as u8;
                dist += 1;
                i += 1;
            }
            code += 1;
        }
        table
    })
}

/// Map a match length (`MIN_MATCH..=MAX_MATCH`) to its length code
/// (`0..LENGTH_CODES`).
pub fn length_code(len: usize) -> u8 {
    debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&len));
    length_code_table()[len - MIN_MATCH]
}

/// Map a back-reference distance (`1..=32768`) to its distance code
/// (`0..D_CODES`).
pub fn dist_code(dist: usize) -> u8 {
    debug_assert!((1..=32768).contains(&dist));
    let d = dist - 1;
    let table = dist_code_table();
    if d < 256 {
        table[d]
    } else {
        table[256 + (d >> 7)]
    }
}

/// Code lengths for the fixed (static) literal/length tree, 288 entries per
/// RFC 1951 §3.2.6 (the two trailing entries, codes 286/287, are unused but
/// present so the alphabet size is a round number).
pub const fn static_ltree_lengths() -> [u8; 288] {
    let mut lens = [0u8; 288];
    let mut n = 0;
    while n < 144 {
        lens[n] = 8;
        n += 1;
    }
    while n < 256 {
        lens[n] = 9;
        n += 1;
    }
    while n < 280 {
        lens[n] = 7;
        n += 1;
    }
    while n < 288 {
        lens[n] = 8;
        n += 1;
    }
    lens
}

/// Code lengths for the fixed (static) distance tree. RFC 1951 only defines
/// 30 distance codes, but a canonical Huffman code needs its bit-length
/// counts to fill the code space exactly; 30 length-5 codes leave two 5-bit
/// slots unclaimed, which `build_table` rejects as incomplete. zlib's fixed
/// table papers over this with two extra length-5 "codes" (30/31) that are
/// never legal distance symbols; this does the same.
pub const fn static_dtree_lengths() -> [u8; 32] {
    [5; 32]
}
