//! L6 — canonical Huffman decode-table builder (§4.6 "Table builder").
//!
//! Builds a 1- or 2-level lookup table from a received code-length sequence,
//! the decode-side counterpart to [`crate::huffman::build_tree`]. Root-level
//! entries are indexed directly by the low `root_bits` bits of the bit
//! stream (9 for the combined literal/length alphabet, 6 for distances, per
//! §4.6); any code longer than `root_bits` is represented by a single `Sub`
//! entry at the root whose `value` is the arena offset of a second-level
//! sub-table sized to exactly the codes sharing that root-bits prefix. This
//! keeps the representation a flat arena with embedded offsets rather than a
//! pointer graph (§9, "Two-level code tables → flat arena with embedded
//! offsets").
//!
//! Every working array here is a fixed-size stack buffer, not a heap
//! collection — table construction runs on the same per-block cadence as the
//! rest of the inflate engine and must not allocate (§1, "no runtime
//! allocator is consulted after initialization").
//!
//! Symbols are grouped into a plain enum rather than a bit-packed `op` byte:
//! nothing here crosses an FFI boundary, so there is no reason to hand-roll
//! the C union zlib's `code` struct uses.

use crate::error::InflateError;
use crate::huffman::assign_canonical_codes;
use crate::huffman::tables::MAX_BITS;

/// Largest alphabet this builder is ever asked to build a table over
/// (the combined literal/length alphabet, 286 used symbols of 288 slots).
const MAX_SYMS: usize = 288;
/// Largest root table this builder ever produces (`2^9` for literal/length).
const MAX_ROOT: usize = 512;

/// What a decoded symbol means once its code has been read (§4.6, "packed
/// `(op, bits, val)` triple").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    /// Slot never reached by any valid code of this table (over-subscribed
    /// or unused symbol) — a data error if decoded.
    #[default]
    Invalid,
    /// `value` is the literal byte.
    Literal,
    /// End-of-block marker (literal/length table only).
    EndOfBlock,
    /// `value` is the length base; `extra` more bits follow, added to it.
    Length,
    /// `value` is the distance base; `extra` more bits follow, added to it.
    Distance,
    /// Root-level indirection: `value` is the arena index the second-level
    /// sub-table starts at, `bits` is that sub-table's index width.
    Sub,
    /// `value` is the raw alphabet symbol itself (the bit-length meta-tree,
    /// whose 19 symbols are interpreted by the caller, not by this table).
    Raw,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeEntry {
    pub op: Op,
    /// Bits this entry consumes directly from the stream (the root table's
    /// `root_bits`, or a sub-table's own width for entries reached through
    /// a `Sub` indirection).
    pub bits: u8,
    /// Extra bits to read and add to `value` after decoding (`Length` /
    /// `Distance` only).
    pub extra: u8,
    pub value: u16,
}

/// Which alphabet a table decodes — controls how a decoded symbol index maps
/// to an [`Op`] (§4.6, combined literal/length table vs. pure distance
/// table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// Symbols `0..256` are literals, `256` is end-of-block, `257..` are
    /// length codes (base/extra from [`crate::huffman::tables::BASE_LENGTH`]
    /// / `EXTRA_LBITS`).
    LitLen,
    /// Every symbol is a distance code (base/extra from `BASE_DIST` /
    /// `EXTRA_DBITS`).
    Dist,
    /// The 19-symbol bit-length meta-tree used to transmit the literal/length
    /// and distance trees' own code lengths (§4.3 "Emit", §4.6 "Dynamic table
    /// build").
    BitLen,
}

fn symbol_op(alphabet: Alphabet, sym: usize) -> (Op, u8, u16) {
    use crate::huffman::tables::{BASE_DIST, BASE_LENGTH, D_CODES, EXTRA_DBITS, EXTRA_LBITS, LENGTH_CODES};
    match alphabet {
        Alphabet::LitLen => {
            if sym < 256 {
                (Op::Literal, 0, sym as u16)
            } else if sym == 256 {
                (Op::EndOfBlock, 0, 0)
            } else {
                let lc = sym - 257;
                if lc >= LENGTH_CODES {
                    // Symbols 286/287: present in the fixed tree's 288-entry
                    // length assignment to round out the alphabet, but not
                    // legal length codes (RFC 1951 only defines 257..285).
                    (Op::Invalid, 0, 0)
                } else {
                    (Op::Length, EXTRA_LBITS[lc], BASE_LENGTH[lc])
                }
            }
        }
        Alphabet::Dist => {
            if sym >= D_CODES {
                // Symbols 30/31: padding so the fixed distance tree's 5-bit
                // code space is complete, never legal distance codes.
                (Op::Invalid, 0, 0)
            } else {
                (Op::Distance, EXTRA_DBITS[sym], BASE_DIST[sym])
            }
        }
        Alphabet::BitLen => (Op::Raw, 0, sym as u16),
    }
}

/// A built table: the root table's width, plus the total entries used across
/// the root table and every sub-table (for sizing checks against the
/// caller's arena).
#[derive(Debug, Clone, Copy)]
pub struct TableInfo {
    pub root_bits: u32,
    pub used: usize,
}

fn invalid_entry(bits: u8) -> CodeEntry {
    CodeEntry {
        op: Op::Invalid,
        bits,
        extra: 0,
        value: 0,
    }
}

/// Build a decode table for `lens[sym] = code length of sym` (0 = unused)
/// into `arena`, starting at index 0. `max_root_bits` bounds the root
/// table's width (9 for literal/length, 6 for distance, per §4.6); the
/// actual root width is `min(max_root_bits, longest code length)`.
///
/// Mirrors RFC 1951's allowance for an under-subscribed code only when
/// exactly one symbol is present (a block with a single distance code):
/// such a table still decodes that one symbol using `root_bits = 1`, the
/// second slot marked `Invalid`.
pub fn build_table(
    lens: &[u8],
    alphabet: Alphabet,
    max_root_bits: u32,
    arena: &mut [CodeEntry],
) -> Result<TableInfo, InflateError> {
    debug_assert!(lens.len() <= MAX_SYMS);

    let mut count = [0u32; MAX_BITS + 1];
    for &l in lens {
        count[l as usize] += 1;
    }

    let max_len = (1..=MAX_BITS).rev().find(|&l| count[l] != 0);
    let Some(max_len) = max_len else {
        arena[0] = invalid_entry(1);
        arena[1] = invalid_entry(1);
        return Ok(TableInfo { root_bits: 1, used: 2 });
    };

    let used_syms: u32 = count[1..=MAX_BITS].iter().sum();
    let mut left: i64 = 1;
    for len in 1..=max_len {
        left = left * 2 - count[len] as i64;
        if left < 0 {
            return Err(InflateError::DataError("over-subscribed huffman code"));
        }
    }
    if left > 0 && used_syms != 1 {
        return Err(InflateError::DataError("incomplete huffman code"));
    }

    let mut codes = [0u16; MAX_SYMS];
    assign_canonical_codes(lens, &mut codes[..lens.len()]);

    let root_bits = max_root_bits.min(max_len as u32).max(1);
    let root_size = 1usize << root_bits;
    if arena.len() < root_size {
        return Err(InflateError::MemError);
    }
    for e in arena[..root_size].iter_mut() {
        *e = invalid_entry(root_bits as u8);
    }

    // Pass 1: fill every symbol whose code fits entirely within the root
    // table, and record (without allocating) the widest overflow any root
    // prefix needs, keyed by that prefix.
    let mut prefix_sub_bits = [0u8; MAX_ROOT];
    for (sym, &l) in lens.iter().enumerate() {
        if l == 0 {
            continue;
        }
        let code = codes[sym] as usize;
        if (l as u32) <= root_bits {
            let (op, extra, value) = symbol_op(alphabet, sym);
            let stride = 1usize << l;
            let mut v = code;
            while v < root_size {
                arena[v] = CodeEntry { op, bits: l, extra, value };
                v += stride;
            }
        } else {
            let prefix = code & (root_size - 1);
            let sub_bits = l as u32 - root_bits;
            if sub_bits > prefix_sub_bits[prefix] as u32 {
                prefix_sub_bits[prefix] = sub_bits as u8;
            }
        }
    }

    // Pass 2: lay out one sub-table per overflowing prefix, in prefix order,
    // each sized to the widest code that prefix needs.
    let mut sub_table_start = [0u16; MAX_ROOT];
    let mut next_free = root_size;
    for prefix in 0..root_size {
        let sub_bits = prefix_sub_bits[prefix];
        if sub_bits == 0 {
            continue;
        }
        let sub_size = 1usize << sub_bits;
        if next_free + sub_size > arena.len() {
            return Err(InflateError::MemError);
        }
        for e in arena[next_free..next_free + sub_size].iter_mut() {
            *e = invalid_entry(sub_bits);
        }
        arena[prefix] = CodeEntry {
            op: Op::Sub,
            bits: sub_bits,
            extra: 0,
            value: next_free as u16,
        };
        sub_table_start[prefix] = next_free as u16;
        next_free += sub_size;
    }

    // Pass 3: place every overflowing symbol into its sub-table.
    for (sym, &l) in lens.iter().enumerate() {
        if l == 0 || (l as u32) <= root_bits {
            continue;
        }
        let code = codes[sym] as usize;
        let prefix = code & (root_size - 1);
        let sub_bits = prefix_sub_bits[prefix] as u32;
        let start = sub_table_start[prefix] as usize;
        let sub_len = l as u32 - root_bits;
        let (op, extra, value) = symbol_op(alphabet, sym);
        let stride = 1usize << sub_len;
        let mut v = code >> root_bits;
        let sub_size = 1usize << sub_bits;
        while v < sub_size {
            arena[start + v] = CodeEntry { op, bits: sub_len as u8, extra, value };
            v += stride;
        }
    }

    Ok(TableInfo {
        root_bits,
        used: next_free,
    })
}

/// The fixed (static) literal/length and distance decode tables (§4.6,
/// built once from RFC 1951's fixed code-length assignment, shared with the
/// encode side's [`crate::huffman::static_ltree`] / `static_dtree`). Neither
/// fixed tree's longest code exceeds its root width (9 bits litlen, 5 bits
/// dist), so these tables never need a second level.
pub struct FixedTables {
    pub litlen: [CodeEntry; 512],
    pub litlen_root_bits: u32,
    pub dist: [CodeEntry; 64],
    pub dist_root_bits: u32,
}

pub fn fixed_tables() -> &'static FixedTables {
    use std::sync::OnceLock;
    static TABLES: OnceLock<FixedTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let ll_lens = crate::huffman::tables::static_ltree_lengths();
        let mut litlen = [CodeEntry::default(); 512];
        let info = build_table(&ll_lens, Alphabet::LitLen, 9, &mut litlen).expect("fixed litlen table");
        debug_assert_eq!(info.root_bits, 9);

        let d_lens = crate::huffman::tables::static_dtree_lengths();
        let mut dist = [CodeEntry::default(); 64];
        let dinfo = build_table(&d_lens, Alphabet::Dist, 6, &mut dist).expect("fixed dist table");

        FixedTables {
            litlen,
            litlen_root_bits: info.root_bits,
            dist,
            dist_root_bits: dinfo.root_bits,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fixed_tables_without_error() {
        let t = fixed_tables();
        assert_eq!(t.litlen_root_bits, 9);
        assert_eq!(t.dist_root_bits, 5);
    }

    #[test]
    fn single_symbol_table_decodes_via_root() {
        let mut lens = [0u8; 2];
        lens[0] = 1;
        let mut arena = [CodeEntry::default(); 8];
        let info = build_table(&lens, Alphabet::Dist, 6, &mut arena).unwrap();
        assert_eq!(info.root_bits, 1);
        assert_eq!(arena[0].op, Op::Distance);
    }

    #[test]
    fn rejects_over_subscribed_code() {
        let lens = [1u8, 1, 1]; // three 1-bit codes cannot coexist
        let mut arena = [CodeEntry::default(); 8];
        assert!(build_table(&lens, Alphabet::Dist, 6, &mut arena).is_err());
    }

    #[test]
    fn two_level_table_handles_long_codes() {
        // lengths chosen so some codes exceed a 2-bit root table.
        let lens = [1u8, 2, 3, 3];
        let mut arena = [CodeEntry::default(); 32];
        let info = build_table(&lens, Alphabet::LitLen, 2, &mut arena).unwrap();
        assert_eq!(info.root_bits, 2);
        assert!(arena[..4].iter().any(|e| e.op == Op::Sub));
    }

    #[test]
    fn decoded_symbols_match_expected_values_for_all_codes() {
        // A small literal/length alphabet; verify every assigned code
        // decodes through the table to the right symbol.
        let mut lens = [0u8; 8];
        lens[0] = 2;
        lens[1] = 2;
        lens[2] = 2;
        lens[3] = 2;
        let mut arena = [CodeEntry::default(); 16];
        let info = build_table(&lens, Alphabet::LitLen, 4, &mut arena).unwrap();
        assert_eq!(info.root_bits, 2);
        let mut codes = [0u16; 8];
        assign_canonical_codes(&lens, &mut codes);
        for sym in 0..4 {
            let code = codes[sym] as usize;
            let entry = arena[code];
            assert_eq!(entry.op, Op::Literal);
            assert_eq!(entry.value as usize, sym);
        }
    }
}
