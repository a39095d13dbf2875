//! L3 — Huffman tree construction, canonical code assignment, and bit-length
//! sequence emission (§4.3).
//!
//! `build_tree` ports the classic heap-based Huffman builder: a priority
//! queue over symbol indices (breaking frequency ties by depth, per the
//! "Build" contract), combined-node assembly, then bit-length assignment with
//! overflow redistribution (`gen_bitlen`) and canonical code assignment
//! (`gen_codes`). `build_tree` is shared by all three alphabets this crate
//! ever builds a tree over (286, 30, 19 symbols) via the `elems` parameter,
//! mirroring how the teacher's `hc::search` shares one insertion routine
//! across match-window sizes rather than specializing per size.

pub mod tables;

use crate::bitio::{BitWriter, PendingBuf};
use crate::error::HuffError;
use tables::{BL_ORDER, MAX_BITS, MAX_HEAP, REPZ_11_138, REPZ_3_10, REP_3_6};

const SMALLEST: usize = 1;

/// Result of [`build_tree`]: per-symbol code lengths and canonical codes for
/// symbols `0..=max_code`, plus the total bit cost of encoding with this tree
/// (used by the deflate engine to pick the cheapest of stored / static /
/// dynamic, per §4.5).
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub len: [u8; MAX_HEAP],
    pub code: [u16; MAX_HEAP],
    pub max_code: usize,
    pub opt_len_bits: u64,
}

impl BuiltTree {
    fn empty() -> Self {
        BuiltTree {
            len: [0; MAX_HEAP],
            code: [0; MAX_HEAP],
            max_code: 0,
            opt_len_bits: 0,
        }
    }
}

/// Reverse the low `len` bits of `code` (canonical codes are assigned
/// MSB-first by length but transmitted LSB-first).
pub(crate) fn bi_reverse(mut code: u32, len: u32) -> u32 {
    let mut res = 0u32;
    let mut n = len;
    loop {
        res |= code & 1;
        code >>= 1;
        res <<= 1;
        n -= 1;
        if n == 0 {
            break;
        }
    }
    res >> 1
}

/// Build a Huffman tree over `freq[0..elems]` (the "Build" contract).
///
/// `extra_bits[sym - extra_base]` gives the number of extra bits transmitted
/// after symbol `sym`'s code (0 for symbols below `extra_base`); `max_length`
/// is 15 for data trees, 7 for the bit-length tree.
pub fn build_tree(
    freq: &[u16],
    elems: usize,
    extra_bits: &[u8],
    extra_base: usize,
    max_length: usize,
) -> Result<BuiltTree, HuffError> {
    debug_assert!(elems + elems + 1 <= MAX_HEAP);

    let mut tree_freq = [0u32; MAX_HEAP];
    let mut dad = [0usize; MAX_HEAP];
    let mut depth = [0u8; MAX_HEAP];
    let mut len = [0u8; MAX_HEAP];
    tree_freq[..elems].iter_mut().zip(freq).for_each(|(t, &f)| *t = f as u32);

    let mut heap = [0usize; MAX_HEAP];
    let mut heap_len = 0usize;
    let mut heap_max = MAX_HEAP;
    let mut max_code: isize = -1;

    for n in 0..elems {
        if tree_freq[n] != 0 {
            heap_len += 1;
            heap[heap_len] = n;
            max_code = n as isize;
            depth[n] = 0;
        } else {
            len[n] = 0;
        }
    }

    // RFC 1951 requires at least two codes even for a degenerate
    // single-symbol or empty-input block, so the tree always has a root with
    // two children.
    while heap_len < 2 {
        let node = if max_code < 2 {
            max_code += 1;
            max_code as usize
        } else {
            0
        };
        heap_len += 1;
        heap[heap_len] = node;
        tree_freq[node] = 1;
        depth[node] = 0;
    }
    let max_code = max_code as usize;

    let smaller = |tree_freq: &[u32; MAX_HEAP], depth: &[u8; MAX_HEAP], n: usize, m: usize| {
        tree_freq[n] < tree_freq[m] || (tree_freq[n] == tree_freq[m] && depth[n] <= depth[m])
    };

    fn pqdownheap(
        heap: &mut [usize; MAX_HEAP],
        heap_len: usize,
        tree_freq: &[u32; MAX_HEAP],
        depth: &[u8; MAX_HEAP],
        smaller: &dyn Fn(&[u32; MAX_HEAP], &[u8; MAX_HEAP], usize, usize) -> bool,
        k0: usize,
    ) {
        let mut k = k0;
        let v = heap[k];
        let mut j = k << 1;
        while j <= heap_len {
            if j < heap_len && smaller(tree_freq, depth, heap[j + 1], heap[j]) {
                j += 1;
            }
            if smaller(tree_freq, depth, v, heap[j]) {
                break;
            }
            heap[k] = heap[j];
            k = j;
            j <<= 1;
        }
        heap[k] = v;
    }

    let mut n = heap_len / 2;
    while n >= 1 {
        pqdownheap(&mut heap, heap_len, &tree_freq, &depth, &smaller, n);
        n -= 1;
    }

    let mut node = elems;
    loop {
        let n = heap[SMALLEST];
        heap[SMALLEST] = heap[heap_len];
        heap_len -= 1;
        pqdownheap(&mut heap, heap_len, &tree_freq, &depth, &smaller, SMALLEST);

        let m = heap[SMALLEST];
        heap_max -= 1;
        heap[heap_max] = n;
        heap_max -= 1;
        heap[heap_max] = m;

        tree_freq[node] = tree_freq[n] + tree_freq[m];
        depth[node] = depth[n].max(depth[m]) + 1;
        dad[n] = node;
        dad[m] = node;

        heap[SMALLEST] = node;
        node += 1;
        pqdownheap(&mut heap, heap_len, &tree_freq, &depth, &smaller, SMALLEST);

        if heap_len < 2 {
            break;
        }
    }
    heap_max -= 1;
    heap[heap_max] = heap[SMALLEST];

    // gen_bitlen: top-down walk assigning code lengths, then redistributing
    // any lengths that exceed max_length (§4.3, "redistribute by moving one
    // leaf down and promoting its sibling").
    let mut bl_count = [0u32; MAX_BITS + 1];
    len[heap[heap_max]] = 0;
    let mut overflow: isize = 0;
    let mut opt_len: u64 = 0;

    for h in (heap_max + 1)..MAX_HEAP {
        let n = heap[h];
        let mut bits = len[dad[n]] as usize + 1;
        if bits > max_length {
            bits = max_length;
            overflow += 1;
        }
        len[n] = bits as u8;
        if n > max_code {
            continue;
        }
        bl_count[bits] += 1;
        let xbits = if n >= extra_base {
            extra_bits[n - extra_base] as usize
        } else {
            0
        };
        opt_len += tree_freq[n] as u64 * (bits + xbits) as u64;
    }

    if overflow > 0 {
        while overflow > 0 {
            let mut bits = max_length - 1;
            while bl_count[bits] == 0 {
                bits -= 1;
            }
            bl_count[bits] -= 1;
            bl_count[bits + 1] += 2;
            bl_count[max_length] -= 1;
            overflow -= 2;
        }

        let mut h = MAX_HEAP;
        let mut bits = max_length;
        while bits != 0 {
            let mut n = bl_count[bits];
            while n != 0 {
                h -= 1;
                let m = heap[h];
                if m > max_code {
                    continue;
                }
                if len[m] as usize != bits {
                    opt_len += (bits as i64 - len[m] as i64) as u64 * tree_freq[m] as u64;
                    len[m] = bits as u8;
                }
                n -= 1;
            }
            bits -= 1;
        }
    }

    if overflow != 0 {
        // The redistribution loop above always terminates (the bit budget is
        // bounded); reaching here would mean the heap was built over an
        // inconsistent frequency table.
        return Err(HuffError::LengthOverflow);
    }

    // gen_codes: canonical code assignment, bit-reversed to LSB-first order.
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    debug_assert_eq!(
        code + bl_count[MAX_BITS] - 1,
        (1u32 << MAX_BITS) - 1,
        "huffman code space not fully consumed"
    );

    let mut out = BuiltTree::empty();
    out.max_code = max_code;
    out.opt_len_bits = opt_len;
    for n in 0..=max_code {
        let l = len[n];
        if l == 0 {
            continue;
        }
        out.len[n] = l;
        out.code[n] = bi_reverse(next_code[l as usize], l as u32) as u16;
        next_code[l as usize] += 1;
    }
    Ok(out)
}

/// Count, for the bit-length meta-tree, how many times each code-length
/// value (and the two run-length escapes) occurs across `tree`'s symbols
/// `0..=max_code` (the "Emit" contract's scan step).
fn scan_tree(freq: &mut [u16; tables::BL_CODES], tree_len: &[u8; MAX_HEAP], max_code: usize) {
    let mut prevlen: isize = -1;
    let mut nextlen = tree_len[0] as isize;
    let mut count = 0i32;
    let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

    for n in 0..=max_code {
        let curlen = nextlen;
        // Sentinel past the last real symbol so the run-length scan always
        // sees a "change" there, mirroring the 0xffff marker the classic
        // implementation writes one slot past `max_code`.
        nextlen = if n + 1 > max_code {
            0xFFFF
        } else {
            tree_len[n + 1] as isize
        };
        count += 1;
        if count < max_count && curlen == nextlen {
            continue;
        } else if count < min_count {
            freq[curlen as usize] += count as u16;
        } else if curlen != 0 {
            if curlen != prevlen {
                freq[curlen as usize] += 1;
            }
            freq[REP_3_6] += 1;
        } else if count <= 10 {
            freq[REPZ_3_10] += 1;
        } else {
            freq[REPZ_11_138] += 1;
        }
        count = 0;
        prevlen = curlen;
        if nextlen == 0 {
            max_count = 138;
            min_count = 3;
        } else if curlen == nextlen {
            max_count = 6;
            min_count = 3;
        } else {
            max_count = 7;
            min_count = 4;
        }
    }
}

/// Emit `tree`'s code-length sequence for symbols `0..=max_code` using the
/// already-built bit-length tree `bl`, with run-length codes 16/17/18 (the
/// "Emit" contract's send step).
fn send_tree(
    w: &mut BitWriter,
    pending: &mut PendingBuf<'_>,
    bl: &BuiltTree,
    tree_len: &[u8; MAX_HEAP],
    max_code: usize,
) {
    let send_code = |w: &mut BitWriter, pending: &mut PendingBuf<'_>, code: usize| {
        w.send_bits(pending, bl.code[code] as u32, bl.len[code] as u32);
    };

    let mut prevlen: isize = -1;
    let mut nextlen = tree_len[0] as isize;
    let mut count = 0i32;
    let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = if n + 1 > max_code {
            0xFFFF
        } else {
            tree_len[n + 1] as isize
        };
        count += 1;
        if count < max_count && curlen == nextlen {
            continue;
        } else if count < min_count {
            for _ in 0..count {
                send_code(w, pending, curlen as usize);
            }
        } else if curlen != 0 {
            let mut count = count;
            if curlen != prevlen {
                send_code(w, pending, curlen as usize);
                count -= 1;
            }
            send_code(w, pending, REP_3_6);
            w.send_bits(pending, (count - 3) as u32, 2);
        } else if count <= 10 {
            send_code(w, pending, REPZ_3_10);
            w.send_bits(pending, (count - 3) as u32, 3);
        } else {
            send_code(w, pending, REPZ_11_138);
            w.send_bits(pending, (count - 11) as u32, 7);
        }
        count = 0;
        prevlen = curlen;
        if nextlen == 0 {
            max_count = 138;
            min_count = 3;
        } else if curlen == nextlen {
            max_count = 6;
            min_count = 3;
        } else {
            max_count = 7;
            min_count = 4;
        }
    }
}

/// Build the bit-length meta-tree over the literal/length and distance
/// trees' code-length sequences, and return the number of trailing
/// bit-length codes (in `BL_ORDER`) that can be dropped because their length
/// is zero (`max_blindex >= 3`, per RFC 1951's minimum HCLEN of 4).
pub fn build_bl_tree(
    ltree_len: &[u8; MAX_HEAP],
    l_max_code: usize,
    dtree_len: &[u8; MAX_HEAP],
    d_max_code: usize,
) -> Result<(BuiltTree, usize), HuffError> {
    let mut bl_freq = [0u16; tables::BL_CODES];
    scan_tree(&mut bl_freq, ltree_len, l_max_code);
    scan_tree(&mut bl_freq, dtree_len, d_max_code);

    let bl_tree = build_tree(
        &bl_freq,
        tables::BL_CODES,
        &tables::EXTRA_BLBITS,
        0,
        tables::MAX_BL_BITS,
    )?;

    let mut max_blindex = tables::BL_CODES - 1;
    while max_blindex >= 3 {
        if bl_tree.len[BL_ORDER[max_blindex] as usize] != 0 {
            break;
        }
        max_blindex -= 1;
    }
    Ok((bl_tree, max_blindex))
}

/// Emit HLIT/HDIST/HCLEN, the bit-length code-length table, and the two
/// run-length-encoded code sequences (§4.3, "Emit").
#[allow(clippy::too_many_arguments)]
pub fn send_all_trees(
    w: &mut BitWriter,
    pending: &mut PendingBuf<'_>,
    ltree: &BuiltTree,
    dtree: &BuiltTree,
    bl_tree: &BuiltTree,
    max_blindex: usize,
) {
    w.send_bits(pending, (ltree.max_code + 1 - 257) as u32, 5);
    w.send_bits(pending, (dtree.max_code + 1 - 1) as u32, 5);
    w.send_bits(pending, (max_blindex + 1 - 4) as u32, 4);
    for rank in 0..=max_blindex {
        w.send_bits(
            pending,
            bl_tree.len[BL_ORDER[rank] as usize] as u32,
            3,
        );
    }
    send_tree(w, pending, bl_tree, &ltree.len, ltree.max_code);
    send_tree(w, pending, bl_tree, &dtree.len, dtree.max_code);
}

/// The fixed (static) literal/length tree, computed once from RFC 1951's
/// fixed code-length assignment (§4.3, "Static trees").
pub fn static_ltree() -> &'static BuiltTree {
    use std::sync::OnceLock;
    static TREE: OnceLock<BuiltTree> = OnceLock::new();
    TREE.get_or_init(|| static_tree_from_lengths(&tables::static_ltree_lengths(), 287))
}

/// The fixed (static) distance tree: 30 legal symbols, all 5 bits (built from
/// a 32-entry length table so the 5-bit code space is complete; see
/// [`tables::static_dtree_lengths`]).
pub fn static_dtree() -> &'static BuiltTree {
    use std::sync::OnceLock;
    static TREE: OnceLock<BuiltTree> = OnceLock::new();
    TREE.get_or_init(|| static_tree_from_lengths(&tables::static_dtree_lengths(), 29))
}

/// Canonical-code assignment for a tree whose lengths are already fixed
/// (skips the heap/`gen_bitlen` steps `build_tree` needs for dynamic trees).
fn static_tree_from_lengths(lens: &[u8], max_code: usize) -> BuiltTree {
    let mut out = BuiltTree::empty();
    out.max_code = max_code;
    let mut codes = [0u16; MAX_HEAP];
    assign_canonical_codes(lens, &mut codes[..lens.len()]);
    for (n, &l) in lens.iter().enumerate() {
        out.len[n] = l;
        out.code[n] = codes[n];
    }
    out
}

/// Assign canonical LSB-first codes to every symbol with a nonzero length in
/// `lens`, writing into the same-length `codes_out`. Shared by the static
/// trees above and by the inflate side's decode-table builder
/// (`inflate::tables`), which needs the identical canonical assignment to
/// build its lookup tables from a received code-length sequence (§4.3
/// "Assign canonical codes" / §4.6 "Table builder").
pub fn assign_canonical_codes(lens: &[u8], codes_out: &mut [u16]) {
    debug_assert_eq!(lens.len(), codes_out.len());
    let mut bl_count = [0u32; MAX_BITS + 1];
    for &l in lens {
        if l != 0 {
            bl_count[l as usize] += 1;
        }
    }
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    for (n, &l) in lens.iter().enumerate() {
        if l == 0 {
            continue;
        }
        codes_out[n] = bi_reverse(next_code[l as usize], l as u32) as u16;
        next_code[l as usize] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tables::{length_code, dist_code, BASE_DIST, BASE_LENGTH, LENGTH_CODES, MIN_MATCH};

    #[test]
    fn length_code_covers_full_range() {
        assert_eq!(length_code(MIN_MATCH), 0);
        assert_eq!(length_code(tables::MAX_MATCH), (LENGTH_CODES - 1) as u8);
        for len in MIN_MATCH..=tables::MAX_MATCH {
            let code = length_code(len) as usize;
            assert!(BASE_LENGTH[code] as usize + MIN_MATCH <= len || code == LENGTH_CODES - 1);
        }
    }

    #[test]
    fn dist_code_matches_base_table() {
        assert_eq!(dist_code(1), 0);
        assert_eq!(dist_code(4), 3);
        for (code, &base) in BASE_DIST.iter().enumerate() {
            let d = base as usize + 1;
            assert_eq!(dist_code(d) as usize, code);
        }
    }

    #[test]
    fn static_trees_are_canonical_and_stable() {
        let lt = static_ltree();
        assert_eq!(lt.len[0], 8);
        assert_eq!(lt.len[143], 8);
        assert_eq!(lt.len[144], 9);
        assert_eq!(lt.len[255], 9);
        assert_eq!(lt.len[256], 7);
        assert_eq!(lt.len[279], 7);
        assert_eq!(lt.len[280], 8);
        assert_eq!(lt.len[287], 8);

        let dt = static_dtree();
        for n in 0..tables::D_CODES {
            assert_eq!(dt.len[n], 5);
        }
    }

    #[test]
    fn build_tree_round_trips_single_heavy_symbol() {
        let mut freq = [0u16; tables::L_CODES];
        freq[65] = 100;
        freq[66] = 1;
        let built = build_tree(
            &freq,
            tables::L_CODES,
            &tables::EXTRA_LBITS,
            257,
            MAX_BITS,
        )
        .unwrap();
        assert!(built.len[65] >= 1);
        assert!(built.len[66] >= 1);
        // code space fully assigned and each length within bound
        for n in 0..=built.max_code {
            assert!(built.len[n] as usize <= MAX_BITS);
        }
    }

    #[test]
    fn build_tree_rejects_nothing_for_valid_input_and_bounds_overflow() {
        // A skewed frequency table that forces length-limiting redistribution.
        let mut freq = [0u16; tables::L_CODES];
        for (i, f) in freq.iter_mut().enumerate().take(20) {
            *f = 1u16 << i.min(14);
        }
        let built = build_tree(
            &freq,
            tables::L_CODES,
            &tables::EXTRA_LBITS,
            257,
            MAX_BITS,
        )
        .unwrap();
        for n in 0..=built.max_code {
            assert!(built.len[n] as usize <= MAX_BITS);
        }
    }
}
