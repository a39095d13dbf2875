//! Window maintenance, the five compression strategies, and block assembly
//! (§4.5).

use super::state::{DeflateState, MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};
use crate::bitio::{BitWriter, PendingBuf};
use crate::config::{Flush, Strategy};
use crate::huffman::tables::{dist_code, length_code, END_BLOCK, MAX_BITS};
use crate::huffman::{build_bl_tree, build_tree, static_dtree, static_ltree, send_all_trees, BuiltTree};
use crate::match_finder::{longest_match, update_hash, Match, MatchParams, NIL};
use crate::stream::Cursor;

/// Insert the string starting at `pos` into the hash tables, returning the
/// previous chain head at that hash slot (the value the caller walks from
/// when searching for a match).
fn insert_string(state: &mut DeflateState, pos: usize) -> usize {
    let c = state.window[pos + MIN_MATCH - 1];
    state.ins_h = state.update_hash(c);
    let hash_bits = state.cfg.hash_bits();
    let mask = (1u32 << hash_bits) - 1;
    let h = (state.ins_h & mask) as usize;
    let head = state.head[h] as usize;
    state.prev[pos & state.w_mask] = head as u16;
    state.head[h] = pos as u16;
    head
}

/// Slide the window down by `w_size` once `strstart` has drifted far enough
/// that the upper half is full, per §4.5 "Window sliding".
fn slide_window(state: &mut DeflateState) {
    let w_size = state.cfg.w_size();
    state.window.copy_within(w_size..2 * w_size, 0);
    state.match_start = state.match_start.saturating_sub(w_size);
    state.strstart -= w_size;
    state.block_start -= w_size as isize;

    // Every stored position shifts down by `w_size`; anything that was
    // already behind the new window origin becomes NIL (clamping at 0 has
    // the same effect, since NIL is 0).
    for h in state.head.iter_mut() {
        *h = (*h as usize).saturating_sub(w_size) as u16;
    }
    for p in state.prev.iter_mut() {
        *p = (*p as usize).saturating_sub(w_size) as u16;
    }
}

/// Top up the window from the input cursor and slide it if the upper half
/// has filled, maintaining `lookahead ≥ MIN_LOOKAHEAD` whenever input
/// remains (§3 invariant).
///
/// `budget` caps how many input bytes this call may pull, independent of
/// `input.remaining()`. The per-strategy-call wrapper in
/// [`crate::deflate`] feeds input in `lit_bufsize`-sized chunks so that at
/// most one symbol-buffer's worth of block output accumulates in `pending`
/// between drains to the caller's output buffer — without this cap, a
/// single call with a large input would pull the whole thing into the
/// window at once and could emit more Huffman-coded bytes than `pending`
/// (sized `lit_bufsize * 4`, §3) has room for.
pub fn fill_window(state: &mut DeflateState, input: &mut Cursor<u8>, budget: &mut usize) {
    let w_size = state.cfg.w_size();
    loop {
        if state.lookahead >= MIN_LOOKAHEAD {
            break;
        }
        let max_dist = w_size - MIN_LOOKAHEAD;
        if state.strstart >= w_size + max_dist {
            slide_window(state);
        }
        if input.remaining() == 0 || *budget == 0 {
            break;
        }
        let more = (2 * w_size - state.lookahead - state.strstart)
            .min(input.remaining())
            .min(*budget);
        let dst = state.strstart + state.lookahead;
        let src = input.unread();
        state.window[dst..dst + more].copy_from_slice(&src[..more]);
        input.advance(more);
        *budget -= more;
        state.lookahead += more;
        if state.lookahead == 0 {
            break;
        }
    }
}

fn match_params(state: &DeflateState) -> MatchParams {
    MatchParams {
        good_match: state.good_match,
        nice_match: state.nice_match,
        max_chain_length: state.max_chain_length,
        w_mask: state.w_mask,
        max_dist: state.cfg.w_size() - MIN_LOOKAHEAD,
    }
}

fn find_match(state: &DeflateState, cur_match: usize) -> Match {
    longest_match(
        state.window,
        state.prev,
        &match_params(state),
        state.strstart,
        state.lookahead,
        state.prev_length,
        cur_match,
    )
}

/// level 0: no match search, stored blocks only. Chunks input into
/// at-most-65 535-byte stored blocks directly, bypassing the Huffman cost
/// comparison in [`flush_block`] entirely (level 0 always wants the
/// verbatim encoding, never a Huffman one).
pub fn deflate_stored(
    state: &mut DeflateState,
    input: &mut Cursor<u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    const MAX_STORED: usize = 65_535;
    let finish = flush == Flush::Finish;
    loop {
        fill_window(state, input, budget);
        let block_len = (state.strstart + state.lookahead)
            .saturating_sub(state.block_start as usize)
            .min(MAX_STORED);
        if block_len == 0 {
            break;
        }
        if block_len < MAX_STORED && !(finish && input.remaining() == 0 && state.lookahead == 0) {
            break;
        }
        state.strstart += state.lookahead;
        state.lookahead = 0;
        let start = state.block_start as usize;
        let end = start + block_len;
        let last = finish && input.remaining() == 0 && end == state.strstart;
        stored_block(state.window, (start, end), &mut state.bits, &mut state.pending, last);
        state.block_start = end as isize;
        if last {
            return true;
        }
    }
    false
}

/// levels 1–3: greedy match, no lazy lookahead (§4.5 "fast").
pub fn deflate_fast(
    state: &mut DeflateState,
    input: &mut Cursor<u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    loop {
        if state.lookahead < MIN_LOOKAHEAD {
            fill_window(state, input, budget);
            if state.lookahead < MIN_LOOKAHEAD && flush != Flush::Finish {
                return false;
            }
            if state.lookahead == 0 {
                break;
            }
        }

        let mut hash_head = NIL as usize;
        if state.lookahead >= MIN_MATCH {
            hash_head = insert_string(state, state.strstart);
        }

        if hash_head != NIL as usize
            && state.strstart - hash_head <= state.cfg.w_size() - MIN_LOOKAHEAD
        {
            let m = find_match(state, hash_head);
            state.match_length = m.len.min(state.lookahead);
            state.match_start = m.start;
        } else {
            state.match_length = MIN_MATCH - 1;
        }

        if state.match_length >= MIN_MATCH {
            let full = state.tally_dist(state.strstart - state.match_start, state.match_length);
            state.lookahead -= state.match_length;
            if state.match_length <= state.max_lazy_match && state.lookahead >= MIN_MATCH {
                let mut n = state.match_length - 1;
                state.strstart += 1;
                while n > 0 {
                    insert_string(state, state.strstart);
                    state.strstart += 1;
                    n -= 1;
                }
            } else {
                state.strstart += state.match_length;
            }
            state.match_length = MIN_MATCH - 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        } else {
            let byte = state.window[state.strstart];
            let full = state.tally_lit(byte);
            state.lookahead -= 1;
            state.strstart += 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        }
    }
    if flush == Flush::Finish {
        flush_block(state, Some((state.block_start as usize, state.strstart)), true);
        return true;
    }
    false
}

/// levels 4–9 (and FIXED): lazy match — prefer the match at `strstart+1` if
/// strictly longer (§4.5 "Lazy match").
pub fn deflate_slow(
    state: &mut DeflateState,
    input: &mut Cursor<u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    loop {
        if state.lookahead < MIN_LOOKAHEAD {
            fill_window(state, input, budget);
            if state.lookahead < MIN_LOOKAHEAD && flush != Flush::Finish {
                return false;
            }
            if state.lookahead == 0 {
                break;
            }
        }

        let mut hash_head = NIL as usize;
        if state.lookahead >= MIN_MATCH {
            hash_head = insert_string(state, state.strstart);
        }

        state.prev_length = state.match_length;
        state.prev_match = state.match_start;
        state.match_length = MIN_MATCH - 1;

        if hash_head != NIL as usize
            && state.prev_length < state.max_lazy_match
            && state.strstart - hash_head <= state.cfg.w_size() - MIN_LOOKAHEAD
        {
            let m = find_match(state, hash_head);
            let mut len = m.len.min(state.lookahead);
            if state.cfg.strategy == Strategy::Filtered && len <= 5 && state.strstart - m.start > 4096 {
                len = MIN_MATCH - 1;
            }
            state.match_length = len;
            state.match_start = m.start;
        }

        if state.prev_length >= MIN_MATCH && state.match_length <= state.prev_length {
            let max_insert = state.strstart + state.lookahead - MIN_MATCH;
            let full =
                state.tally_dist(state.strstart - 1 - state.prev_match, state.prev_length);
            state.lookahead -= state.prev_length - 1;
            state.prev_length -= 2;
            loop {
                state.strstart += 1;
                if state.strstart <= max_insert {
                    insert_string(state, state.strstart);
                }
                state.prev_length -= 1;
                if state.prev_length == 0 {
                    break;
                }
            }
            state.match_available = false;
            state.match_length = MIN_MATCH - 1;
            state.strstart += 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        } else if state.match_available {
            let byte = state.window[state.strstart - 1];
            let full = state.tally_lit(byte);
            state.strstart += 1;
            state.lookahead -= 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        } else {
            state.match_available = true;
            state.strstart += 1;
            state.lookahead -= 1;
        }
    }

    if state.match_available {
        let full = state.tally_lit(state.window[state.strstart - 1]);
        state.match_available = false;
        if full {
            flush_block(state, Some((state.block_start as usize, state.strstart)), false);
        }
    }
    if flush == Flush::Finish {
        flush_block(state, Some((state.block_start as usize, state.strstart)), true);
        return true;
    }
    false
}

/// RLE strategy: only distance-1 matches (run-length encoding of repeated
/// bytes).
pub fn deflate_rle(
    state: &mut DeflateState,
    input: &mut Cursor<u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    loop {
        if state.lookahead <= MAX_MATCH {
            fill_window(state, input, budget);
            if state.lookahead <= MAX_MATCH && flush != Flush::Finish {
                return false;
            }
            if state.lookahead == 0 {
                break;
            }
        }

        state.match_length = MIN_MATCH - 1;
        if state.lookahead >= MIN_MATCH && state.strstart >= 1 {
            let scan = state.strstart - 1;
            if state.window[scan] == state.window[state.strstart] {
                let max_len = state.lookahead.min(MAX_MATCH);
                let mut len = 0;
                while len < max_len && state.window[scan] == state.window[scan + len] {
                    len += 1;
                }
                state.match_length = len.min(state.lookahead);
            }
        }

        if state.match_length >= MIN_MATCH {
            let full = state.tally_dist(1, state.match_length);
            state.lookahead -= state.match_length;
            state.strstart += state.match_length;
            state.match_length = MIN_MATCH - 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        } else {
            let byte = state.window[state.strstart];
            let full = state.tally_lit(byte);
            state.lookahead -= 1;
            state.strstart += 1;
            if full {
                flush_block(state, Some((state.block_start as usize, state.strstart)), false);
            }
        }
    }
    if flush == Flush::Finish {
        flush_block(state, Some((state.block_start as usize, state.strstart)), true);
        return true;
    }
    false
}

/// HUFFMAN_ONLY strategy: literals only, no match search at all.
pub fn deflate_huff(
    state: &mut DeflateState,
    input: &mut Cursor<u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    loop {
        if state.lookahead == 0 {
            fill_window(state, input, budget);
            if state.lookahead == 0 {
                if flush == Flush::Finish {
                    break;
                }
                return false;
            }
        }
        state.match_length = MIN_MATCH - 1;
        let byte = state.window[state.strstart];
        let full = state.tally_lit(byte);
        state.lookahead -= 1;
        state.strstart += 1;
        if full {
            flush_block(state, Some((state.block_start as usize, state.strstart)), false);
        }
    }
    flush_block(state, Some((state.block_start as usize, state.strstart)), true);
    true
}

fn tree_bits(
    freq_l: &[u16],
    lens_l: &[u8],
    freq_d: &[u16],
    lens_d: &[u8],
) -> u64 {
    let mut bits = 0u64;
    for (n, &f) in freq_l.iter().enumerate() {
        if f == 0 {
            continue;
        }
        let extra = if n >= 257 {
            crate::huffman::tables::EXTRA_LBITS[n - 257] as u64
        } else {
            0
        };
        bits += f as u64 * (lens_l[n] as u64 + extra);
    }
    for (n, &f) in freq_d.iter().enumerate() {
        if f == 0 {
            continue;
        }
        let extra = crate::huffman::tables::EXTRA_DBITS[n] as u64;
        bits += f as u64 * (lens_d[n] as u64 + extra);
    }
    bits
}

fn compress_block(state: &mut DeflateState, ltree: &BuiltTree, dtree: &BuiltTree) {
    for i in 0..state.sym_next {
        let dist = state.d_buf[i] as usize;
        if dist == 0 {
            let lit = state.l_buf[i] as usize;
            state.bits.send_bits(&mut state.pending, ltree.code[lit] as u32, ltree.len[lit] as u32);
        } else {
            let len = state.l_buf[i] as usize + MIN_MATCH;
            let lc = length_code(len) as usize;
            let code = lc + 257;
            state.bits.send_bits(&mut state.pending, ltree.code[code] as u32, ltree.len[code] as u32);
            let lextra = crate::huffman::tables::EXTRA_LBITS[lc];
            if lextra != 0 {
                let base = crate::huffman::tables::BASE_LENGTH[lc] as usize;
                state.bits.send_bits(&mut state.pending, (len - MIN_MATCH - base) as u32, lextra as u32);
            }
            let dc = dist_code(dist) as usize;
            state.bits.send_bits(&mut state.pending, dtree.code[dc] as u32, dtree.len[dc] as u32);
            let dextra = crate::huffman::tables::EXTRA_DBITS[dc];
            if dextra != 0 {
                let base = crate::huffman::tables::BASE_DIST[dc] as usize;
                state.bits.send_bits(&mut state.pending, (dist - 1 - base) as u32, dextra as u32);
            }
        }
    }
    state.bits.send_bits(
        &mut state.pending,
        ltree.code[END_BLOCK] as u32,
        ltree.len[END_BLOCK] as u32,
    );
}

/// Emit one stored (uncompressed) block verbatim. Takes the window and the
/// bit-writer/pending-buffer fields as separate borrows (rather than
/// `&mut DeflateState`) so the caller can hand in an immutable slice of
/// `state.window` alongside a mutable borrow of `state.pending` without an
/// intermediate copy — stored blocks can be up to 65 535 bytes, too large to
/// stage through a stack buffer, and copying into a heap `Vec` would violate
/// the no-allocation-after-init rule.
fn stored_block(
    window: &[u8],
    data_range: (usize, usize),
    bits: &mut BitWriter,
    pending: &mut PendingBuf<'_>,
    last: bool,
) {
    bits.send_bits(pending, if last { 1 } else { 0 }, 1);
    bits.send_bits(pending, 0, 2); // type 00 = stored
    bits.align_byte(pending);
    let (s, e) = data_range;
    let len = (e - s) as u16;
    pending.push((len & 0xFF) as u8);
    pending.push((len >> 8) as u8);
    let nlen = !len;
    pending.push((nlen & 0xFF) as u8);
    pending.push((nlen >> 8) as u8);
    pending.extend_from_slice(&window[s..e]);
}

/// Build trees from the buffered symbol frequencies, pick the cheapest of
/// stored / static / dynamic encoding, and emit the block (§4.5 "Block
/// assembly").
pub fn flush_block(state: &mut DeflateState, window_range: Option<(usize, usize)>, last: bool) {
    state.l_freq[END_BLOCK] += 1;

    let ltree = build_tree(
        &state.l_freq,
        crate::huffman::tables::L_CODES,
        &crate::huffman::tables::EXTRA_LBITS,
        257,
        MAX_BITS,
    )
    .expect("literal/length tree construction");
    let dtree_elems = crate::huffman::tables::D_CODES;
    let dtree = build_tree(
        &state.d_freq,
        dtree_elems,
        &crate::huffman::tables::EXTRA_DBITS,
        0,
        MAX_BITS,
    )
    .expect("distance tree construction");

    let (bl_tree, max_blindex) =
        build_bl_tree(&ltree.len, ltree.max_code, &dtree.len, dtree.max_code)
            .expect("bit-length tree construction");

    let dynamic_bits = ltree.opt_len_bits
        + dtree.opt_len_bits
        + 3 * (max_blindex as u64 + 1)
        + 5
        + 5
        + 4;

    let static_l = static_ltree();
    let static_d = static_dtree();
    let static_bits = tree_bits(&state.l_freq, &static_l.len, &state.d_freq, &static_d.len) + 7;

    let stored_len = window_range.map(|(s, e)| e - s).unwrap_or(0);
    // Byte-aligning first can cost up to 7 bits beyond the 1-bit block
    // header already counted in `dynamic_bits`/`static_bits`.
    let stored_bits = (stored_len as u64) * 8 + 32 + 7;

    let force_static = state.cfg.strategy == Strategy::Fixed;
    let force_huff = state.cfg.strategy == Strategy::HuffmanOnly;
    let can_store = window_range.is_some() && !force_static && !force_huff;

    if can_store && stored_bits <= dynamic_bits && stored_bits <= static_bits {
        let (s, e) = window_range.unwrap();
        stored_block(state.window, (s, e), &mut state.bits, &mut state.pending, last);
        reset_block_state(state);
        return;
    }

    state
        .bits
        .send_bits(&mut state.pending, if last { 1 } else { 0 }, 1);
    if force_static || static_bits <= dynamic_bits {
        state.bits.send_bits(&mut state.pending, 1, 2);
        compress_block(state, static_l, static_d);
    } else {
        state.bits.send_bits(&mut state.pending, 2, 2);
        send_all_trees(&mut state.bits, &mut state.pending, &ltree, &dtree, &bl_tree, max_blindex);
        compress_block(state, &ltree, &dtree);
    }
    // A trailing checksum/ISIZE or a SYNC/FULL_FLUSH marker must start on a
    // byte boundary (§4.5 "Header emission", §GLOSSARY "Sync marker"); a
    // Huffman-coded block's last code generally does not end on one, so the
    // final block of a stream (and every flush point) is byte-aligned here
    // rather than relying on the next stored block to do it.
    if last {
        state.bits.align_byte(&mut state.pending);
    }
    reset_block_state(state);
}

fn reset_block_state(state: &mut DeflateState) {
    state.sym_next = 0;
    state.l_freq = [0; crate::huffman::tables::L_CODES];
    state.d_freq = [0; crate::huffman::tables::D_CODES];
    state.block_start = state.strstart as isize;
}

/// End the current block (if any buffered symbols remain) without aligning
/// to a byte boundary — `Flush::Partial` (§4.5/§7).
pub fn end_block_partial(state: &mut DeflateState) {
    flush_block(state, Some((state.block_start as usize, state.strstart)), false);
}

/// End the current block and pad to a byte boundary, but emit no sync
/// marker — `Flush::Block`.
pub fn end_block_aligned(state: &mut DeflateState) {
    flush_block(state, Some((state.block_start as usize, state.strstart)), false);
    state.bits.align_byte(&mut state.pending);
}

/// End the current block, byte-align, and append an empty stored block
/// (`00 00 FF FF`) so `inflate_sync` can find this point later —
/// `Flush::Sync` and `Flush::Full` (§GLOSSARY "Sync marker").
pub fn emit_sync_marker(state: &mut DeflateState) {
    flush_block(state, Some((state.block_start as usize, state.strstart)), false);
    let at = state.strstart;
    stored_block(state.window, (at, at), &mut state.bits, &mut state.pending, false);
    reset_block_state(state);
}

/// Prime the window and hash chains with a preset dictionary (§6 "Preset
/// dictionary"): the dictionary's tail (at most `w_size` bytes) becomes
/// match history for the data that follows, without being emitted itself.
pub fn seed_dictionary(state: &mut DeflateState, dict: &[u8]) {
    let w_size = state.cfg.w_size();
    let take = dict.len().min(w_size);
    let start = dict.len() - take;
    state.window[..take].copy_from_slice(&dict[start..]);
    state.strstart = take;
    state.block_start = take as isize;
    if take >= MIN_MATCH {
        for pos in 0..=(take - MIN_MATCH) {
            insert_string(state, pos);
        }
    }
}

/// Drop all hash-chain history — `Flush::Full` additionally severs any
/// back-reference across the flush point, so a corrupted block on one side
/// can never poison decoding on the other (§4.5, §GLOSSARY "Sync marker").
pub fn clear_hash_history(state: &mut DeflateState) {
    state.head.fill(NIL);
    state.prev.fill(NIL);
}
