//! Decompression state (§3 "Decompression state"): circular window, dynamic
//! code-table arenas, gzip header scratch, and the mode state machine.
//!
//! §9's design note ("Macro-driven state machine → explicit enum + loop")
//! is implemented literally: [`Mode`] is a tagged union whose variants carry
//! whatever partial progress a suspended step needs to resume exactly where
//! it left off (a length already decoded but not yet paired with a distance,
//! bytes of a match still to copy, bytes of a gzip header field still to
//! skip). There is no separate "saved locals" struct — the mode *is* the
//! saved continuation.

use crate::bitio::BitReader;
use crate::config::{InflateConfig, Wrap};
use crate::error::{InflateError, PoolError};
use crate::inflate::tables::CodeEntry;
use crate::pool::Pool;

/// Entries needed for the literal/length table arena: a 9-bit root (512)
/// plus worst-case second-level sub-tables for a 286-symbol dynamic tree.
/// Matches the classical `ENOUGH_LENS` sizing (§3).
pub const ENOUGH_LENS: usize = 852;
/// Entries needed for the distance table arena (`ENOUGH_DISTS`).
pub const ENOUGH_DISTS: usize = 592;

/// Which code table a symbol is currently being decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTable {
    Fixed,
    Dynamic,
}

/// The ~30-mode inflate state machine (§4.6), grouped by the table in §4.6's
/// header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing parsed yet; next bits decide zlib vs. gzip vs. raw framing.
    Head,
    // ---- gzip header parse ----
    GzipFlags,
    GzipTime,
    GzipOs,
    GzipExLen,
    GzipExtra { remaining: u32 },
    GzipName,
    GzipComment,
    GzipHCrc,
    // ---- zlib header parse ----
    /// zlib header's preset-dictionary flag was set; next 32 bits are the
    /// expected dictionary Adler-32.
    DictId,
    /// Caller must supply a dictionary matching `expected_adler` before
    /// decoding can continue (§7, "Dictionary needed").
    Dict { expected_adler: u32 },
    // ---- block dispatch ----
    Type,
    /// Block type bits consumed and (for a stored block) byte-aligned;
    /// about to read the 32-bit LEN/~LEN pair. Kept distinct from `Type` so
    /// a suspend while reading LEN/~LEN can't re-read the 3 type bits
    /// (§9, "No hidden control flow").
    StoredLen,
    /// Stored block: LEN verified, about to copy `len` bytes.
    Stored { len: u16 },
    /// Block type bits consumed; about to read the 14-bit HLIT/HDIST/HCLEN
    /// triple.
    TableHeader,
    /// Dynamic block header: HLIT/HDIST/HCLEN just read.
    Table { hlit: usize, hdist: usize, hclen: usize },
    /// Reading the `hclen` 3-bit bit-length-tree lengths.
    LenLens { have: usize, hclen: usize },
    /// Reading the HLIT+HDIST literal/length + distance code lengths via the
    /// bit-length tree (with run-length codes 16/17/18).
    CodeLens { have: usize, total: usize, hlit: usize },
    /// A bit-length-tree repeat symbol (16/17/18) was decoded; its extra bits
    /// still need to be read before the repeat can be applied.
    CodeLensExtra { have: usize, total: usize, hlit: usize, sym: u8 },
    // ---- coded block body ----
    /// Waiting to decode the next literal/length symbol.
    Len { table: ActiveTable },
    /// Root-level literal/length lookup found a second-level indirection;
    /// `sub_start`/`sub_bits` locate the sub-table to resume into.
    LenSub { table: ActiveTable, sub_start: u16, sub_bits: u8 },
    /// A length code was decoded; `extra` more bits remain before the value
    /// is final and distance decoding can start.
    LenExt { table: ActiveTable, len: usize, extra: u8 },
    /// Length resolved; waiting to decode the distance symbol.
    Dist { table: ActiveTable, len: usize },
    /// Root-level distance lookup found a second-level indirection.
    DistSub { table: ActiveTable, len: usize, sub_start: u16, sub_bits: u8 },
    /// A distance code was decoded; `extra` more bits remain.
    DistExt { table: ActiveTable, len: usize, dist: usize, extra: u8 },
    /// Copying a resolved (length, distance) match into the output; `len`
    /// bytes still to copy.
    Match { table: ActiveTable, len: usize, dist: usize },
    /// A literal byte was decoded but the output buffer was full; one byte
    /// still to write before resuming symbol decoding.
    PendingLiteral { table: ActiveTable, byte: u8 },
    // ---- trailer ----
    Check,
    /// gzip only: ISIZE (total uncompressed size mod 2^32).
    Length,
    Done,
    /// Sticky data-error state; only `inflate_sync` can leave it.
    Bad { msg: &'static str },
    Mem,
    /// Scanning for the `00 00 FF FF` sync marker after `inflate_sync`.
    Sync,
}

pub struct InflateState<'a> {
    pub cfg: InflateConfig,
    pub mode: Mode,
    pub bits: BitReader,

    /// Circular history window, `2^window_bits` bytes.
    pub window: &'a mut [u8],
    pub wsize: usize,
    pub whave: usize,
    pub wnext: usize,

    pub litlen_arena: &'a mut [CodeEntry],
    pub litlen_root_bits: u32,
    pub dist_arena: &'a mut [CodeEntry],
    pub dist_root_bits: u32,

    /// Scratch for the combined literal/length + distance code-length
    /// sequence read from a dynamic block header (up to 286 + 30 entries).
    pub lens: [u8; 320],
    /// Bit-length-tree (19 symbols) lengths, in transmission order applied
    /// via `BL_ORDER`.
    pub bl_lens: [u8; 19],
    pub bl_arena: [CodeEntry; 128],
    pub bl_root_bits: u32,

    pub last_block: bool,
    pub dmax: usize,
    pub total_out: u64,

    // gzip header scratch
    pub gz_flags: u8,
    pub gz_extra_remaining: u32,

    pub dict_adler: u32,

    /// HLIT/HDIST captured at `Mode::TableHeader`, needed again once
    /// `Mode::LenLens` finishes building the bit-length tree (§4.6 "Dynamic
    /// table build").
    pub pending_hlit: usize,
    pub pending_hdist: usize,
}

impl<'a> InflateState<'a> {
    pub fn new(pool: &mut Pool<'a>, cfg: InflateConfig) -> Result<Self, InflateError> {
        let wsize = cfg.w_size();
        let window: &mut [u8] = pool.alloc_bytes(wsize).map_err(pool_mem)?;
        let litlen_arena: &mut [CodeEntry] =
            pool.alloc(ENOUGH_LENS).map_err(pool_mem)?;
        let dist_arena: &mut [CodeEntry] = pool.alloc(ENOUGH_DISTS).map_err(pool_mem)?;

        Ok(InflateState {
            mode: Mode::Head,
            bits: BitReader::new(),
            window,
            wsize,
            whave: 0,
            wnext: 0,
            litlen_arena,
            litlen_root_bits: 9,
            dist_arena,
            dist_root_bits: 6,
            lens: [0; 320],
            bl_lens: [0; 19],
            bl_arena: [CodeEntry::default(); 128],
            bl_root_bits: 7,
            last_block: false,
            dmax: wsize,
            total_out: 0,
            gz_flags: 0,
            gz_extra_remaining: 0,
            dict_adler: 1,
            pending_hlit: 0,
            pending_hdist: 0,
            cfg,
        })
    }

    pub fn wrap(&self) -> Wrap {
        self.cfg.wrap
    }

    /// Append one produced output byte to the circular history window
    /// (§4.6, "Window maintenance"). Pushing byte-by-byte as output is
    /// produced (rather than batching at the end of a step, as the classical
    /// `inflate_fast` does for speed) means a match's source byte is always
    /// reachable through the window alone, including overlapping copies
    /// where `dist < len`.
    pub fn push_window_byte(&mut self, byte: u8) {
        self.window[self.wnext] = byte;
        self.wnext += 1;
        if self.wnext == self.wsize {
            self.wnext = 0;
        }
        if self.whave < self.wsize {
            self.whave += 1;
        }
    }

    /// Bulk form of [`Self::push_window_byte`] for a run of bytes with no
    /// internal back-references (stored blocks, preset dictionaries).
    pub fn push_window_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_window_byte(b);
        }
    }

    /// Reads the byte `dist` positions behind the next window write
    /// position. Caller must have already checked `dist <= self.whave`.
    pub fn window_distance_byte(&self, dist: usize) -> u8 {
        let idx = (self.wnext + self.wsize - dist) % self.wsize;
        self.window[idx]
    }
}

fn pool_mem(_: PoolError) -> InflateError {
    InflateError::MemError
}
