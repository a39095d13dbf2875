//! Compression state (§3 "Compression state"): window, hash tables, symbol
//! buffers, pending buffer, and dynamic-tree frequency tables, all carved
//! from the caller's pool at construction time.

use crate::bitio::{BitWriter, PendingBuf};
use crate::config::{DeflateConfig, Strategy, Wrap};
use crate::error::{DeflateError, PoolError};
use crate::huffman::tables::{D_CODES, L_CODES};
use crate::pool::Pool;

pub const MIN_MATCH: usize = crate::huffman::tables::MIN_MATCH;
pub const MAX_MATCH: usize = crate::huffman::tables::MAX_MATCH;
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// `status`, §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Init,
    Gzip,
    Extra,
    Name,
    Comment,
    HCrc,
    Busy,
    Finish,
}

pub struct DeflateState<'a> {
    pub cfg: DeflateConfig,

    /// `2 * w_size` bytes: upper half receives new input, lower half holds
    /// the previous window once slid down (§4.5 "Window sliding").
    pub window: &'a mut [u8],
    /// `2^hash_bits` most-recent-position-per-hash-slot entries.
    pub head: &'a mut [u16],
    /// `w_size` hash-chain links, indexed modulo `w_size`.
    pub prev: &'a mut [u16],

    /// Buffered literal bytes, parallel to `d_buf` (§3, "Literal/length
    /// buffer and distance buffer").
    pub l_buf: &'a mut [u8],
    /// Buffered distances; `0` at index `i` means `l_buf[i]` is a literal,
    /// otherwise it is the distance of a back-reference whose length is
    /// recovered from `l_buf[i]` via the length-code mapping.
    pub d_buf: &'a mut [u16],
    pub sym_next: usize,
    pub sym_end: usize,

    pub pending: PendingBuf<'a>,
    pub bits: BitWriter,

    pub l_freq: [u16; L_CODES],
    pub d_freq: [u16; D_CODES],
    pub bl_freq: [u16; crate::huffman::tables::BL_CODES],

    pub status: Status,
    pub strstart: usize,
    pub lookahead: usize,
    pub match_length: usize,
    pub match_start: usize,
    pub prev_length: usize,
    pub prev_match: usize,
    pub match_available: bool,
    pub ins_h: u32,
    pub block_start: isize,
    pub last_flush: i32,
    pub w_mask: usize,

    pub good_match: usize,
    pub max_lazy_match: usize,
    pub nice_match: usize,
    pub max_chain_length: usize,

    pub dict_adler: u32,
    pub header_written: usize,
}

impl<'a> DeflateState<'a> {
    pub fn new(pool: &mut Pool<'a>, cfg: DeflateConfig) -> Result<Self, DeflateError> {
        let w_size = cfg.w_size();
        let hash_size = 1usize << cfg.hash_bits();
        let lit_bufsize = cfg.lit_bufsize();

        let window = alloc_or_mem(pool, 2 * w_size)?;
        let head: &mut [u16] = pool.alloc(hash_size).map_err(|_| DeflateError::MemError)?;
        let prev: &mut [u16] = pool.alloc(w_size).map_err(|_| DeflateError::MemError)?;
        let l_buf = alloc_or_mem(pool, lit_bufsize)?;
        let d_buf: &mut [u16] = pool.alloc(lit_bufsize).map_err(|_| DeflateError::MemError)?;
        let pending_buf = alloc_or_mem(pool, lit_bufsize * 4)?;

        let (good_match, max_lazy_match, nice_match, max_chain_length) = cfg.match_params();

        Ok(DeflateState {
            cfg,
            window,
            head,
            prev,
            l_buf,
            d_buf,
            sym_next: 0,
            sym_end: lit_bufsize - 1,
            pending: PendingBuf::new(pending_buf),
            bits: BitWriter::new(),
            l_freq: [0; L_CODES],
            d_freq: [0; D_CODES],
            bl_freq: [0; crate::huffman::tables::BL_CODES],
            status: match cfg.wrap {
                Wrap::Gzip => Status::Gzip,
                _ => Status::Init,
            },
            strstart: 0,
            lookahead: 0,
            match_length: MIN_MATCH - 1,
            match_start: 0,
            prev_length: MIN_MATCH - 1,
            prev_match: 0,
            match_available: false,
            ins_h: 0,
            block_start: 0,
            last_flush: -1,
            w_mask: w_size - 1,
            good_match,
            max_lazy_match,
            nice_match,
            max_chain_length,
            dict_adler: 1,
            header_written: 0,
        })
    }

    pub fn hash_shift(&self) -> u32 {
        crate::match_finder::hash_shift(self.cfg.hash_bits())
    }

    pub fn update_hash(&self, c: u8) -> u32 {
        crate::match_finder::update_hash(self.ins_h, self.hash_shift(), self.cfg.hash_bits(), c)
    }

    /// Record one literal byte symbol (§3: "(distance=0, literal=byte)").
    pub fn tally_lit(&mut self, byte: u8) -> bool {
        self.d_buf[self.sym_next] = 0;
        self.l_buf[self.sym_next] = byte;
        self.sym_next += 1;
        self.l_freq[byte as usize] += 1;
        self.sym_next == self.sym_end
    }

    /// Record one (length, distance) match symbol.
    pub fn tally_dist(&mut self, dist: usize, len: usize) -> bool {
        self.d_buf[self.sym_next] = dist as u16;
        self.l_buf[self.sym_next] = (len - MIN_MATCH) as u8;
        self.sym_next += 1;
        self.l_freq[crate::huffman::tables::length_code(len) as usize + 257] += 1;
        self.d_freq[crate::huffman::tables::dist_code(dist) as usize] += 1;
        self.sym_next == self.sym_end
    }
}

fn alloc_or_mem<'a>(pool: &mut Pool<'a>, n: usize) -> Result<&'a mut [u8], DeflateError> {
    pool.alloc_bytes(n).map_err(|_e: PoolError| DeflateError::MemError)
}
