//! Validated-at-init configuration (§6 "Parameters", §A.3).
//!
//! Generalizes the teacher's CLI `config.rs` (which validates a thread-count
//! argument against `num_cpus` before a run starts) to this crate's
//! compression parameters: every field is checked once, at construction, so
//! the engine itself never has to re-validate a level/window/strategy
//! combination mid-stream.

use crate::error::{Code, DeflateError, InflateError};

/// `strategy`, §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Default = 0,
    Filtered = 1,
    HuffmanOnly = 2,
    Rle = 3,
    Fixed = 4,
}

/// `flush`, §6. `Trees` only has meaning on the inflate side (resume after a
/// `SYNC_FLUSH`'s header has been read but its payload hasn't).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    #[default]
    NoFlush = 0,
    Partial = 1,
    Sync = 2,
    Full = 3,
    Finish = 4,
    Block = 5,
    Trees = 6,
}

/// Raw / zlib / gzip framing, selected by the sign and magnitude of
/// `window_bits` (§6, §GLOSSARY "Wrap mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Raw,
    Zlib,
    Gzip,
}

const MIN_WINDOW_BITS: i32 = 8;
const MAX_WINDOW_BITS: i32 = 15;
const GZIP_WINDOW_OFFSET: i32 = 16;

/// Parse the raw `window_bits` parameter into a wrap mode and an effective
/// `8..=15` window size, applying the "8 is silently promoted to 9" rule.
fn parse_window_bits(window_bits: i32) -> Result<(Wrap, u32), &'static str> {
    let (wrap, bits) = if window_bits < 0 {
        (Wrap::Raw, -window_bits)
    } else if window_bits > MAX_WINDOW_BITS {
        (Wrap::Gzip, window_bits - GZIP_WINDOW_OFFSET)
    } else if window_bits == 0 {
        (Wrap::Zlib, MAX_WINDOW_BITS)
    } else {
        (Wrap::Zlib, window_bits)
    };
    if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        return Err("window_bits out of range");
    }
    let bits = if bits == MIN_WINDOW_BITS { 9 } else { bits };
    Ok((wrap, bits as u32))
}

/// Validated compression parameters (§6).
#[derive(Debug, Clone, Copy)]
pub struct DeflateConfig {
    pub level: i32,
    pub window_bits: u32,
    pub wrap: Wrap,
    pub mem_level: u32,
    pub strategy: Strategy,
}

impl DeflateConfig {
    pub fn new(
        level: i32,
        window_bits: i32,
        mem_level: i32,
        strategy: Strategy,
    ) -> Result<Self, DeflateError> {
        let level = if level == -1 { 6 } else { level };
        if !(0..=9).contains(&level) {
            return Err(DeflateError::StreamError("level out of range"));
        }
        if !(1..=9).contains(&mem_level) {
            return Err(DeflateError::StreamError("mem_level out of range"));
        }
        let (wrap, window_bits) =
            parse_window_bits(window_bits).map_err(DeflateError::StreamError)?;
        Ok(DeflateConfig {
            level,
            window_bits,
            wrap,
            mem_level: mem_level as u32,
            strategy,
        })
    }

    pub fn w_size(&self) -> usize {
        1usize << self.window_bits
    }

    pub fn hash_bits(&self) -> u32 {
        self.mem_level + 7
    }

    pub fn lit_bufsize(&self) -> usize {
        1usize << (self.mem_level + 6)
    }

    /// Derived lazy-matching parameters for the five strategies (§4.5's
    /// level table): `(good_match, max_lazy, nice_match, max_chain)`.
    pub fn match_params(&self) -> (usize, usize, usize, usize) {
        const TABLE: [(usize, usize, usize, usize); 10] = [
            (0, 0, 0, 0),         // 0: stored
            (4, 4, 8, 4),         // 1
            (4, 5, 16, 8),        // 2
            (4, 6, 32, 32),       // 3
            (4, 4, 16, 16),       // 4
            (8, 16, 32, 32),      // 5
            (8, 16, 128, 128),    // 6
            (8, 32, 128, 256),    // 7
            (32, 128, 258, 1024), // 8
            (32, 258, 258, 4096), // 9
        ];
        TABLE[self.level as usize]
    }
}

/// Validated decompression parameters (§6).
#[derive(Debug, Clone, Copy)]
pub struct InflateConfig {
    pub window_bits: u32,
    pub wrap: Wrap,
}

impl InflateConfig {
    pub fn new(window_bits: i32) -> Result<Self, InflateError> {
        let (wrap, window_bits) =
            parse_window_bits(window_bits).map_err(InflateError::StreamError)?;
        Ok(InflateConfig { window_bits, wrap })
    }

    pub fn w_size(&self) -> usize {
        1usize << self.window_bits
    }
}

impl From<Code> for i32 {
    fn from(c: Code) -> i32 {
        c as i32
    }
}
