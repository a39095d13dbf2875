//! Work-buffer sizing and output-bound formulas (§6 "Sizing functions").
//!
//! A caller must be able to compute these before ever touching the engine —
//! that's the whole point of the fixed-pool design (§4.1: "never fails for
//! callers who sized the buffer per the sizing formula"). Kept as free
//! functions over the validated [`crate::config::DeflateConfig`] /
//! [`crate::config::InflateConfig`] rather than methods on the engine state,
//! so a caller can size a buffer before any state exists.

use crate::config::{DeflateConfig, InflateConfig};

/// `pos_size` in the compression sizing formula: window and hash positions
/// are stored as 16-bit offsets.
const POS_SIZE: usize = 2;

/// Conservative estimate of the deflate engine's own scalar state (window
/// cursors, bit accumulator, dynamic-tree frequency/code arrays, pending
/// buffer bookkeeping) — everything in a compression stream that isn't a
/// `mem_level`/`window_bits`-scaled buffer.
const DEFLATE_STATE_SIZE: usize = 8192;

/// Conservative estimate of the inflate engine's own scalar state (mode
/// enum, bit accumulator, code-table scratch below the `ENOUGH` arena,
/// gzip header scratch).
const INFLATE_STATE_SIZE: usize = 8192;

/// Bytes the [`crate::pool::Pool`] backing a compression stream must supply
/// for the given parameters (§6).
pub fn deflate_work_size(cfg: &DeflateConfig) -> usize {
    let w_size = cfg.w_size();
    let hash_bits = cfg.hash_bits();
    let lit_bufsize = cfg.lit_bufsize();

    DEFLATE_STATE_SIZE
        + w_size * (2 * 1 + 2 * POS_SIZE)
        + (1usize << hash_bits) * POS_SIZE
        + lit_bufsize * 4
}

/// Bytes the pool backing a decompression stream must supply (§6).
pub fn inflate_work_size(cfg: &InflateConfig) -> usize {
    INFLATE_STATE_SIZE + cfg.w_size()
}

/// Conservative deflate output bound: always safe, independent of level or
/// strategy (§6, "conservative upper bound").
pub fn deflate_bound_conservative(source_len: usize, wrap_overhead: usize) -> usize {
    source_len + source_len.div_ceil(8) + source_len.div_ceil(64) + 5 + wrap_overhead
}

/// Tight deflate output bound for default parameters (§6, "tight bound").
/// Only valid when `level` and `strategy` are left at their defaults; a
/// caller using non-default parameters must use
/// [`deflate_bound_conservative`] instead.
pub fn deflate_bound_tight(source_len: usize, wrap_overhead: usize) -> usize {
    let base = source_len
        + source_len / 4096
        + source_len / 16384
        + source_len / 33_554_432
        + 13;
    base.saturating_sub(6) + wrap_overhead
}

/// Extra bytes an independent-block compression needs on top of a plain
/// bound, to cover the `00 00 FF FF` marker each `FULL_FLUSH` inserts
/// between blocks (§6, "Independent-block bound").
pub fn independent_block_overhead(bound: usize, max_block_len: usize) -> usize {
    debug_assert!(max_block_len > 0);
    4 * bound.div_ceil(max_block_len)
}

/// Header/trailer overhead contributed by the wrap mode, for use with the
/// two deflate bound functions above.
pub fn wrap_overhead(wrap: crate::config::Wrap) -> usize {
    match wrap {
        crate::config::Wrap::Raw => 0,
        crate::config::Wrap::Zlib => 2 + 4, // 2-byte header + 4-byte Adler-32
        crate::config::Wrap::Gzip => 10 + 8, // 10-byte header + CRC32 + ISIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeflateConfig, InflateConfig, Strategy};

    #[test]
    fn conservative_bound_dominates_tight_bound_for_default_params() {
        let n = 100_000;
        assert!(deflate_bound_conservative(n, 0) >= deflate_bound_tight(n, 0));
    }

    #[test]
    fn independent_block_overhead_scales_with_block_count() {
        assert_eq!(independent_block_overhead(12_000, 4096), 4 * 3);
        assert_eq!(independent_block_overhead(4096, 4096), 4);
    }

    #[test]
    fn deflate_work_size_grows_with_window_and_mem_level() {
        let small = DeflateConfig::new(6, 9, 1, Strategy::Default).unwrap();
        let large = DeflateConfig::new(6, 15, 9, Strategy::Default).unwrap();
        assert!(deflate_work_size(&large) > deflate_work_size(&small));
    }

    #[test]
    fn inflate_work_size_scales_with_window_bits() {
        let small = InflateConfig::new(9).unwrap();
        let large = InflateConfig::new(15).unwrap();
        assert!(inflate_work_size(&large) > inflate_work_size(&small));
    }
}
