//! L7 — independent-block driver (§4.7).
//!
//! A thin loop on top of [`crate::deflate::DeflateStream`] /
//! [`crate::inflate::InflateStream`] that lets a caller split a large input
//! into recoverable segments: the compression side issues `Flush::Full`
//! between segments so each is decodable on its own, and the decompression
//! side calls [`crate::inflate::InflateStream::sync`] to skip past a
//! corrupted segment instead of failing the whole payload (§GLOSSARY
//! "Independent block").

use crate::config::{Flush, InflateConfig};
use crate::deflate::DeflateStream;
use crate::error::{Code, DeflateError, InflateError};
use crate::inflate::InflateStream;
use crate::stream::Cursor;

/// Compress `source` in chunks of at most `max_block_len` bytes, issuing a
/// `Flush::Full` between chunks and a `Flush::Finish` on the last one, so
/// the `00 00 FF FF` marker (§GLOSSARY "Sync marker") separates every block
/// from its neighbours (§4.7 "Compression driver").
///
/// `dest` must be at least as large as the bound computed from
/// [`crate::sizing::deflate_bound_conservative`] plus
/// [`crate::sizing::independent_block_overhead`] for `max_block_len`; if it
/// is too small this returns `BufError` rather than writing a truncated
/// stream.
///
/// Loop iterations are bounded by `source.len() / max_block_len +
/// dest.len() / max_block_len + 8` (§9 open question 2: a derived, provable
/// bound replacing the original's ad hoc `dest/max_block + source/max_block
/// + 10`) — each iteration either consumes at least one input chunk or
/// produces at least one output chunk, and the `+8` covers the header,
/// trailer, and final drain that consume neither.
pub fn compress_independent_blocks(
    stream: &mut DeflateStream<'_>,
    source: &[u8],
    dest: &mut [u8],
    max_block_len: usize,
) -> Result<usize, DeflateError> {
    assert!(max_block_len > 0, "max_block_len must be nonzero");

    let iteration_bound = source.len().div_ceil(max_block_len) + dest.len().div_ceil(max_block_len) + 8;
    let mut out_cur = Cursor::new(dest);
    let mut pos = 0usize;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        assert!(
            iterations <= iteration_bound,
            "independent-block compress driver exceeded its provable iteration bound"
        );

        let remaining = source.len() - pos;
        let take = remaining.min(max_block_len);
        let is_last = take == remaining;
        let flush = if is_last { Flush::Finish } else { Flush::Full };

        // Feed exactly one block's worth of input per flush: a fresh
        // cursor over just this block's bytes guarantees `deflate` sees
        // `remaining_in <= chunk` at the block boundary and applies the
        // requested flush there, not partway through the next block.
        let mut block_buf = source[pos..pos + take].to_vec();
        let mut block_cur = Cursor::new(&mut block_buf);

        loop {
            let code = stream.deflate(&mut block_cur, &mut out_cur, flush)?;
            if code == Code::StreamEnd {
                break;
            }
            if block_cur.remaining() == 0 && stream.pending_len() == 0 {
                break;
            }
            if out_cur.remaining() == 0 {
                return Err(DeflateError::BufError);
            }
        }
        pos += take;
        if is_last {
            break;
        }
    }

    Ok(out_cur.consumed())
}

/// Outcome of [`decompress_independent_blocks`]: the bytes produced, and
/// whether any segment failed to decode (§4.7 "Decompression driver": "the
/// final return is `data-error` if so, even if subsequent blocks decoded
/// cleanly").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveredLen {
    pub produced: usize,
    pub had_data_error: bool,
}

/// Decompress `source` into `dest`, resynchronizing past corrupted segments
/// via [`InflateStream::sync`] rather than aborting the whole payload
/// (§4.7 "Decompression driver", §8 boundary scenario 5). Output already
/// written before an error is never rolled back.
pub fn decompress_independent_blocks(
    cfg: InflateConfig,
    work: &mut [u8],
    source: &[u8],
    dest: &mut [u8],
) -> Result<RecoveredLen, InflateError> {
    let mut inflator = InflateStream::new(work, cfg)?;
    let mut src = source.to_vec();
    let mut in_cur = Cursor::new(&mut src);
    let mut out_cur = Cursor::new(dest);
    let mut had_data_error = false;

    let iteration_bound = source.len() + dest.len() + 8;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        assert!(
            iterations <= iteration_bound,
            "independent-block decompress driver exceeded its provable iteration bound"
        );

        match inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish) {
            Ok(Code::StreamEnd) => break,
            Ok(Code::Ok) => {
                // Ran out of output space with more work to do; the caller
                // sized `dest` too small for the whole payload.
                if out_cur.remaining() == 0 {
                    break;
                }
                if in_cur.remaining() == 0 {
                    break;
                }
            }
            Ok(_) => unreachable!("inflate only ever returns Ok or StreamEnd here"),
            Err(InflateError::DataError(_)) => {
                had_data_error = true;
                log::warn!("independent_blocks: data error, attempting resync");
                if inflator.sync(&mut in_cur).is_err() {
                    break;
                }
            }
            Err(e @ InflateError::BufError) => {
                if out_cur.remaining() == 0 || in_cur.remaining() == 0 {
                    break;
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(RecoveredLen {
        produced: out_cur.consumed(),
        had_data_error,
    })
}
