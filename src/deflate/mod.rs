//! Public compression engine (§5 "Compression engine (deflate)", §6).
//!
//! Wires [`state::DeflateState`] and the five strategies in [`strategy`]
//! into the `init`/`deflate`/`end` life cycle: header/trailer framing for
//! the three wrap modes, the `Partial`/`Sync`/`Full`/`Block` flush variants
//! the strategies don't special-case themselves, and the chunked feed that
//! keeps the fixed-size pending buffer from ever needing to grow (see
//! [`strategy::fill_window`]'s doc comment for why that cap exists).

pub mod state;
pub mod strategy;

use crate::checksum::adler32;
use crate::config::{DeflateConfig, Flush, Strategy, Wrap};
use crate::error::{Code, DeflateError};
use crate::pool::Pool;
use crate::sizing::deflate_work_size;
use crate::stream::{Cursor, StreamStats};
use state::{DeflateState, Status};

/// Optional gzip member metadata, attached before the first [`DeflateStream::deflate`]
/// call via [`DeflateStream::set_gzip_header`] (§3 "gzip header fields").
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipHeader<'a> {
    pub mtime: u32,
    /// RFC 1952 OS byte; `255` ("unknown") if not set.
    pub os: u8,
    pub extra: Option<&'a [u8]>,
    pub name: Option<&'a [u8]>,
    pub comment: Option<&'a [u8]>,
    pub hcrc: bool,
}

/// A compression session over a caller-supplied work buffer (§3 "Stream
/// object" + "Compression state").
pub struct DeflateStream<'a> {
    state: DeflateState<'a>,
    pub stats: StreamStats,
    gzip_header: Option<GzipHeader<'a>>,
}

impl<'a> DeflateStream<'a> {
    /// `deflateInit2`-equivalent (§6 "init"). `work` must be at least
    /// [`deflate_work_size`] bytes for `cfg`.
    pub fn new(work: &'a mut [u8], cfg: DeflateConfig) -> Result<Self, DeflateError> {
        if work.len() < deflate_work_size(&cfg) {
            return Err(DeflateError::MemError);
        }
        let mut pool = Pool::new(work);
        let state = DeflateState::new(&mut pool, cfg)?;
        log::debug!(
            "deflate init: level={} window_bits={} mem_level={} wrap={:?} strategy={:?}",
            cfg.level, cfg.window_bits, cfg.mem_level, cfg.wrap, cfg.strategy
        );
        Ok(DeflateStream {
            state,
            stats: StreamStats::new(cfg.wrap),
            gzip_header: None,
        })
    }

    /// Attach gzip member metadata. Only valid for `Wrap::Gzip` streams, and
    /// only before the first `deflate` call.
    pub fn set_gzip_header(&mut self, header: GzipHeader<'a>) -> Result<(), DeflateError> {
        if self.state.cfg.wrap != Wrap::Gzip {
            return Err(DeflateError::StreamError("gzip header requires gzip wrap mode"));
        }
        if self.state.status != Status::Gzip {
            return Err(DeflateError::StreamError(
                "gzip header must be set before the first deflate call",
            ));
        }
        self.gzip_header = Some(header);
        Ok(())
    }

    /// Prime the match history with a preset dictionary (§6 "Preset
    /// dictionary"). Only valid before the first `deflate` call.
    pub fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), DeflateError> {
        if !matches!(self.state.status, Status::Init | Status::Gzip) {
            return Err(DeflateError::StreamError(
                "dictionary must be set before the first deflate call",
            ));
        }
        self.state.dict_adler = adler32(1, dict);
        strategy::seed_dictionary(&mut self.state, dict);
        Ok(())
    }

    pub fn total_in(&self) -> u64 {
        self.stats.total_in
    }

    pub fn total_out(&self) -> u64 {
        self.stats.total_out
    }

    pub fn msg(&self) -> Option<&'static str> {
        self.stats.msg
    }

    /// Bytes still buffered awaiting output space. An independent-block
    /// driver uses this to know a `Full`/`Finish` flush has been entirely
    /// drained before starting the next block (§5 "Independent-block
    /// driver").
    pub fn pending_len(&self) -> usize {
        self.state.pending.len()
    }

    /// Conservative output bound for `source_len` more input under this
    /// stream's wrap mode (§6 "deflateBound").
    pub fn bound(&self, source_len: usize) -> usize {
        crate::sizing::deflate_bound_conservative(
            source_len,
            crate::sizing::wrap_overhead(self.state.cfg.wrap),
        )
    }

    fn write_header_if_needed(&mut self) {
        match self.state.status {
            Status::Init => {
                if self.state.cfg.wrap == Wrap::Zlib {
                    emit_zlib_header(&mut self.state);
                }
                self.state.status = Status::Busy;
            }
            Status::Gzip => {
                emit_gzip_header(&mut self.state, self.gzip_header.as_ref());
                self.state.status = Status::Busy;
            }
            _ => {}
        }
    }

    fn drain_pending(&mut self, output: &mut Cursor<'_, u8>) {
        let n = output.remaining().min(self.state.pending.len());
        if n == 0 {
            return;
        }
        output.unwritten_mut()[..n].copy_from_slice(&self.state.pending.as_slice()[..n]);
        output.advance(n);
        self.stats.total_out += n as u64;
        self.state.pending.consume(n);
    }

    /// Compress as much of `input` into `output` as the buffers and `flush`
    /// request allow (§6 "deflate"). Call repeatedly, supplying more output
    /// space, until the returned code is `StreamEnd` (only reachable with
    /// `flush == Finish`).
    pub fn deflate(
        &mut self,
        input: &mut Cursor<'_, u8>,
        output: &mut Cursor<'_, u8>,
        flush: Flush,
    ) -> Result<Code, DeflateError> {
        if self.state.status == Status::Finish {
            self.drain_pending(output);
            return Ok(if self.state.pending.is_empty() {
                Code::StreamEnd
            } else {
                Code::Ok
            });
        }

        self.write_header_if_needed();
        self.drain_pending(output);

        let total_in_before = self.stats.total_in;
        let total_out_before = self.stats.total_out;
        let chunk = self.state.cfg.lit_bufsize().max(1);

        loop {
            if output.remaining() == 0 && !self.state.pending.is_empty() {
                break;
            }

            let remaining_in = input.remaining();
            let is_last_chunk = remaining_in <= chunk;
            let pass_flush = if is_last_chunk { flush } else { Flush::NoFlush };

            let pos_before = input.consumed();
            let mut budget = chunk;
            let finished = dispatch(&mut self.state, input, &mut budget, pass_flush);
            let consumed = input.consumed_range(pos_before);
            if !consumed.is_empty() {
                self.stats.total_in += consumed.len() as u64;
                if self.stats.wrap != Wrap::Raw {
                    self.stats.check = self.stats.check_kind.update(self.stats.check, consumed);
                }
            }

            self.drain_pending(output);

            if finished {
                log::debug!("deflate: final block emitted, total_in={}", self.stats.total_in);
                emit_trailer(&mut self.state, &self.stats);
                self.state.status = Status::Finish;
                self.drain_pending(output);
                break;
            }

            if !is_last_chunk {
                if output.remaining() == 0 && !self.state.pending.is_empty() {
                    break;
                }
                continue;
            }

            if input.remaining() == 0 {
                apply_flush_marker(&mut self.state, flush);
                self.drain_pending(output);
            }
            break;
        }

        let progressed = self.stats.total_in != total_in_before
            || self.stats.total_out != total_out_before
            || self.state.status == Status::Finish;
        if !progressed && flush != Flush::NoFlush {
            return Err(DeflateError::BufError);
        }

        Ok(if self.state.status == Status::Finish && self.state.pending.is_empty() {
            Code::StreamEnd
        } else {
            Code::Ok
        })
    }

    /// Release the stream. Returns `StreamError` if compression had not
    /// reached `Finish` yet (mirrors `deflateEnd`'s `Z_DATA_ERROR` when
    /// called early, generalized to this crate's `Code` taxonomy).
    pub fn end(self) -> Code {
        if self.state.status == Status::Finish {
            Code::Ok
        } else {
            Code::StreamError
        }
    }
}

fn dispatch(
    state: &mut DeflateState,
    input: &mut Cursor<'_, u8>,
    budget: &mut usize,
    flush: Flush,
) -> bool {
    if state.cfg.level == 0 {
        return strategy::deflate_stored(state, input, budget, flush);
    }
    match state.cfg.strategy {
        Strategy::Rle => strategy::deflate_rle(state, input, budget, flush),
        Strategy::HuffmanOnly => strategy::deflate_huff(state, input, budget, flush),
        _ if state.cfg.level <= 3 => strategy::deflate_fast(state, input, budget, flush),
        _ => strategy::deflate_slow(state, input, budget, flush),
    }
}

/// Apply the block-ending behaviour that distinguishes `Partial`/`Sync`/
/// `Full`/`Block` from plain `NoFlush`, once the engine has consumed all
/// input currently available (§4.5, §GLOSSARY "Sync marker").
fn apply_flush_marker(state: &mut DeflateState, flush: Flush) {
    match flush {
        Flush::Partial => strategy::end_block_partial(state),
        Flush::Block => strategy::end_block_aligned(state),
        Flush::Sync => strategy::emit_sync_marker(state),
        Flush::Full => {
            strategy::emit_sync_marker(state);
            strategy::clear_hash_history(state);
            log::trace!("deflate: full flush, hash history cleared");
        }
        Flush::NoFlush | Flush::Finish | Flush::Trees => {}
    }
}

fn emit_zlib_header(state: &mut DeflateState) {
    let cinfo = (state.cfg.window_bits - 8) as u8;
    let cmf = (cinfo << 4) | 8; // CM = 8 (deflate)
    let level_flag: u8 = match state.cfg.level {
        0 => 0,
        1..=5 => 1,
        6 => 2,
        _ => 3,
    };
    let fdict = state.dict_adler != 1;
    let mut flg = (level_flag << 6) | if fdict { 0x20 } else { 0 };
    let check = ((cmf as u16) * 256 + flg as u16) % 31;
    if check != 0 {
        flg += (31 - check) as u8;
    }
    state.pending.push(cmf);
    state.pending.push(flg);
    if fdict {
        state.pending.extend_from_slice(&state.dict_adler.to_be_bytes());
    }
}

fn emit_gzip_header(state: &mut DeflateState, header: Option<&GzipHeader>) {
    let mtime = header.map(|h| h.mtime).unwrap_or(0);
    let os = header.map(|h| h.os).unwrap_or(255);
    let extra = header.and_then(|h| h.extra);
    let name = header.and_then(|h| h.name);
    let comment = header.and_then(|h| h.comment);
    let hcrc = header.map(|h| h.hcrc).unwrap_or(false);

    let mut flg = 0u8;
    if extra.is_some() {
        flg |= 0x04;
    }
    if name.is_some() {
        flg |= 0x08;
    }
    if comment.is_some() {
        flg |= 0x10;
    }
    if hcrc {
        flg |= 0x02;
    }

    state.pending.push(0x1f);
    state.pending.push(0x8b);
    state.pending.push(8); // CM = deflate
    state.pending.push(flg);
    state.pending.extend_from_slice(&mtime.to_le_bytes());
    let xfl: u8 = match state.cfg.level {
        9 => 2,
        0 | 1 => 4,
        _ => 0,
    };
    state.pending.push(xfl);
    state.pending.push(os);

    if let Some(extra) = extra {
        state.pending.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        state.pending.extend_from_slice(extra);
    }
    if let Some(name) = name {
        state.pending.extend_from_slice(name);
        state.pending.push(0);
    }
    if let Some(comment) = comment {
        state.pending.extend_from_slice(comment);
        state.pending.push(0);
    }
    if hcrc {
        let crc = crate::checksum::crc32(0, state.pending.as_slice());
        state.pending.extend_from_slice(&(crc as u16).to_le_bytes());
    }
}

fn emit_trailer(state: &mut DeflateState, stats: &StreamStats) {
    match stats.wrap {
        Wrap::Zlib => {
            state.pending.extend_from_slice(&stats.check.to_be_bytes());
        }
        Wrap::Gzip => {
            state.pending.extend_from_slice(&stats.check.to_le_bytes());
            state.pending.extend_from_slice(&(stats.total_in as u32).to_le_bytes());
        }
        Wrap::Raw => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;

    fn cfg(level: i32, window_bits: i32, wrap_is_zlib: bool) -> DeflateConfig {
        let wb = if wrap_is_zlib { window_bits } else { -window_bits };
        DeflateConfig::new(level, wb, 8, Strategy::Default).unwrap()
    }

    #[test]
    fn raw_stream_round_trip_bytes_match_through_pending() {
        let c = cfg(6, 15, false);
        let mut work = vec![0u8; deflate_work_size(&c)];
        let mut stream = DeflateStream::new(&mut work, c).unwrap();

        let data = b"the quick brown fox jumps over the lazy dog ".repeat(50);
        let mut in_buf = data.clone();
        let mut out_buf = vec![0u8; stream.bound(data.len())];
        let mut input = Cursor::new(&mut in_buf);
        let mut output = Cursor::new(&mut out_buf);

        let code = stream.deflate(&mut input, &mut output, Flush::Finish).unwrap();
        assert_eq!(code, Code::StreamEnd);
        assert_eq!(input.remaining(), 0);
        assert!(output.consumed() > 0);
        assert!(output.consumed() < data.len());
    }

    #[test]
    fn zlib_header_is_multiple_of_31() {
        let c = cfg(6, 15, true);
        let mut work = vec![0u8; deflate_work_size(&c)];
        let mut stream = DeflateStream::new(&mut work, c).unwrap();
        let mut in_buf = *b"abc";
        let mut out_buf = vec![0u8; 64];
        let mut input = Cursor::new(&mut in_buf);
        let mut output = Cursor::new(&mut out_buf);
        stream.deflate(&mut input, &mut output, Flush::Finish).unwrap();
        let produced = output.consumed();
        let header = ((out_buf[0] as u16) << 8) | out_buf[1] as u16;
        assert_eq!(header % 31, 0);
        assert!(produced >= 6);
    }

    #[test]
    fn full_flush_then_more_input_still_decodes_independently() {
        let c = cfg(6, 15, false);
        let mut work = vec![0u8; deflate_work_size(&c)];
        let mut stream = DeflateStream::new(&mut work, c).unwrap();

        let mut in_buf = *b"first segment of data";
        let mut out_buf = vec![0u8; 4096];
        {
            let mut input = Cursor::new(&mut in_buf);
            let mut output = Cursor::new(&mut out_buf);
            let code = stream.deflate(&mut input, &mut output, Flush::Full).unwrap();
            assert_eq!(code, Code::Ok);
            assert_eq!(input.remaining(), 0);
            // the last four bytes written must be the sync marker
            let n = output.consumed();
            assert_eq!(&out_buf[n - 4..n], &[0x00, 0x00, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn no_progress_with_finish_requested_and_zero_output_space_is_buf_error() {
        let c = cfg(6, 15, false);
        let mut work = vec![0u8; deflate_work_size(&c)];
        let mut stream = DeflateStream::new(&mut work, c).unwrap();
        let mut in_buf = *b"some data";
        let mut out_buf: Vec<u8> = Vec::new();
        let mut input = Cursor::new(&mut in_buf);
        let mut output = Cursor::new(&mut out_buf);
        let err = stream.deflate(&mut input, &mut output, Flush::Finish).unwrap_err();
        assert_eq!(err, DeflateError::BufError);
    }

    #[test]
    fn large_input_does_not_overflow_pending_buffer() {
        // Exercises the per-chunk budget cap in `dispatch`/`fill_window`:
        // without it this many bytes in one call would overrun `pending`.
        let c = DeflateConfig::new(1, -15, 1, Strategy::Default).unwrap();
        let mut work = vec![0u8; deflate_work_size(&c)];
        let mut stream = DeflateStream::new(&mut work, c).unwrap();

        let mut in_buf = vec![0u8; 500_000];
        for (i, b) in in_buf.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let mut out_buf = vec![0u8; stream.bound(in_buf.len())];
        let mut input = Cursor::new(&mut in_buf);
        let mut output = Cursor::new(&mut out_buf);
        let code = stream.deflate(&mut input, &mut output, Flush::Finish).unwrap();
        assert_eq!(code, Code::StreamEnd);
        assert_eq!(input.remaining(), 0);
    }
}
