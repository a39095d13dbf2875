//! Stream object (§3 "Stream object").
//!
//! Holds the input/output cursors, running totals, and the running check
//! value shared by both the deflate and inflate engines. The engine-specific
//! state (window, hash tables, Huffman trees, mode machine) lives in
//! [`crate::deflate::state::DeflateState`] / [`crate::inflate::state::InflateState`]
//! instead of behind an `opaque pointer` the way the spec's source C does it
//! — Rust's enums give us a closed, typed alternative to a `void *`.

use crate::config::Wrap;

/// Which running checksum a stream tracks, chosen by wrap mode (§3,
/// "running check value (Adler-32 or CRC-32)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Adler32,
    Crc32,
    /// Raw streams track nothing; the field stays 0 and no trailer is
    /// emitted or verified.
    None,
}

impl CheckKind {
    pub fn for_wrap(wrap: Wrap) -> Self {
        match wrap {
            Wrap::Raw => CheckKind::None,
            Wrap::Zlib => CheckKind::Adler32,
            Wrap::Gzip => CheckKind::Crc32,
        }
    }

    pub fn initial(self) -> u32 {
        match self {
            CheckKind::Adler32 => 1,
            CheckKind::Crc32 | CheckKind::None => 0,
        }
    }

    pub fn update(self, running: u32, data: &[u8]) -> u32 {
        match self {
            CheckKind::Adler32 => crate::checksum::adler32(running, data),
            CheckKind::Crc32 => crate::checksum::crc32(running, data),
            CheckKind::None => running,
        }
    }
}

/// Binary / text / unknown data-type hint (§3). Only `Binary`/`Text` are
/// exported per the §9 design note retiring the historical ASCII alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    Binary,
    Text,
    #[default]
    Unknown,
}

/// Cursor + remaining-count pair over a caller-owned byte span, shared shape
/// for the input side (read-only) and output side (write-only) of a stream
/// (§3, §5 "Shared-resource policy").
pub struct Cursor<'a, T> {
    buf: &'a mut [T],
    pos: usize,
}

impl<'a, T> Cursor<'a, T> {
    pub fn new(buf: &'a mut [T]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.buf.len());
        self.pos += n;
    }
}

impl<'a> Cursor<'a, u8> {
    pub fn unread(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    pub fn unwritten_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.pos..]
    }

    /// Bytes consumed since `since` (a previously captured [`Cursor::consumed`]
    /// value), for running a checksum over exactly what one call advanced
    /// past without holding a borrow across that call.
    pub fn consumed_range(&self, since: usize) -> &[u8] {
        &self.buf[since..self.pos]
    }
}

/// Shared bookkeeping for one compression or decompression session (§3,
/// "Stream object"): totals, running check, diagnostic message, data-type
/// hint, and wrap mode. Input/output spans are borrowed per-call rather than
/// stored, since each step call supplies fresh slices (mirrors the teacher
/// crate's preference for borrowing short-lived spans over owning handles,
/// see its `block/stream.rs` discussion of dictionary-attachment lifetimes).
#[derive(Debug, Clone)]
pub struct StreamStats {
    pub total_in: u64,
    pub total_out: u64,
    pub check: u32,
    pub check_kind: CheckKind,
    pub data_type: DataType,
    pub msg: Option<&'static str>,
    pub wrap: Wrap,
}

impl StreamStats {
    pub fn new(wrap: Wrap) -> Self {
        let check_kind = CheckKind::for_wrap(wrap);
        StreamStats {
            total_in: 0,
            total_out: 0,
            check: check_kind.initial(),
            check_kind,
            data_type: DataType::Unknown,
            msg: None,
            wrap,
        }
    }

    pub fn record_input(&mut self, n: usize) {
        self.total_in += n as u64;
    }

    pub fn record_output(&mut self, data: &[u8]) {
        self.total_out += data.len() as u64;
        self.check = self.check_kind.update(self.check, data);
    }

    pub fn set_msg(&mut self, msg: &'static str) {
        self.msg = Some(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_position() {
        let mut buf = [1u8, 2, 3, 4, 5];
        let mut c = Cursor::new(&mut buf);
        assert_eq!(c.remaining(), 5);
        c.advance(2);
        assert_eq!(c.remaining(), 3);
        assert_eq!(c.unread(), &[3, 4, 5]);
    }

    #[test]
    fn stats_track_totals_and_checksum() {
        let mut s = StreamStats::new(Wrap::Zlib);
        assert_eq!(s.check, 1);
        s.record_input(5);
        s.record_output(b"hello");
        assert_eq!(s.total_in, 5);
        assert_eq!(s.total_out, 5);
        assert_eq!(s.check, crate::checksum::adler32(1, b"hello"));
    }

    #[test]
    fn consumed_range_reports_bytes_advanced_past() {
        let mut buf = [10u8, 20, 30, 40, 50];
        let mut c = Cursor::new(&mut buf);
        let since = c.consumed();
        c.advance(3);
        assert_eq!(c.consumed_range(since), &[10, 20, 30]);
    }

    #[test]
    fn raw_wrap_tracks_no_checksum() {
        let mut s = StreamStats::new(Wrap::Raw);
        assert_eq!(s.check, 0);
        s.record_output(b"anything");
        assert_eq!(s.check, 0);
    }
}
