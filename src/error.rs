//! Error and return-code taxonomy.
//!
//! Mirrors the manual `Display` + `std::error::Error` pattern the teacher
//! uses for `Lz4FError` (`frame/types.rs`) rather than pulling in
//! `thiserror`/`anyhow`: each layer gets its own small enum, and a single
//! `Code` enum reproduces the classic zlib-style integer contract (§6) for
//! callers that want one.

use core::fmt;

/// The numeric return-code contract from spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    StreamEnd = 1,
    NeedDict = 2,
    StreamError = -2,
    DataError = -3,
    MemError = -4,
    BufError = -5,
    VersionError = -6,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::Ok => "ok",
            Code::StreamEnd => "stream end",
            Code::NeedDict => "need dictionary",
            Code::StreamError => "stream error",
            Code::DataError => "data error",
            Code::MemError => "memory error",
            Code::BufError => "buffer error",
            Code::VersionError => "version error",
        };
        f.write_str(s)
    }
}

/// Error from the pool allocator (§4.1): a sub-allocation request exceeded
/// the remaining space in the caller-supplied work buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolError {
    pub requested: usize,
    pub remaining: usize,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool allocator: requested {} bytes, {} remaining",
            self.requested, self.remaining
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PoolError {}

/// Error from Huffman tree construction (§4.3). Should be unreachable for
/// the bounded alphabets (286/30/19 symbols) this crate ever builds trees
/// over; kept as a typed, defensive path rather than a panic (per §9,
/// "Exception-free error handling").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuffError {
    /// Code-length redistribution could not bring every length under the
    /// tree's `max_length` bound.
    LengthOverflow,
}

impl fmt::Display for HuffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HuffError::LengthOverflow => f.write_str("huffman: code length overflow"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HuffError {}

/// Errors produced by the deflate engine (§7 taxonomy, compression side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeflateError {
    /// Out-of-range `level`/`window_bits`/`mem_level`/`strategy`, or a
    /// parameter change that is invalid for the current stream state.
    StreamError(&'static str),
    /// The caller-supplied work buffer is smaller than `deflate_work_size`
    /// requires for the requested parameters.
    MemError,
    /// A step call made no progress (output full, or input exhausted while
    /// `FINISH` was requested) — not fatal, retry with more buffer/input.
    BufError,
}

impl fmt::Display for DeflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeflateError::StreamError(msg) => write!(f, "deflate stream error: {msg}"),
            DeflateError::MemError => f.write_str("deflate: insufficient work buffer"),
            DeflateError::BufError => f.write_str("deflate: no progress, need more buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeflateError {}

impl From<&DeflateError> for Code {
    fn from(e: &DeflateError) -> Code {
        match e {
            DeflateError::StreamError(_) => Code::StreamError,
            DeflateError::MemError => Code::MemError,
            DeflateError::BufError => Code::BufError,
        }
    }
}

/// Errors produced by the inflate engine (§7 taxonomy, decompression side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateError {
    /// Out-of-range parameters at init.
    StreamError(&'static str),
    /// Work buffer too small for `window_bits`.
    MemError,
    /// Malformed compressed stream: bad header, invalid Huffman code, bad
    /// back-reference distance, checksum mismatch. Sticky until
    /// `inflate_sync` recovers the stream.
    DataError(&'static str),
    /// No progress possible with the buffers given; not fatal.
    BufError,
    /// zlib header indicated a preset dictionary; caller must supply one
    /// matching `expected_adler`.
    NeedDict { expected_adler: u32 },
}

impl fmt::Display for InflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InflateError::StreamError(msg) => write!(f, "inflate stream error: {msg}"),
            InflateError::MemError => f.write_str("inflate: insufficient work buffer"),
            InflateError::DataError(msg) => write!(f, "inflate data error: {msg}"),
            InflateError::BufError => f.write_str("inflate: no progress, need more buffer/input"),
            InflateError::NeedDict { expected_adler } => {
                write!(f, "inflate: preset dictionary needed (adler32 {expected_adler:#010x})")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InflateError {}

impl From<&InflateError> for Code {
    fn from(e: &InflateError) -> Code {
        match e {
            InflateError::StreamError(_) => Code::StreamError,
            InflateError::MemError => Code::MemError,
            InflateError::DataError(_) => Code::DataError,
            InflateError::BufError => Code::BufError,
            InflateError::NeedDict { .. } => Code::NeedDict,
        }
    }
}
