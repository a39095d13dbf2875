//! Safety-critical DEFLATE (RFC 1951), zlib (RFC 1950), and gzip (RFC 1952)
//! compression and decompression over a caller-supplied work buffer.
//!
//! No allocation after [`deflate::DeflateStream::new`] /
//! [`inflate::InflateStream::new`] have run; every working array the engine
//! needs (sliding window, hash chains, pending buffer, Huffman frequency
//! tables, decode-table arenas) is carved once out of the caller's `&mut
//! [u8]` by [`pool::Pool`]. See `SPEC_FULL.md` / `DESIGN.md` for the module
//! layout this crate follows.
//!
//! ```
//! use sdeflate::config::{DeflateConfig, InflateConfig, Strategy, Flush};
//! use sdeflate::deflate::DeflateStream;
//! use sdeflate::inflate::InflateStream;
//! use sdeflate::stream::Cursor;
//! use sdeflate::sizing::{deflate_work_size, inflate_work_size};
//! use sdeflate::error::Code;
//!
//! let dcfg = DeflateConfig::new(6, 15, 8, Strategy::Default).unwrap();
//! let mut dwork = vec![0u8; deflate_work_size(&dcfg)];
//! let mut deflator = DeflateStream::new(&mut dwork, dcfg).unwrap();
//!
//! let mut src = b"hello, hello!".to_vec();
//! let mut compressed = vec![0u8; deflator.bound(src.len())];
//! let mut in_cur = Cursor::new(&mut src);
//! let mut out_cur = Cursor::new(&mut compressed);
//! let code = deflator.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
//! assert_eq!(code, Code::StreamEnd);
//! compressed.truncate(out_cur.consumed());
//!
//! let icfg = InflateConfig::new(15).unwrap();
//! let mut iwork = vec![0u8; inflate_work_size(&icfg)];
//! let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
//! let mut out = vec![0u8; 64];
//! let mut in_cur = Cursor::new(&mut compressed);
//! let mut out_cur = Cursor::new(&mut out);
//! let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
//! assert_eq!(code, Code::StreamEnd);
//! assert_eq!(&out[..out_cur.consumed()], b"hello, hello!");
//! ```

pub mod bitio;
pub mod checksum;
pub mod config;
pub mod deflate;
pub mod driver;
pub mod error;
pub mod huffman;
pub mod inflate;
mod match_finder;
pub mod pool;
pub mod sizing;
pub mod stream;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common entry points.
// ─────────────────────────────────────────────────────────────────────────────

pub use config::{DeflateConfig, Flush, InflateConfig, Strategy, Wrap};
pub use deflate::{DeflateStream, GzipHeader};
pub use driver::{compress_independent_blocks, decompress_independent_blocks, RecoveredLen};
pub use error::{Code, DeflateError, InflateError};
pub use inflate::InflateStream;
pub use sizing::{deflate_bound_conservative, deflate_bound_tight, deflate_work_size, inflate_work_size};
pub use stream::Cursor;
