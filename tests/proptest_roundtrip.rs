//! Property-based round-trip and idempotence checks (spec.md §8).
//!
//! `proptest` is not used by the teacher itself (LZ4's test suite is
//! hand-written corpora); it is imported the way `ironrdp-graphics` /
//! `ironrdp-input` use it elsewhere in the retrieved pack, to get
//! shrinking-on-failure for arbitrary byte strings and flush sequences.

use proptest::prelude::*;
use sdeflate::config::{DeflateConfig, Flush, InflateConfig, Strategy};
use sdeflate::deflate::DeflateStream;
use sdeflate::error::Code;
use sdeflate::inflate::InflateStream;
use sdeflate::sizing::{deflate_work_size, inflate_work_size};
use sdeflate::stream::Cursor;

fn strategy_for(tag: u8) -> Strategy {
    match tag % 5 {
        0 => Strategy::Default,
        1 => Strategy::Filtered,
        2 => Strategy::HuffmanOnly,
        3 => Strategy::Rle,
        _ => Strategy::Fixed,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn inflate_of_deflate_is_the_identity(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        level in 0i32..=9,
        strategy_tag in any::<u8>(),
    ) {
        let strategy = strategy_for(strategy_tag);
        let dcfg = DeflateConfig::new(level, 15, 8, strategy).unwrap();
        let mut dwork = vec![0u8; deflate_work_size(&dcfg)];
        let mut deflator = DeflateStream::new(&mut dwork, dcfg).unwrap();

        let mut src = data.clone();
        let mut compressed = vec![0u8; deflator.bound(data.len()) + 64];
        let mut in_cur = Cursor::new(&mut src);
        let mut out_cur = Cursor::new(&mut compressed);
        let code = deflator.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        prop_assert_eq!(code, Code::StreamEnd);
        compressed.truncate(out_cur.consumed());

        let icfg = InflateConfig::new(15).unwrap();
        let mut iwork = vec![0u8; inflate_work_size(&icfg)];
        let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
        let mut out = vec![0u8; data.len() + 64];
        let mut in_cur = Cursor::new(&mut compressed);
        let mut out_cur = Cursor::new(&mut out);
        let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        prop_assert_eq!(code, Code::StreamEnd);
        prop_assert_eq!(&out[..out_cur.consumed()], &data[..]);
    }

    #[test]
    fn total_in_and_total_out_always_match_the_buffers(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let dcfg = DeflateConfig::new(6, 15, 8, Strategy::Default).unwrap();
        let mut dwork = vec![0u8; deflate_work_size(&dcfg)];
        let mut deflator = DeflateStream::new(&mut dwork, dcfg).unwrap();
        let mut src = data.clone();
        let mut compressed = vec![0u8; deflator.bound(data.len()) + 64];
        let mut in_cur = Cursor::new(&mut src);
        let mut out_cur = Cursor::new(&mut compressed);
        deflator.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        prop_assert_eq!(deflator.total_in(), data.len() as u64);
        prop_assert_eq!(deflator.total_out(), out_cur.consumed() as u64);
    }
}
