//! Work-buffer sizing and output-bound properties (spec.md §6, §8: "No
//! sub-allocation from the pool ever exceeds `deflate_work_size` ... for any
//! valid parameter triple").

use sdeflate::config::{DeflateConfig, Flush, InflateConfig, Strategy};
use sdeflate::deflate::DeflateStream;
use sdeflate::error::{Code, DeflateError};
use sdeflate::inflate::InflateStream;
use sdeflate::sizing::{
    deflate_bound_conservative, deflate_bound_tight, deflate_work_size, inflate_work_size,
};
use sdeflate::stream::Cursor;

#[test]
fn exactly_sized_work_buffers_never_fail_to_allocate() {
    for window_bits in 8..=15 {
        for mem_level in 1..=9 {
            let dcfg = DeflateConfig::new(6, window_bits, mem_level, Strategy::Default).unwrap();
            let mut work = vec![0u8; deflate_work_size(&dcfg)];
            assert!(DeflateStream::new(&mut work, dcfg).is_ok());

            let icfg = InflateConfig::new(window_bits).unwrap();
            let mut iwork = vec![0u8; inflate_work_size(&icfg)];
            assert!(InflateStream::new(&mut iwork, icfg).is_ok());
        }
    }
}

#[test]
fn undersized_work_buffer_reports_mem_error_rather_than_panicking() {
    let dcfg = DeflateConfig::new(6, 15, 8, Strategy::Default).unwrap();
    let full = deflate_work_size(&dcfg);
    let mut work = vec![0u8; full - 1];
    assert_eq!(
        DeflateStream::new(&mut work, dcfg).unwrap_err(),
        DeflateError::MemError
    );
}

#[test]
fn conservative_bound_is_never_exceeded_for_default_parameters() {
    // For all compression runs with default parameters and input >= 256
    // bytes, the output size is bounded by deflate_bound(len) (spec.md §8).
    let cfg = DeflateConfig::new(-1, 15, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];

    for len in [256usize, 1_000, 10_000, 100_000] {
        let mut stream = DeflateStream::new(&mut work, cfg).unwrap();
        let mut src: Vec<u8> = (0..len).map(|i| ((i * 31 + 7) % 256) as u8).collect();
        let bound = deflate_bound_conservative(len, 2 + 4);
        let tight = deflate_bound_tight(len, 2 + 4);
        let mut dst = vec![0u8; bound];
        let mut in_cur = Cursor::new(&mut src);
        let mut out_cur = Cursor::new(&mut dst);
        let code = stream.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        assert_eq!(code, Code::StreamEnd);
        assert!(out_cur.consumed() <= bound, "exceeded conservative bound at len={len}");
        assert!(out_cur.consumed() <= tight, "exceeded tight bound at len={len}");
    }
}

#[test]
fn work_size_grows_monotonically_with_window_bits_and_mem_level() {
    let baseline = DeflateConfig::new(6, 9, 1, Strategy::Default).unwrap();
    let mut prev = deflate_work_size(&baseline);
    for window_bits in 10..=15 {
        let cfg = DeflateConfig::new(6, window_bits, 1, Strategy::Default).unwrap();
        let size = deflate_work_size(&cfg);
        assert!(size > prev, "window_bits={window_bits}");
        prev = size;
    }

    let mut prev = deflate_work_size(&DeflateConfig::new(6, 9, 1, Strategy::Default).unwrap());
    for mem_level in 2..=9 {
        let cfg = DeflateConfig::new(6, 9, mem_level, Strategy::Default).unwrap();
        let size = deflate_work_size(&cfg);
        assert!(size > prev, "mem_level={mem_level}");
        prev = size;
    }
}
