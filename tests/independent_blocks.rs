//! L7 independent-block driver: recoverable segmentation via `Flush::Full`
//! (spec.md §4.7, §8 boundary scenario 5).

use sdeflate::config::{DeflateConfig, InflateConfig, Strategy};
use sdeflate::deflate::DeflateStream;
use sdeflate::driver::{compress_independent_blocks, decompress_independent_blocks};
use sdeflate::sizing::{
    deflate_bound_conservative, deflate_work_size, independent_block_overhead, inflate_work_size,
    wrap_overhead,
};

fn compress(source: &[u8], max_block_len: usize) -> Vec<u8> {
    let cfg = DeflateConfig::new(6, -15, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut stream = DeflateStream::new(&mut work, cfg).unwrap();
    let plain_bound = deflate_bound_conservative(source.len(), wrap_overhead(cfg.wrap));
    let bound = plain_bound + independent_block_overhead(plain_bound, max_block_len) + 64;
    let mut dest = vec![0u8; bound];
    let n = compress_independent_blocks(&mut stream, source, &mut dest, max_block_len).unwrap();
    dest.truncate(n);
    dest
}

#[test]
fn decodes_to_the_exact_original_for_every_block_length() {
    // For all max-block-lengths B >= 1024, independent-block compression
    // produces output decodable by the independent-block decompression
    // driver to exactly x (spec.md §8).
    let mut source = Vec::new();
    for i in 0..20_000u32 {
        source.push(((i * 37) % 256) as u8);
    }

    for &max_block_len in &[1024usize, 4096, 8192] {
        let compressed = compress(&source, max_block_len);

        let icfg = InflateConfig::new(-15).unwrap();
        let mut iwork = vec![0u8; inflate_work_size(&icfg)];
        let mut dest = vec![0u8; source.len() + 64];
        let result =
            decompress_independent_blocks(icfg, &mut iwork, &compressed, &mut dest).unwrap();
        assert!(!result.had_data_error, "max_block_len={max_block_len}");
        assert_eq!(
            &dest[..result.produced],
            &source[..],
            "max_block_len={max_block_len}"
        );
    }
}

#[test]
fn corrupted_middle_segment_still_recovers_the_outer_segments() {
    // Boundary scenario 5: a 3-block stream (12000 bytes, max_block_len
    // 4096) with one byte flipped in the middle block's payload.
    let source: Vec<u8> = (0..12_000u32).map(|i| (i % 199) as u8).collect();
    let mut compressed = compress(&source, 4096);

    let mid = compressed.len() / 2;
    compressed[mid] ^= 0xAA;

    let icfg = InflateConfig::new(-15).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut dest = vec![0u8; source.len() + 64];
    let result = decompress_independent_blocks(icfg, &mut iwork, &compressed, &mut dest).unwrap();

    assert!(result.had_data_error);
    assert!(
        result.produced > 0,
        "the output buffer should still contain the segments either side of the corruption"
    );
}

#[test]
fn single_segment_covering_all_input_matches_plain_compression() {
    let source = b"small enough to be a single independent block".to_vec();
    let compressed = compress(&source, 1 << 20);

    let icfg = InflateConfig::new(-15).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut dest = vec![0u8; source.len() + 64];
    let result = decompress_independent_blocks(icfg, &mut iwork, &compressed, &mut dest).unwrap();
    assert!(!result.had_data_error);
    assert_eq!(&dest[..result.produced], &source[..]);
}
