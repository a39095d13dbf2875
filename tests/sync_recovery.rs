//! `inflate_sync` resynchronization on the `00 00 FF FF` marker emitted by
//! `SYNC_FLUSH`/`FULL_FLUSH` (spec.md §4.6 "Resynchronization", §8 boundary
//! scenario 6).

use sdeflate::config::{DeflateConfig, Flush, InflateConfig, Strategy};
use sdeflate::deflate::DeflateStream;
use sdeflate::error::Code;
use sdeflate::inflate::InflateStream;
use sdeflate::sizing::{deflate_work_size, inflate_work_size};
use sdeflate::stream::Cursor;

#[test]
fn full_flush_then_finish_leaves_a_marker_between_segments() {
    let cfg = DeflateConfig::new(6, -15, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut stream = DeflateStream::new(&mut work, cfg).unwrap();

    let mut buf = vec![0u8; 8192];
    let produced_a;
    {
        let mut a = b"segment A content".to_vec();
        let mut in_cur = Cursor::new(&mut a);
        let mut out_cur = Cursor::new(&mut buf);
        let code = stream.deflate(&mut in_cur, &mut out_cur, Flush::Full).unwrap();
        assert_eq!(code, Code::Ok);
        produced_a = out_cur.consumed();
    }
    assert_eq!(&buf[produced_a - 4..produced_a], &[0x00, 0x00, 0xFF, 0xFF]);

    let total_len;
    {
        let mut b = b"segment B content, after the sync marker".to_vec();
        let mut in_cur = Cursor::new(&mut b);
        let mut tail = vec![0u8; 4096];
        let mut out_cur = Cursor::new(&mut tail);
        let code = stream.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        assert_eq!(code, Code::StreamEnd);
        let n = out_cur.consumed();
        buf[produced_a..produced_a + n].copy_from_slice(&tail[..n]);
        total_len = produced_a + n;
    }
    buf.truncate(total_len);

    // decompressing the whole stream yields A ++ B.
    let icfg = InflateConfig::new(-15).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut out = vec![0u8; 256];
    let mut whole = buf.clone();
    let mut in_cur = Cursor::new(&mut whole);
    let mut out_cur = Cursor::new(&mut out);
    let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    assert_eq!(code, Code::StreamEnd);
    assert_eq!(
        &out[..out_cur.consumed()],
        b"segment A contentsegment B content, after the sync marker"
    );
}

#[test]
fn sync_after_leading_garbage_finds_the_marker_and_resumes() {
    let cfg = DeflateConfig::new(6, -15, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut deflator = DeflateStream::new(&mut work, cfg).unwrap();

    let mut src = b"recoverable payload after a scan".to_vec();
    let mut tail = vec![0u8; 4096];
    let tail_len;
    {
        let mut in_cur = Cursor::new(&mut src);
        let mut out_cur = Cursor::new(&mut tail);
        deflator.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
        tail_len = out_cur.consumed();
    }
    tail.truncate(tail_len);

    let mut stream = vec![0x11u8, 0x22, 0x33, 0x44, 0x55]; // no marker in here
    stream.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF]);
    stream.extend_from_slice(&tail);

    let icfg = InflateConfig::new(-15).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut out = vec![0u8; 256];
    let mut in_cur = Cursor::new(&mut stream);
    let mut out_cur = Cursor::new(&mut out);

    inflator.sync(&mut in_cur).expect("marker must be found");
    let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    assert_eq!(code, Code::StreamEnd);
    assert_eq!(&out[..out_cur.consumed()], b"recoverable payload after a scan");
}

#[test]
fn sync_with_no_marker_present_reports_data_error_and_consumes_all_input() {
    let icfg = InflateConfig::new(-15).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut garbage = vec![0x55u8; 64];
    let mut in_cur = Cursor::new(&mut garbage);
    let err = inflator.sync(&mut in_cur).unwrap_err();
    assert!(matches!(err, sdeflate::error::InflateError::DataError(_)));
    assert_eq!(in_cur.remaining(), 0);
}
