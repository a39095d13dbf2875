//! gzip (RFC 1952) framing: 10-byte header fields, optional extra/name/
//! comment/HCRC, and the CRC-32 + ISIZE trailer (spec.md §4.5 "Header
//! emission").

use sdeflate::config::{DeflateConfig, Flush, InflateConfig, Strategy};
use sdeflate::deflate::{DeflateStream, GzipHeader};
use sdeflate::error::Code;
use sdeflate::inflate::InflateStream;
use sdeflate::sizing::{deflate_work_size, inflate_work_size};
use sdeflate::stream::Cursor;

const GZIP_WBITS: i32 = 15 + 16;

#[test]
fn default_gzip_header_round_trips() {
    let cfg = DeflateConfig::new(6, GZIP_WBITS, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut stream = DeflateStream::new(&mut work, cfg).unwrap();

    let mut src = b"gzip-wrapped payload, gzip-wrapped payload".repeat(30);
    let mut dst = vec![0u8; stream.bound(src.len())];
    let mut in_cur = Cursor::new(&mut src);
    let mut out_cur = Cursor::new(&mut dst);
    stream.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    dst.truncate(out_cur.consumed());

    assert_eq!(&dst[0..2], &[0x1f, 0x8b]);
    assert_eq!(dst[2], 8); // CM = deflate
    assert_eq!(dst[9], 255); // OS unknown by default

    let icfg = InflateConfig::new(GZIP_WBITS).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut out = vec![0u8; src.len() + 64];
    let mut in_cur = Cursor::new(&mut dst);
    let mut out_cur = Cursor::new(&mut out);
    let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    assert_eq!(code, Code::StreamEnd);
}

#[test]
fn gzip_header_with_extra_name_comment_and_hcrc_round_trips() {
    let cfg = DeflateConfig::new(6, GZIP_WBITS, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut stream = DeflateStream::new(&mut work, cfg).unwrap();
    stream
        .set_gzip_header(GzipHeader {
            mtime: 1_700_000_000,
            os: 3, // Unix
            extra: Some(b"extra-field-bytes"),
            name: Some(b"archive.txt"),
            comment: Some(b"a test comment"),
            hcrc: true,
        })
        .unwrap();

    let mut src = b"payload with a full gzip header attached".to_vec();
    let mut dst = vec![0u8; stream.bound(src.len()) + 128];
    let mut in_cur = Cursor::new(&mut src);
    let mut out_cur = Cursor::new(&mut dst);
    stream.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    dst.truncate(out_cur.consumed());

    assert_eq!(dst[3] & 0x04, 0x04); // FEXTRA
    assert_eq!(dst[3] & 0x08, 0x08); // FNAME
    assert_eq!(dst[3] & 0x10, 0x10); // FCOMMENT
    assert_eq!(dst[3] & 0x02, 0x02); // FHCRC
    assert_eq!(dst[9], 3);

    let icfg = InflateConfig::new(GZIP_WBITS).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut out = vec![0u8; 128];
    let mut in_cur = Cursor::new(&mut dst);
    let mut out_cur = Cursor::new(&mut out);
    let code = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    assert_eq!(code, Code::StreamEnd);
    assert_eq!(
        &out[..out_cur.consumed()],
        b"payload with a full gzip header attached"
    );
}

#[test]
fn truncated_isize_trailer_is_rejected() {
    let cfg = DeflateConfig::new(6, GZIP_WBITS, 8, Strategy::Default).unwrap();
    let mut work = vec![0u8; deflate_work_size(&cfg)];
    let mut stream = DeflateStream::new(&mut work, cfg).unwrap();

    let mut src = b"a gzip payload whose trailer we will corrupt".to_vec();
    let mut dst = vec![0u8; stream.bound(src.len())];
    let mut in_cur = Cursor::new(&mut src);
    let mut out_cur = Cursor::new(&mut dst);
    stream.deflate(&mut in_cur, &mut out_cur, Flush::Finish).unwrap();
    let n = out_cur.consumed();
    dst.truncate(n);

    // flip a byte in the trailing ISIZE field.
    let last = dst.len() - 1;
    dst[last] ^= 0xFF;

    let icfg = InflateConfig::new(GZIP_WBITS).unwrap();
    let mut iwork = vec![0u8; inflate_work_size(&icfg)];
    let mut inflator = InflateStream::new(&mut iwork, icfg).unwrap();
    let mut out = vec![0u8; src.len() + 64];
    let mut in_cur = Cursor::new(&mut dst);
    let mut out_cur = Cursor::new(&mut out);
    let result = inflator.inflate(&mut in_cur, &mut out_cur, Flush::Finish);
    assert!(result.is_err());
}
