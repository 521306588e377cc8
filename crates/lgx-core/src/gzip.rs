//! Deterministic gzip framing.
//!
//! Compression writes a fixed 10-byte header (no flags, mtime 0, XFL 0,
//! OS "unknown"), a raw-deflate body at the default level, and the standard
//! CRC-32 + size trailer. Every byte of the frame is either pinned here or
//! produced by the pinned deflate engine, so identical input yields identical
//! output on any host.
//!
//! Decompression accepts any valid single-member gzip stream, not just the
//! frames this module writes.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// The pinned gzip header: magic, deflate method, no flags, mtime 0, no
/// extra flags, OS unknown.
pub const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff];

/// True if `data` starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Compress `data` into a deterministic gzip frame.
///
/// Empty input is not special-cased: the empty deflate stream is the fixed
/// two-byte final block and the trailer fields are zero.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(GZIP_HEADER.len() + data.len() / 2 + 32);
    out.extend_from_slice(&GZIP_HEADER);

    let mut encoder = DeflateEncoder::new(&mut out, Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::InvalidCompression(format!("deflate failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::InvalidCompression(format!("deflate failed: {e}")))?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());

    Ok(out)
}

/// Decompress a gzip stream into memory.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress_to(data, &mut out)?;
    Ok(out)
}

/// Decompress a gzip stream into a caller-supplied sink.
///
/// Returns the number of uncompressed bytes delivered.
///
/// # Errors
///
/// [`Error::InvalidCompression`] when the stream does not start with the
/// gzip magic or inflation fails; [`Error::Io`] when the sink rejects a
/// write.
pub fn decompress_to<W: Write>(data: &[u8], sink: &mut W) -> Result<u64> {
    if !is_gzip(data) {
        return Err(Error::InvalidCompression("not a gzip stream".into()));
    }

    let mut decoder = GzDecoder::new(data);
    let mut buf = [0u8; 32 * 1024];
    let mut total: u64 = 0;
    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| Error::InvalidCompression(format!("inflate failed: {e}")))?;
        if n == 0 {
            return Ok(total);
        }
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_pinned() {
        for input in [&b""[..], &b"hello"[..], &[0u8; 100_000][..]] {
            let frame = compress(input).unwrap();
            assert_eq!(&frame[..10], &GZIP_HEADER);
        }
    }

    #[test]
    fn test_empty_input_exact_bytes() {
        let frame = compress(&[]).unwrap();
        assert_eq!(
            frame,
            vec![
                0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, // header
                0x03, 0x00, // empty final deflate block
                0x00, 0x00, 0x00, 0x00, // crc32 = 0
                0x00, 0x00, 0x00, 0x00, // isize = 0
            ]
        );
        assert_eq!(decompress(&frame).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let frame = compress(&data).unwrap();
        assert_eq!(decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_trailer_crc_and_size() {
        let data = b"trailer check".to_vec();
        let frame = compress(&data).unwrap();
        let trailer = &frame[frame.len() - 8..];

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data);
        assert_eq!(trailer[..4], hasher.finalize().to_le_bytes()[..]);
        assert_eq!(trailer[4..], (data.len() as u32).to_le_bytes()[..]);
    }

    #[test]
    fn test_compression_is_deterministic() {
        let data = vec![7u8; 123_457];
        assert_eq!(compress(&data).unwrap(), compress(&data).unwrap());
    }

    #[test]
    fn test_rejects_non_gzip() {
        let err = decompress(b"PK\x03\x04").unwrap_err();
        assert!(matches!(err, Error::InvalidCompression(_)), "{err}");
        assert!(decompress(&[]).is_err());
    }

    #[test]
    fn test_rejects_corrupt_body() {
        let mut frame = compress(b"some payload worth corrupting").unwrap();
        let mid = frame.len() / 2;
        frame[mid] ^= 0xFF;
        assert!(decompress(&frame).is_err());
    }

    #[test]
    fn test_streaming_sink() {
        let data = b"streamed".to_vec();
        let frame = compress(&data).unwrap();
        let mut sink = Vec::new();
        let n = decompress_to(&frame, &mut sink).unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(sink, data);
    }

    #[test]
    fn test_accepts_foreign_gzip_headers() {
        // A frame with FNAME set, as an external tool would write it.
        use flate2::{Compression, GzBuilder};
        use std::io::Write;

        let mut out = Vec::new();
        let mut encoder = GzBuilder::new()
            .filename("orig.tar")
            .write(&mut out, Compression::default());
        encoder.write_all(b"foreign").unwrap();
        encoder.finish().unwrap();

        assert_eq!(decompress(&out).unwrap(), b"foreign");
    }
}
