//! JPEG marker scanning for metadata carry-over.
//!
//! Only the header (everything before the first SOS) is inspected. Segments kept:
//! - APP1 (FF E1) starting with `Exif\0\0` or the XMP namespace
//! - APP2 (FF E2) starting with `ICC_PROFILE\0`
//!
//! Scanning is lenient: a malformed header ends the scan and whatever was found so far is returned.

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;

const EXIF_ID: &[u8] = b"Exif\0\0";
const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const ICC_ID: &[u8] = b"ICC_PROFILE\0";

fn is_kept(marker: u8, payload: &[u8]) -> bool {
    match marker {
        APP1 => payload.starts_with(EXIF_ID) || payload.starts_with(XMP_ID),
        APP2 => payload.starts_with(ICC_ID),
        _ => false,
    }
}

/// Markers with no length field.
fn is_standalone(marker: u8) -> bool {
    marker == SOI || marker == EOI || (RST0..=RST7).contains(&marker) || marker == 0x01
}

/// One header segment. `body` begins at the length field.
struct Segment {
    marker: u8,
    body: usize,
    end: usize,
}

impl Segment {
    /// Bytes after the 2-byte length field.
    fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.body + 2..self.end]
    }
}

/// Iterate header segments after SOI, stopping at SOS/EOI or the first malformed byte.
fn header_segments(data: &[u8]) -> impl Iterator<Item = Segment> + '_ {
    let valid = data.len() >= 4 && data[0] == MARKER_PREFIX && data[1] == SOI;
    let mut pos = if valid { 2 } else { data.len() };
    std::iter::from_fn(move || {
        loop {
            if pos + 1 >= data.len() || data[pos] != MARKER_PREFIX {
                return None;
            }
            // Fill bytes: any number of 0xFF before the marker code.
            while pos < data.len() && data[pos] == MARKER_PREFIX {
                pos += 1;
            }
            let marker = *data.get(pos)?;
            pos += 1;
            if marker == SOS || marker == EOI {
                pos = data.len();
                return None;
            }
            if is_standalone(marker) {
                continue;
            }
            if pos + 2 > data.len() {
                return None;
            }
            let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
            if length < 2 || pos + length > data.len() {
                pos = data.len();
                return None;
            }
            let body = pos;
            pos += length;
            return Some(Segment {
                marker,
                body,
                end: pos,
            });
        }
    })
}

/// Raw metadata segments (EXIF, XMP, ICC) found in the JPEG header, in file order.
/// Each is returned as `FF <marker> <len> <payload>` with fill bytes dropped.
pub fn extract_metadata_segments(data: &[u8]) -> Vec<Vec<u8>> {
    header_segments(data)
        .filter(|seg| is_kept(seg.marker, seg.payload(data)))
        .map(|seg| {
            let mut out = vec![MARKER_PREFIX, seg.marker];
            out.extend_from_slice(&data[seg.body..seg.end]);
            out
        })
        .collect()
}

/// Split a stored segment into its APPn number and payload (the bytes after the length field).
/// Returns None for anything that is not a well-formed APP1..APP15 segment.
pub fn app_segment_parts(segment: &[u8]) -> Option<(u8, &[u8])> {
    let [MARKER_PREFIX, marker, hi, lo, ..] = segment else {
        return None;
    };
    let number = marker.checked_sub(APP0).filter(|n| (1..=15).contains(n))?;
    let length = u16::from_be_bytes([*hi, *lo]) as usize;
    (length + 2 == segment.len()).then(|| (number, &segment[4..]))
}

/// Build a segment `FF <marker> <len> <payload>`. Payload must fit a 16-bit length.
pub fn build_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&[MARKER_PREFIX, marker]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jfif_app0() -> Vec<u8> {
        build_segment(APP0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0")
    }

    /// SOI + given segments + a fake SOS header and EOI. Enough for header scanning.
    fn fake_jpeg(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![MARKER_PREFIX, SOI];
        for seg in segments {
            out.extend_from_slice(seg);
        }
        out.extend_from_slice(&[MARKER_PREFIX, SOS, 0x00, 0x02, 0x12, 0x34]);
        out.extend_from_slice(&[MARKER_PREFIX, EOI]);
        out
    }

    #[test]
    fn test_extract_keeps_exif_xmp_icc_only() {
        let exif = build_segment(APP1, b"Exif\0\0II*\0");
        let xmp = build_segment(APP1, b"http://ns.adobe.com/xap/1.0/\0<x/>");
        let icc = build_segment(APP2, b"ICC_PROFILE\0\x01\x01data");
        let comment = build_segment(0xFE, b"hello");
        let other_app1 = build_segment(APP1, b"Something else");
        let data = fake_jpeg(&[
            jfif_app0(),
            exif.clone(),
            comment,
            xmp.clone(),
            other_app1,
            icc.clone(),
        ]);

        assert_eq!(extract_metadata_segments(&data), vec![exif, xmp, icc]);
    }

    #[test]
    fn test_extract_ignores_segments_after_sos() {
        let mut data = fake_jpeg(&[]);
        let eoi = data.split_off(data.len() - 2);
        data.extend_from_slice(&build_segment(APP1, b"Exif\0\0late"));
        data.extend_from_slice(&eoi);
        assert!(extract_metadata_segments(&data).is_empty());
    }

    #[test]
    fn test_extract_non_jpeg_is_empty() {
        assert!(extract_metadata_segments(b"\x89PNG\r\n\x1a\n").is_empty());
        assert!(extract_metadata_segments(&[]).is_empty());
    }

    #[test]
    fn test_extract_truncated_segment_returns_what_was_found() {
        let exif = build_segment(APP1, b"Exif\0\0ok");
        let mut data = vec![MARKER_PREFIX, SOI];
        data.extend_from_slice(&exif);
        // declares 0x40 bytes but stops short
        data.extend_from_slice(&[MARKER_PREFIX, APP2, 0x00, 0x40, b'I', b'C']);
        assert_eq!(extract_metadata_segments(&data), vec![exif]);
    }

    #[test]
    fn test_app_segment_parts() {
        let exif = build_segment(APP1, b"Exif\0\0x");
        assert_eq!(app_segment_parts(&exif), Some((1, &b"Exif\0\0x"[..])));
        let icc = build_segment(APP2, b"ICC_PROFILE\0\x01\x01");
        assert_eq!(app_segment_parts(&icc).map(|(n, _)| n), Some(2));
    }

    #[test]
    fn test_app_segment_parts_rejects_other_markers() {
        assert!(app_segment_parts(&jfif_app0()).is_none());
        assert!(app_segment_parts(&build_segment(0xFE, b"comment")).is_none());
        let mut short = build_segment(APP1, b"Exif\0\0x");
        short.pop();
        assert!(app_segment_parts(&short).is_none());
        assert!(app_segment_parts(&[MARKER_PREFIX]).is_none());
    }
}
