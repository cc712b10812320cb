/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Minimal IVF container.
//!
//! IVF is a 32-byte file header followed by frames, each prefixed with a
//! 12-byte header (payload size, presentation timestamp). All integers are
//! little-endian.

use crate::CodecError;

pub const SIGNATURE: &[u8; 4] = b"DKIF";
pub const FILE_HEADER_LEN: usize = 32;
pub const FRAME_HEADER_LEN: usize = 12;

/// Codec identifiers understood by this client.
pub const FOURCC_VP8: [u8; 4] = *b"VP80";
pub const FOURCC_VP9: [u8; 4] = *b"VP90";
pub const FOURCC_AV1: [u8; 4] = *b"AV01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfHeader {
    pub fourcc: [u8; 4],
    pub width: u16,
    pub height: u16,
    /// Timebase denominator (frames per second when `timebase_num == 1`).
    pub timebase_den: u32,
    pub timebase_num: u32,
    pub frame_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvfFrame {
    pub pts: u64,
    pub data: Vec<u8>,
}

/// Accumulates compressed frames and serializes them as one IVF buffer.
#[derive(Debug)]
pub struct IvfWriter {
    header: IvfHeader,
    body: Vec<u8>,
}

impl IvfWriter {
    pub fn new(fourcc: [u8; 4], width: u16, height: u16, frame_rate: u32) -> Self {
        Self {
            header: IvfHeader {
                fourcc,
                width,
                height,
                timebase_den: frame_rate,
                timebase_num: 1,
                frame_count: 0,
            },
            body: Vec::new(),
        }
    }

    pub fn push(&mut self, pts: u64, data: &[u8]) {
        self.body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.body.extend_from_slice(&pts.to_le_bytes());
        self.body.extend_from_slice(data);
        self.header.frame_count += 1;
    }

    pub fn frame_count(&self) -> u32 {
        self.header.frame_count
    }

    pub fn finish(self) -> Vec<u8> {
        let h = &self.header;
        let mut out = Vec::with_capacity(FILE_HEADER_LEN + self.body.len());
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(FILE_HEADER_LEN as u16).to_le_bytes());
        out.extend_from_slice(&h.fourcc);
        out.extend_from_slice(&h.width.to_le_bytes());
        out.extend_from_slice(&h.height.to_le_bytes());
        out.extend_from_slice(&h.timebase_den.to_le_bytes());
        out.extend_from_slice(&h.timebase_num.to_le_bytes());
        out.extend_from_slice(&h.frame_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parse an IVF buffer into its header and frames.
///
/// Fails with [`CodecError::MissingTrack`] when the stream is not VP8, VP9 or
/// AV1, and with [`CodecError::Container`] on truncation.
pub fn read(bytes: &[u8]) -> Result<(IvfHeader, Vec<IvfFrame>), CodecError> {
    if bytes.len() < FILE_HEADER_LEN || &bytes[0..4] != SIGNATURE {
        return Err(CodecError::Container("missing IVF signature".into()));
    }
    let header_len = u16_at(bytes, 6) as usize;
    if header_len < FILE_HEADER_LEN || header_len > bytes.len() {
        return Err(CodecError::Container(format!(
            "bad IVF header length {header_len}"
        )));
    }

    let mut fourcc = [0u8; 4];
    fourcc.copy_from_slice(&bytes[8..12]);
    if ![FOURCC_VP8, FOURCC_VP9, FOURCC_AV1].contains(&fourcc) {
        return Err(CodecError::MissingTrack(format!(
            "VP80, VP90 or AV01 not found (got {})",
            String::from_utf8_lossy(&fourcc)
        )));
    }

    let header = IvfHeader {
        fourcc,
        width: u16_at(bytes, 12),
        height: u16_at(bytes, 14),
        timebase_den: u32_at(bytes, 16),
        timebase_num: u32_at(bytes, 20),
        frame_count: u32_at(bytes, 24),
    };

    let mut frames = Vec::new();
    let mut at = header_len;
    while at < bytes.len() {
        if at + FRAME_HEADER_LEN > bytes.len() {
            return Err(CodecError::Container(format!(
                "truncated frame header at offset {at}"
            )));
        }
        let size = u32_at(bytes, at) as usize;
        let mut pts = [0u8; 8];
        pts.copy_from_slice(&bytes[at + 4..at + 12]);
        let start = at + FRAME_HEADER_LEN;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| CodecError::Container(format!("truncated frame at offset {at}")))?;
        frames.push(IvfFrame {
            pts: u64::from_le_bytes(pts),
            data: bytes[start..end].to_vec(),
        });
        at = end;
    }

    Ok((header, frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut writer = IvfWriter::new(FOURCC_VP9, 768, 512, 25);
        writer.push(0, &[1, 2, 3]);
        writer.push(1, &[4]);
        writer.push(2, &[]);
        writer.finish()
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample();
        assert_eq!(&bytes[0..4], b"DKIF");
        assert_eq!(u16_at(&bytes, 6), 32);
        assert_eq!(&bytes[8..12], b"VP90");
        assert_eq!(u16_at(&bytes, 12), 768);
        assert_eq!(u16_at(&bytes, 14), 512);
        assert_eq!(u32_at(&bytes, 24), 3);
        assert_eq!(bytes.len(), FILE_HEADER_LEN + 3 * FRAME_HEADER_LEN + 4);
    }

    #[test]
    fn test_read_returns_frames_in_order() {
        let (header, frames) = read(&sample()).unwrap();
        assert_eq!(header.frame_count, 3);
        assert_eq!(header.timebase_den, 25);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data, vec![1, 2, 3]);
        assert_eq!(frames[1].pts, 1);
        assert!(frames[2].data.is_empty());
    }

    #[test]
    fn test_unknown_codec_is_missing_track() {
        let mut bytes = sample();
        bytes[8..12].copy_from_slice(b"H264");
        assert!(matches!(read(&bytes), Err(CodecError::MissingTrack(_))));
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let mut bytes = sample();
        bytes.truncate(FILE_HEADER_LEN + FRAME_HEADER_LEN + 1);
        assert!(matches!(read(&bytes), Err(CodecError::Container(_))));
    }

    #[test]
    fn test_not_ivf() {
        assert!(matches!(read(b"RIFF"), Err(CodecError::Container(_))));
    }
}
