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

//! VP9 encode → decode through libvpx. Run with `--features vpx`.

#![cfg(feature = "vpx")]

use ltx_codecs::decoder::Vp9Decoder;
use ltx_codecs::encoder::Vp9Encoder;
use ltx_codecs::{
    ivf, solid_color_frame, CodecError, VideoDecoder, VideoEncoder, VideoEncoderConfig,
};

fn config(width: u32, height: u32) -> VideoEncoderConfig {
    VideoEncoderConfig {
        width,
        height,
        bit_rate: 1_000_000,
        frame_rate: 25,
    }
}

#[test]
fn test_round_trip_preserves_frame_count() {
    let frames: Vec<_> = (0..25u8)
        .map(|i| solid_color_frame(64, 48, [i * 10, 128, 255 - i * 10, 255]))
        .collect();
    let bytes = Vp9Encoder::default().encode(&frames, &config(64, 48)).unwrap();

    let (header, samples) = ivf::read(&bytes).unwrap();
    assert_eq!(header.fourcc, ivf::FOURCC_VP9);
    assert_eq!(samples.len(), 25);

    let decoded = Vp9Decoder.decode(&bytes).unwrap();
    assert_eq!(decoded.len(), 25);
    assert!(decoded.iter().all(|f| f.width() == 64 && f.height() == 48));
}

#[test]
fn test_gray_stays_roughly_gray() {
    let frames = vec![solid_color_frame(32, 32, [128, 128, 128, 255]); 3];
    let bytes = Vp9Encoder::default().encode(&frames, &config(32, 32)).unwrap();
    let decoded = Vp9Decoder.decode(&bytes).unwrap();
    let pixel = decoded[0].image().get_pixel(16, 16).0;
    for channel in &pixel[..3] {
        assert!((*channel as i16 - 128).abs() < 12, "{pixel:?}");
    }
}

#[test]
fn test_frames_of_other_sizes_are_rescaled() {
    let frames = vec![solid_color_frame(10, 10, [0, 0, 0, 255]); 2];
    let bytes = Vp9Encoder::default().encode(&frames, &config(32, 16)).unwrap();
    let decoded = Vp9Decoder.decode(&bytes).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!((decoded[0].width(), decoded[0].height()), (32, 16));
}

#[test]
fn test_unsupported_config_is_rejected_before_encoding() {
    let frames = vec![solid_color_frame(33, 33, [0, 0, 0, 255])];
    let err = Vp9Encoder::default()
        .encode(&frames, &config(33, 33))
        .unwrap_err();
    assert!(matches!(err, CodecError::Unsupported(_)));
}
