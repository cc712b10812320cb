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

//! VP8/VP9 decoder using libvpx, reading IVF.

use std::ffi::c_void;
use std::ptr;

use log::{debug, warn};
use vpx_sys::{
    vpx_codec_ctx_t, vpx_codec_dec_init_ver, vpx_codec_decode, vpx_codec_destroy,
    vpx_codec_get_frame, vpx_codec_vp8_dx, vpx_codec_vp9_dx, vpx_image_t,
    VPX_CODEC_OK, VPX_DECODER_ABI_VERSION,
};

use crate::ivf::{self, FOURCC_VP8, FOURCC_VP9};
use crate::yuv::i420_to_rgba;
use crate::{CodecError, VideoDecoder, VideoFrame};

/// Decodes IVF-wrapped VP8 or VP9 into RGBA frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct Vp9Decoder;

impl VideoDecoder for Vp9Decoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<VideoFrame>, CodecError> {
        let (header, samples) = ivf::read(bytes)?;
        let mut context = DecoderContext::new(header.fourcc)?;
        let mut frames = Vec::with_capacity(samples.len());
        for sample in &samples {
            context.decode(&sample.data)?;
            context.drain(&mut frames);
        }
        debug!(
            "decoded {} frames from {} IVF samples",
            frames.len(),
            samples.len()
        );
        Ok(frames)
    }
}

struct DecoderContext {
    context: vpx_codec_ctx_t,
}

impl DecoderContext {
    fn new(fourcc: [u8; 4]) -> Result<Self, CodecError> {
        let iface = match fourcc {
            FOURCC_VP9 => unsafe { vpx_codec_vp9_dx() },
            FOURCC_VP8 => unsafe { vpx_codec_vp8_dx() },
            other => {
                return Err(CodecError::Unsupported(format!(
                    "no decoder for {}",
                    String::from_utf8_lossy(&other)
                )))
            }
        };
        let mut context = unsafe { std::mem::zeroed() };
        let ret = unsafe {
            vpx_codec_dec_init_ver(
                &mut context,
                iface,
                ptr::null_mut(),
                0,
                VPX_DECODER_ABI_VERSION as i32,
            )
        };
        if ret != VPX_CODEC_OK {
            return Err(CodecError::Vpx(format!(
                "failed to initialize decoder: {ret:?}"
            )));
        }
        Ok(Self { context })
    }

    fn decode(&mut self, data: &[u8]) -> Result<(), CodecError> {
        let ret = unsafe {
            vpx_codec_decode(
                &mut self.context,
                data.as_ptr(),
                data.len() as u32,
                ptr::null_mut(),
                0,
            )
        };
        if ret != VPX_CODEC_OK {
            let message = unsafe {
                let error_cstr = vpx_sys::vpx_codec_err_to_string(ret);
                if error_cstr.is_null() {
                    "unknown codec error".to_string()
                } else {
                    std::ffi::CStr::from_ptr(error_cstr)
                        .to_string_lossy()
                        .into_owned()
                }
            };
            return Err(CodecError::Vpx(format!("decode failed: {message}")));
        }
        Ok(())
    }

    fn drain(&mut self, frames: &mut Vec<VideoFrame>) {
        let mut iter = ptr::null_mut::<c_void>();
        loop {
            let img = unsafe {
                vpx_codec_get_frame(
                    &mut self.context,
                    &mut iter as *mut _ as *mut *const c_void,
                )
            };
            if img.is_null() {
                break;
            }
            match unsafe { image_to_frame(img) } {
                Some(frame) => frames.push(frame),
                None => warn!("skipping decoded image with unexpected layout"),
            }
        }
    }
}

impl Drop for DecoderContext {
    fn drop(&mut self) {
        unsafe {
            vpx_codec_destroy(&mut self.context);
        }
    }
}

/// Copy the planes of a decoded I420 image, dropping row padding.
unsafe fn image_to_frame(img: *const vpx_image_t) -> Option<VideoFrame> {
    let width = (*img).d_w as usize;
    let height = (*img).d_h as usize;
    if width == 0 || height == 0 {
        return None;
    }
    let uv_width = width.div_ceil(2);
    let uv_height = height.div_ceil(2);

    let y = copy_plane((*img).planes[0], (*img).stride[0], width, height);
    let u = copy_plane((*img).planes[1], (*img).stride[1], uv_width, uv_height);
    let v = copy_plane((*img).planes[2], (*img).stride[2], uv_width, uv_height);

    let rgba = i420_to_rgba(&y, &u, &v, width as u32, height as u32);
    Some(VideoFrame::from_image(rgba))
}

unsafe fn copy_plane(plane: *const u8, stride: i32, width: usize, height: usize) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(width * height);
    let mut current_ptr = plane;
    for _ in 0..height {
        buffer.extend_from_slice(std::slice::from_raw_parts(current_ptr, width));
        current_ptr = current_ptr.offset(stride as isize);
    }
    buffer
}
