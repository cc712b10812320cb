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

//! VP9 encoder using libvpx, muxed into IVF.
//!
//! # Example
//!
//! ```no_run
//! use ltx_codecs::encoder::Vp9Encoder;
//! use ltx_codecs::{solid_color_frame, VideoEncoder, VideoEncoderConfig};
//!
//! let frames = vec![solid_color_frame(768, 512, [128, 128, 128, 255]); 25];
//! let config = VideoEncoderConfig { width: 768, height: 512, bit_rate: 2_000_000, frame_rate: 25 };
//! let ivf = Vp9Encoder::default().encode(&frames, &config).unwrap();
//! ```

use std::mem::MaybeUninit;
use std::os::raw::{c_int, c_ulong};

use image::imageops::{self, FilterType};
use log::debug;
use vpx_sys::*;

use crate::ivf::{IvfWriter, FOURCC_VP9};
use crate::video::is_keyframe;
use crate::yuv::rgba_to_i420;
use crate::{CodecError, VideoEncoder, VideoEncoderConfig, VideoFrame};

macro_rules! vpx {
    ($f:expr) => {{
        let res = unsafe { $f };
        let res_int = unsafe { std::mem::transmute::<vpx_sys::vpx_codec_err_t, i32>(res) };
        if res_int != 0 {
            return Err(CodecError::Vpx(format!("vpx function error code ({res_int})")));
        }
        res
    }};
}

macro_rules! vpx_ptr {
    ($f:expr) => {{
        let res = unsafe { $f };
        if res.is_null() {
            return Err(CodecError::Vpx("vpx function returned null pointer".into()));
        }
        res
    }};
}

/// Encodes conditioning videos as VP9 (profile 0, 8-bit 4:2:0) in IVF.
#[derive(Debug, Clone, Copy)]
pub struct Vp9Encoder {
    /// CPU usage / speed trade-off (0 = slowest/best, 8 = fastest).
    pub cpu_used: u32,
}

impl Default for Vp9Encoder {
    fn default() -> Self {
        Self { cpu_used: 4 }
    }
}

impl VideoEncoder for Vp9Encoder {
    fn encode(
        &mut self,
        frames: &[VideoFrame],
        config: &VideoEncoderConfig,
    ) -> Result<Vec<u8>, CodecError> {
        config.check_supported()?;
        let mut context = Vp9Context::new(config, self.cpu_used)?;
        let mut writer = IvfWriter::new(
            FOURCC_VP9,
            config.width as u16,
            config.height as u16,
            config.frame_rate,
        );

        for (index, frame) in frames.iter().enumerate() {
            let i420 = if frame.width() == config.width && frame.height() == config.height {
                rgba_to_i420(frame.image())
            } else {
                let resized = imageops::resize(
                    frame.image(),
                    config.width,
                    config.height,
                    FilterType::Triangle,
                );
                rgba_to_i420(&resized)
            };
            context.encode(index as i64, Some(&i420), is_keyframe(index), &mut writer)?;
        }
        context.flush(&mut writer)?;

        debug!(
            "encoded {} frames into {} IVF packets",
            frames.len(),
            writer.frame_count()
        );
        Ok(writer.finish())
    }
}

/// An initialised libvpx VP9 encoder context.
struct Vp9Context {
    ctx: vpx_codec_ctx_t,
    width: u32,
    height: u32,
}

impl Vp9Context {
    fn new(config: &VideoEncoderConfig, cpu_used: u32) -> Result<Self, CodecError> {
        let cfg_ptr = vpx_ptr!(vpx_codec_vp9_cx());
        let mut cfg = unsafe { MaybeUninit::<vpx_codec_enc_cfg_t>::zeroed().assume_init() };
        vpx!(vpx_codec_enc_config_default(cfg_ptr, &mut cfg, 0));

        cfg.g_w = config.width;
        cfg.g_h = config.height;
        cfg.g_timebase.num = 1;
        cfg.g_timebase.den = config.frame_rate as c_int;
        cfg.rc_target_bitrate = (config.bit_rate / 1000).max(1);
        cfg.g_threads = 2;
        cfg.g_lag_in_frames = 0;
        cfg.g_pass = vpx_enc_pass::VPX_RC_ONE_PASS;
        cfg.g_profile = 0;
        cfg.rc_end_usage = vpx_rc_mode::VPX_VBR;
        cfg.kf_mode = vpx_kf_mode::VPX_KF_DISABLED;

        let mut ctx = unsafe { MaybeUninit::<vpx_codec_ctx_t>::zeroed().assume_init() };
        vpx!(vpx_codec_enc_init_ver(
            &mut ctx,
            cfg_ptr,
            &cfg,
            0,
            VPX_ENCODER_ABI_VERSION as i32
        ));

        unsafe {
            vpx_codec_control_(
                &mut ctx,
                vp8e_enc_control_id::VP8E_SET_CPUUSED as c_int,
                cpu_used as c_int,
            );
            vpx_codec_control_(&mut ctx, vp8e_enc_control_id::VP9E_SET_ROW_MT as c_int, 1);
        }

        Ok(Self {
            ctx,
            width: config.width,
            height: config.height,
        })
    }

    /// Encode one I420 frame (or flush when `data` is `None`) and move every
    /// produced packet into `writer`.
    fn encode(
        &mut self,
        pts: i64,
        data: Option<&[u8]>,
        keyframe: bool,
        writer: &mut IvfWriter,
    ) -> Result<(), CodecError> {
        let mut image = unsafe { MaybeUninit::<vpx_image_t>::zeroed().assume_init() };
        let image_ptr: *const vpx_image_t = match data {
            Some(data) => {
                vpx_ptr!(vpx_img_wrap(
                    &mut image,
                    vpx_img_fmt::VPX_IMG_FMT_I420,
                    self.width as _,
                    self.height as _,
                    1,
                    data.as_ptr() as _,
                ));
                &image
            }
            None => std::ptr::null(),
        };
        let flags = if keyframe { VPX_EFLAG_FORCE_KF as _ } else { 0 };

        vpx!(vpx_codec_encode(
            &mut self.ctx,
            image_ptr,
            pts,
            1,
            flags,
            VPX_DL_GOOD_QUALITY as c_ulong,
        ));

        let mut iter: vpx_codec_iter_t = std::ptr::null();
        loop {
            let pkt = unsafe { vpx_codec_get_cx_data(&mut self.ctx, &mut iter) };
            if pkt.is_null() {
                break;
            }
            unsafe {
                if (*pkt).kind == vpx_codec_cx_pkt_kind::VPX_CODEC_CX_FRAME_PKT {
                    let f = &(*pkt).data.frame;
                    let bytes = std::slice::from_raw_parts(f.buf as *const u8, f.sz as usize);
                    writer.push(f.pts as u64, bytes);
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self, writer: &mut IvfWriter) -> Result<(), CodecError> {
        self.encode(-1, None, false, writer)
    }
}

impl Drop for Vp9Context {
    fn drop(&mut self) {
        unsafe {
            vpx_codec_destroy(&mut self.ctx);
        }
    }
}
