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

use image::RgbaImage;
use log::debug;
use ltx_codecs::{fit_cover, VideoFrame};

/// Decoded frames of the current editing session, oldest first.
///
/// The store only grows. Frames whose size differs from the store's are
/// cover-fitted on the way in so every committed frame is `width x height`.
#[derive(Debug, Clone)]
pub struct FrameStore {
    width: u32,
    height: u32,
    frames: Vec<VideoFrame>,
    pending_frames: Vec<VideoFrame>,
}

impl FrameStore {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
            pending_frames: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[VideoFrame] {
        &self.frames
    }

    pub fn push_frame(&mut self, frame: VideoFrame) {
        let frame = self.conform(frame);
        self.frames.push(frame);
    }

    /// Append a raw RGBA buffer, e.g. pixels read back from a canvas.
    pub fn push_image_data(&mut self, image: RgbaImage) {
        self.push_frame(VideoFrame::from_image(image));
    }

    /// Stage a frame without committing it.
    pub fn push_pending(&mut self, frame: VideoFrame) {
        let frame = self.conform(frame);
        self.pending_frames.push(frame);
    }

    pub fn pending_len(&self) -> usize {
        self.pending_frames.len()
    }

    /// Move every staged frame into the store, preserving order.
    pub fn commit_pending(&mut self) -> usize {
        let committed = self.pending_frames.len();
        self.frames.append(&mut self.pending_frames);
        committed
    }

    pub fn discard_pending(&mut self) {
        self.pending_frames.clear();
    }

    /// Append a decoded chunk, dropping its first `skip` frames.
    pub fn extend_from_output(&mut self, frames: Vec<VideoFrame>, skip: usize) -> usize {
        let before = self.frames.len();
        for frame in frames.into_iter().skip(skip) {
            self.push_frame(frame);
        }
        let added = self.frames.len() - before;
        debug!("frame store: appended {added} frames (skipped {skip}), now {}", self.frames.len());
        added
    }

    /// The last `n` frames, or all of them when the store holds fewer.
    pub fn tail(&self, n: usize) -> &[VideoFrame] {
        let start = self.frames.len().saturating_sub(n);
        &self.frames[start..]
    }

    fn conform(&self, frame: VideoFrame) -> VideoFrame {
        if frame.width() == self.width && frame.height() == self.height {
            frame
        } else {
            VideoFrame::from_image(fit_cover(frame.image(), self.width, self.height))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltx_codecs::solid_color_frame;

    #[test]
    fn test_push_keeps_order() {
        let mut store = FrameStore::new(4, 4);
        let a = solid_color_frame(4, 4, [1, 0, 0, 255]);
        let b = solid_color_frame(4, 4, [2, 0, 0, 255]);
        store.push_frame(a.clone());
        store.push_frame(b.clone());
        assert_eq!(store.len(), 2);
        assert!(store.frames()[0].ptr_eq(&a));
        assert!(store.frames()[1].ptr_eq(&b));
    }

    #[test]
    fn test_push_image_data_resizes() {
        let mut store = FrameStore::new(8, 4);
        store.push_image_data(RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255])));
        let frame = &store.frames()[0];
        assert_eq!((frame.width(), frame.height()), (8, 4));
        assert_eq!(frame.image().get_pixel(4, 2).0, [9, 9, 9, 255]);
    }

    #[test]
    fn test_tail() {
        let mut store = FrameStore::new(2, 2);
        assert!(store.tail(3).is_empty());
        for i in 0..5u8 {
            store.push_frame(solid_color_frame(2, 2, [i, 0, 0, 255]));
        }
        let tail = store.tail(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].image().get_pixel(0, 0).0[0], 2);
        assert_eq!(store.tail(10).len(), 5);
    }

    #[test]
    fn test_pending_commit_and_discard() {
        let mut store = FrameStore::new(2, 2);
        store.push_pending(solid_color_frame(2, 2, [0, 0, 0, 255]));
        store.push_pending(solid_color_frame(2, 2, [0, 0, 0, 255]));
        assert!(store.is_empty());
        assert_eq!(store.commit_pending(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.pending_len(), 0);

        store.push_pending(solid_color_frame(2, 2, [0, 0, 0, 255]));
        store.discard_pending();
        assert_eq!(store.len(), 2);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_extend_from_output_skips_leading_frames() {
        let mut store = FrameStore::new(2, 2);
        let chunk: Vec<_> = (0..25u8)
            .map(|i| solid_color_frame(2, 2, [i, 0, 0, 255]))
            .collect();
        assert_eq!(store.extend_from_output(chunk, 9), 16);
        assert_eq!(store.frames()[0].image().get_pixel(0, 0).0[0], 9);
    }
}
