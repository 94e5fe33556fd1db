//! Fuzz target: `resize_and_normalize`
//!
//! The first four bytes pick frame dimensions and the pixel format, the
//! rest is the pixel buffer. Accepted frames must produce values in
//! [0, 1]; rejected frames must leave the tensor untouched.
//!
//! cargo fuzz run fuzz_preprocess

#![no_main]

use camclassify::frame::{FrameView, PixelFormat};
use camclassify::preprocess::{INPUT_LEN, resize_and_normalize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [w, h, fmt, rest @ ..] = data else {
        return;
    };
    let format = match fmt % 4 {
        0 => PixelFormat::Grayscale,
        1 => PixelFormat::Yuv422,
        2 => PixelFormat::Rgb565,
        _ => PixelFormat::Jpeg,
    };
    let frame = FrameView {
        width: usize::from(*w),
        height: usize::from(*h),
        format,
        data: rest,
    };

    let mut out = [-1.0f32; INPUT_LEN];
    match resize_and_normalize(&frame, &mut out) {
        Ok(()) => assert!(out.iter().all(|v| (0.0..=1.0).contains(v))),
        Err(_) => assert!(out.iter().all(|&v| v == -1.0)),
    }
});
