//! Frame → model input tensor.
//!
//! Bilinear resampling of the sensor frame onto the fixed
//! `MODEL_IMAGE_HEIGHT × MODEL_IMAGE_WIDTH` grid, followed by scaling each
//! byte to `[0.0, 1.0]`.  Both steps run in one pass straight into the
//! caller's tensor; nothing is allocated and no state survives the call, so
//! identical frames always produce bit-identical tensors.
//!
//! Sample positions use pixel-centre alignment:
//!
//! ```text
//! src = (dst + 0.5) * (src_len / dst_len) - 0.5     clamped to [0, src_len - 1]
//! ```

use crate::config::{MODEL_IMAGE_HEIGHT, MODEL_IMAGE_WIDTH, NUM_CHANNELS};
use crate::error::PreprocessError;
use crate::frame::{FrameBuffer, PixelFormat};

/// Number of `f32` elements in the model input.
pub const INPUT_LEN: usize = MODEL_IMAGE_WIDTH * MODEL_IMAGE_HEIGHT * NUM_CHANNELS;

/// Model input, row-major `H × W × C`, values in `[0.0, 1.0]`.
pub type NormalizedTensor = [f32; INPUT_LEN];

/// Interpolation taps along one axis: the two neighbouring source indices
/// and the weight of the second one.
#[derive(Debug, Clone, Copy, Default)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

fn tap(dst: usize, scale: f32, src_len: usize) -> Tap {
    let last = (src_len - 1) as f32;
    let pos = ((dst as f32 + 0.5) * scale - 0.5).clamp(0.0, last);
    let i0 = pos as usize;
    let i1 = (i0 + 1).min(src_len - 1);
    Tap {
        i0,
        i1,
        frac: pos - i0 as f32,
    }
}

/// Luma of pixel `idx` (row-major pixel index, not byte offset).
#[inline]
fn luma(data: &[u8], format: PixelFormat, idx: usize) -> u8 {
    match format {
        PixelFormat::Grayscale => data[idx],
        PixelFormat::Yuv422 => data[idx * 2],
        PixelFormat::Rgb565 => {
            let v = u16::from_be_bytes([data[idx * 2], data[idx * 2 + 1]]);
            let r = ((v >> 11) & 0x1F) as u32;
            let g = ((v >> 5) & 0x3F) as u32;
            let b = (v & 0x1F) as u32;
            let r8 = (r << 3) | (r >> 2);
            let g8 = (g << 2) | (g >> 4);
            let b8 = (b << 3) | (b >> 2);
            ((77 * r8 + 150 * g8 + 29 * b8) >> 8) as u8
        }
        // Rejected before sampling starts.
        PixelFormat::Jpeg => 0,
    }
}

/// Check that `frame` can be resampled, without touching any output.
pub fn check_frame(frame: &impl FrameBuffer) -> Result<(), PreprocessError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(PreprocessError::DegenerateFrame { width, height });
    }
    let bpp = frame
        .format()
        .bytes_per_pixel()
        .ok_or(PreprocessError::UnsupportedFormat)?;
    let required = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(bpp))
        .ok_or(PreprocessError::Oversized { width, height })?;
    if frame.len() < required {
        return Err(PreprocessError::BufferTooShort {
            required,
            actual: frame.len(),
        });
    }
    Ok(())
}

/// Resample `frame` to the model grid and normalise into `out`.
///
/// On error `out` is left untouched.
pub fn resize_and_normalize(
    frame: &impl FrameBuffer,
    out: &mut NormalizedTensor,
) -> Result<(), PreprocessError> {
    check_frame(frame)?;

    let (src_w, src_h) = (frame.width(), frame.height());
    let data = frame.data();
    let format = frame.format();

    let scale_x = src_w as f32 / MODEL_IMAGE_WIDTH as f32;
    let scale_y = src_h as f32 / MODEL_IMAGE_HEIGHT as f32;

    let mut x_taps = [Tap::default(); MODEL_IMAGE_WIDTH];
    for (x, t) in x_taps.iter_mut().enumerate() {
        *t = tap(x, scale_x, src_w);
    }

    for (y, row) in out.chunks_exact_mut(MODEL_IMAGE_WIDTH * NUM_CHANNELS).enumerate() {
        let ty = tap(y, scale_y, src_h);
        let row0 = ty.i0 * src_w;
        let row1 = ty.i1 * src_w;

        for (x, px) in row.chunks_exact_mut(NUM_CHANNELS).enumerate() {
            let tx = x_taps[x];

            let p00 = f32::from(luma(data, format, row0 + tx.i0));
            let p01 = f32::from(luma(data, format, row0 + tx.i1));
            let p10 = f32::from(luma(data, format, row1 + tx.i0));
            let p11 = f32::from(luma(data, format, row1 + tx.i1));

            let top = p00 * (1.0 - tx.frac) + p01 * tx.frac;
            let bottom = p10 * (1.0 - tx.frac) + p11 * tx.frac;
            let v = (top * (1.0 - ty.frac) + bottom * ty.frac).round().clamp(0.0, 255.0) as u8;

            let normalized = f32::from(v) / 255.0;
            px.fill(normalized);
        }
    }

    Ok(())
}
