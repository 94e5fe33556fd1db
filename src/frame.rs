//! Raw frame types shared by the camera driver and the preprocessor.
//!
//! A frame is only ever *borrowed* by the pipeline: the [`FrameSource`]
//! that produced it keeps ownership until it is handed back through
//! `release_frame`.
//!
//! [`FrameSource`]: crate::app::ports::FrameSource

use serde::{Deserialize, Serialize};

/// Pixel encodings the sensor can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit luma, one byte per pixel.
    Grayscale,
    /// YUYV 4:2:2, luma in every even byte.
    Yuv422,
    /// 16-bit RGB 5-6-5, big-endian (driver byte order).
    Rgb565,
    /// Compressed; cannot be resampled without a decoder.
    Jpeg,
}

impl PixelFormat {
    /// Bytes per pixel for uncompressed formats, `None` for JPEG.
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Grayscale => Some(1),
            Self::Yuv422 | Self::Rgb565 => Some(2),
            Self::Jpeg => None,
        }
    }
}

/// Read-only view over one captured frame.
pub trait FrameBuffer {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn format(&self) -> PixelFormat;
    fn data(&self) -> &[u8];

    /// Length of the pixel buffer in bytes.
    fn len(&self) -> usize {
        self.data().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A borrowed frame, used by the simulated driver and tests.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn grayscale(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Grayscale,
            data,
        }
    }
}

impl FrameBuffer for FrameView<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn data(&self) -> &[u8] {
        self.data
    }
}
