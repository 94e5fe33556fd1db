//! System configuration parameters
//!
//! Build-time constants for the camera sensor and the capture pipeline.
//! Nothing here is runtime-configurable on the device; `Default` yields the
//! values flashed in this build and `validate()` runs once at boot.

use serde::{Deserialize, Serialize};

use crate::error::{Error, InitError};
use crate::frame::PixelFormat;
use crate::pins;

/// Side length of the model's square input image.
pub const MODEL_IMAGE_WIDTH: usize = 32;
pub const MODEL_IMAGE_HEIGHT: usize = 32;
pub const NUM_CHANNELS: usize = 1;

/// Working memory handed to the inference engine (60 KiB).
pub const TENSOR_ARENA_SIZE: usize = 60 * 1024;

/// Sensor resolution classes supported by the esp32-camera driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSize {
    Qqvga,
    Qcif,
    Hqvga,
    Qvga,
    Cif,
    Hvga,
    Vga,
    Svga,
    Xga,
    Hd,
    Sxga,
    Uxga,
}

impl FrameSize {
    /// `(width, height)` in pixels.
    pub const fn dimensions(self) -> (usize, usize) {
        match self {
            Self::Qqvga => (160, 120),
            Self::Qcif => (176, 144),
            Self::Hqvga => (240, 176),
            Self::Qvga => (320, 240),
            Self::Cif => (400, 296),
            Self::Hvga => (480, 320),
            Self::Vga => (640, 480),
            Self::Svga => (800, 600),
            Self::Xga => (1024, 768),
            Self::Hd => (1280, 720),
            Self::Sxga => (1280, 1024),
            Self::Uxga => (1600, 1200),
        }
    }
}

/// What the driver does when the application is slower than the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrabMode {
    /// Fill buffers only when they are empty (frame may be stale).
    WhenEmpty,
    /// Keep overwriting so `acquire_frame` returns the newest frame.
    Latest,
}

/// Where frame buffers are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FbLocation {
    Psram,
    Dram,
}

/// Camera sensor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    // --- Pins ---
    pub pin_pwdn: i32,
    pub pin_reset: i32,
    pub pin_xclk: i32,
    pub pin_sccb_sda: i32,
    pub pin_sccb_scl: i32,
    /// Parallel data bus, D0..D7.
    pub pin_data: [i32; 8],
    pub pin_vsync: i32,
    pub pin_href: i32,
    pub pin_pclk: i32,

    // --- Clock ---
    /// XCLK frequency. 10 MHz is stable on OV2640; 20 MHz doubles FPS.
    pub xclk_freq_hz: u32,

    // --- Image ---
    pub pixel_format: PixelFormat,
    pub frame_size: FrameSize,
    /// 0-63, lower is better. Only used when `pixel_format` is JPEG.
    pub jpeg_quality: u8,

    // --- Buffering ---
    pub fb_count: u8,
    pub fb_location: FbLocation,
    pub grab_mode: GrabMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pin_pwdn: pins::CAM_PIN_PWDN,
            pin_reset: pins::CAM_PIN_RESET,
            pin_xclk: pins::CAM_PIN_XCLK,
            pin_sccb_sda: pins::CAM_PIN_SIOD,
            pin_sccb_scl: pins::CAM_PIN_SIOC,
            pin_data: pins::CAM_DATA_PINS,
            pin_vsync: pins::CAM_PIN_VSYNC,
            pin_href: pins::CAM_PIN_HREF,
            pin_pclk: pins::CAM_PIN_PCLK,

            xclk_freq_hz: 10_000_000,

            pixel_format: PixelFormat::Grayscale,
            frame_size: FrameSize::Qvga,
            jpeg_quality: 63,

            fb_count: 1,
            fb_location: FbLocation::Psram,
            grab_mode: GrabMode::WhenEmpty,
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> Result<(), InitError> {
        if self.fb_count == 0 {
            return Err(InitError::InvalidConfig("fb_count must be at least 1"));
        }
        if self.jpeg_quality > 63 {
            return Err(InitError::InvalidConfig("jpeg_quality must be 0-63"));
        }
        if self.xclk_freq_hz == 0 || self.xclk_freq_hz > 24_000_000 {
            return Err(InitError::InvalidConfig("xclk_freq_hz must be 1 Hz - 24 MHz"));
        }
        if self.pin_xclk < 0 || self.pin_vsync < 0 || self.pin_href < 0 || self.pin_pclk < 0 {
            return Err(InitError::InvalidConfig("sync/clock pins must be routed"));
        }
        if self.pin_data.iter().any(|&p| p < 0) {
            return Err(InitError::InvalidConfig("all data pins must be routed"));
        }
        Ok(())
    }
}

/// Capture-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sleep between the end of one iteration and the next capture.
    pub capture_interval_ms: u32,
    /// Bytes reserved for the tensor arena.
    pub arena_size_bytes: usize,
    /// Index of the first class included in reports. Classes below it are
    /// treated as reserved (e.g. a "background" class).
    pub first_reported_class: usize,
    /// Emit a statistics line every N iterations (0 disables).
    pub stats_interval_iterations: u32,
    /// Task watchdog timeout; must exceed one full iteration.
    pub watchdog_timeout_ms: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture_interval_ms: 10_000,
            arena_size_bytes: TENSOR_ARENA_SIZE,
            first_reported_class: 0,
            stats_interval_iterations: 6, // once a minute at 10 s cadence
            watchdog_timeout_ms: 30_000,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.capture_interval_ms == 0 {
            return Err(Error::Config("capture_interval_ms must be > 0"));
        }
        if self.arena_size_bytes < MODEL_IMAGE_WIDTH * MODEL_IMAGE_HEIGHT * NUM_CHANNELS * 4 {
            return Err(Error::Config("arena cannot hold the input tensor"));
        }
        if self.watchdog_timeout_ms <= self.capture_interval_ms {
            return Err(Error::Config(
                "watchdog_timeout_ms must exceed capture_interval_ms",
            ));
        }
        Ok(())
    }
}
