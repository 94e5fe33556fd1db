//! Camera driver (esp32-camera component, OV2640 on the ESP32-S3-EYE).
//!
//! Implements [`FrameSource`].  The driver owns every frame buffer; a frame
//! handed out by [`acquire_frame`](FrameSource::acquire_frame) borrows the
//! driver's memory until it comes back through
//! [`release_frame`](FrameSource::release_frame).  Only one frame may be
//! outstanding at a time.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `esp_camera_init` / `esp_camera_fb_get` / `esp_camera_fb_return`.
//! On host/test: a simulated sensor that serves a synthetic gradient (or an
//! injected scene) from a single reusable buffer.

use log::{info, warn};

use crate::app::ports::FrameSource;
use crate::config::SensorConfig;
use crate::error::InitError;
use crate::frame::{FrameBuffer, PixelFormat};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::camera;

pub struct CameraDriver {
    initialized: bool,
    outstanding: bool,
    #[cfg(not(target_os = "espidf"))]
    sim: SimSensor,
}

impl Default for CameraDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDriver {
    pub fn new() -> Self {
        Self {
            initialized: false,
            outstanding: false,
            #[cfg(not(target_os = "espidf"))]
            sim: SimSensor::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a frame is currently lent out.
    pub fn has_outstanding_frame(&self) -> bool {
        self.outstanding
    }

    fn begin_acquire(&self) -> bool {
        if !self.initialized {
            warn!("Camera: acquire before initialize");
            return false;
        }
        if self.outstanding {
            warn!("Camera: previous frame not released");
            return false;
        }
        true
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

/// A frame buffer borrowed from the esp32-camera driver.
#[cfg(target_os = "espidf")]
pub struct CameraFrame {
    fb: core::ptr::NonNull<camera::camera_fb_t>,
}

#[cfg(target_os = "espidf")]
impl CameraFrame {
    fn fb(&self) -> &camera::camera_fb_t {
        // SAFETY: `fb` came from esp_camera_fb_get() and stays valid until
        // it is passed to esp_camera_fb_return(), which consumes `self`.
        unsafe { self.fb.as_ref() }
    }
}

#[cfg(target_os = "espidf")]
impl FrameBuffer for CameraFrame {
    fn width(&self) -> usize {
        self.fb().width
    }

    fn height(&self) -> usize {
        self.fb().height
    }

    fn format(&self) -> PixelFormat {
        match self.fb().format {
            camera::pixformat_t_PIXFORMAT_GRAYSCALE => PixelFormat::Grayscale,
            camera::pixformat_t_PIXFORMAT_YUV422 => PixelFormat::Yuv422,
            camera::pixformat_t_PIXFORMAT_RGB565 => PixelFormat::Rgb565,
            // Everything else is compressed or unsupported.
            _ => PixelFormat::Jpeg,
        }
    }

    fn data(&self) -> &[u8] {
        let fb = self.fb();
        if fb.buf.is_null() {
            return &[];
        }
        // SAFETY: the driver guarantees `buf` holds `len` bytes for the
        // lifetime of the frame buffer.
        unsafe { core::slice::from_raw_parts(fb.buf, fb.len) }
    }
}

#[cfg(target_os = "espidf")]
fn to_camera_config(config: &SensorConfig) -> camera::camera_config_t {
    use crate::config::{FbLocation, FrameSize, GrabMode};

    let pixel_format = match config.pixel_format {
        PixelFormat::Grayscale => camera::pixformat_t_PIXFORMAT_GRAYSCALE,
        PixelFormat::Yuv422 => camera::pixformat_t_PIXFORMAT_YUV422,
        PixelFormat::Rgb565 => camera::pixformat_t_PIXFORMAT_RGB565,
        PixelFormat::Jpeg => camera::pixformat_t_PIXFORMAT_JPEG,
    };
    let frame_size = match config.frame_size {
        FrameSize::Qqvga => camera::framesize_t_FRAMESIZE_QQVGA,
        FrameSize::Qcif => camera::framesize_t_FRAMESIZE_QCIF,
        FrameSize::Hqvga => camera::framesize_t_FRAMESIZE_HQVGA,
        FrameSize::Qvga => camera::framesize_t_FRAMESIZE_QVGA,
        FrameSize::Cif => camera::framesize_t_FRAMESIZE_CIF,
        FrameSize::Hvga => camera::framesize_t_FRAMESIZE_HVGA,
        FrameSize::Vga => camera::framesize_t_FRAMESIZE_VGA,
        FrameSize::Svga => camera::framesize_t_FRAMESIZE_SVGA,
        FrameSize::Xga => camera::framesize_t_FRAMESIZE_XGA,
        FrameSize::Hd => camera::framesize_t_FRAMESIZE_HD,
        FrameSize::Sxga => camera::framesize_t_FRAMESIZE_SXGA,
        FrameSize::Uxga => camera::framesize_t_FRAMESIZE_UXGA,
    };
    let grab_mode = match config.grab_mode {
        GrabMode::WhenEmpty => camera::camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY,
        GrabMode::Latest => camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
    };
    let fb_location = match config.fb_location {
        FbLocation::Psram => camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
        FbLocation::Dram => camera::camera_fb_location_t_CAMERA_FB_IN_DRAM,
    };
    let d = &config.pin_data;

    camera::camera_config_t {
        pin_pwdn: config.pin_pwdn,
        pin_reset: config.pin_reset,
        pin_xclk: config.pin_xclk,
        __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
            pin_sccb_sda: config.pin_sccb_sda,
        },
        __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
            pin_sccb_scl: config.pin_sccb_scl,
        },
        pin_d7: d[7],
        pin_d6: d[6],
        pin_d5: d[5],
        pin_d4: d[4],
        pin_d3: d[3],
        pin_d2: d[2],
        pin_d1: d[1],
        pin_d0: d[0],
        pin_vsync: config.pin_vsync,
        pin_href: config.pin_href,
        pin_pclk: config.pin_pclk,
        xclk_freq_hz: config.xclk_freq_hz as i32,
        ledc_timer: esp_idf_svc::sys::ledc_timer_t_LEDC_TIMER_0,
        ledc_channel: esp_idf_svc::sys::ledc_channel_t_LEDC_CHANNEL_0,
        pixel_format,
        frame_size,
        jpeg_quality: i32::from(config.jpeg_quality),
        fb_count: usize::from(config.fb_count),
        fb_location,
        grab_mode,
        ..Default::default()
    }
}

#[cfg(target_os = "espidf")]
impl FrameSource for CameraDriver {
    type Frame = CameraFrame;

    fn initialize(&mut self, config: &SensorConfig) -> Result<(), InitError> {
        if self.initialized {
            return Err(InitError::AlreadyInitialized);
        }
        config.validate()?;

        let cfg = to_camera_config(config);
        // SAFETY: called once from the main task before the capture loop.
        let ret = unsafe { camera::esp_camera_init(&cfg) };
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            return Err(InitError::SensorRejected(ret));
        }

        self.initialized = true;
        let (w, h) = config.frame_size.dimensions();
        info!(
            "Camera: initialized {}x{} {:?}, XCLK {} Hz, {} buffer(s)",
            w, h, config.pixel_format, config.xclk_freq_hz, config.fb_count
        );
        Ok(())
    }

    fn acquire_frame(&mut self) -> Option<CameraFrame> {
        if !self.begin_acquire() {
            return None;
        }
        // SAFETY: the driver is initialized and no frame is outstanding.
        let fb = unsafe { camera::esp_camera_fb_get() };
        let fb = core::ptr::NonNull::new(fb)?;
        self.outstanding = true;
        Some(CameraFrame { fb })
    }

    fn release_frame(&mut self, frame: CameraFrame) {
        // SAFETY: `frame.fb` came from esp_camera_fb_get() and is returned once.
        unsafe { camera::esp_camera_fb_return(frame.fb.as_ptr()) };
        self.outstanding = false;
    }
}

// ── Host simulation ───────────────────────────────────────────

/// A frame served by the simulated sensor.  Owns the driver's buffer
/// while lent out.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct SimFrame {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

#[cfg(not(target_os = "espidf"))]
impl FrameBuffer for SimFrame {
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
        &self.data
    }
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimSensor {
    width: usize,
    height: usize,
    format: Option<PixelFormat>,
    buffer: Vec<u8>,
    reject_init: Option<i32>,
    drop_frames: u32,
    acquired: u64,
    released: u64,
}

#[cfg(not(target_os = "espidf"))]
impl CameraDriver {
    /// Make the next `initialize` fail with `rc`.
    pub fn sim_reject_init(&mut self, rc: i32) {
        self.sim.reject_init = Some(rc);
    }

    /// Return `None` from the next `count` acquisitions.
    pub fn sim_drop_frames(&mut self, count: u32) {
        self.sim.drop_frames = count;
    }

    /// Replace the scene served on every subsequent capture.
    pub fn sim_set_scene(&mut self, width: usize, height: usize, format: PixelFormat, data: &[u8]) {
        self.sim.width = width;
        self.sim.height = height;
        self.sim.format = Some(format);
        self.sim.buffer.clear();
        self.sim.buffer.extend_from_slice(data);
    }

    /// `(acquired, released)` frame counts.
    pub fn sim_frame_counts(&self) -> (u64, u64) {
        (self.sim.acquired, self.sim.released)
    }

    /// Horizontal gradient in the configured format.
    fn sim_fill_gradient(&mut self, width: usize, height: usize, format: PixelFormat) {
        let bpp = format.bytes_per_pixel().unwrap_or(1);
        self.sim.width = width;
        self.sim.height = height;
        self.sim.format = Some(format);
        self.sim.buffer.clear();
        for _ in 0..height {
            for x in 0..width {
                let v = (x * 255 / width.max(1)) as u8;
                self.sim.buffer.extend(std::iter::repeat_n(v, bpp));
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl FrameSource for CameraDriver {
    type Frame = SimFrame;

    fn initialize(&mut self, config: &SensorConfig) -> Result<(), InitError> {
        if self.initialized {
            return Err(InitError::AlreadyInitialized);
        }
        config.validate()?;
        if let Some(rc) = self.sim.reject_init.take() {
            return Err(InitError::SensorRejected(rc));
        }

        let (w, h) = config.frame_size.dimensions();
        if self.sim.format.is_none() {
            self.sim_fill_gradient(w, h, config.pixel_format);
        }
        self.initialized = true;
        info!("Camera(sim): initialized {}x{} {:?}", w, h, config.pixel_format);
        Ok(())
    }

    fn acquire_frame(&mut self) -> Option<SimFrame> {
        if !self.begin_acquire() {
            return None;
        }
        if self.sim.drop_frames > 0 {
            self.sim.drop_frames -= 1;
            return None;
        }
        self.outstanding = true;
        self.sim.acquired += 1;
        Some(SimFrame {
            width: self.sim.width,
            height: self.sim.height,
            format: self.sim.format.unwrap_or(PixelFormat::Grayscale),
            data: core::mem::take(&mut self.sim.buffer),
        })
    }

    fn release_frame(&mut self, frame: SimFrame) {
        self.sim.buffer = frame.data;
        self.sim.released += 1;
        self.outstanding = false;
    }
}
