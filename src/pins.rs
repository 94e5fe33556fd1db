//! Camera pin assignments for the ESP32-S3-EYE board.
//!
//! Single source of truth; [`SensorConfig::default`](crate::config::SensorConfig)
//! references this module rather than hard-coding pin numbers.
//!
//! `-1` means the signal is not routed on this board.

// ---------------------------------------------------------------------------
// Power / reset (not routed on S3-EYE)
// ---------------------------------------------------------------------------

pub const CAM_PIN_PWDN: i32 = -1;
pub const CAM_PIN_RESET: i32 = -1;

// ---------------------------------------------------------------------------
// Sync + clocks
// ---------------------------------------------------------------------------

pub const CAM_PIN_VSYNC: i32 = 6;
pub const CAM_PIN_HREF: i32 = 7;
pub const CAM_PIN_PCLK: i32 = 13;
/// Master clock output to the sensor (LEDC-driven).
pub const CAM_PIN_XCLK: i32 = 15;

// ---------------------------------------------------------------------------
// SCCB (I²C-like) control bus
// ---------------------------------------------------------------------------

pub const CAM_PIN_SIOD: i32 = 4;
pub const CAM_PIN_SIOC: i32 = 5;

// ---------------------------------------------------------------------------
// 8-bit parallel data bus, D0 (LSB) .. D7 (MSB)
// ---------------------------------------------------------------------------

pub const CAM_PIN_D0: i32 = 11;
pub const CAM_PIN_D1: i32 = 9;
pub const CAM_PIN_D2: i32 = 8;
pub const CAM_PIN_D3: i32 = 10;
pub const CAM_PIN_D4: i32 = 12;
pub const CAM_PIN_D5: i32 = 18;
pub const CAM_PIN_D6: i32 = 17;
pub const CAM_PIN_D7: i32 = 16;

/// Data bus in D0..D7 order.
pub const CAM_DATA_PINS: [i32; 8] = [
    CAM_PIN_D0, CAM_PIN_D1, CAM_PIN_D2, CAM_PIN_D3, CAM_PIN_D4, CAM_PIN_D5, CAM_PIN_D6, CAM_PIN_D7,
];
