//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to          |
//! |------------|------------|----------------------|
//! | `log_sink` | EventSink  | Serial log output    |
//! | `time`     | ClockPort  | ESP32 system timer   |
//!
//! The camera ([`FrameSource`](crate::app::ports::FrameSource)) lives in
//! [`drivers::camera`](crate::drivers::camera) and the interpreter in
//! [`inference`](crate::inference).

pub mod log_sink;
pub mod time;
