//! Application core: pure pipeline logic, zero I/O.
//!
//! The capture loop body lives here.  All interaction with the camera, the
//! model, the clock and the log goes through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
