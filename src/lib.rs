//! CamClassify firmware library.
//!
//! Exposes the pipeline modules for integration testing and host-side
//! tooling.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; on the host the
//! drivers fall back to simulations.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod inference;
pub mod pins;
pub mod preprocess;

pub mod adapters;
pub mod drivers;
