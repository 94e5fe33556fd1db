//! Unified error types for the CamClassify firmware.
//!
//! One enum per pipeline stage plus a top-level [`Error`] that every stage
//! converts into, so the capture loop handles failures uniformly.  All
//! variants are `Copy` and allocation-free.
//!
//! | Error              | When                          | Loop policy             |
//! |--------------------|-------------------------------|-------------------------|
//! | [`InitError`]      | sensor setup                  | fatal, never loop       |
//! | [`ModelLoadError`] | model parse / arena planning  | fatal, never loop       |
//! | [`AcquireError`]   | no frame from the driver      | skip iteration          |
//! | [`PreprocessError`]| unusable frame geometry       | skip, release frame     |
//! | [`InferenceError`] | graph execution failed        | skip, release frame     |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Init(InitError),
    ModelLoad(ModelLoadError),
    Acquire(AcquireError),
    Preprocess(PreprocessError),
    Inference(InferenceError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// Initialization-time errors stop startup; everything else only skips
    /// one loop iteration.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Init(_) | Self::ModelLoad(_) | Self::Config(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::ModelLoad(e) => write!(f, "model load: {e}"),
            Self::Acquire(e) => write!(f, "acquire: {e}"),
            Self::Preprocess(e) => write!(f, "preprocess: {e}"),
            Self::Inference(e) => write!(f, "inference: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor initialisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The camera driver rejected the configuration (ESP-IDF return code).
    SensorRejected(i32),
    /// `initialize` was called a second time.
    AlreadyInitialized,
    /// The sensor configuration failed validation before touching hardware.
    InvalidConfig(&'static str),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorRejected(rc) => write!(f, "camera init failed (rc={rc})"),
            Self::AlreadyInitialized => write!(f, "camera already initialized"),
            Self::InvalidConfig(msg) => write!(f, "invalid sensor config: {msg}"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Model loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLoadError {
    /// Artifact does not start with the model magic.
    BadMagic,
    /// Schema version this firmware cannot execute.
    UnsupportedVersion(u16),
    /// Body failed to decode.
    Malformed,
    /// The graph contains no operators.
    EmptyGraph,
    /// Operator `op` cannot accept the shape produced by its predecessor.
    ShapeMismatch { op: usize },
    /// Operator `op` carries `actual` weight bytes where `expected` were needed.
    WeightSize { op: usize, expected: usize, actual: usize },
    /// Planned tensors need more memory than the arena provides.
    ArenaTooSmall { required: usize, capacity: usize },
    /// Model input length differs from the compile-time tensor size.
    InputSize { expected: usize, actual: usize },
    /// Model output length differs from the label table.
    OutputSize { expected: usize, actual: usize },
    /// `first` reported class is not below the model's class count.
    FirstClassOutOfRange { first: usize, classes: usize },
    /// Operator `op` carries a NaN or infinite weight or bias.
    NonFiniteWeight { op: usize },
    /// The runner is already `Ready`; models are loaded once.
    AlreadyLoaded,
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "bad model magic"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported schema version {v}"),
            Self::Malformed => write!(f, "malformed model body"),
            Self::EmptyGraph => write!(f, "model has no operators"),
            Self::ShapeMismatch { op } => write!(f, "shape mismatch at op {op}"),
            Self::WeightSize { op, expected, actual } => {
                write!(f, "op {op}: expected {expected} weight bytes, got {actual}")
            }
            Self::ArenaTooSmall { required, capacity } => {
                write!(f, "arena too small: need {required} bytes, have {capacity}")
            }
            Self::InputSize { expected, actual } => {
                write!(f, "input tensor has {actual} elements, expected {expected}")
            }
            Self::OutputSize { expected, actual } => {
                write!(f, "output tensor has {actual} classes, label table has {expected}")
            }
            Self::FirstClassOutOfRange { first, classes } => {
                write!(f, "first reported class {first} out of range for {classes} classes")
            }
            Self::NonFiniteWeight { op } => write!(f, "op {op}: non-finite weight"),
            Self::AlreadyLoaded => write!(f, "model already loaded"),
        }
    }
}

impl From<ModelLoadError> for Error {
    fn from(e: ModelLoadError) -> Self {
        Self::ModelLoad(e)
    }
}

// ---------------------------------------------------------------------------
// Per-iteration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The driver returned no frame buffer.
    NoFrame,
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFrame => write!(f, "no frame available"),
        }
    }
}

impl From<AcquireError> for Error {
    fn from(e: AcquireError) -> Self {
        Self::Acquire(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessError {
    /// Width or height is zero.
    DegenerateFrame { width: usize, height: usize },
    /// Buffer holds fewer bytes than the geometry requires.
    BufferTooShort { required: usize, actual: usize },
    /// Geometry too large to address (`width * height * bpp` overflows).
    Oversized { width: usize, height: usize },
    /// Pixel encoding cannot be resampled (e.g. JPEG).
    UnsupportedFormat,
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateFrame { width, height } => {
                write!(f, "degenerate frame {width}x{height}")
            }
            Self::BufferTooShort { required, actual } => {
                write!(f, "frame buffer too short ({actual} < {required} bytes)")
            }
            Self::Oversized { width, height } => write!(f, "frame {width}x{height} too large"),
            Self::UnsupportedFormat => write!(f, "unsupported pixel format"),
        }
    }
}

impl From<PreprocessError> for Error {
    fn from(e: PreprocessError) -> Self {
        Self::Preprocess(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceError {
    /// No model has been loaded.
    NotReady,
    /// The input tensor contains NaN or infinity.
    NonFiniteInput,
    /// The graph produced NaN or infinity.
    NonFiniteOutput,
    /// The last invocation failed (or none ran); outputs are not valid.
    NoValidOutput,
    /// A kernel rejected its operands at run time.
    KernelFailed { op: usize },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "interpreter not ready"),
            Self::NonFiniteInput => write!(f, "non-finite value in input tensor"),
            Self::NonFiniteOutput => write!(f, "non-finite value in output tensor"),
            Self::NoValidOutput => write!(f, "no valid output from last invocation"),
            Self::KernelFailed { op } => write!(f, "kernel failed at op {op}"),
        }
    }
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
