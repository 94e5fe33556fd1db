//! Embedded model artifact: header, schema, and load-time validation.
//!
//! ```text
//! ┌────────┬─────────┬──────────────────────────────────────┐
//! │ "CCVM" │ ver u16 │ postcard(ModelSchema)                │
//! │ 4 B    │ 2 B LE  │ input shape + ordered operator list  │
//! └────────┴─────────┴──────────────────────────────────────┘
//! ```
//!
//! Weights are little-endian `f32` stored as raw bytes and *borrowed* from
//! the artifact, so a model embedded in flash is never copied into RAM.
//! All tensors are row-major `H × W × C`; convolution filters are laid out
//! `[filters][kernel_h][kernel_w][in_channels]`.

use serde::{Deserialize, Serialize};

use crate::error::ModelLoadError;

pub const MODEL_MAGIC: [u8; 4] = *b"CCVM";
pub const SCHEMA_VERSION: u16 = 1;
const HEADER_LEN: usize = MODEL_MAGIC.len() + 2;

/// Tensor shape as stored in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorShape {
    pub height: u16,
    pub width: u16,
    pub channels: u16,
}

/// Working shape used by the planner and kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Shape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    pub const fn vector(len: usize) -> Self {
        Self::new(1, 1, len)
    }

    pub const fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element count, or `None` if it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.height.checked_mul(self.width)?.checked_mul(self.channels)
    }
}

impl From<TensorShape> for Shape {
    fn from(s: TensorShape) -> Self {
        Self::new(s.height as usize, s.width as usize, s.channels as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Padding {
    /// No padding; output shrinks by `kernel - 1`.
    Valid,
    /// Zero padding so that `out = ceil(in / stride)`.
    Same,
}

/// One operator in the graph, executed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op<'a> {
    Conv2d {
        filters: u16,
        kernel: u16,
        stride: u16,
        padding: Padding,
        weights: &'a [u8],
        bias: &'a [u8],
    },
    MaxPool2d {
        size: u16,
        stride: u16,
    },
    FullyConnected {
        units: u16,
        weights: &'a [u8],
        bias: &'a [u8],
    },
    Relu,
    Softmax,
    Flatten,
}

impl Op<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Conv2d { .. } => "CONV_2D",
            Self::MaxPool2d { .. } => "MAX_POOL_2D",
            Self::FullyConnected { .. } => "FULLY_CONNECTED",
            Self::Relu => "RELU",
            Self::Softmax => "SOFTMAX",
            Self::Flatten => "FLATTEN",
        }
    }

    /// Output shape for `input`, validating operator parameters and weight
    /// sizes.  `index` is only used to tag errors.
    pub fn output_shape(&self, index: usize, input: Shape) -> Result<Shape, ModelLoadError> {
        let mismatch = ModelLoadError::ShapeMismatch { op: index };
        match *self {
            Self::Conv2d {
                filters,
                kernel,
                stride,
                padding,
                weights,
                bias,
            } => {
                let (f, k, s) = (filters as usize, kernel as usize, stride as usize);
                if f == 0 || k == 0 || s == 0 || input.is_empty() {
                    return Err(mismatch);
                }
                let (oh, ow) = match padding {
                    Padding::Valid => {
                        if input.height < k || input.width < k {
                            return Err(mismatch);
                        }
                        ((input.height - k) / s + 1, (input.width - k) / s + 1)
                    }
                    Padding::Same => (input.height.div_ceil(s), input.width.div_ceil(s)),
                };
                let elements = k
                    .checked_mul(k)
                    .and_then(|n| n.checked_mul(f))
                    .and_then(|n| n.checked_mul(input.channels))
                    .ok_or(mismatch)?;
                check_bytes(index, weights, elements)?;
                check_bytes(index, bias, f)?;
                Ok(Shape::new(oh, ow, f))
            }
            Self::MaxPool2d { size, stride } => {
                let (k, s) = (size as usize, stride as usize);
                if k == 0 || s == 0 || input.height < k || input.width < k {
                    return Err(mismatch);
                }
                Ok(Shape::new(
                    (input.height - k) / s + 1,
                    (input.width - k) / s + 1,
                    input.channels,
                ))
            }
            Self::FullyConnected {
                units,
                weights,
                bias,
            } => {
                let u = units as usize;
                if u == 0 || input.is_empty() {
                    return Err(mismatch);
                }
                check_bytes(index, weights, u.checked_mul(input.len()).ok_or(mismatch)?)?;
                check_bytes(index, bias, u)?;
                Ok(Shape::vector(u))
            }
            Self::Relu | Self::Softmax => Ok(input),
            Self::Flatten => Ok(Shape::vector(input.len())),
        }
    }
}

/// Check that `bytes` holds exactly `elements` finite `f32` values.
fn check_bytes(op: usize, bytes: &[u8], elements: usize) -> Result<(), ModelLoadError> {
    let expected = elements.saturating_mul(4);
    if bytes.len() != expected {
        return Err(ModelLoadError::WeightSize {
            op,
            expected,
            actual: bytes.len(),
        });
    }
    // ReLU and max-pool would mask a NaN weight before the output check.
    let finite = bytes
        .chunks_exact(4)
        .all(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]).is_finite());
    if finite {
        Ok(())
    } else {
        Err(ModelLoadError::NonFiniteWeight { op })
    }
}

/// Read element `i` of a little-endian `f32` weight blob.
#[inline]
pub fn weight(bytes: &[u8], i: usize) -> f32 {
    let b = &bytes[i * 4..i * 4 + 4];
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Pack `f32` values into a little-endian weight blob (host-side export).
pub fn f32_le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decoded model body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema<'a> {
    pub input: TensorShape,
    #[serde(borrow)]
    pub ops: Vec<Op<'a>>,
}

impl<'a> ModelSchema<'a> {
    /// Parse an artifact, borrowing weights from `bytes`.
    pub fn decode(bytes: &'a [u8]) -> Result<Self, ModelLoadError> {
        if bytes.len() < HEADER_LEN || bytes[..4] != MODEL_MAGIC {
            return Err(ModelLoadError::BadMagic);
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SCHEMA_VERSION {
            return Err(ModelLoadError::UnsupportedVersion(version));
        }
        postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|_| ModelLoadError::Malformed)
    }

    /// Serialise to an artifact (host-side export and tests).
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&MODEL_MAGIC);
        out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
        out.extend_from_slice(&postcard::to_allocvec(self)?);
        Ok(out)
    }

    pub fn input_shape(&self) -> Shape {
        self.input.into()
    }

    /// Output shape of every operator, in execution order.
    pub fn infer_shapes(&self) -> Result<Vec<Shape>, ModelLoadError> {
        if self.ops.is_empty() {
            return Err(ModelLoadError::EmptyGraph);
        }
        let mut shape = self.input_shape();
        if shape.checked_len().is_none_or(|n| n == 0) {
            return Err(ModelLoadError::ShapeMismatch { op: 0 });
        }
        let mut shapes = Vec::with_capacity(self.ops.len());
        for (i, op) in self.ops.iter().enumerate() {
            shape = op.output_shape(i, shape)?;
            if shape.checked_len().is_none() {
                return Err(ModelLoadError::ShapeMismatch { op: i });
            }
            shapes.push(shape);
        }
        Ok(shapes)
    }
}
