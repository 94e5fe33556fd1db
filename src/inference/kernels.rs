//! f32 operator kernels.
//!
//! Shapes are validated once at load time by [`Op::output_shape`]; the
//! kernels here assume `input.len() == in_shape.len()` and
//! `output.len() == out_shape.len()` and never allocate.

use super::model::{Op, Padding, Shape, weight};

/// Execute one operator.
pub fn eval(op: &Op<'_>, input: &[f32], in_shape: Shape, out_shape: Shape, output: &mut [f32]) {
    match *op {
        Op::Conv2d {
            kernel,
            stride,
            padding,
            weights,
            bias,
            ..
        } => conv2d(
            input,
            in_shape,
            output,
            out_shape,
            kernel as usize,
            stride as usize,
            padding,
            weights,
            bias,
        ),
        Op::MaxPool2d { size, stride } => {
            max_pool2d(input, in_shape, output, out_shape, size as usize, stride as usize);
        }
        Op::FullyConnected { weights, bias, .. } => fully_connected(input, output, weights, bias),
        Op::Relu => relu(input, output),
        Op::Softmax => softmax(input, output),
        Op::Flatten => output.copy_from_slice(input),
    }
}

#[allow(clippy::too_many_arguments)]
fn conv2d(
    input: &[f32],
    ins: Shape,
    output: &mut [f32],
    outs: Shape,
    k: usize,
    s: usize,
    padding: Padding,
    weights: &[u8],
    bias: &[u8],
) {
    let (pad_top, pad_left) = match padding {
        Padding::Valid => (0, 0),
        Padding::Same => (
            ((outs.height - 1) * s + k).saturating_sub(ins.height) / 2,
            ((outs.width - 1) * s + k).saturating_sub(ins.width) / 2,
        ),
    };
    let c = ins.channels;

    for oy in 0..outs.height {
        for ox in 0..outs.width {
            for f in 0..outs.channels {
                let mut acc = weight(bias, f);
                for ky in 0..k {
                    let iy = (oy * s + ky) as isize - pad_top as isize;
                    if iy < 0 || iy >= ins.height as isize {
                        continue;
                    }
                    for kx in 0..k {
                        let ix = (ox * s + kx) as isize - pad_left as isize;
                        if ix < 0 || ix >= ins.width as isize {
                            continue;
                        }
                        let src = (iy as usize * ins.width + ix as usize) * c;
                        let w = ((f * k + ky) * k + kx) * c;
                        for ch in 0..c {
                            acc += input[src + ch] * weight(weights, w + ch);
                        }
                    }
                }
                output[(oy * outs.width + ox) * outs.channels + f] = acc;
            }
        }
    }
}

fn max_pool2d(input: &[f32], ins: Shape, output: &mut [f32], outs: Shape, k: usize, s: usize) {
    let c = ins.channels;
    for oy in 0..outs.height {
        for ox in 0..outs.width {
            for ch in 0..c {
                let mut m = f32::NEG_INFINITY;
                for ky in 0..k {
                    for kx in 0..k {
                        let v = input[((oy * s + ky) * ins.width + ox * s + kx) * c + ch];
                        m = m.max(v);
                    }
                }
                output[(oy * outs.width + ox) * c + ch] = m;
            }
        }
    }
}

fn fully_connected(input: &[f32], output: &mut [f32], weights: &[u8], bias: &[u8]) {
    let n = input.len();
    for (u, out) in output.iter_mut().enumerate() {
        let row = u * n;
        let mut acc = weight(bias, u);
        for (i, x) in input.iter().enumerate() {
            acc += x * weight(weights, row + i);
        }
        *out = acc;
    }
}

fn relu(input: &[f32], output: &mut [f32]) {
    for (o, &x) in output.iter_mut().zip(input) {
        *o = x.max(0.0);
    }
}

fn softmax(input: &[f32], output: &mut [f32]) {
    let max = input.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for (o, &x) in output.iter_mut().zip(input) {
        *o = (x - max).exp();
        sum += *o;
    }
    for o in output.iter_mut() {
        *o /= sum;
    }
}
