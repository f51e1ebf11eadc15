//! Two-layer action-value network: input -> hidden (ReLU) -> output.
//!
//! Weights are stored flat and row-major (`w1[j * input + i]` connects input `i`
//! to hidden unit `j`), which is also the order the optimizer walks them in.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default directory for saved parameters.
pub const MODEL_DIR: &str = "./model";

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QNet {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    w1: Vec<f32>, // hidden x input
    b1: Vec<f32>,
    w2: Vec<f32>, // output x hidden
    b2: Vec<f32>,
}

/// Gradient accumulators shaped like the parameters of a [`QNet`].
#[derive(Clone, Debug)]
pub struct Gradients {
    pub w1: Vec<f32>,
    pub b1: Vec<f32>,
    pub w2: Vec<f32>,
    pub b2: Vec<f32>,
}

impl Gradients {
    pub fn zero_grad(&mut self) {
        for g in [&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2] {
            g.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Flat views in the same order as [`QNet::params_mut`].
    pub fn tensors(&self) -> [&[f32]; 4] {
        [self.w1.as_slice(), self.b1.as_slice(), self.w2.as_slice(), self.b2.as_slice()]
    }
}

impl QNet {
    /// Uniform init in `[-1/sqrt(fan_in), 1/sqrt(fan_in)]` for weights and biases.
    pub fn new<R: Rng>(input: usize, hidden: usize, output: usize, rng: &mut R) -> Self {
        let mut layer = |fan_in: usize, count: usize| -> Vec<f32> {
            let bound = 1.0 / (fan_in as f32).sqrt();
            (0..count).map(|_| rng.gen_range(-bound..bound)).collect()
        };
        let w1 = layer(input, hidden * input);
        let b1 = layer(input, hidden);
        let w2 = layer(hidden, output * hidden);
        let b2 = layer(hidden, output);
        Self { input_size: input, hidden_size: hidden, output_size: output, w1, b1, w2, b2 }
    }

    /// Builds a network from explicit parameters laid out as described above.
    pub fn from_parts(
        input: usize,
        hidden: usize,
        output: usize,
        w1: Vec<f32>,
        b1: Vec<f32>,
        w2: Vec<f32>,
        b2: Vec<f32>,
    ) -> Result<Self> {
        let net = Self { input_size: input, hidden_size: hidden, output_size: output, w1, b1, w2, b2 };
        net.check_shapes()?;
        Ok(net)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Zeroed gradient buffers for this network.
    pub fn gradients(&self) -> Gradients {
        Gradients {
            w1: vec![0.0; self.w1.len()],
            b1: vec![0.0; self.b1.len()],
            w2: vec![0.0; self.w2.len()],
            b2: vec![0.0; self.b2.len()],
        }
    }

    /// Mutable flat parameter tensors: `[w1, b1, w2, b2]`.
    pub fn params_mut(&mut self) -> [&mut [f32]; 4] {
        [
            self.w1.as_mut_slice(),
            self.b1.as_mut_slice(),
            self.w2.as_mut_slice(),
            self.b2.as_mut_slice(),
        ]
    }

    /// Pre-activations of the hidden layer.
    fn hidden_pre(&self, x: &[f32]) -> Vec<f32> {
        assert_eq!(x.len(), self.input_size, "input has wrong length");
        (0..self.hidden_size)
            .map(|j| {
                let row = &self.w1[j * self.input_size..(j + 1) * self.input_size];
                self.b1[j] + row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>()
            })
            .collect()
    }

    fn output(&self, hidden: &[f32]) -> Vec<f32> {
        (0..self.output_size)
            .map(|k| {
                let row = &self.w2[k * self.hidden_size..(k + 1) * self.hidden_size];
                self.b2[k] + row.iter().zip(hidden).map(|(w, h)| w * h).sum::<f32>()
            })
            .collect()
    }

    /// Action values for a single state.
    pub fn forward(&self, x: &[f32]) -> Vec<f32> {
        let hidden: Vec<f32> = self.hidden_pre(x).into_iter().map(relu).collect();
        self.output(&hidden)
    }

    /// Action values for every row of a batch, in order.
    pub fn forward_batch<X: AsRef<[f32]> + Sync>(&self, xs: &[X]) -> Vec<Vec<f32>> {
        xs.par_iter().map(|x| self.forward(x.as_ref())).collect()
    }

    /// Accumulates into `grads` the gradient of a loss whose derivative with
    /// respect to `forward(x)` is `d_out`.
    pub fn backward(&self, x: &[f32], d_out: &[f32], grads: &mut Gradients) {
        assert_eq!(d_out.len(), self.output_size, "output gradient has wrong length");
        let pre = self.hidden_pre(x);
        let hidden: Vec<f32> = pre.iter().map(|&z| relu(z)).collect();

        let mut d_hidden = vec![0.0f32; self.hidden_size];
        for (k, &g) in d_out.iter().enumerate() {
            if g == 0.0 {
                continue;
            }
            grads.b2[k] += g;
            let base = k * self.hidden_size;
            for j in 0..self.hidden_size {
                grads.w2[base + j] += g * hidden[j];
                d_hidden[j] += g * self.w2[base + j];
            }
        }

        for j in 0..self.hidden_size {
            if pre[j] <= 0.0 {
                continue;
            }
            let g = d_hidden[j];
            grads.b1[j] += g;
            let base = j * self.input_size;
            for i in 0..self.input_size {
                grads.w1[base + i] += g * x[i];
            }
        }
    }

    /// Writes parameters to `MODEL_DIR/file_name`, replacing any previous file.
    pub fn save(&self, file_name: &str) -> Result<PathBuf> {
        self.save_to(Path::new(MODEL_DIR), file_name)
    }

    pub fn save_to(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let tmp = dir.join(format!("{file_name}.tmp"));
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, &path)?;
        info!("saved model to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let net: QNet = serde_json::from_slice(&fs::read(path)?)?;
        net.check_shapes()?;
        Ok(net)
    }

    /// Fails if `other` was built with different layer sizes.
    pub fn check_compatible(&self, other: &QNet) -> Result<()> {
        let dims = |n: &QNet| format!("{}x{}x{}", n.input_size, n.hidden_size, n.output_size);
        if dims(self) != dims(other) {
            return Err(Error::Shape { expected: dims(self), found: dims(other) });
        }
        Ok(())
    }

    fn check_shapes(&self) -> Result<()> {
        let expected = [
            ("w1", self.hidden_size * self.input_size, self.w1.len()),
            ("b1", self.hidden_size, self.b1.len()),
            ("w2", self.output_size * self.hidden_size, self.w2.len()),
            ("b2", self.output_size, self.b2.len()),
        ];
        for (name, want, got) in expected {
            if want != got {
                return Err(Error::Shape {
                    expected: format!("{name}[{want}]"),
                    found: format!("{name}[{got}]"),
                });
            }
        }
        Ok(())
    }
}
