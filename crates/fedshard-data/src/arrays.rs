// ArrayDataset — raw feature/label array pairs stored as .npy files
//
// Each split is a pair of files under one root:
//   - x_{split}_dataset.npy  u8, shape [N, H, W, C], pixel values 0..255
//   - y_{split}_dataset.npy  i64, shape [N], one class label per sample
//
// Pixels are converted to channel-first [C, H, W] at load time so samples
// line up with the binary CIFAR and image-folder datasets.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array4};
use ndarray_npy::ReadNpyExt;

use crate::dataset::{ClassId, Dataset, LabelSource, LabeledDataset, Sample};
use crate::error::{Error, Result};

/// A dataset backed by a feature array and a label array.
#[derive(Debug)]
pub struct ArrayDataset {
    /// Channel-first pixel bytes, `sample_len` per sample.
    pixels: Vec<u8>,
    labels: Vec<ClassId>,
    sample_len: usize,
    feature_dims: [usize; 3],
    dataset_name: String,
}

impl ArrayDataset {
    /// Load the `x_{split}_dataset.npy` / `y_{split}_dataset.npy` pair
    /// under `root`.
    pub fn load(root: impl AsRef<Path>, split: &str) -> Result<Self> {
        let root = root.as_ref();
        let x_path = root.join(format!("x_{split}_dataset.npy"));
        let y_path = root.join(format!("y_{split}_dataset.npy"));
        for path in [&x_path, &y_path] {
            if !path.exists() {
                return Err(Error::MissingFile(path.clone()));
            }
        }

        let x = Array4::<u8>::read_npy(fs::File::open(&x_path)?)?;
        let y = Array1::<i64>::read_npy(fs::File::open(&y_path)?)?;
        Self::from_arrays(x, y, split)
    }

    /// Build a dataset from arrays already in memory.
    ///
    /// `x` is `[N, H, W, C]` interleaved pixels; `y` holds one label per
    /// sample. Pixels are re-laid-out channel-first.
    pub fn from_arrays(x: Array4<u8>, y: Array1<i64>, split: &str) -> Result<Self> {
        let (n, h, w, c) = x.dim();
        if n != y.len() {
            return Err(Error::CountMismatch {
                features: n,
                labels: y.len(),
            });
        }

        let mut labels = Vec::with_capacity(n);
        for &v in y.iter() {
            if v < 0 {
                return Err(Error::NegativeLabel(v));
            }
            labels.push(v as ClassId);
        }

        // [N, H, W, C] -> [N, C, H, W], flattened row-major.
        let pixels: Vec<u8> = x.permuted_axes([0, 3, 1, 2]).iter().copied().collect();

        Ok(Self {
            pixels,
            labels,
            sample_len: c * h * w,
            feature_dims: [c, h, w],
            dataset_name: format!("arrays-{split}"),
        })
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    /// Class label for sample `i`.
    pub fn label(&self, i: usize) -> ClassId {
        self.labels[i]
    }
}

impl Dataset for ArrayDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Sample {
        let start = index * self.sample_len;
        let pixels = &self.pixels[start..start + self.sample_len];

        Sample {
            features: pixels.iter().map(|&p| p as f64).collect(),
            feature_shape: self.feature_dims.to_vec(),
            target: vec![self.labels[index] as f64],
            target_shape: vec![1],
        }
    }

    fn feature_shape(&self) -> &[usize] {
        &self.feature_dims
    }

    fn target_shape(&self) -> &[usize] {
        &[1]
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}

impl LabeledDataset for ArrayDataset {
    fn label_source(&self) -> LabelSource<'_> {
        LabelSource::Paired(&self.labels)
    }
}
