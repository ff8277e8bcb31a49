// Transform — per-sample preprocessing pipeline

use crate::dataset::Sample;

/// A transform applied to each sample before batching.
pub trait Transform: Send + Sync {
    /// Apply the transform to a sample, returning the modified sample.
    fn apply(&self, sample: Sample) -> Sample;
}

// Built-in transforms

/// Scale features into [0, 1] by dividing by a given factor.
///
/// Commonly used for image pixels: `Scale::new(255.0)`.
#[derive(Debug, Clone)]
pub struct Scale {
    factor: f64,
}

impl Scale {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl Transform for Scale {
    fn apply(&self, mut sample: Sample) -> Sample {
        for v in &mut sample.features {
            *v /= self.factor;
        }
        sample
    }
}

/// Standardize each channel of a channel-first `[C, H, W]` feature block
/// with its own mean and standard deviation.
#[derive(Debug, Clone)]
pub struct ChannelNormalize {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ChannelNormalize {
    /// # Panics
    /// Panics if `mean` and `std` differ in length.
    pub fn new(mean: &[f64], std: &[f64]) -> Self {
        assert_eq!(
            mean.len(),
            std.len(),
            "ChannelNormalize: {} means vs {} stds",
            mean.len(),
            std.len()
        );
        Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        }
    }
}

impl Transform for ChannelNormalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        let channels = self.mean.len();
        assert_eq!(
            sample.feature_shape.first().copied().unwrap_or(0),
            channels,
            "ChannelNormalize: sample shape {:?} does not start with {} channels",
            sample.feature_shape,
            channels
        );
        let plane = sample.features.len() / channels;
        for c in 0..channels {
            let (m, s) = (self.mean[c], self.std[c]);
            for v in &mut sample.features[c * plane..(c + 1) * plane] {
                *v = (*v - m) / s;
            }
        }
        sample
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for Compose {
    fn apply(&self, mut sample: Sample) -> Sample {
        for t in &self.transforms {
            sample = t.apply(sample);
        }
        sample
    }
}
