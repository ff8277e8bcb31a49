// Dataset trait — unified interface for any labeled data source

use std::sync::Arc;

/// Integer class label, in `[0, num_classes)`.
pub type ClassId = usize;

/// A single sample: a pair of (input features, label/target).
///
/// Both are stored as `Vec<f64>` with their associated shapes so they can be
/// batched later. Image features use channel-first `[C, H, W]` layout with
/// raw pixel values in `[0, 255]`; scaling and normalization are applied by
/// loader transforms.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Input feature vector (flattened).
    pub features: Vec<f64>,
    /// Shape of the feature block (e.g. `[3, 32, 32]` for CIFAR).
    pub feature_shape: Vec<usize>,
    /// Target / label value(s) (flattened). For classification this is a
    /// single-element vec holding the class index as `f64`.
    pub target: Vec<f64>,
    /// Shape of the target block (e.g. `[1]` for a class index).
    pub target_shape: Vec<usize>,
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the loader can read from multiple
/// threads when parallel prefetching is enabled.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Panics
    /// May panic if `index >= self.len()`.
    fn get(&self, index: usize) -> Sample;

    /// The shape of a single feature sample (without batch dim).
    fn feature_shape(&self) -> &[usize];

    /// The shape of a single target sample (without batch dim).
    fn target_shape(&self) -> &[usize];

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// How a labeled collection produces its per-sample label array.
///
/// Partitioning needs every label of a collection up front. Rather than
/// probing implementations at runtime, each declares one of three forms:
/// labels stored inline in sample order, labels reached through an index
/// view over a parent collection, or labels held as the second half of a
/// feature/label array pair.
pub enum LabelSource<'a> {
    /// Labels stored inline, aligned with sample order.
    Direct(&'a [ClassId]),
    /// Labels gathered through an index view over a parent collection.
    View {
        parent: &'a dyn LabeledDataset,
        indices: &'a [usize],
    },
    /// Labels taken from the label array of a feature/label array pair.
    Paired(&'a [ClassId]),
}

/// A dataset whose samples carry integer class labels.
pub trait LabeledDataset: Dataset {
    /// Declare how this collection's label array is produced.
    fn label_source(&self) -> LabelSource<'_>;

    /// Materialize the full label array, one entry per sample, aligned to
    /// this collection's index space. Nested views resolve recursively.
    fn class_labels(&self) -> Vec<ClassId> {
        match self.label_source() {
            LabelSource::Direct(labels) | LabelSource::Paired(labels) => labels.to_vec(),
            LabelSource::View { parent, indices } => {
                let parent_labels = parent.class_labels();
                indices.iter().map(|&i| parent_labels[i]).collect()
            }
        }
    }
}

impl std::fmt::Debug for dyn LabeledDataset + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabeledDataset")
            .field("name", &self.name())
            .field("len", &self.len())
            .finish()
    }
}

// Shared-ownership datasets delegate to their inner value, so splits can be
// held as `Arc<dyn LabeledDataset>` and fanned out to per-client views.

impl<D: Dataset + ?Sized> Dataset for Arc<D> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn get(&self, index: usize) -> Sample {
        (**self).get(index)
    }

    fn feature_shape(&self) -> &[usize] {
        (**self).feature_shape()
    }

    fn target_shape(&self) -> &[usize] {
        (**self).target_shape()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<D: LabeledDataset + ?Sized> LabeledDataset for Arc<D> {
    fn label_source(&self) -> LabelSource<'_> {
        (**self).label_source()
    }

    fn class_labels(&self) -> Vec<ClassId> {
        (**self).class_labels()
    }
}
