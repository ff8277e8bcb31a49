// Dataset combinators — index-subset views and random splitting

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::{Dataset, LabelSource, LabeledDataset, Sample};

// SubsetDataset — view of selected indices

/// A dataset that exposes only the samples at the given indices.
///
/// Used both for train/validation splitting and for per-client shards.
pub struct SubsetDataset<D: Dataset> {
    inner: D,
    indices: Vec<usize>,
}

impl<D: Dataset> SubsetDataset<D> {
    /// Create a subset of `inner` containing only the samples at `indices`.
    ///
    /// # Panics
    /// Panics (lazily, at `get` time) if any index is out of range.
    pub fn new(inner: D, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    /// The indices this view selects, in view order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: Dataset> Dataset for SubsetDataset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Sample {
        self.inner.get(self.indices[index])
    }

    fn feature_shape(&self) -> &[usize] {
        self.inner.feature_shape()
    }

    fn target_shape(&self) -> &[usize] {
        self.inner.target_shape()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<D: LabeledDataset> LabeledDataset for SubsetDataset<D> {
    fn label_source(&self) -> LabelSource<'_> {
        LabelSource::View {
            parent: &self.inner,
            indices: &self.indices,
        }
    }
}

// Random splitting

/// Split a dataset into disjoint subsets of the given absolute sizes.
///
/// Indices are shuffled with the caller's RNG, then sliced into prefix
/// ranges, one `SubsetDataset` view per requested size, in `sizes` order.
///
/// # Panics
/// Panics if the sizes do not sum to the dataset length.
pub fn random_split<D, R>(dataset: D, sizes: &[usize], rng: &mut R) -> Vec<SubsetDataset<D>>
where
    D: Dataset + Clone,
    R: Rng + ?Sized,
{
    let n = dataset.len();
    let total: usize = sizes.iter().sum();
    assert_eq!(
        total, n,
        "random_split: sizes sum to {total} but dataset has {n} samples"
    );

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut splits = Vec::with_capacity(sizes.len());
    let mut offset = 0;
    for &size in sizes {
        splits.push(SubsetDataset::new(
            dataset.clone(),
            indices[offset..offset + size].to_vec(),
        ));
        offset += size;
    }

    splits
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Tiny helper dataset for testing.
    #[derive(Clone)]
    struct TinyDataset {
        labels: Vec<usize>,
    }

    impl TinyDataset {
        fn new(n: usize) -> Self {
            Self {
                labels: (0..n).map(|i| i % 3).collect(),
            }
        }
    }

    impl Dataset for TinyDataset {
        fn len(&self) -> usize {
            self.labels.len()
        }
        fn get(&self, idx: usize) -> Sample {
            Sample {
                features: vec![idx as f64],
                feature_shape: vec![1],
                target: vec![self.labels[idx] as f64],
                target_shape: vec![1],
            }
        }
        fn feature_shape(&self) -> &[usize] {
            &[1]
        }
        fn target_shape(&self) -> &[usize] {
            &[1]
        }
    }

    impl LabeledDataset for TinyDataset {
        fn label_source(&self) -> LabelSource<'_> {
            LabelSource::Direct(&self.labels)
        }
    }

    #[test]
    fn subset_dataset() {
        let ds = TinyDataset::new(10);
        let sub = SubsetDataset::new(ds, vec![2, 5, 7]);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.get(0).features[0], 2.0);
        assert_eq!(sub.get(1).features[0], 5.0);
        assert_eq!(sub.get(2).features[0], 7.0);
    }

    #[test]
    fn subset_labels_gather_from_parent() {
        let ds = TinyDataset::new(9);
        let sub = SubsetDataset::new(ds, vec![0, 4, 8]);
        // Parent labels cycle 0,1,2 — gathered at 0, 4, 8.
        assert_eq!(sub.class_labels(), vec![0, 1, 2]);
    }

    #[test]
    fn nested_subset_labels() {
        let ds = TinyDataset::new(12);
        let outer = SubsetDataset::new(ds, vec![1, 3, 5, 7, 9, 11]);
        let inner = SubsetDataset::new(outer, vec![0, 2, 4]);
        // outer labels: 1,0,2,1,0,2; inner picks positions 0, 2, 4.
        assert_eq!(inner.class_labels(), vec![1, 2, 0]);
    }

    #[test]
    fn random_split_sizes() {
        let ds = TinyDataset::new(100);
        let mut rng = StdRng::seed_from_u64(42);
        let splits = random_split(ds, &[80, 20], &mut rng);
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].len(), 80);
        assert_eq!(splits[1].len(), 20);
    }

    #[test]
    fn random_split_covers_everything_once() {
        let ds = TinyDataset::new(50);
        let mut rng = StdRng::seed_from_u64(7);
        let splits = random_split(ds, &[30, 15, 5], &mut rng);
        let mut seen: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.indices().iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn random_split_reproducible() {
        let mut rng1 = StdRng::seed_from_u64(123);
        let mut rng2 = StdRng::seed_from_u64(123);
        let s1 = random_split(TinyDataset::new(40), &[30, 10], &mut rng1);
        let s2 = random_split(TinyDataset::new(40), &[30, 10], &mut rng2);
        assert_eq!(s1[0].indices(), s2[0].indices());
        assert_eq!(s1[1].indices(), s2[1].indices());
    }

    #[test]
    #[should_panic(expected = "sizes sum to")]
    fn random_split_rejects_bad_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        random_split(TinyDataset::new(10), &[5, 4], &mut rng);
    }
}
