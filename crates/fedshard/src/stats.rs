// ClassStats — per-collection label statistics

use fedshard_data::{ClassId, LabeledDataset};

/// Label statistics for one sample collection.
///
/// Computed once per collection by walking its [`LabeledDataset`] label
/// source: the number of distinct classes, the per-class sample counts
/// (ordered by ascending class id) and the full per-sample label array,
/// aligned to the collection's index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStats {
    num_classes: usize,
    class_counts: Vec<usize>,
    labels: Vec<ClassId>,
}

impl ClassStats {
    /// Scan a labeled collection.
    ///
    /// `num_classes` is derived as `max(label) + 1`, so class ids are
    /// assumed dense from 0; classes absent from the collection get a count
    /// of 0. An empty collection yields `num_classes == 0`.
    pub fn scan(dataset: &dyn LabeledDataset) -> Self {
        let labels = dataset.class_labels();
        let num_classes = labels.iter().max().map_or(0, |&m| m + 1);

        let mut class_counts = vec![0usize; num_classes];
        for &label in &labels {
            class_counts[label] += 1;
        }

        Self {
            num_classes,
            class_counts,
            labels,
        }
    }

    /// Number of distinct classes (`max(label) + 1`).
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Per-class sample counts, ordered by ascending class id. Length
    /// equals [`num_classes`](Self::num_classes).
    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }

    /// The full per-sample label array, aligned to the collection's index
    /// space.
    pub fn labels(&self) -> &[ClassId] {
        &self.labels
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedshard_data::{CifarDataset, SubsetDataset};

    #[test]
    fn scan_counts_round_robin_labels() {
        let ds = CifarDataset::synthetic(30, 5);
        let stats = ClassStats::scan(&ds);

        assert_eq!(stats.num_classes(), 5);
        assert_eq!(stats.class_counts(), &[6, 6, 6, 6, 6]);
        assert_eq!(stats.num_samples(), 30);
        assert_eq!(&stats.labels()[..5], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn scan_through_subset_view() {
        let ds = CifarDataset::synthetic(12, 4);
        // Every third sample: labels 0, 3, 2, 1.
        let view = SubsetDataset::new(ds, vec![0, 3, 6, 9]);
        let stats = ClassStats::scan(&view);

        assert_eq!(stats.num_classes(), 4);
        assert_eq!(stats.class_counts(), &[1, 1, 1, 1]);
        assert_eq!(stats.labels(), &[0, 3, 2, 1]);
    }

    #[test]
    fn scan_counts_missing_classes_as_zero() {
        let ds = CifarDataset::synthetic(8, 4);
        // Only labels 0 and 3 survive the view.
        let view = SubsetDataset::new(ds, vec![0, 3, 4, 7]);
        let stats = ClassStats::scan(&view);

        assert_eq!(stats.num_classes(), 4);
        assert_eq!(stats.class_counts(), &[2, 0, 0, 2]);
    }

    #[test]
    fn scan_empty_collection() {
        let ds = CifarDataset::synthetic(5, 5);
        let view = SubsetDataset::new(ds, Vec::new());
        let stats = ClassStats::scan(&view);

        assert_eq!(stats.num_classes(), 0);
        assert!(stats.class_counts().is_empty());
        assert_eq!(stats.num_samples(), 0);
    }
}
