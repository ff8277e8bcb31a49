// CIFAR dataset — binary distribution parser
//
// CIFAR-10 ships as cifar-10-batches-bin/:
//   - data_batch_1.bin .. data_batch_5.bin  (10,000 records each, train)
//   - test_batch.bin                        (10,000 records, test)
//   record: label(u8) | 3072 pixel bytes (R plane, G plane, B plane, 32×32)
//
// CIFAR-100 ships as cifar-100-binary/:
//   - train.bin  (50,000 records)
//   - test.bin   (10,000 records)
//   record: coarse_label(u8) | fine_label(u8) | 3072 pixel bytes
//
// The fine label is used for CIFAR-100. Pixel planes are already
// channel-first, so records map directly onto [3, 32, 32] samples.
// Download from: https://www.cs.toronto.edu/~kriz/cifar.html

use std::fs;
use std::path::Path;

use crate::dataset::{ClassId, Dataset, LabelSource, LabeledDataset, Sample};
use crate::error::{Error, Result};

/// Subdirectory holding the CIFAR-10 binary batches.
pub const CIFAR10_DIR: &str = "cifar-10-batches-bin";
/// Subdirectory holding the CIFAR-100 binary files.
pub const CIFAR100_DIR: &str = "cifar-100-binary";

const IMAGE_BYTES: usize = 3072;
const IMAGE_SHAPE: [usize; 3] = [3, 32, 32];

const CIFAR10_TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];

/// Which split of CIFAR to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CifarSplit {
    Train,
    Test,
}

/// A loaded CIFAR dataset stored entirely in memory.
///
/// Images are stored as raw `Vec<u8>` (3×32×32 = 3072 bytes each,
/// channel-first). Labels are class indices, fine labels for CIFAR-100.
#[derive(Debug)]
pub struct CifarDataset {
    images: Vec<Vec<u8>>,
    labels: Vec<ClassId>,
    num_classes: usize,
    dataset_name: &'static str,
}

impl CifarDataset {
    /// Load CIFAR-10 from the binary batches under `root/cifar-10-batches-bin`.
    pub fn load_cifar10(root: impl AsRef<Path>, split: CifarSplit) -> Result<Self> {
        let dir = root.as_ref().join(CIFAR10_DIR);
        let files: &[&str] = match split {
            CifarSplit::Train => &CIFAR10_TRAIN_FILES,
            CifarSplit::Test => &["test_batch.bin"],
        };

        let mut images = Vec::new();
        let mut labels = Vec::new();
        for name in files {
            let path = dir.join(name);
            if !path.exists() {
                return Err(Error::MissingFile(path));
            }
            let bytes = fs::read(&path)?;
            parse_records(
                &bytes,
                &path.display().to_string(),
                1,
                10,
                &mut images,
                &mut labels,
            )?;
        }

        Ok(Self {
            images,
            labels,
            num_classes: 10,
            dataset_name: match split {
                CifarSplit::Train => "cifar10-train",
                CifarSplit::Test => "cifar10-test",
            },
        })
    }

    /// Load CIFAR-100 from the binary files under `root/cifar-100-binary`.
    pub fn load_cifar100(root: impl AsRef<Path>, split: CifarSplit) -> Result<Self> {
        let dir = root.as_ref().join(CIFAR100_DIR);
        let name = match split {
            CifarSplit::Train => "train.bin",
            CifarSplit::Test => "test.bin",
        };
        let path = dir.join(name);
        if !path.exists() {
            return Err(Error::MissingFile(path));
        }
        let bytes = fs::read(&path)?;
        Self::from_cifar100_bytes(&bytes, split)
    }

    /// Parse CIFAR-10 records from raw batch bytes (useful for testing).
    ///
    /// Accepts one or more batch files' contents; records accumulate in
    /// order.
    pub fn from_cifar10_bytes(batches: &[&[u8]], split: CifarSplit) -> Result<Self> {
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for (i, bytes) in batches.iter().enumerate() {
            parse_records(bytes, &format!("batch {i}"), 1, 10, &mut images, &mut labels)?;
        }
        Ok(Self {
            images,
            labels,
            num_classes: 10,
            dataset_name: match split {
                CifarSplit::Train => "cifar10-train",
                CifarSplit::Test => "cifar10-test",
            },
        })
    }

    /// Parse CIFAR-100 records from raw file bytes (useful for testing).
    pub fn from_cifar100_bytes(bytes: &[u8], split: CifarSplit) -> Result<Self> {
        let mut images = Vec::new();
        let mut labels = Vec::new();
        parse_records(bytes, "cifar-100 records", 2, 100, &mut images, &mut labels)?;
        Ok(Self {
            images,
            labels,
            num_classes: 100,
            dataset_name: match split {
                CifarSplit::Train => "cifar100-train",
                CifarSplit::Test => "cifar100-test",
            },
        })
    }

    /// Create a small synthetic CIFAR-like dataset for testing.
    ///
    /// Generates `n` random 32×32 RGB images with labels assigned
    /// round-robin, so every class receives an equal share (up to
    /// remainder) and class counts are predictable.
    pub fn synthetic(n: usize, num_classes: usize) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut images = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);

        for i in 0..n {
            let mut img = vec![0u8; IMAGE_BYTES];
            for px in &mut img {
                *px = rng.gen();
            }
            images.push(img);
            labels.push(i % num_classes);
        }

        Self {
            images,
            labels,
            num_classes,
            dataset_name: "cifar-synthetic",
        }
    }

    /// Total number of samples.
    pub fn num_samples(&self) -> usize {
        self.images.len()
    }

    /// Number of distinct classes this dataset declares.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Raw channel-first pixel bytes for sample `i`.
    pub fn image_u8(&self, i: usize) -> &[u8] {
        &self.images[i]
    }

    /// Class label for sample `i`.
    pub fn label(&self, i: usize) -> ClassId {
        self.labels[i]
    }
}

impl Dataset for CifarDataset {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn get(&self, index: usize) -> Sample {
        let pixels = &self.images[index];
        let label = self.labels[index];

        Sample {
            features: pixels.iter().map(|&p| p as f64).collect(),
            feature_shape: IMAGE_SHAPE.to_vec(),
            target: vec![label as f64],
            target_shape: vec![1],
        }
    }

    fn feature_shape(&self) -> &[usize] {
        &IMAGE_SHAPE
    }

    fn target_shape(&self) -> &[usize] {
        &[1]
    }

    fn name(&self) -> &str {
        self.dataset_name
    }
}

impl LabeledDataset for CifarDataset {
    fn label_source(&self) -> LabelSource<'_> {
        LabelSource::Direct(&self.labels)
    }
}

// Record parsing

/// Parse fixed-size records, appending images and labels.
///
/// `label_bytes` is 1 for CIFAR-10 and 2 for CIFAR-100; the last label
/// byte is the class (the fine label for CIFAR-100).
fn parse_records(
    data: &[u8],
    source: &str,
    label_bytes: usize,
    num_classes: usize,
    images: &mut Vec<Vec<u8>>,
    labels: &mut Vec<ClassId>,
) -> Result<()> {
    let record = label_bytes + IMAGE_BYTES;
    if data.len() % record != 0 {
        return Err(Error::TruncatedRecords {
            path: source.to_string(),
            len: data.len(),
            record,
        });
    }

    for chunk in data.chunks_exact(record) {
        let label = chunk[label_bytes - 1] as usize;
        if label >= num_classes {
            return Err(Error::LabelOutOfRange {
                label: label as i64,
                num_classes,
            });
        }
        images.push(chunk[label_bytes..].to_vec());
        labels.push(label);
    }

    Ok(())
}

// Builder helpers

/// Build CIFAR-10 record bytes from (label, pixels) pairs (useful for tests).
///
/// Each pixel slice must be exactly 3072 bytes.
pub fn build_cifar10_bytes(entries: &[(u8, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(entries.len() * (1 + IMAGE_BYTES));
    for (label, pixels) in entries {
        buf.push(*label);
        buf.extend_from_slice(pixels);
    }
    buf
}

/// Build CIFAR-100 record bytes from (coarse, fine, pixels) triples
/// (useful for tests).
pub fn build_cifar100_bytes(entries: &[(u8, u8, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(entries.len() * (2 + IMAGE_BYTES));
    for (coarse, fine, pixels) in entries {
        buf.push(*coarse);
        buf.push(*fine);
        buf.extend_from_slice(pixels);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cifar10_roundtrip() {
        let img0 = vec![0u8; IMAGE_BYTES];
        let img1 = vec![255u8; IMAGE_BYTES];
        let bytes = build_cifar10_bytes(&[(3, &img0), (7, &img1)]);
        let ds = CifarDataset::from_cifar10_bytes(&[&bytes], CifarSplit::Train).unwrap();

        assert_eq!(ds.num_samples(), 2);
        assert_eq!(ds.label(0), 3);
        assert_eq!(ds.label(1), 7);
        assert_eq!(ds.image_u8(0), &vec![0u8; IMAGE_BYTES][..]);
    }

    #[test]
    fn parse_cifar10_multiple_batches() {
        let img = vec![1u8; IMAGE_BYTES];
        let b1 = build_cifar10_bytes(&[(0, &img), (1, &img)]);
        let b2 = build_cifar10_bytes(&[(2, &img)]);
        let ds = CifarDataset::from_cifar10_bytes(&[&b1, &b2], CifarSplit::Train).unwrap();
        assert_eq!(ds.num_samples(), 3);
        assert_eq!(ds.label(2), 2);
    }

    #[test]
    fn parse_cifar100_uses_fine_label() {
        let img = vec![9u8; IMAGE_BYTES];
        let bytes = build_cifar100_bytes(&[(4, 42, &img)]);
        let ds = CifarDataset::from_cifar100_bytes(&bytes, CifarSplit::Test).unwrap();
        assert_eq!(ds.label(0), 42);
        assert_eq!(ds.num_classes(), 100);
    }

    #[test]
    fn truncated_records_rejected() {
        let img = vec![0u8; IMAGE_BYTES];
        let mut bytes = build_cifar10_bytes(&[(1, &img)]);
        bytes.pop();
        let err = CifarDataset::from_cifar10_bytes(&[&bytes], CifarSplit::Train).unwrap_err();
        assert!(matches!(err, Error::TruncatedRecords { .. }));
    }

    #[test]
    fn label_out_of_range_rejected() {
        let img = vec![0u8; IMAGE_BYTES];
        let bytes = build_cifar10_bytes(&[(10, &img)]);
        let err = CifarDataset::from_cifar10_bytes(&[&bytes], CifarSplit::Train).unwrap_err();
        assert!(matches!(err, Error::LabelOutOfRange { .. }));
    }

    #[test]
    fn dataset_trait_sample_layout() {
        let img: Vec<u8> = (0..IMAGE_BYTES).map(|i| (i % 251) as u8).collect();
        let bytes = build_cifar10_bytes(&[(5, &img)]);
        let ds = CifarDataset::from_cifar10_bytes(&[&bytes], CifarSplit::Test).unwrap();

        assert_eq!(ds.len(), 1);
        assert!(!ds.is_empty());
        assert_eq!(ds.name(), "cifar10-test");

        let s = ds.get(0);
        assert_eq!(s.features.len(), IMAGE_BYTES);
        assert_eq!(s.feature_shape, vec![3, 32, 32]);
        assert_eq!(s.features[0], 0.0);
        assert_eq!(s.features[1], 1.0);
        assert_eq!(s.target, vec![5.0]);
        assert_eq!(s.target_shape, vec![1]);
    }

    #[test]
    fn labels_exposed_directly() {
        let ds = CifarDataset::synthetic(6, 3);
        assert_eq!(ds.class_labels(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn synthetic_round_robin_balance() {
        let ds = CifarDataset::synthetic(100, 10);
        let mut counts = vec![0usize; 10];
        for i in 0..ds.num_samples() {
            counts[ds.label(i)] += 1;
        }
        assert!(counts.iter().all(|&c| c == 10));
    }
}
