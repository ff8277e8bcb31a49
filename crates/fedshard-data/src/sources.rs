// Dataset sources — named datasets resolved into train/val/test collections

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;

use crate::arrays::ArrayDataset;
use crate::cifar::{CifarDataset, CifarSplit};
use crate::combinators::random_split;
use crate::dataset::{Dataset, LabeledDataset};
use crate::error::{Error, Result};
#[cfg(feature = "image-folder")]
use crate::image_folder::FolderDataset;

/// Relative directory the CINIC-10 image folders are expected under.
pub const CINIC_DIR: &str = "../cinic";

/// Validation samples carved from the training set by default.
pub const DEFAULT_VAL_SIZE: usize = 10_000;

/// The supported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetName {
    Cifar10,
    Cifar100,
    Cinic10,
}

impl FromStr for DatasetName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cifar10" => Ok(DatasetName::Cifar10),
            "cifar100" => Ok(DatasetName::Cifar100),
            "cinic10" => Ok(DatasetName::Cinic10),
            other => Err(Error::UnknownDataset(other.to_string())),
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatasetName::Cifar10 => "cifar10",
            DatasetName::Cifar100 => "cifar100",
            DatasetName::Cinic10 => "cinic10",
        };
        f.write_str(s)
    }
}

/// Per-channel mean and standard deviation, measured on a training set
/// scaled to [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct ChannelStats {
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

impl DatasetName {
    /// The normalization constants conventionally used with this dataset.
    pub fn channel_stats(&self) -> ChannelStats {
        match self {
            DatasetName::Cifar10 => ChannelStats {
                mean: [0.4914, 0.4822, 0.4465],
                std: [0.2023, 0.1994, 0.2010],
            },
            DatasetName::Cifar100 => ChannelStats {
                mean: [0.5071, 0.4865, 0.4409],
                std: [0.2673, 0.2564, 0.2762],
            },
            DatasetName::Cinic10 => ChannelStats {
                mean: [0.47889522, 0.47227842, 0.43047404],
                std: [0.24205776, 0.23828046, 0.25874835],
            },
        }
    }
}

/// Load the three splits of a named dataset.
///
/// CIFAR datasets carve `val_size` samples off the shuffled training set;
/// CINIC-10 ships its own `valid` split, so `val_size` is ignored there.
pub fn load_splits<R: Rng + ?Sized>(
    name: DatasetName,
    root: &Path,
    val_size: usize,
    rng: &mut R,
) -> Result<[Arc<dyn LabeledDataset>; 3]> {
    match name {
        DatasetName::Cifar10 => {
            let train = CifarDataset::load_cifar10(root, CifarSplit::Train)?;
            let test = CifarDataset::load_cifar10(root, CifarSplit::Test)?;
            carve_validation(train, test, val_size, rng)
        }
        DatasetName::Cifar100 => {
            let train = CifarDataset::load_cifar100(root, CifarSplit::Train)?;
            let test = CifarDataset::load_cifar100(root, CifarSplit::Test)?;
            carve_validation(train, test, val_size, rng)
        }
        DatasetName::Cinic10 => cinic_splits(root),
    }
}

/// Shuffle the full training collection and carve a validation subset off
/// its tail, leaving the test collection untouched.
fn carve_validation<D, R>(
    train_full: D,
    test: D,
    val_size: usize,
    rng: &mut R,
) -> Result<[Arc<dyn LabeledDataset>; 3]>
where
    D: LabeledDataset + 'static,
    R: Rng + ?Sized,
{
    let n = train_full.len();
    if val_size >= n {
        return Err(Error::ValSplitTooLarge {
            requested: val_size,
            available: n,
        });
    }

    let shared = Arc::new(train_full);
    let mut splits = random_split(shared, &[n - val_size, val_size], rng);
    let val = splits.remove(1);
    let train = splits.remove(0);

    Ok([
        Arc::new(train) as Arc<dyn LabeledDataset>,
        Arc::new(val) as Arc<dyn LabeledDataset>,
        Arc::new(test) as Arc<dyn LabeledDataset>,
    ])
}

/// Resolve CINIC-10: prefer the image-folder form at its fixed relative
/// location, fall back to `.npy` array pairs under `root`.
fn cinic_splits(root: &Path) -> Result<[Arc<dyn LabeledDataset>; 3]> {
    #[cfg(feature = "image-folder")]
    {
        let image_base = Path::new(CINIC_DIR);
        if image_base.join("train").is_dir() {
            return folder_splits(image_base);
        }
    }

    if root.join("x_train_dataset.npy").exists() {
        return array_splits(root);
    }

    Err(Error::CinicNotFound {
        image_dir: Path::new(CINIC_DIR).display().to_string(),
        array_root: root.display().to_string(),
    })
}

#[cfg(feature = "image-folder")]
fn folder_splits(base: &Path) -> Result<[Arc<dyn LabeledDataset>; 3]> {
    let train = FolderDataset::scan(base.join("train"))?;
    let val = FolderDataset::scan(base.join("valid"))?;
    let test = FolderDataset::scan(base.join("test"))?;
    Ok([
        Arc::new(train) as Arc<dyn LabeledDataset>,
        Arc::new(val) as Arc<dyn LabeledDataset>,
        Arc::new(test) as Arc<dyn LabeledDataset>,
    ])
}

fn array_splits(root: &Path) -> Result<[Arc<dyn LabeledDataset>; 3]> {
    let train = ArrayDataset::load(root, "train")?;
    let val = ArrayDataset::load(root, "valid")?;
    let test = ArrayDataset::load(root, "test")?;
    Ok([
        Arc::new(train) as Arc<dyn LabeledDataset>,
        Arc::new(val) as Arc<dyn LabeledDataset>,
        Arc::new(test) as Arc<dyn LabeledDataset>,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_known_names() {
        assert_eq!("cifar10".parse::<DatasetName>().unwrap(), DatasetName::Cifar10);
        assert_eq!(
            "cifar100".parse::<DatasetName>().unwrap(),
            DatasetName::Cifar100
        );
        assert_eq!("cinic10".parse::<DatasetName>().unwrap(), DatasetName::Cinic10);
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "mnist".parse::<DatasetName>().unwrap_err();
        assert!(matches!(err, Error::UnknownDataset(_)));
        assert!(err.to_string().contains("cifar10"));
    }

    #[test]
    fn display_matches_selector() {
        for name in ["cifar10", "cifar100", "cinic10"] {
            let parsed: DatasetName = name.parse().unwrap();
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn channel_stats_are_per_dataset() {
        let c10 = DatasetName::Cifar10.channel_stats();
        let cinic = DatasetName::Cinic10.channel_stats();
        assert!((c10.mean[0] - 0.4914).abs() < 1e-9);
        assert!((cinic.std[2] - 0.25874835).abs() < 1e-12);
        assert_ne!(c10.mean, cinic.mean);
    }

    #[test]
    fn carve_validation_splits_train_only() {
        let train = CifarDataset::synthetic(50, 5);
        let test = CifarDataset::synthetic(20, 5);
        let mut rng = StdRng::seed_from_u64(11);

        let [train_split, val_split, test_split] =
            carve_validation(train, test, 10, &mut rng).unwrap();
        assert_eq!(train_split.len(), 40);
        assert_eq!(val_split.len(), 10);
        assert_eq!(test_split.len(), 20);

        // Together the carved splits cover the synthetic labels exactly.
        let mut labels = train_split.class_labels();
        labels.extend(val_split.class_labels());
        labels.sort_unstable();
        let mut expected: Vec<usize> = (0..50).map(|i| i % 5).collect();
        expected.sort_unstable();
        assert_eq!(labels, expected);
    }

    #[test]
    fn oversized_validation_rejected() {
        let train = CifarDataset::synthetic(10, 2);
        let test = CifarDataset::synthetic(4, 2);
        let mut rng = StdRng::seed_from_u64(0);

        let err = carve_validation(train, test, 10, &mut rng).unwrap_err();
        assert!(matches!(err, Error::ValSplitTooLarge { .. }));
    }

    #[test]
    fn cinic_without_data_reports_both_locations() {
        let root = std::env::temp_dir().join("fedshard_sources_no_cinic");
        std::fs::create_dir_all(&root).unwrap();
        let err = cinic_splits(&root).unwrap_err();
        match err {
            Error::CinicNotFound {
                image_dir,
                array_root,
            } => {
                assert!(image_dir.contains("cinic"));
                assert!(array_root.contains("fedshard_sources_no_cinic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
