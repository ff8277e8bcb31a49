use std::path::PathBuf;

/// All errors that can occur while loading datasets.
///
/// Every failure mode surfaces here: missing or malformed files, label
/// values outside the declared class range, and mismatched feature/label
/// pairs. A single error type across the crate simplifies propagation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure while reading dataset files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required dataset file does not exist.
    #[error("dataset file not found: {0}")]
    MissingFile(PathBuf),

    /// A binary record stream does not divide into whole records.
    #[error("truncated record stream in {path}: {len} bytes is not a multiple of {record} bytes")]
    TruncatedRecords {
        path: String,
        len: usize,
        record: usize,
    },

    /// A stored label lies outside the declared class range.
    #[error("label {label} out of range: expected 0..{num_classes}")]
    LabelOutOfRange { label: i64, num_classes: usize },

    /// Feature and label collections disagree on sample count.
    #[error("count mismatch: {features} feature rows vs {labels} labels")]
    CountMismatch { features: usize, labels: usize },

    /// A label array contains a negative value.
    #[error("negative label {0} in label array")]
    NegativeLabel(i64),

    /// Unknown dataset selector string.
    #[error("unknown dataset {0:?}: choose from [\"cifar10\", \"cifar100\", \"cinic10\"]")]
    UnknownDataset(String),

    /// The requested validation split does not leave any training data.
    #[error("validation split of {requested} samples leaves no training data ({available} samples loaded)")]
    ValSplitTooLarge { requested: usize, available: usize },

    /// CINIC-10 data could not be located in either supported form.
    #[error(
        "CINIC-10 data not found: no image directory at {image_dir} and no array files under {array_root}"
    )]
    CinicNotFound { image_dir: String, array_root: String },

    /// The root path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// No class subdirectories found.
    #[error("no class subdirectories in {0}")]
    NoClasses(String),

    /// No image files found.
    #[error("no image files found in {0}")]
    NoImages(String),

    /// Image decoding failed.
    #[error("failed to decode {0}: {1}")]
    ImageDecode(String, String),

    /// Reading a `.npy` array file failed.
    #[error("npy read error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}

/// Convenience Result type used throughout the data crate.
pub type Result<T> = std::result::Result<T, Error>;
