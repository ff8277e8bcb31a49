//! # fedshard-data
//!
//! Datasets, transforms and batched loading for fedshard.
//!
//! This crate provides:
//! - [`Dataset`] / [`LabeledDataset`] traits — unified interface over any
//!   labeled sample collection
//! - [`DataLoader`] — batching, shuffling, parallel fetch, background prefetch
//! - [`SubsetDataset`] — index-restricted views, plus reproducible
//!   [`random_split`]
//! - Per-sample transforms — [`Scale`], [`ChannelNormalize`], [`Compose`]
//! - Built-in sources: CIFAR-10/100 binary distributions, class-per-directory
//!   image trees (CINIC-10, feature `image-folder`), and `.npy` array pairs
//! - [`load_splits`] — resolve a [`DatasetName`] into train/val/test
//!   collections

pub mod arrays;
pub mod cifar;
pub mod combinators;
pub mod dataset;
pub mod error;
pub mod image_folder;
pub mod loader;
pub mod sources;
pub mod transform;

pub use arrays::ArrayDataset;
pub use cifar::{CifarDataset, CifarSplit};
pub use combinators::{random_split, SubsetDataset};
pub use dataset::{ClassId, Dataset, LabelSource, LabeledDataset, Sample};
pub use error::{Error, Result};
pub use loader::{Batch, DataLoader, DataLoaderConfig, PrefetchIterator};
pub use sources::{load_splits, ChannelStats, DatasetName, DEFAULT_VAL_SIZE};
pub use transform::{ChannelNormalize, Compose, Scale, Transform};

#[cfg(feature = "image-folder")]
pub use image_folder::FolderDataset;
