//! # fedshard
//!
//! Label-skewed data partitioning for federated-learning experiments on
//! CIFAR-10, CIFAR-100 and CINIC-10.
//!
//! Each of N clients receives a fixed number of classes and a random
//! proportion of every class it holds, so no client sees the full label
//! distribution. The assignment is computed once on the training split and
//! reused for validation and test, giving every client a consistent class
//! footprint across splits.
//!
//! ## Usage
//!
//! ```no_run
//! use fedshard::{client_loaders, FactoryConfig};
//! use fedshard_data::DatasetName;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let config = FactoryConfig::new(DatasetName::Cifar10, "data")
//!     .num_clients(100)
//!     .batch_size(64);
//! let loaders = client_loaders(&config, &mut rng)?;
//! assert_eq!(loaders.train.len(), 100);
//! # Ok::<(), fedshard::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`stats`] — per-collection label statistics ([`ClassStats`])
//! - [`partition`] — plan generation and index splitting ([`PartitionPlan`])
//! - [`factory`] — per-client loader construction ([`client_loaders`])

pub mod error;
pub mod factory;
pub mod partition;
pub mod stats;

pub use error::{Error, Result};
pub use factory::{client_loaders, ClientLoaders, FactoryConfig};
pub use partition::{ClientClasses, PartitionOptions, PartitionPlan};
pub use stats::ClassStats;
