// Loader factory — per-client DataLoaders for all three splits

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use fedshard_data::{
    load_splits, ChannelNormalize, ChannelStats, DataLoader, DataLoaderConfig, Dataset,
    DatasetName, LabeledDataset, Scale, SubsetDataset, DEFAULT_VAL_SIZE,
};

use crate::error::Result;
use crate::partition::{PartitionOptions, PartitionPlan};
use crate::stats::ClassStats;

/// Worker threads per client loader.
const NUM_WORKERS: usize = 4;

/// Configuration for [`client_loaders`].
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    /// Which dataset to load.
    pub dataset: DatasetName,
    /// Root directory holding the dataset files.
    pub data_root: PathBuf,
    /// Number of federated clients to shard across.
    pub num_clients: usize,
    /// Batch size for every client loader.
    pub batch_size: usize,
    /// Whether to append per-channel normalization after pixel scaling.
    pub normalize: bool,
    /// Validation samples carved off the training set (ignored for
    /// CINIC-10, which ships its own validation split).
    pub val_size: usize,
    /// Class-assignment tunables.
    pub partition: PartitionOptions,
}

impl FactoryConfig {
    pub fn new(dataset: DatasetName, data_root: impl Into<PathBuf>) -> Self {
        Self {
            dataset,
            data_root: data_root.into(),
            num_clients: 10,
            batch_size: 32,
            normalize: true,
            val_size: DEFAULT_VAL_SIZE,
            partition: PartitionOptions::default(),
        }
    }

    pub fn num_clients(mut self, n: usize) -> Self {
        self.num_clients = n;
        self
    }

    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn normalize(mut self, on: bool) -> Self {
        self.normalize = on;
        self
    }

    pub fn val_size(mut self, n: usize) -> Self {
        self.val_size = n;
        self
    }

    pub fn partition(mut self, options: PartitionOptions) -> Self {
        self.partition = options;
        self
    }
}

/// Per-client loaders for the three splits, index-aligned by client id,
/// plus the plan they were built from.
pub struct ClientLoaders {
    pub plan: PartitionPlan,
    pub train: Vec<DataLoader>,
    pub val: Vec<DataLoader>,
    pub test: Vec<DataLoader>,
}

impl std::fmt::Debug for ClientLoaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientLoaders")
            .field("plan", &self.plan)
            .field("train", &self.train.len())
            .field("val", &self.val.len())
            .field("test", &self.test.len())
            .finish()
    }
}

/// Build per-client train/val/test loaders for a label-skewed federation.
///
/// Loads the three splits, generates the partition plan once on the
/// training split, then applies it to all three so each client keeps the
/// same class footprint everywhere. Every client shard becomes a
/// [`SubsetDataset`] wrapped in a [`DataLoader`]; training loaders shuffle
/// each epoch, validation and test loaders do not. Pixel values are scaled
/// to `[0, 1]`, with per-channel normalization appended when
/// `config.normalize` is set.
///
/// One-shot and stateless: any precondition failure aborts the whole setup.
pub fn client_loaders<R: Rng + ?Sized>(
    config: &FactoryConfig,
    rng: &mut R,
) -> Result<ClientLoaders> {
    let [train_ds, val_ds, test_ds] =
        load_splits(config.dataset, &config.data_root, config.val_size, rng)?;

    let train_stats = ClassStats::scan(&train_ds);
    let plan = PartitionPlan::generate(&train_stats, config.num_clients, &config.partition, rng)?;
    debug!(
        dataset = %config.dataset,
        num_clients = config.num_clients,
        num_classes = train_stats.num_classes(),
        "partition plan ready"
    );

    let channel_stats = config.dataset.channel_stats();
    let train = shard_loaders(&plan, &train_ds, &train_stats, true, config, &channel_stats, rng)?;
    let val_stats = ClassStats::scan(&val_ds);
    let val = shard_loaders(&plan, &val_ds, &val_stats, false, config, &channel_stats, rng)?;
    let test_stats = ClassStats::scan(&test_ds);
    let test = shard_loaders(&plan, &test_ds, &test_stats, false, config, &channel_stats, rng)?;

    Ok(ClientLoaders {
        plan,
        train,
        val,
        test,
    })
}

/// Split one collection across clients and wrap every shard in a loader.
fn shard_loaders<R: Rng + ?Sized>(
    plan: &PartitionPlan,
    dataset: &Arc<dyn LabeledDataset>,
    stats: &ClassStats,
    shuffle: bool,
    config: &FactoryConfig,
    channel_stats: &ChannelStats,
    rng: &mut R,
) -> Result<Vec<DataLoader>> {
    let client_indices = plan.split_indices(stats, rng)?;

    let loaders = client_indices
        .into_iter()
        .map(|indices| {
            let shard = SubsetDataset::new(dataset.clone(), indices);
            let loader_config = DataLoaderConfig::default()
                .batch_size(config.batch_size)
                .shuffle(shuffle)
                .num_workers(NUM_WORKERS);
            let mut loader = DataLoader::new(Arc::new(shard) as Arc<dyn Dataset>, loader_config)
                .with_transform(Arc::new(Scale::new(255.0)));
            if config.normalize {
                loader = loader.with_transform(Arc::new(ChannelNormalize::new(
                    &channel_stats.mean,
                    &channel_stats.std,
                )));
            }
            loader
        })
        .collect();

    Ok(loaders)
}
