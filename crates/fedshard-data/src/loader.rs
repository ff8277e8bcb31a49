// DataLoader — batching, shuffling, parallel fetch, background prefetch
//
// Two iteration styles over one dataset:
//
//   - epoch_batches() materializes every batch of an epoch up front,
//     fetching samples in parallel with rayon when num_workers > 0.
//   - iter_batches() spawns background workers that load, transform and
//     collate batches into a bounded channel ahead of the consumer.
//
// Usage:
//
//   let loader = DataLoader::new(
//       dataset,
//       DataLoaderConfig::default().batch_size(64).num_workers(4),
//   )
//   .with_transform(Arc::new(Scale::new(255.0)));
//
//   for batch in loader.iter_batches() {
//       // train on batch ...
//   }

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use rayon::prelude::*;

use crate::dataset::{Dataset, Sample};
use crate::transform::Transform;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of worker threads for loading and transforming.
    /// 0 = sequential fetch; prefetch still uses one background thread.
    pub num_workers: usize,
    /// How many batches to pre-load ahead of the consumer.
    /// Total buffered batches = prefetch_factor * max(num_workers, 1).
    pub prefetch_factor: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            prefetch_factor: 2,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn prefetch_factor(mut self, pf: usize) -> Self {
        self.prefetch_factor = pf;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// A collated batch: samples stacked along a leading batch dimension.
///
/// Features and targets stay flattened `f64` buffers with their shapes
/// alongside; converting them into a tensor type is the consumer's concern.
#[derive(Debug, Clone)]
pub struct Batch {
    pub features: Vec<f64>,
    /// `[batch_size, ...sample_feature_shape]`
    pub feature_shape: Vec<usize>,
    pub targets: Vec<f64>,
    /// `[batch_size, ...sample_target_shape]`
    pub target_shape: Vec<usize>,
}

impl Batch {
    /// Number of samples in this batch.
    pub fn batch_size(&self) -> usize {
        self.feature_shape.first().copied().unwrap_or(0)
    }
}

/// A DataLoader wraps a Dataset and produces collated batches.
///
/// The dataset is held via `Arc<dyn Dataset>` so it can be shared with
/// background worker threads and across per-client loaders.
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    config: DataLoaderConfig,
    transforms: Vec<Arc<dyn Transform>>,
    indices: Vec<usize>,
}

impl DataLoader {
    /// Create a new DataLoader over a dataset.
    ///
    /// # Panics
    /// Panics if `config.batch_size` is zero.
    pub fn new(dataset: Arc<dyn Dataset>, config: DataLoaderConfig) -> Self {
        assert!(config.batch_size > 0, "DataLoader: batch_size must be > 0");
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Self {
            dataset,
            config,
            transforms: Vec::new(),
            indices,
        }
    }

    /// Add a transform to apply to each sample.
    pub fn with_transform(mut self, t: Arc<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (call at the start of each epoch).
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.config.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    self.indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = thread_rng();
                    self.indices.shuffle(&mut rng);
                }
            }
        }
    }

    /// Fetch and transform a slice of samples, in parallel via rayon when
    /// workers are configured.
    fn fetch_samples(&self, indices: &[usize]) -> Vec<Sample> {
        let fetch_one = |&i: &usize| {
            let mut s = self.dataset.get(i);
            for t in &self.transforms {
                s = t.apply(s);
            }
            s
        };

        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(fetch_one).collect()
        } else {
            indices.iter().map(fetch_one).collect()
        }
    }

    /// Produce all batches for one epoch.
    pub fn epoch_batches(&mut self) -> Vec<Batch> {
        self.reshuffle();

        let bs = self.config.batch_size;
        let n = self.dataset.len();
        let num_batches = self.num_batches();
        let mut batches = Vec::with_capacity(num_batches);

        for batch_idx in 0..num_batches {
            let start = batch_idx * bs;
            let end = (start + bs).min(n);
            let batch_indices: Vec<usize> = self.indices[start..end].to_vec();
            let samples = self.fetch_samples(&batch_indices);
            batches.push(collate_batch(&samples));
        }

        batches
    }

    /// Iterate over one epoch of prefetched batches.
    ///
    /// Spawns background workers that load batches into a bounded channel
    /// of capacity `prefetch_factor * max(num_workers, 1)`, so at most that
    /// many batches are materialized at a time. With more than one worker,
    /// batches arrive in completion order rather than index order.
    ///
    /// The workers are joined when the iterator is dropped.
    pub fn iter_batches(&mut self) -> PrefetchIterator {
        self.reshuffle();

        let bs = self.config.batch_size;
        let n = self.dataset.len();
        let num_batches = self.num_batches();
        let workers = self.config.num_workers.max(1);
        let capacity = self.config.prefetch_factor * workers;

        // Build the list of batch index ranges
        let mut batch_ranges: Vec<Vec<usize>> = Vec::with_capacity(num_batches);
        for b in 0..num_batches {
            let start = b * bs;
            let end = (start + bs).min(n);
            batch_ranges.push(self.indices[start..end].to_vec());
        }

        let (tx, rx) = mpsc::sync_channel::<Batch>(capacity);

        // Shared work queue: each worker pops the next batch range
        let work_queue: Arc<Mutex<std::vec::IntoIter<Vec<usize>>>> =
            Arc::new(Mutex::new(batch_ranges.into_iter()));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let wq = work_queue.clone();
            let tx = tx.clone();
            let tfs = self.transforms.clone();
            let ds = self.dataset.clone();

            let handle = thread::spawn(move || loop {
                // Pop the next batch from the shared queue
                let sample_indices = {
                    let mut q = match wq.lock() {
                        Ok(q) => q,
                        Err(_) => break, // another worker panicked
                    };
                    q.next()
                };
                let sample_indices = match sample_indices {
                    Some(x) => x,
                    None => break, // no more work
                };

                let samples: Vec<Sample> = sample_indices
                    .iter()
                    .map(|&i| {
                        let mut s = ds.get(i);
                        for t in &tfs {
                            s = t.apply(s);
                        }
                        s
                    })
                    .collect();

                // Send to consumer — if the receiver is dropped, stop
                if tx.send(collate_batch(&samples)).is_err() {
                    break;
                }
            });
            handles.push(handle);
        }

        // Drop the original sender so the channel closes when workers finish
        drop(tx);

        PrefetchIterator {
            rx: Some(rx),
            handles: Some(handles),
            remaining: num_batches,
        }
    }
}

// PrefetchIterator

/// An iterator that yields prefetched batches from background workers.
///
/// Workers are joined when the iterator is fully consumed or dropped. A
/// worker panic (e.g. a failed image decode) is re-raised on the consuming
/// thread rather than silently truncating the epoch.
///
/// The receiver is dropped before the workers are joined: a worker blocked
/// in `send` on the full channel only unblocks once the receiving end
/// disconnects, so joining with the receiver alive would deadlock.
pub struct PrefetchIterator {
    rx: Option<mpsc::Receiver<Batch>>,
    handles: Option<Vec<thread::JoinHandle<()>>>,
    remaining: usize,
}

impl PrefetchIterator {
    /// Disconnect the channel, then join every worker. Panics from workers
    /// are re-raised unless `quiet` is set.
    fn shutdown(&mut self, quiet: bool) {
        self.rx = None;
        if let Some(handles) = self.handles.take() {
            for h in handles {
                match h.join() {
                    Ok(()) => {}
                    Err(panic) if !quiet => std::panic::resume_unwind(panic),
                    Err(_) => {}
                }
            }
        }
    }
}

impl Iterator for PrefetchIterator {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.rx.as_ref()?.recv() {
            Ok(batch) => {
                self.remaining -= 1;
                Some(batch)
            }
            Err(_) => {
                // Channel closed with batches still owed: a worker died.
                self.remaining = 0;
                self.shutdown(false);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PrefetchIterator {}

impl Drop for PrefetchIterator {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

// Collation

/// Collate a slice of samples into one batch with a leading batch dim.
fn collate_batch(samples: &[Sample]) -> Batch {
    let batch_size = samples.len();
    if batch_size == 0 {
        return Batch {
            features: Vec::new(),
            feature_shape: vec![0],
            targets: Vec::new(),
            target_shape: vec![0],
        };
    }

    let feat_shape = &samples[0].feature_shape;
    let tgt_shape = &samples[0].target_shape;

    let mut features = Vec::with_capacity(batch_size * samples[0].features.len());
    let mut targets = Vec::with_capacity(batch_size * samples[0].target.len());
    for s in samples {
        features.extend_from_slice(&s.features);
        targets.extend_from_slice(&s.target);
    }

    let mut batch_feat_shape = vec![batch_size];
    batch_feat_shape.extend_from_slice(feat_shape);
    let mut batch_tgt_shape = vec![batch_size];
    batch_tgt_shape.extend_from_slice(tgt_shape);

    Batch {
        features,
        feature_shape: batch_feat_shape,
        targets,
        target_shape: batch_tgt_shape,
    }
}
