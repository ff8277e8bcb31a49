// PartitionPlan — label-skewed class assignment and index splitting
//
// Two-phase construction of per-client data shards:
//
//   1. PartitionPlan::generate decides, once per experiment, which classes
//      each client receives and what proportion of each class's pool it
//      gets (greedy budget assignment + normalized uniform proportions).
//   2. PartitionPlan::split_indices slices one split's shuffled per-class
//      index pools across clients according to that plan. Reusing the same
//      plan for train/val/test gives every client a consistent class
//      footprint across splits.
//
// All randomness flows through the caller's RNG, so a fixed seed fully
// determines both the plan and the splits.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use fedshard_data::ClassId;

use crate::error::{Error, Result};
use crate::stats::ClassStats;

/// Tunables for plan generation.
#[derive(Debug, Clone)]
pub struct PartitionOptions {
    /// Number of distinct classes assigned to each client.
    pub classes_per_client: usize,
    /// Lower bound for the uniform proportion draws.
    pub prob_low: f64,
    /// Upper bound for the uniform proportion draws.
    pub prob_high: f64,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            classes_per_client: 2,
            prob_low: 0.4,
            prob_high: 0.6,
        }
    }
}

impl PartitionOptions {
    pub fn classes_per_client(mut self, n: usize) -> Self {
        self.classes_per_client = n;
        self
    }

    pub fn prob_bounds(mut self, low: f64, high: f64) -> Self {
        self.prob_low = low;
        self.prob_high = high;
        self
    }
}

/// One client's share of the partition: which classes it holds and what
/// fraction of each class's remaining pool it receives, in parallel order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientClasses {
    pub classes: Vec<ClassId>,
    pub proportions: Vec<f64>,
}

/// The class/proportion assignment for every client.
///
/// Generated once on the training split and reused for every split, so the
/// per-client class footprint is consistent across train/val/test.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPlan {
    clients: Vec<ClientClasses>,
}

impl PartitionPlan {
    /// Generate a plan for `num_clients` clients.
    ///
    /// Each class receives a budget of
    /// `count_per_class = classes_per_client * num_clients / num_classes`
    /// assignment slots and a matching list of normalized uniform
    /// proportions. Clients then claim slots greedily: each of a client's
    /// `classes_per_client` picks goes to a uniformly random class among
    /// those tied for the maximum remaining budget, excluding classes the
    /// client already holds.
    ///
    /// Fails fast on configuration errors: zero clients, an empty
    /// collection, `classes_per_client` above the class count, bad
    /// proportion bounds, or a slot total that `num_classes` does not
    /// divide (equal class appearance would be impossible).
    pub fn generate<R: Rng + ?Sized>(
        stats: &ClassStats,
        num_clients: usize,
        options: &PartitionOptions,
        rng: &mut R,
    ) -> Result<Self> {
        let num_classes = stats.num_classes();
        let classes_per_client = options.classes_per_client;

        if num_clients == 0 {
            return Err(Error::NoClients);
        }
        if num_classes == 0 {
            return Err(Error::EmptyCollection);
        }
        if classes_per_client > num_classes {
            return Err(Error::TooManyClassesPerClient {
                classes_per_client,
                num_classes,
            });
        }
        let total_slots = classes_per_client * num_clients;
        if total_slots % num_classes != 0 {
            return Err(Error::UnevenClassAppearance {
                total_slots,
                num_classes,
            });
        }
        if !(options.prob_low > 0.0 && options.prob_low <= options.prob_high) {
            return Err(Error::InvalidProbBounds {
                low: options.prob_low,
                high: options.prob_high,
            });
        }

        let count_per_class = total_slots / num_classes;
        debug!(num_clients, num_classes, count_per_class, "generating partition plan");

        // Per class: remaining assignment budget and the proportions it
        // hands out, normalized to sum 1 and consumed from the end.
        let mut budgets = vec![count_per_class; num_classes];
        let mut proportions: Vec<Vec<f64>> = (0..num_classes)
            .map(|_| {
                let draws: Vec<f64> = (0..count_per_class)
                    .map(|_| rng.gen_range(options.prob_low..=options.prob_high))
                    .collect();
                let sum: f64 = draws.iter().sum();
                draws.into_iter().map(|p| p / sum).collect()
            })
            .collect();

        let mut clients = Vec::with_capacity(num_clients);
        for client in 0..num_clients {
            let mut classes: Vec<ClassId> = Vec::with_capacity(classes_per_client);
            for _ in 0..classes_per_client {
                let max_budget = *budgets.iter().max().unwrap();
                let candidates: Vec<ClassId> = (0..num_classes)
                    .filter(|&c| budgets[c] == max_budget && !classes.contains(&c))
                    .collect();
                let &chosen = candidates
                    .choose(rng)
                    .ok_or(Error::NoAssignableClass { client })?;
                budgets[chosen] -= 1;
                classes.push(chosen);
            }
            let client_props = classes
                .iter()
                .map(|&c| {
                    // budgets and proportion lists shrink in lockstep, so a
                    // chosen class always has a proportion left.
                    proportions[c].pop().unwrap()
                })
                .collect();
            clients.push(ClientClasses {
                classes,
                proportions: client_props,
            });
        }

        Ok(Self { clients })
    }

    /// Number of clients this plan covers.
    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Per-client class/proportion entries, indexed by client id.
    pub fn clients(&self) -> &[ClientClasses] {
        &self.clients
    }

    /// Slice one split's samples across clients according to this plan.
    ///
    /// Builds a pool of sample indices per class, shuffles each pool
    /// independently, then walks clients in order: each (class, proportion)
    /// pair takes a prefix of that class's *current* pool sized
    /// `floor(remaining * proportion)` and removes it. Proportions are
    /// therefore relative to what earlier clients left behind, and a
    /// residual tail per class may stay unassigned.
    ///
    /// Returns one index list per client; the lists are disjoint within a
    /// split by construction.
    pub fn split_indices<R: Rng + ?Sized>(
        &self,
        stats: &ClassStats,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>> {
        let num_classes = stats.num_classes();
        for entry in &self.clients {
            if let Some(&class) = entry.classes.iter().find(|&&c| c >= num_classes) {
                return Err(Error::PlanClassOutOfRange { class, num_classes });
            }
        }

        let mut pools: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
        for (index, &label) in stats.labels().iter().enumerate() {
            pools[label].push(index);
        }
        for pool in &mut pools {
            pool.shuffle(rng);
        }

        let mut client_indices = Vec::with_capacity(self.clients.len());
        for entry in &self.clients {
            let mut indices = Vec::new();
            for (&class, &proportion) in entry.classes.iter().zip(&entry.proportions) {
                let take = (pools[class].len() as f64 * proportion) as usize;
                indices.extend(pools[class].drain(..take));
            }
            client_indices.push(indices);
        }

        let assigned: usize = client_indices.iter().map(Vec::len).sum();
        debug!(
            num_clients = self.clients.len(),
            assigned,
            residual = stats.num_samples() - assigned,
            "split indices across clients"
        );

        Ok(client_indices)
    }
}
