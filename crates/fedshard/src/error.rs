/// Errors from partition planning and the loader factory.
///
/// Everything here is a setup-time failure: either the configuration cannot
/// produce a valid partition, or the data layer could not load a split. All
/// of them abort the pipeline; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dataset could not be loaded or parsed.
    #[error(transparent)]
    Data(#[from] fedshard_data::Error),

    /// The collection holds no samples, so there is nothing to partition.
    #[error("cannot partition an empty collection")]
    EmptyCollection,

    /// At least one client is needed for a partition to mean anything.
    #[error("num_clients must be at least 1")]
    NoClients,

    /// A client cannot receive more distinct classes than exist.
    #[error("classes_per_client ({classes_per_client}) exceeds the number of classes ({num_classes})")]
    TooManyClassesPerClient {
        classes_per_client: usize,
        num_classes: usize,
    },

    /// Equal class appearance across clients requires
    /// `classes_per_client * num_clients` to divide evenly by `num_classes`.
    #[error(
        "classes_per_client * num_clients = {total_slots} is not divisible by \
         num_classes = {num_classes}; equal class appearance cannot be guaranteed"
    )]
    UnevenClassAppearance {
        total_slots: usize,
        num_classes: usize,
    },

    /// Proportion sampling bounds must satisfy `0 < low <= high`.
    #[error("invalid proportion bounds: low = {low}, high = {high}")]
    InvalidProbBounds { low: f64, high: f64 },

    /// Every class at the maximum remaining budget is already held by the
    /// client being assigned, so the greedy step cannot proceed.
    #[error("no assignable class left for client {client}")]
    NoAssignableClass { client: usize },

    /// A partition plan references a class the split does not contain.
    #[error("plan references class {class} but the split has {num_classes} classes")]
    PlanClassOutOfRange { class: usize, num_classes: usize },
}

/// Convenience Result type used throughout the partitioning crate.
pub type Result<T> = std::result::Result<T, Error>;
