use crate::error::PipelineError;

/// The default number of elements a stage worker pops per iteration of its
/// loop, per `spec.md` §4.2 ("recommended `DEFAULT_BATCH = 128`").
pub const DEFAULT_BATCH: usize = 128;

/// Configuration for a [`crate::Pipe`].
///
/// Mirrors the donor crate's `Config` (ring size / producer limit / metrics
/// toggle) but reshaped around a blocking, type-parameterised pipe: there is
/// no `ring_bits`/`max_producers` here because capacity is a plain element
/// count and the producer count is unbounded (any number of `Producer`
/// handles may be minted, per `spec.md` §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of elements buffered at once. `0` means unbounded
    /// (`spec.md` §3 "limit (maximum element count; 0 denotes unbounded)").
    pub capacity: usize,
    /// Batch size a stage worker requests per `pop` call.
    pub default_batch: usize,
    /// Whether to track [`crate::MetricsSnapshot`] counters. Disabled by
    /// default since it costs an atomic increment per push/pop call.
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroBatch`] if `default_batch` is zero.
    pub fn new(capacity: usize, default_batch: usize, enable_metrics: bool) -> Result<Self, PipelineError> {
        if default_batch == 0 {
            return Err(PipelineError::ZeroBatch);
        }
        Ok(Self {
            capacity,
            default_batch,
            enable_metrics,
        })
    }

    /// An unbounded pipe (`capacity == 0`) with the default batch size.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            capacity: 0,
            default_batch: DEFAULT_BATCH,
            enable_metrics: false,
        }
    }

    /// A bounded pipe of the given capacity with the default batch size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero — a zero-capacity bounded pipe can never
    /// hold an element, which is never a useful configuration (unlike
    /// `capacity == 0` meaning "unbounded").
    #[must_use]
    pub const fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded capacity must be greater than zero");
        Self {
            capacity,
            default_batch: DEFAULT_BATCH,
            enable_metrics: false,
        }
    }

    /// Returns true if this pipe has no capacity ceiling.
    #[inline]
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.capacity == 0
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::unbounded()
    }
}
