use thiserror::Error;

/// Errors that can arise from misconfiguration of a pipe or pipeline.
///
/// These are all class-1 ("programmer error") conditions per `spec.md` §7
/// that the type system cannot rule out statically. They are reported
/// through `Result` rather than an assert-and-abort because the values in
/// question (batch sizes, worker counts) often originate from a caller's
/// own configuration rather than being hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// `Config::default_batch` was zero; a worker would never be able to pop.
    #[error("default_batch must be greater than zero")]
    ZeroBatch,
    /// `parallel()` was asked to spawn zero worker instances.
    #[error("parallel() requires at least one instance")]
    ZeroInstances,
}
