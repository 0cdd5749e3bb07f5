//! pipeflow — a thread-safe, typed multi-producer/multi-consumer pipe, plus
//! a small set of pipeline combinators that wire such pipes together with
//! worker threads into linear and parallel dataflow graphs.
//!
//! # Example
//!
//! ```
//! use pipeflow::{Config, Pipe};
//!
//! let pipe = Pipe::<u64>::new(Config::unbounded());
//! let producer = pipe.producer();
//! let consumer = pipe.consumer();
//!
//! producer.push(vec![1, 2, 3]);
//! drop(producer);
//!
//! assert_eq!(consumer.pop(10), vec![1, 2, 3]);
//! ```
//!
//! For chaining worker threads together, see [`PipelineBuilder`] and
//! [`parallel`].

mod config;
mod error;
mod invariants;
mod metrics;
mod pipe;
mod pipeline;
mod stage;

pub use config::{Config, DEFAULT_BATCH};
pub use error::PipelineError;
pub use metrics::MetricsSnapshot;
pub use pipe::{Consumer, Pipe, Producer};
pub use pipeline::{parallel, trivial, Pipeline, PipelineBuilder};
pub use stage::{stage_fn, stage_fn_simple, Stage};
