use std::sync::Arc;

use crate::config::Config;
use crate::error::PipelineError;
use crate::pipe::{Consumer, Pipe, Producer};
use crate::stage::{self, Stage};

/// The `{in, out}` pair exposed to callers of a pipeline, per `spec.md` §3.
///
/// `output` is `None` when the pipeline was built with
/// [`PipelineBuilder::sink`], the Rust replacement for the C original's
/// trailing zero-size sentinel that suppresses the final consumer handle.
pub struct Pipeline<In, Out> {
    pub input: Producer<In>,
    pub output: Option<Consumer<Out>>,
}

/// Wraps an existing pipe as a trivial one-stage pipeline: mints a producer
/// and a consumer from it and bundles them (`spec.md` §4.3 `trivial`).
pub fn trivial<T>(pipe: &Pipe<T>) -> Pipeline<T, T> {
    Pipeline {
        input: pipe.producer(),
        output: Some(pipe.consumer()),
    }
}

/// Spawns `instances` worker threads, all reading from one shared input pipe
/// and all writing to one shared output pipe (`spec.md` §4.3 `parallel`,
/// `original_source/pipe_util.c`'s `pipe_parallel`).
///
/// All instances run the same `stage`, wrapped once in `Arc` and cloned per
/// worker — the Rust replacement for the C original passing the same raw
/// `aux` pointer to every thread. Ordering across the `instances` workers'
/// outputs is not preserved (`spec.md` §5); `stage.finish` is called exactly
/// once per worker, i.e. exactly `instances` times in total (`spec.md` §4.3,
/// §8 P6).
///
/// # Errors
///
/// Returns [`PipelineError::ZeroInstances`] if `instances == 0`.
pub fn parallel<In, Out, S>(
    instances: usize,
    in_capacity: usize,
    stage: S,
    out_capacity: usize,
) -> Result<Pipeline<In, Out>, PipelineError>
where
    In: Send + 'static,
    Out: Send + 'static,
    S: Stage<In, Out>,
{
    if instances == 0 {
        return Err(PipelineError::ZeroInstances);
    }

    let in_pipe = Pipe::<In>::new(capacity_config(in_capacity));
    let out_pipe = Pipe::<Out>::new(capacity_config(out_capacity));
    let stage: Arc<dyn Stage<In, Out>> = Arc::new(stage);

    for _ in 0..instances {
        stage::spawn(in_pipe.consumer(), Arc::clone(&stage), out_pipe.producer());
    }

    Ok(Pipeline {
        input: in_pipe.producer(),
        output: Some(out_pipe.consumer()),
    })
    // `in_pipe` and `out_pipe` (the owner handles) are dropped here; each
    // pipe stays alive because its producer/consumer handles are still live.
}

fn capacity_config(capacity: usize) -> Config {
    if capacity == 0 {
        Config::unbounded()
    } else {
        Config::bounded(capacity)
    }
}

/// Builds a linear chain of pipes and stage workers, one call per stage
/// (`spec.md` §4.3 `pipeline`, replacing the C original's variadic argument
/// list of `(proc, aux, size)` triples terminated by a `NULL`/`0` sentinel
/// with the builder pattern `spec.md` §9 recommends).
///
/// ```
/// use pipeflow::{stage_fn_simple, Config, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::<i32>::new(Config::unbounded())
///     .stage(Config::unbounded(), stage_fn_simple(|batch: &[i32], out| {
///         out.push(batch.iter().map(|v| v * 2).collect());
///     }))
///     .build();
///
/// pipeline.input.push(vec![1, 2, 3]);
/// drop(pipeline.input);
/// assert_eq!(pipeline.output.unwrap().pop(10), vec![2, 4, 6]);
/// ```
pub struct PipelineBuilder<In, T = In> {
    input: Producer<In>,
    tail: Consumer<T>,
}

impl<T: Send + 'static> PipelineBuilder<T, T> {
    /// Starts a new chain by creating the first pipe, `P0`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let p0 = Pipe::<T>::new(config);
        Self {
            input: p0.producer(),
            tail: p0.consumer(),
        }
    }
}

impl<In: Send + 'static, T: Send + 'static> PipelineBuilder<In, T> {
    /// Appends one stage: creates a new pipe `Pi`, spawns a worker wired
    /// between the builder's current tail consumer and `Pi`'s producer, and
    /// advances the chain's element type from `T` to `U`.
    pub fn stage<U, S>(self, config: Config, stage: S) -> PipelineBuilder<In, U>
    where
        U: Send + 'static,
        S: Stage<T, U>,
    {
        let next = Pipe::<U>::new(config);
        stage::spawn(self.tail, Arc::new(stage), next.producer());
        PipelineBuilder {
            input: self.input,
            tail: next.consumer(),
        }
    }

    /// Finishes the chain, returning `{in, out: Some(..)}`.
    #[must_use]
    pub fn build(self) -> Pipeline<In, T> {
        Pipeline {
            input: self.input,
            output: Some(self.tail),
        }
    }

    /// Finishes the chain without minting a final consumer handle — the
    /// Rust replacement for the C original's trailing zero-size sentinel.
    /// The last stage's worker still runs and still pushes into its output
    /// pipe; those pushes are simply discarded via the orphaned-producer
    /// path once the builder's tail consumer is dropped here (`spec.md` §8
    /// scenario 6).
    #[must_use]
    pub fn sink(self) -> Producer<In> {
        drop(self.tail);
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::stage_fn_simple;

    fn doubler() -> impl Stage<(i64, i64), (i64, i64)> {
        stage_fn_simple(|batch: &[(i64, i64)], out: &Producer<(i64, i64)>| {
            let doubled: Vec<(i64, i64)> = batch.iter().map(|&(orig, new)| (orig, new * 2)).collect();
            out.push(doubled);
        })
    }

    #[test]
    fn trivial_round_trips() {
        let pipe = Pipe::<i32>::new(Config::unbounded());
        let pipeline = trivial(&pipe);
        pipeline.input.push(vec![1, 2, 3]);
        drop(pipeline.input);
        assert_eq!(pipeline.output.unwrap().pop(10), vec![1, 2, 3]);
    }

    #[test]
    fn linear_doubling_chain_matches_scenario_3() {
        const N: i64 = 200;
        const STAGES: u32 = 6;

        let mut builder = PipelineBuilder::<(i64, i64)>::new(Config::unbounded());
        for _ in 0..STAGES {
            builder = builder.stage(Config::unbounded(), doubler());
        }
        let pipeline = builder.build();

        for i in 0..N {
            pipeline.input.push(vec![(i, i)]);
        }
        drop(pipeline.input);

        let out = pipeline.output.unwrap();
        let mut seen = 0;
        loop {
            let batch = out.pop(64);
            if batch.is_empty() {
                break;
            }
            for (orig, new) in batch {
                assert_eq!(new, orig * (1 << STAGES));
                seen += 1;
            }
        }
        assert_eq!(seen, N);
    }

    #[test]
    fn parallel_fan_out_matches_scenario_4() {
        const N: i64 = 500;
        const WORKERS: usize = 4;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingDoubler {
            finish_calls: Arc<AtomicUsize>,
        }

        impl Stage<(i64, i64), (i64, i64)> for CountingDoubler {
            fn process(&self, batch: &[(i64, i64)], out: &Producer<(i64, i64)>) {
                let doubled: Vec<(i64, i64)> = batch.iter().map(|&(orig, new)| (orig, new * 2)).collect();
                out.push(doubled);
            }

            fn finish(&self, _out: &Producer<(i64, i64)>) {
                self.finish_calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        let finish_calls = Arc::new(AtomicUsize::new(0));
        let stage = CountingDoubler {
            finish_calls: Arc::clone(&finish_calls),
        };

        let pipeline = parallel::<(i64, i64), (i64, i64), _>(WORKERS, 0, stage, 0).unwrap();

        for i in 0..N {
            pipeline.input.push(vec![(i, i)]);
        }
        drop(pipeline.input);

        let out = pipeline.output.unwrap();
        let mut seen: Vec<i64> = Vec::new();
        loop {
            let batch = out.pop(64);
            if batch.is_empty() {
                break;
            }
            seen.extend(batch.into_iter().map(|(_, new)| new));
        }
        seen.sort_unstable();
        let expected: Vec<i64> = (0..N).map(|i| 2 * i).collect();
        assert_eq!(seen, expected);

        while finish_calls.load(Ordering::SeqCst) < WORKERS {
            std::thread::yield_now();
        }
        assert_eq!(finish_calls.load(Ordering::SeqCst), WORKERS);
    }

    #[test]
    fn sink_suppresses_consumer_like_scenario_6() {
        let pipeline = PipelineBuilder::<i32>::new(Config::unbounded())
            .stage(Config::unbounded(), doubler_i32())
            .sink();

        // Driving the input must not block or panic even though nothing
        // ever reads the discarded output.
        pipeline.push(vec![1, 2, 3, 4]);
    }

    fn doubler_i32() -> impl Stage<i32, i32> {
        stage_fn_simple(|batch: &[i32], out: &Producer<i32>| {
            out.push(batch.iter().map(|v| v * 2).collect());
        })
    }
}
