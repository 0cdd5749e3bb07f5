use std::sync::Arc;
use std::thread;

use crate::pipe::{Consumer, Producer};

/// A single pipeline stage: transforms batches of `In` into pushes onto an
/// `Out` producer.
///
/// This is the typed, trait-based replacement for the C `pipe_processor_t`
/// function-pointer contract (`spec.md` §4.2, §6). `process` is called for
/// every non-empty batch popped from the stage's input pipe; `finish` is
/// called exactly once, after the input pipe reaches closed-to-consumers,
/// before the worker thread releases its handles (`spec.md` §8 P6).
///
/// Implementors shared across [`crate::pipeline::parallel`]'s worker threads
/// are wrapped in `Arc`, which is this crate's replacement for the C
/// original's raw `aux` pointer shared verbatim across threads (`spec.md`
/// §4.3, §9): any internal mutable state must be `Send + Sync` on its own
/// terms, exactly as the C contract requires the processor to manage `aux`'s
/// thread-safety itself.
pub trait Stage<In, Out>: Send + Sync + 'static {
    /// Process one non-empty batch, optionally pushing results downstream.
    fn process(&self, batch: &[In], out: &Producer<Out>);

    /// Called exactly once, after the input stream is exhausted. The
    /// default implementation does nothing.
    fn finish(&self, out: &Producer<Out>) {
        let _ = out;
    }
}

struct FnStage<F, G> {
    process: F,
    finish: G,
}

impl<In, Out, F, G> Stage<In, Out> for FnStage<F, G>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(&[In], &Producer<Out>) + Send + Sync + 'static,
    G: Fn(&Producer<Out>) + Send + Sync + 'static,
{
    fn process(&self, batch: &[In], out: &Producer<Out>) {
        (self.process)(batch, out);
    }

    fn finish(&self, out: &Producer<Out>) {
        (self.finish)(out);
    }
}

/// Builds a [`Stage`] out of a per-batch closure and a teardown closure, for
/// the common case of a stateless transform that needs no other `Stage`
/// machinery.
pub fn stage_fn<In, Out, F, G>(process: F, finish: G) -> impl Stage<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(&[In], &Producer<Out>) + Send + Sync + 'static,
    G: Fn(&Producer<Out>) + Send + Sync + 'static,
{
    FnStage { process, finish }
}

/// Builds a [`Stage`] out of a per-batch closure alone; `finish` is a no-op.
pub fn stage_fn_simple<In, Out, F>(process: F) -> impl Stage<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(&[In], &Producer<Out>) + Send + Sync + 'static,
{
    stage_fn(process, |_out: &Producer<Out>| {})
}

/// The worker loop, direct Rust equivalent of `original_source/pipe_util.c`'s
/// `process_pipe`: pop a batch, hand it to the stage, repeat until the input
/// is drained and closed, then call the teardown hook once and release both
/// handles by letting them drop.
fn run<In, Out>(input: Consumer<In>, stage: Arc<dyn Stage<In, Out>>, output: Producer<Out>)
where
    In: Send + 'static,
    Out: Send + 'static,
{
    let batch_size = input.default_batch();
    loop {
        let batch = input.pop(batch_size);
        if batch.is_empty() {
            break;
        }
        stage.process(&batch, &output);
    }
    stage.finish(&output);
    // `input` and `output` are dropped here, releasing this worker's handles
    // exactly once, matching `spec.md` §4.2 step 5.
}

/// Spawns a detached worker thread running one stage. Per `spec.md` §9,
/// the pipeline builder never retains or joins these threads — the thread
/// owns `input` and `output` for its entire lifetime and is the sole
/// releaser of both.
pub(crate) fn spawn<In, Out>(input: Consumer<In>, stage: Arc<dyn Stage<In, Out>>, output: Producer<Out>)
where
    In: Send + 'static,
    Out: Send + 'static,
{
    thread::spawn(move || run(input, stage, output));
}
