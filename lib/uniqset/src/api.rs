use crate::error::ReduceError;
use serde::Serialize;
use std::io;

// ========== Core MapReduce traits ==========

pub trait Mapper {
    type Input: Send + 'static;
    type Key: Send + Serialize + Ord + Clone + 'static;
    type Value: Send + Clone + 'static;

    fn do_map<I, F>(&self, input: I, emit: &mut F)
    where
        I: IntoIterator<Item = Self::Input>,
        F: FnMut(Self::Key, Self::Value);
}

/// Reducer is invoked once per grouped key and emits its output records through `emit`.
///
/// Values arrive as `io::Result` so the grouping stage can report a fault mid-iteration.
/// An invocation that returns `Err` must be treated as having emitted nothing: callers
/// buffer what `emit` received and drop it on failure.
pub trait Reducer {
    type Key: Send + Sync + Serialize + Ord + Clone + 'static;
    type ValueIn: Send + Sync + Clone + 'static;
    type Out: Send + 'static;

    fn do_reduce<I, F>(&self, key: &Self::Key, values: I, emit: &mut F) -> Result<(), ReduceError>
    where
        I: IntoIterator<Item = io::Result<Self::ValueIn>>,
        F: FnMut(Self::Out) -> io::Result<()>;
}

// ========== Executable pipeline interface ==========

pub trait ExecutablePipeline {
    fn add_input(&mut self, input_path: impl Into<String>);
    fn add_output(&mut self, output_path: impl Into<String>);

    fn map_reduce<M, R>(&mut self, mapper: M, reducer: R) -> anyhow::Result<crate::stats::RunSummary>
    where
        M: Mapper<Input = String> + Send + Sync + 'static,
        R: Reducer<Key = M::Key, ValueIn = M::Value> + Send + Sync + 'static,
        R::Out: std::fmt::Display;
}
