pub mod api;
pub mod constants;
pub mod error;
pub mod io;
pub mod reduce;
pub mod runtime;
pub mod set;
pub mod stats;
pub mod utils;

pub use api::{ExecutablePipeline, Mapper, Reducer};
pub use error::ReduceError;
pub use io::{Sink, TextLineSink, VecSink};
pub use reduce::{aggregate, OutputRecord, UniqueValuesReducer};
pub use runtime::{default_pipeline, LocalPipeline, RuntimeConfig};
pub use set::ValueSet;
pub use stats::RunSummary;
