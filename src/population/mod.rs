mod pipeline;
mod schedule;
mod sink;

pub use pipeline::{Pipeline, RunId};
pub use sink::{JsonSink, NullSink, PersistenceSink};
