// Route handling: the static pair registry, the instruction codec, and the
// transfer execution pipeline

pub mod codec;
pub mod pipeline;
pub mod registry;

pub use pipeline::{Pipeline, PipelineTiming, RouteSummary, TransferOutcome};
pub use registry::{ChainTag, Route};
