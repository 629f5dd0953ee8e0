pub use errors::{PipelineError, PipelineResult};

pub mod catalog;
pub mod errors;
pub mod fanout;
pub mod pipeline;
pub mod report;
