pub mod distribution;
pub mod etl;
pub mod matrix;
pub mod parser;
pub mod pipeline;
pub mod plot;

pub use crate::domain::model::{ExtractResult, RunSummary, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
