pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{AlignmentRunner, LocalStorage, ProcessRunner};
pub use core::{etl::EtlEngine, pipeline::BlastPipeline};
pub use domain::model::{RunSummary, ScoreTable, SearchProgram};
pub use utils::error::{EtlError, Result};
