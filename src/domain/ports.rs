use crate::domain::model::{ExtractResult, RunSummary, SearchProgram, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub const DEFAULT_PLOT_FILE: &str = "DistributionEValue.png";
pub const DEFAULT_NUM_ITERATIONS: u32 = 3;
pub const DEFAULT_EVALUE: f64 = 10.0;
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn ids_file(&self) -> &str;
    fn query_folder(&self) -> &str;
    fn database(&self) -> &str;
    fn program(&self) -> SearchProgram;
    fn evalue(&self) -> f64;
    fn num_iterations(&self) -> u32;
    fn blast_path(&self) -> Option<&str>;
    fn output_file(&self) -> &str;
    fn output_png(&self) -> &str;
    fn summary_path(&self) -> Option<&str>;

    fn histogram_bins(&self) -> usize {
        DEFAULT_HISTOGRAM_BINS
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, data: ExtractResult) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunSummary>;
}
