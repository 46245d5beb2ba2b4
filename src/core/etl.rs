use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting alignment run...");
        self.monitor.checkpoint("start");

        // Extract
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Searched {} of {} queries",
            extracted.runs.len(),
            extracted.query_ids.len()
        );
        self.monitor.checkpoint("extract");

        // Transform
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Built {} matrix rows from {} scored pairs",
            transformed.matrix.len(),
            transformed.scores.len()
        );
        self.monitor.checkpoint("transform");

        // Load
        let summary = self.pipeline.load(transformed).await?;
        tracing::info!("Matrix saved to: {}", summary.matrix_path);
        if let Some(plot) = &summary.plot_path {
            tracing::info!("Histogram saved to: {}", plot);
        }
        self.monitor.checkpoint("load");
        self.monitor.log_final_stats();

        Ok(summary)
    }
}
