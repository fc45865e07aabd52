use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: String,
    pub rows_read: usize,
    pub rows_written: usize,
    pub rows_skipped: usize,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting conversion...");
        self.monitor.log_stats("Start");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        let rows_read = raw_data.len();
        tracing::info!("Extracted {} rows", rows_read);
        self.monitor.log_stats("Extract");

        // Transform
        let table = self.pipeline.transform(raw_data).await?;
        let rows_written = table.records.len();
        let rows_skipped = table.skipped;
        tracing::info!(
            "Converted {} rows, skipped {} with unsupported types",
            rows_written,
            rows_skipped
        );
        self.monitor.log_stats("Transform");

        // Load
        let output_path = self.pipeline.load(table).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunSummary {
            output_path,
            rows_read,
            rows_written,
            rows_skipped,
        })
    }
}
