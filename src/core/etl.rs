use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

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

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting PV series generation...");
        self.monitor.log_stats("Start");

        tracing::info!("Extracting measurements...");
        let tables = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        tracing::info!("Generating PV power...");
        let result = self.pipeline.transform(tables).await?;
        let (rows, columns) = result.power.shape();
        tracing::info!(
            "Generated {} cells ({} missing)",
            rows * columns,
            result.summary.missing_output
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
