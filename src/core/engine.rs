use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::collections::BTreeMap;

/// What one run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub count_outliers: usize,
    pub static_ships: usize,
    pub snapshot_matches: usize,
    pub alerts_by_harbour: BTreeMap<String, usize>,
    pub files: Vec<String>,
}

impl RunSummary {
    pub fn total_alerts(&self) -> usize {
        self.count_outliers + self.static_ships + self.snapshot_matches
    }
}

pub struct AlertEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AlertEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting alert run");
        self.monitor.log_stats("Start");

        tracing::info!("📥 Loading observations...");
        let input = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} reference and {} current observations",
            input.reference.len(),
            input.current.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("🔎 Running detector...");
        let report = self.pipeline.transform(input).await?;
        tracing::info!(
            "Raised {} count outliers, {} static ships, {} snapshot matches",
            report.count_outliers.len(),
            report.static_ships.len(),
            report.snapshot_matches.len()
        );
        self.monitor.log_stats("Detect");

        let mut summary = RunSummary {
            count_outliers: report.count_outliers.len(),
            static_ships: report.static_ships.len(),
            snapshot_matches: report.snapshot_matches.len(),
            alerts_by_harbour: report
                .counts_by_harbour()
                .into_iter()
                .map(|(harbour, count)| (harbour.to_string(), count))
                .collect(),
            files: Vec::new(),
        };

        tracing::info!("💾 Exporting alerts...");
        summary.files = self.pipeline.load(report).await?;
        for file in &summary.files {
            tracing::info!("📁 Alerts saved to: {}", file);
        }
        self.monitor.log_stats("Export");
        self.monitor.log_final_stats();

        Ok(summary)
    }
}
