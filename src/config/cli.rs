use crate::config::settings::Settings;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "harbour-watch")]
#[command(about = "Raise alerts on ship counts and static ships around harbours")]
pub struct CliArgs {
    /// Path to the TOML settings file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Override the data folder
    #[arg(long)]
    pub data_root: Option<String>,

    /// Override detection.threshold
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Print the number of count outliers for each threshold and exit
    #[arg(long, value_delimiter = ',')]
    pub preview: Vec<f64>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 將命令列覆蓋設定套用到設定檔
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(root) = &self.data_root {
            settings.data.root = root.clone();
            tracing::info!("🔧 Data root overridden to: {}", root);
        }
        if let Some(threshold) = self.threshold {
            settings.detection.threshold = threshold;
            tracing::info!("🔧 Threshold overridden to: {}", threshold);
        }
        if let Some(monitor) = self.monitor {
            settings.monitoring.enabled = monitor;
        }
    }
}
