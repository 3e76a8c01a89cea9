use clap::Parser;
use harbour_watch::adapters::storage::check_data_layout;
use harbour_watch::config::{DataMode, Settings};
use harbour_watch::utils::error::AlertError;
use harbour_watch::utils::{logger, validation::Validate};
use harbour_watch::{AlertEngine, AlertPipeline, CliArgs};

fn exit_with(e: &AlertError) -> ! {
    tracing::error!(
        "❌ Alert run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting harbour-watch");

    // 載入設定
    let mut settings = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading settings from: {}", path.display());
            match Settings::from_file(path) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("❌ Failed to load settings '{}': {}", path.display(), e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::info!("📁 No settings file given, using defaults");
            Settings::default()
        }
    };
    args.apply_overrides(&mut settings);

    // 驗證設定
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::info!("✅ Settings loaded and validated successfully");
    if args.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    let root = settings.data_root();
    match check_data_layout(&root, &[settings.export.alerts_dir.as_str()]) {
        Ok(layout) => {
            tracing::debug!(
                "Data folder holds {} csv, {} geojson, {} tif file(s)",
                layout.csv.len(),
                layout.geojson.len(),
                layout.tif.len()
            );
            for dir in &layout.missing_dirs {
                tracing::warn!("Folder {} does not exist yet, it will be created", dir.display());
            }
        }
        Err(e) => exit_with(&e),
    }

    display_settings_summary(&settings, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let monitor_enabled = settings.monitoring.enabled;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = AlertPipeline::from_settings(settings);

    if !args.preview.is_empty() {
        match pipeline.preview(&args.preview).await {
            Ok(preview) => {
                println!("📊 Count outliers per threshold:");
                for (threshold, count) in preview {
                    println!("  {:>6.2} -> {}", threshold, count);
                }
                return Ok(());
            }
            Err(e) => exit_with(&e),
        }
    }

    let engine = AlertEngine::new_with_monitoring(pipeline, monitor_enabled);
    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Alert run completed with {} alerts", summary.total_alerts());
            println!("✅ Alert run completed!");
            println!("  Count outliers:   {}", summary.count_outliers);
            println!("  Static ships:     {}", summary.static_ships);
            println!("  Snapshot matches: {}", summary.snapshot_matches);
            for (harbour, count) in &summary.alerts_by_harbour {
                println!("  [{}] {} alerts", harbour, count);
            }
            for file in &summary.files {
                println!("📁 {}", root.join(file).display());
            }
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn display_settings_summary(settings: &Settings, args: &CliArgs) {
    println!("📋 Settings Summary:");
    println!("  Data root: {}", settings.data.root);
    match settings.data.mode {
        DataMode::Range => {
            println!("  Observations: {}", settings.data.observations);
            println!(
                "  Reference: < {}   Current: [{}, {})",
                settings.data.date_min.as_deref().unwrap_or("-"),
                settings.data.date_min.as_deref().unwrap_or("-"),
                settings.data.date_max.as_deref().unwrap_or("-")
            );
        }
        DataMode::Snapshots => {
            println!(
                "  Snapshots: {} -> {}",
                settings.data.snapshot_reference.as_deref().unwrap_or("-"),
                settings.data.snapshot_current.as_deref().unwrap_or("-")
            );
        }
    }
    if let Some(harbours) = &settings.data.harbours {
        println!("  Harbours: {}", harbours);
    }

    let detection = &settings.detection;
    println!(
        "  Large variations: {} (threshold {})",
        detection.large_variations, detection.threshold
    );
    println!(
        "  Static objects: {} (n_periods_min {}, smooth {:?})",
        detection.static_objects, detection.n_periods_min, detection.smooth
    );
    println!(
        "  Snapshots: {} (smooth {:?})",
        detection.snapshots, detection.snapshot_smooth
    );
    println!(
        "  Export: {}/ as {}{}",
        settings.export.alerts_dir,
        settings.export.format.extension(),
        if settings.export.archive { " + zip" } else { "" }
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
