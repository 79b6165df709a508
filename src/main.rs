use clap::Parser;
use faa2etc::core::etl::save_summary;
use faa2etc::utils::{logger, validation::Validate};
use faa2etc::{CliConfig, EtlEngine, EtlError, FaaPipeline, FileConfig, LocalStorage};

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Conversion failed: {} (Stage: {}, Severity: {:?})",
        e,
        e.category().stage(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            match FileConfig::from_file(path).and_then(|config| {
                config.validate()?;
                Ok(config)
            }) {
                Ok(config) => Some(config),
                Err(e) => fail(&e),
            }
        }
        None => None,
    };

    let config = match cli.into_run_config(file_config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let summary_path = config.summary_path.clone();
    let monitor_enabled = config.monitor;
    let storage = LocalStorage::default();
    let pipeline = FaaPipeline::new(storage.clone(), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let summary = match engine.run().await {
        Ok(summary) => summary,
        Err(e) => fail(&e),
    };

    if let Some(path) = summary_path {
        if let Err(e) = save_summary(&storage, &summary, &path).await {
            fail(&e);
        }
    }

    println!("✅ Success! Wrote {} rows to {}", summary.stats.rows_emitted, summary.output_path);
}
