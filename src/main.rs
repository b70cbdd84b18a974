use clap::Parser;
use lucky7_etl::utils::{logger, validation::Validate};
use lucky7_etl::{ChromeSession, CliArgs, CsvSink, ScrapeEngine, ScrapeError, ScraperConfig, StopReason};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting lucky7-etl");

    let config = ScraperConfig::load(args.config.as_deref()).unwrap_or_else(|e| exit_with(&e));

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }
    tracing::debug!("Config: {:?}", config);
    tracing::info!("📊 CSV → {}", config.output.csv_path);

    let sink = CsvSink::open(&config.output.csv_path).unwrap_or_else(|e| exit_with(&e));
    let session = ChromeSession::launch(&config)
        .await
        .unwrap_or_else(|e| exit_with(&e));

    let engine = ScrapeEngine::new(session, sink, config.poll_settings())
        .with_debug_dir(&config.output.debug_dir);

    match engine.run(shutdown_signal()).await {
        Ok(summary) => {
            let reason = match summary.stop_reason {
                StopReason::Interrupted => "interrupted",
                StopReason::TimeCap => "time cap",
                StopReason::RoundCap => "round cap",
            };
            tracing::info!(
                "✅ Saved {} rounds in {}s ({})",
                summary.stats.saved,
                summary.elapsed.as_secs(),
                reason
            );
            println!("✅ Saved {} rounds to {}", summary.stats.saved, config.output.csv_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

/// Ctrl-C; if the handler cannot be installed the run continues until a cap.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("⚠️ Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn exit_with(e: &ScrapeError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(1);
}
