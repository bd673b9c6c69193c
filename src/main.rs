use clap::Parser;
use ip_geo_etl::core::ConfigProvider;
use ip_geo_etl::utils::{logger, validation::Validate};
use ip_geo_etl::{run_batch, BatchSummary, CliConfig, EtlError, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ip-geo-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(&cli).await {
        Ok((summary, output_path)) => {
            println!(
                "✅ Done! {} IPs processed ({} skipped). Results saved to {}",
                summary.processed, summary.skipped, output_path
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Batch failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

/// 設定檔載入錯誤也走同一條錯誤路徑
async fn run(cli: &CliConfig) -> Result<(BatchSummary, String), EtlError> {
    match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading config file {}", path);
            let config = TomlConfig::from_file(path)?;
            run_validated(&config).await
        }
        None => run_validated(cli).await,
    }
}

async fn run_validated<C>(config: &C) -> Result<(BatchSummary, String), EtlError>
where
    C: ConfigProvider + Validate,
{
    config.validate()?;
    let summary = run_batch(config).await?;
    Ok((summary, config.output_path().to_string()))
}
