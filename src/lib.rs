pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvRowSink, CsvRowSource, HttpProviderClient};
pub use config::toml_config::TomlConfig;
pub use core::{etl::BatchEngine, reconcile::Reconciler};
pub use domain::model::BatchSummary;
pub use utils::error::{EtlError, Result};

use crate::core::ConfigProvider;

/// Reads the configured input CSV, looks every IP up, and writes the report.
pub async fn run_batch<C: ConfigProvider>(config: &C) -> Result<BatchSummary> {
    let client = reqwest::Client::builder().build()?;
    let reconciler = Reconciler::new(HttpProviderClient::all_from_config(config, &client));
    let engine = BatchEngine::new(reconciler, config.concurrency());

    // 先確認輸入可讀，避免留下只有標頭的報表
    let mut source = CsvRowSource::from_path(config.input_path(), config.ip_column())?;
    let mut sink = CsvRowSink::from_path(config.output_path())?;

    tracing::info!(
        "📂 Reading {} -> writing {}",
        config.input_path(),
        config.output_path()
    );

    engine.run(&mut source, &mut sink).await
}
