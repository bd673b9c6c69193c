use crate::domain::model::{OutputRow, ProviderId, RawResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One geolocation lookup service.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// 查詢單一 IP。任何失敗都以 `Failure` 回傳，不會回傳 `Err`
    async fn lookup(&self, ip: &str) -> RawResult;
}

/// Yields input IPs in order. `None` ends the batch.
///
/// Row-level problems come back as `EtlError::MalformedRow` and are skipped by
/// the engine; every other error aborts the batch.
pub trait RowSource {
    fn next_ip(&mut self) -> Option<Result<String>>;
}

/// Accepts report rows. The column header goes out exactly once, before any row.
pub trait RowSink {
    fn write_row(&mut self, row: &OutputRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub token: Option<String>,
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn ip_column(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn timeout(&self) -> Option<Duration>;
    fn provider(&self, id: ProviderId) -> ProviderSettings;
}
