use crate::core::normalizer::normalize;
use crate::domain::model::{MergedRecord, ProviderId, ProviderResult, RawResult};
use crate::domain::ports::ProviderClient;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Queries every registered provider for one IP and merges the results.
#[derive(Clone)]
pub struct Reconciler {
    clients: Vec<Arc<dyn ProviderClient>>,
}

impl Reconciler {
    pub fn new(clients: Vec<Arc<dyn ProviderClient>>) -> Self {
        Self { clients }
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        self.clients.iter().map(|c| c.id()).collect()
    }

    pub async fn reconcile(&self, ip: &str) -> MergedRecord {
        let mut lookups = JoinSet::new();
        for client in &self.clients {
            let client = Arc::clone(client);
            let ip = ip.to_string();
            lookups.spawn(async move {
                let id = client.id();
                (id, client.lookup(&ip).await)
            });
        }

        let mut results: Vec<(ProviderId, RawResult)> = Vec::with_capacity(self.clients.len());
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Lookup task for {} ended abnormally: {}", ip, e),
            }
        }

        // 任務異常結束的服務也要留下錯誤紀錄
        for client in &self.clients {
            let id = client.id();
            if !results.iter().any(|(done, _)| *done == id) {
                results.push((
                    id,
                    ProviderResult::Failure("Lookup task aborted: task did not complete".to_string()),
                ));
            }
        }

        for (id, result) in &results {
            if let ProviderResult::Failure(reason) = result {
                tracing::warn!("{} lookup failed for {}: {}", id, ip, reason);
            }
        }

        merge(results)
    }
}

/// Deterministic fold keyed by provider, so arrival order never matters.
/// Providers that never report keep all attributes absent and no error.
pub fn merge<I>(results: I) -> MergedRecord
where
    I: IntoIterator<Item = (ProviderId, RawResult)>,
{
    let mut merged = MergedRecord::default();
    for (provider, raw) in results {
        match normalize(provider, raw) {
            ProviderResult::Success(attributes) => merged.record_success(provider, &attributes),
            ProviderResult::Failure(reason) => merged.record_failure(provider, reason),
        }
    }
    merged
}
