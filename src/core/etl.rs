use crate::core::reconcile::Reconciler;
use crate::core::report::format_row;
use crate::domain::model::{BatchSummary, MergedRecord, OutputRow};
use crate::domain::ports::{RowSink, RowSource};
use crate::utils::error::Result;
use tokio::task::JoinSet;

/// Runs a finite batch: source IPs in, one report row per IP out, in input order.
pub struct BatchEngine {
    reconciler: Reconciler,
    concurrency: usize,
}

impl BatchEngine {
    pub fn new(reconciler: Reconciler, concurrency: usize) -> Self {
        Self {
            reconciler,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<BatchSummary>
    where
        S: RowSource,
        K: RowSink,
    {
        tracing::info!(
            "Starting lookup batch (providers: {:?}, concurrency: {})",
            self.reconciler.providers(),
            self.concurrency
        );

        let mut summary = BatchSummary::default();
        let mut chunk = Vec::with_capacity(self.concurrency);

        loop {
            let next = source.next_ip();
            let exhausted = next.is_none();

            match next {
                Some(Ok(ip)) => chunk.push(ip),
                Some(Err(e)) if e.is_row_level() => {
                    tracing::warn!("⚠️ Skipping input row: {}", e);
                    summary.skipped += 1;
                }
                Some(Err(e)) => return Err(e),
                None => {}
            }

            if chunk.len() >= self.concurrency || (exhausted && !chunk.is_empty()) {
                let ips = std::mem::take(&mut chunk);
                for (row, merged) in self.process_chunk(ips).await {
                    summary.record(&merged);
                    sink.write_row(&row)?;
                }
            }

            if exhausted {
                break;
            }
        }

        sink.finish()?;

        tracing::info!(
            "✅ Batch finished: {} processed, {} skipped, {} fully resolved, {} partially failed, {} all failed",
            summary.processed,
            summary.skipped,
            summary.fully_resolved,
            summary.partially_failed,
            summary.all_failed
        );

        Ok(summary)
    }

    /// 同時處理一組 IP，結果依輸入順序回傳
    async fn process_chunk(&self, ips: Vec<String>) -> Vec<(OutputRow, MergedRecord)> {
        let mut tasks = JoinSet::new();
        for (index, ip) in ips.iter().enumerate() {
            let reconciler = self.reconciler.clone();
            let ip = ip.clone();
            tasks.spawn(async move {
                tracing::debug!("Reconciling {}", ip);
                let merged = reconciler.reconcile(&ip).await;
                (index, merged)
            });
        }

        let mut slots: Vec<Option<MergedRecord>> = vec![None; ips.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, merged)) => slots[index] = Some(merged),
                Err(e) => tracing::error!("Reconcile task ended abnormally: {}", e),
            }
        }

        ips.iter()
            .zip(slots)
            .map(|(ip, merged)| {
                // reconcile 本身不會失敗，任務中止時以空紀錄補上
                let merged = merged.unwrap_or_else(|| self.aborted_record());
                (format_row(ip, &merged), merged)
            })
            .collect()
    }

    fn aborted_record(&self) -> MergedRecord {
        let mut merged = MergedRecord::default();
        for provider in self.reconciler.providers() {
            merged.record_failure(
                provider,
                "Lookup task aborted: reconcile task did not complete".to_string(),
            );
        }
        merged
    }
}
