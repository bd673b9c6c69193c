pub mod etl;
pub mod normalizer;
pub mod reconcile;
pub mod report;

pub use crate::domain::model::{
    AttributeName, Attributes, BatchSummary, MergedRecord, OutputRow, ProviderId, ProviderResult,
    RawFields, RawResult,
};
pub use crate::domain::ports::{ConfigProvider, ProviderClient, ProviderSettings, RowSink, RowSource};
pub use crate::utils::error::Result;
