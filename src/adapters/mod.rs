// Adapters layer: concrete implementations of domain ports (HTTP providers, CSV source/sink).

pub mod csv_io;
pub mod http_provider;

pub use csv_io::{CsvRowSink, CsvRowSource};
pub use http_provider::HttpProviderClient;
