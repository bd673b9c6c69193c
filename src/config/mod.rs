pub mod toml_config;

use crate::core::{ConfigProvider, ProviderId, ProviderSettings};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_IPINFO_ENDPOINT: &str = "https://ipinfo.io/{ip}/json";
pub const DEFAULT_IP_API_ENDPOINT: &str = "http://ip-api.com/json/{ip}";
pub const DEFAULT_CONCURRENCY: usize = 4;

pub fn default_endpoint(id: ProviderId) -> &'static str {
    match id {
        ProviderId::IpInfo => DEFAULT_IPINFO_ENDPOINT,
        ProviderId::IpApi => DEFAULT_IP_API_ENDPOINT,
    }
}

/// 共用的設定檢查，CLI 與 TOML 都走這裡
pub(crate) fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validation::validate_path("input", config.input_path())?;
    validation::validate_path("output", config.output_path())?;
    validation::validate_non_empty_string("ip_column", config.ip_column())?;
    validation::validate_positive_number("concurrency", config.concurrency(), 1)?;

    if let Some(timeout) = config.timeout() {
        validation::validate_positive_number("timeout_seconds", timeout.as_secs() as usize, 1)?;
    }

    for id in ProviderId::ALL {
        validation::validate_endpoint_template(
            &format!("{} endpoint", id),
            &config.provider(id).endpoint,
        )?;
    }

    Ok(())
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "ip-geo-etl")]
    #[command(about = "Look up geolocation data for a CSV of IP addresses from two providers")]
    pub struct CliConfig {
        #[arg(long, default_value = "IPs.csv")]
        pub input: String,

        #[arg(long, default_value = "IPsInfo.csv")]
        pub output: String,

        #[arg(long, default_value = "ip", help = "Name of the input column holding the IP")]
        pub ip_column: String,

        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        pub concurrency: usize,

        #[arg(long, help = "Per-lookup timeout in seconds")]
        pub timeout_secs: Option<u64>,

        #[arg(long, default_value = DEFAULT_IPINFO_ENDPOINT)]
        pub ipinfo_endpoint: String,

        #[arg(long)]
        pub ipinfo_token: Option<String>,

        #[arg(long, default_value = DEFAULT_IP_API_ENDPOINT)]
        pub ip_api_endpoint: String,

        #[arg(long)]
        pub ip_api_token: Option<String>,

        #[arg(long, help = "Load settings from a TOML file instead of flags")]
        pub config: Option<String>,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output
        }

        fn ip_column(&self) -> &str {
            &self.ip_column
        }

        fn concurrency(&self) -> usize {
            self.concurrency
        }

        fn timeout(&self) -> Option<Duration> {
            self.timeout_secs.map(Duration::from_secs)
        }

        fn provider(&self, id: ProviderId) -> ProviderSettings {
            match id {
                ProviderId::IpInfo => ProviderSettings {
                    endpoint: self.ipinfo_endpoint.clone(),
                    token: self.ipinfo_token.clone(),
                },
                ProviderId::IpApi => ProviderSettings {
                    endpoint: self.ip_api_endpoint.clone(),
                    token: self.ip_api_token.clone(),
                },
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_settings(self)
        }
    }

}
