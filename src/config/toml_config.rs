use crate::config::{default_endpoint, validate_settings, DEFAULT_CONCURRENCY};
use crate::core::{ConfigProvider, ProviderId, ProviderSettings};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub lookup: Option<LookupConfig>,
    pub providers: Option<ProvidersConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub ip_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub concurrency: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub ipinfo: Option<ProviderEntry>,
    pub ip_api: Option<ProviderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IPINFO_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn entry(&self, id: ProviderId) -> Option<&ProviderEntry> {
        let providers = self.providers.as_ref()?;
        match id {
            ProviderId::IpInfo => providers.ipinfo.as_ref(),
            ProviderId::IpApi => providers.ip_api.as_ref(),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn ip_column(&self) -> &str {
        self.input.ip_column.as_deref().unwrap_or("ip")
    }

    fn concurrency(&self) -> usize {
        self.lookup
            .as_ref()
            .and_then(|l| l.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    fn timeout(&self) -> Option<Duration> {
        self.lookup
            .as_ref()
            .and_then(|l| l.timeout_seconds)
            .map(Duration::from_secs)
    }

    fn provider(&self, id: ProviderId) -> ProviderSettings {
        let entry = self.entry(id);
        ProviderSettings {
            endpoint: entry
                .and_then(|e| e.endpoint.clone())
                .unwrap_or_else(|| default_endpoint(id).to_string()),
            token: entry.and_then(|e| e.token.clone()),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_toml_config() {
        let toml_content = r#"
[input]
path = "IPs.csv"

[output]
path = "IPsInfo.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.ip_column(), "ip");
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.timeout(), None);
        assert_eq!(
            config.provider(ProviderId::IpInfo).endpoint,
            "https://ipinfo.io/{ip}/json"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[input]
path = "in.csv"
ip_column = "address"

[output]
path = "out/report.csv"

[lookup]
concurrency = 8
timeout_seconds = 3

[providers.ipinfo]
token = "abc"

[providers.ip_api]
endpoint = "http://localhost:9000/json/{ip}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.ip_column(), "address");
        assert_eq!(config.concurrency(), 8);
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.provider(ProviderId::IpInfo).token.as_deref(), Some("abc"));
        assert_eq!(
            config.provider(ProviderId::IpApi).endpoint,
            "http://localhost:9000/json/{ip}"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("IP_GEO_ETL_TEST_TOKEN", "from-env");

        let toml_content = r#"
[input]
path = "IPs.csv"

[output]
path = "IPsInfo.csv"

[providers.ipinfo]
token = "${IP_GEO_ETL_TEST_TOKEN}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.provider(ProviderId::IpInfo).token.as_deref(),
            Some("from-env")
        );

        std::env::remove_var("IP_GEO_ETL_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[input]
path = "IPs.csv"

[output]
path = "IPsInfo.csv"

[lookup]
concurrency = 0

[providers.ip_api]
endpoint = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[input\npath =");
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }

    #[test]
    fn test_malformed_file_is_config_error_with_config_exit_code() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[input\npath = ").unwrap();

        let err = TomlConfig::from_file(temp_file.path()).unwrap_err();

        assert!(matches!(err, EtlError::ConfigError { .. }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.recovery_suggestion(), "Fix the configuration value and run again");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[input]
path = "file-test.csv"

[output]
path = "./output.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "file-test.csv");
    }
}
