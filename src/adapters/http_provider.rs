use crate::domain::model::{ProviderId, ProviderResult, RawFields, RawResult};
use crate::domain::ports::{ConfigProvider, ProviderClient, ProviderSettings};
use crate::utils::validation::IP_PLACEHOLDER;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// HTTP GET lookup against a fixed endpoint template (`{ip}` substituted).
pub struct HttpProviderClient {
    id: ProviderId,
    settings: ProviderSettings,
    client: Client,
    timeout: Option<Duration>,
}

impl HttpProviderClient {
    pub fn new(
        id: ProviderId,
        settings: ProviderSettings,
        client: Client,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            id,
            settings,
            client,
            timeout,
        }
    }

    /// One client per registered provider, sharing the same connection pool.
    pub fn all_from_config<C: ConfigProvider>(
        config: &C,
        client: &Client,
    ) -> Vec<Arc<dyn ProviderClient>> {
        ProviderId::ALL
            .into_iter()
            .map(|id| {
                Arc::new(Self::new(
                    id,
                    config.provider(id),
                    client.clone(),
                    config.timeout(),
                )) as Arc<dyn ProviderClient>
            })
            .collect()
    }

    pub fn endpoint_for(&self, ip: &str) -> String {
        self.settings.endpoint.replace(IP_PLACEHOLDER, ip)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn lookup(&self, ip: &str) -> RawResult {
        let url = self.endpoint_for(ip);
        tracing::debug!("{}: requesting {}", self.id, url);

        let mut request = self.client.get(&url);

        if let Some(token) = &self.settings.token {
            request = request.query(&[("token", token)]);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        // 不重試：失敗直接回報
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return ProviderResult::Failure(format!("Request failed: {}", e)),
        };

        let status = response.status();
        tracing::debug!("{}: response status {} for {}", self.id, status, ip);

        if status != StatusCode::OK {
            return ProviderResult::Failure(format!(
                "Failed to fetch data (status {})",
                status.as_u16()
            ));
        }

        match response.json::<RawFields>().await {
            Ok(fields) => ProviderResult::Success(fields),
            Err(e) => ProviderResult::Failure(format!("Invalid response body: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(id: ProviderId, endpoint: String, token: Option<&str>) -> HttpProviderClient {
        HttpProviderClient::new(
            id,
            ProviderSettings {
                endpoint,
                token: token.map(str::to_string),
            },
            Client::new(),
            Some(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/8.8.8.8/json");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!({
                        "ip": "8.8.8.8",
                        "city": "Mountain View",
                        "country": "US"
                    }));
            })
            .await;

        let client = client_for(
            ProviderId::IpInfo,
            format!("{}/{{ip}}/json", server.base_url()),
            None,
        );
        let result = client.lookup("8.8.8.8").await;

        api_mock.assert_async().await;
        match result {
            ProviderResult::Success(fields) => {
                assert_eq!(fields.get("city").and_then(|v| v.as_str()), Some("Mountain View"));
            }
            ProviderResult::Failure(reason) => panic!("unexpected failure: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_lookup_sends_token_query() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/json/1.1.1.1")
                    .query_param("token", "secret");
                then.status(200).json_body(serde_json::json!({"city": "Sydney"}));
            })
            .await;

        let client = client_for(
            ProviderId::IpApi,
            format!("{}/json/{{ip}}", server.base_url()),
            Some("secret"),
        );
        let result = client.lookup("1.1.1.1").await;

        api_mock.assert_async().await;
        assert!(!result.is_failure());
    }

    #[tokio::test]
    async fn test_lookup_non_200_status() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/8.8.8.8/json");
                then.status(429).body("rate limited");
            })
            .await;

        let client = client_for(
            ProviderId::IpInfo,
            format!("{}/{{ip}}/json", server.base_url()),
            None,
        );
        let result = client.lookup("8.8.8.8").await;

        api_mock.assert_async().await;
        assert_eq!(
            result,
            ProviderResult::Failure("Failed to fetch data (status 429)".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_invalid_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/8.8.4.4/json");
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(
            ProviderId::IpInfo,
            format!("{}/{{ip}}/json", server.base_url()),
            None,
        );

        match client.lookup("8.8.4.4").await {
            ProviderResult::Failure(reason) => assert!(reason.starts_with("Invalid response body")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_transport_fault() {
        // 沒有服務在監聽的位址
        let client = client_for(
            ProviderId::IpApi,
            "http://127.0.0.1:1/json/{ip}".to_string(),
            None,
        );

        match client.lookup("9.9.9.9").await {
            ProviderResult::Failure(reason) => assert!(reason.starts_with("Request failed")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_transport_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/4.4.4.4");
                then.status(200)
                    .delay(Duration::from_millis(1500))
                    .json_body(serde_json::json!({"city": "Too Late"}));
            })
            .await;

        let client = HttpProviderClient::new(
            ProviderId::IpApi,
            ProviderSettings {
                endpoint: format!("{}/json/{{ip}}", server.base_url()),
                token: None,
            },
            Client::new(),
            Some(Duration::from_secs(1)),
        );

        match client.lookup("4.4.4.4").await {
            ProviderResult::Failure(reason) => assert!(reason.starts_with("Request failed")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_substitution() {
        let client = client_for(
            ProviderId::IpInfo,
            "https://ipinfo.io/{ip}/json".to_string(),
            None,
        );
        assert_eq!(client.endpoint_for("8.8.8.8"), "https://ipinfo.io/8.8.8.8/json");
    }
}
