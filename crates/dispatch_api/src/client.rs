use std::env;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Connection settings for the dispatch backend. Injected at
/// construction; there is no process-wide configuration.
#[derive(Debug, Clone)]
pub struct DispatchApiConfig {
    pub base_url: String,
    /// Bearer token, when the deployment requires one. Token storage
    /// and login flows live elsewhere.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl DispatchApiConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn env() -> Self {
        let base_url =
            env::var("DISPATCH_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let auth_token = env::var("DISPATCH_API_TOKEN").ok();
        Self {
            auth_token,
            ..Self::new(base_url)
        }
    }
}

pub struct DispatchApiClient {
    config: DispatchApiConfig,
    http: reqwest::Client,
}

impl DispatchApiClient {
    pub fn new(config: DispatchApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET an endpoint and decode the JSON body.
    pub async fn get<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        log::debug!("GET {}", url);
        let request = self.authorize(self.http.get(&url).query(query));
        let response = request.send().await?;
        Self::parse(url, response).await
    }

    /// POST a JSON body and decode the JSON answer.
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        let request = self.authorize(self.http.post(&url).json(body));
        let response = request.send().await?;
        Self::parse(url, response).await
    }

    async fn parse<T>(url: String, response: reqwest::Response) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            Ok(serde_json::from_str(&text)?)
        } else {
            Err(ApiError::InvalidResponse {
                status_code: status,
                url,
                response: response.text().await.ok(),
            })
        }
    }
}
