//! HTTP Fetcher
//!
//! `reqwest` blocking client driven from `smol`'s blocking pool, so the
//! caller only ever awaits.

use std::time::Duration;

use url::Url;

use crate::{FetchResponse, Fetcher, Method, NetError, Request, Response};

/// HTTP fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("lazyimg/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// HTTP fetcher builder
#[derive(Debug, Default)]
pub struct HttpFetcherBuilder {
    config: FetcherConfig,
}

impl HttpFetcherBuilder {
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpFetcher, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.timeout)
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(HttpFetcher {
            client,
            config: self.config,
        })
    }
}

/// Fetcher backed by a real HTTP client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, NetError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, NetError> {
        let url = Url::parse(&request.url)
            .map_err(|e| NetError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        tracing::info!("HTTP {} {}", request.method.as_str(), url);

        let client = self.client.clone();
        smol::unblock(move || {
            let mut builder = client.request(to_reqwest(request.method), url);
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }

            let response = builder.send().map_err(|e| NetError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(k, v)| {
                    (
                        k.as_str().to_string(),
                        v.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect();
            let body = response
                .bytes()
                .map_err(|e| NetError::Network(e.to_string()))?
                .to_vec();

            tracing::debug!(status, bytes = body.len(), "HTTP response");
            Ok(FetchResponse::from(Response { status, headers, body }))
        })
        .await
    }
}
