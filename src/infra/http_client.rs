use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::error::{LoaderError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("observable-loaders/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn read(resp: reqwest::Response) -> Result<HttpResponse> {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(LoaderError::transport)?.to_vec();
        debug!("HTTP response: status={}, size={} bytes", status, bytes.len());
        Ok(HttpResponse { status, bytes })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse> {
        debug!("HTTP GET {}", url);
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(LoaderError::transport)?;
        Self::read(resp).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        debug!("HTTP POST {}", url);
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(LoaderError::transport)?;
        Self::read(resp).await
    }
}
