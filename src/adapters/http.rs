use crate::domain::ports::PageFetcher;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_seconds: u64, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("es-CO,es;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        tracing::debug!("GET {}", url);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LeadError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// 依序嘗試每個 URL，回傳第一個成功解析的結果；所有錯誤只記錄不傳遞
pub async fn fetch_first<T, F>(
    fetcher: &dyn PageFetcher,
    attempts: &[(String, Vec<(&str, &str)>)],
    mut parse: F,
) -> Option<T>
where
    F: FnMut(usize, &str) -> Option<T>,
{
    for (index, (url, headers)) in attempts.iter().enumerate() {
        let outcome = match fetcher.fetch_text(url, headers).await {
            Ok(body) => parse(index, &body).ok_or_else(|| LeadError::parse(url, "no usable data")),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(value) => return Some(value),
            Err(e) => tracing::debug!("Skipping attempt {}: {}", index + 1, e),
        }
    }
    None
}
