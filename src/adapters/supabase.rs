use crate::config::toml_config::SupabaseConfig;
use crate::domain::model::LeadRow;
use crate::utils::error::{LeadError, Result};
use reqwest::Client;
use std::time::Duration;

/// Supabase PostgREST 的薄包裝，只負責 upsert
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    key: String,
    table: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            table: config.table.clone(),
        })
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    pub async fn upsert_leads(&self, rows: &[LeadRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let url = self.table_url();
        tracing::debug!("Upserting {} rows into {}", rows.len(), url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Supabase rejected upsert ({}): {}", status, body);
            return Err(LeadError::HttpStatusError {
                url,
                status: status.as_u16(),
            });
        }

        Ok(rows.len())
    }
}
