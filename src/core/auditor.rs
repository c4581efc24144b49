use crate::adapters::booking::BookingScraper;
use crate::adapters::google::GoogleReviewsScraper;
use crate::adapters::tripadvisor::TripAdvisorScraper;
use crate::adapters::whatsapp;
use crate::config::toml_config::{DiscoveryConfig, TomlConfig};
use crate::config::Endpoints;
use crate::core::discovery::InstagramDiscovery;
use crate::domain::model::{Business, BusinessAudit};
use crate::domain::ports::PageFetcher;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 對單一商家扇出所有來源；任何來源失敗都只會留下空值
pub struct Auditor {
    fetcher: Arc<dyn PageFetcher>,
    discovery: InstagramDiscovery,
    google: GoogleReviewsScraper,
    tripadvisor: TripAdvisorScraper,
    booking: BookingScraper,
}

impl Auditor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        endpoints: &Endpoints,
        discovery: DiscoveryConfig,
        google_api_key: Option<String>,
    ) -> Self {
        Self {
            discovery: InstagramDiscovery::new(fetcher.clone(), endpoints, discovery),
            google: GoogleReviewsScraper::new(fetcher.clone(), endpoints, google_api_key),
            tripadvisor: TripAdvisorScraper::new(fetcher.clone()),
            booking: BookingScraper::new(fetcher.clone(), endpoints),
            fetcher,
        }
    }

    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &TomlConfig) -> Self {
        Self::new(
            fetcher,
            &config.endpoints,
            config.discovery.clone(),
            config.google_api_key().map(str::to_string),
        )
    }

    pub async fn audit(&self, business: &Business) -> BusinessAudit {
        let mut audit = BusinessAudit::new(business.clone());

        let website_html = match &business.website {
            Some(url) => match self.fetcher.fetch_text(url, &[]).await {
                Ok(html) => Some(html),
                Err(e) => {
                    tracing::debug!("Website fetch failed for {}: {}", business.name, e);
                    audit.failed_sources.push("website".to_string());
                    None
                }
            },
            None => None,
        };

        let (discovery, google, tripadvisor, ota) = tokio::join!(
            self.discovery.discover(business, website_html.as_deref()),
            self.google.summary(business),
            self.tripadvisor.summary(business),
            self.booking.listing(business),
        );

        if google.is_none() {
            audit.failed_sources.push("google".to_string());
        }
        if tripadvisor.is_none() && business.tripadvisor_url.is_some() {
            audit.failed_sources.push("tripadvisor".to_string());
        }
        if ota.is_none() && business.category.is_lodging() {
            audit.failed_sources.push("booking".to_string());
        }
        if discovery.best.is_some() && discovery.profile.is_none() {
            audit.failed_sources.push("instagram".to_string());
        }

        let mut texts: Vec<&str> = Vec::new();
        if let Some(html) = website_html.as_deref() {
            texts.push(html);
        }
        if let Some(profile) = &discovery.profile {
            texts.extend(profile.biography.as_deref());
            texts.extend(profile.external_url.as_deref());
        }
        audit.whatsapp = whatsapp::detect(&texts, business.phone.as_deref());

        audit.instagram_match = discovery.best;
        audit.instagram = discovery.profile;
        audit.google = google;
        audit.tripadvisor = tripadvisor;
        audit.ota = ota;

        tracing::info!(
            "🏨 Audited {} ({}): instagram={}, google={}, booking={}, whatsapp={}",
            business.name,
            business.city,
            audit
                .instagram_match
                .as_ref()
                .map(|m| format!("@{}", m.handle))
                .unwrap_or_else(|| "-".to_string()),
            audit.google.as_ref().map(|g| g.review_count).unwrap_or(0),
            audit.ota_listed(),
            audit.whatsapp.has_channel()
        );

        audit
    }

    /// 以 `concurrency` 為上限並行稽核，輸出順序與輸入相同
    pub async fn audit_all(
        self: &Arc<Self>,
        businesses: &[Business],
        concurrency: usize,
    ) -> Vec<BusinessAudit> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, business) in businesses.iter().cloned().enumerate() {
            let auditor = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, auditor.audit(&business).await)
            });
        }

        let mut results: Vec<Option<BusinessAudit>> = vec![None; businesses.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, audit)) => results[index] = Some(audit),
                Err(e) => tracing::error!("Audit task failed: {}", e),
            }
        }

        results
            .into_iter()
            .zip(businesses)
            .map(|(audit, business)| {
                audit.unwrap_or_else(|| {
                    let mut empty = BusinessAudit::new(business.clone());
                    empty.failed_sources.push("audit".to_string());
                    empty
                })
            })
            .collect()
    }
}
