use crate::adapters::structured_data::json_ld_aggregate_rating;
use crate::domain::model::{Business, Platform, ReviewSummary};
use crate::domain::ports::PageFetcher;
use crate::utils::text::{parse_count, parse_rating};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static RATING_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""ratingValue"\s*:\s*"?(\d(?:[.,]\d+)?)"#).expect("rating value regex")
});
static REVIEW_COUNT_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""reviewCount"\s*:\s*"?(\d[\d.,]*)"#).expect("review count field regex")
});
static REVIEW_COUNT_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s+(?:reviews|opiniones|reseñas)").expect("review text regex")
});

pub struct TripAdvisorScraper {
    fetcher: Arc<dyn PageFetcher>,
}

impl TripAdvisorScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// 只處理已知的 TripAdvisor 頁面；搜尋頁需要執行 JavaScript
    pub async fn summary(&self, business: &Business) -> Option<ReviewSummary> {
        let url = business.tripadvisor_url.as_deref()?;
        match self.fetcher.fetch_text(url, &[]).await {
            Ok(html) => {
                let summary = parse_listing(&html, url);
                if summary.is_none() {
                    tracing::debug!("TripAdvisor page for {} had no rating", business.name);
                }
                summary
            }
            Err(e) => {
                tracing::debug!("TripAdvisor fetch failed for {}: {}", business.name, e);
                None
            }
        }
    }
}

pub fn parse_listing(html: &str, url: &str) -> Option<ReviewSummary> {
    let (rating, scale, count) = match json_ld_aggregate_rating(html) {
        Some(aggregate) => (
            aggregate.rating,
            aggregate.best_rating.unwrap_or(5.0),
            aggregate.count,
        ),
        None => (
            RATING_VALUE_RE
                .captures(html)
                .and_then(|caps| parse_rating(&caps[1])),
            5.0,
            REVIEW_COUNT_FIELD_RE
                .captures(html)
                .or_else(|| REVIEW_COUNT_TEXT_RE.captures(html))
                .and_then(|caps| parse_count(&caps[1])),
        ),
    };

    if rating.is_none() && count.is_none() {
        return None;
    }

    Some(ReviewSummary {
        platform: Platform::TripAdvisor,
        rating: rating.filter(|r| *r > 0.0 && *r <= scale),
        rating_scale: scale,
        review_count: count.unwrap_or(0),
        url: Some(url.to_string()),
    })
}
